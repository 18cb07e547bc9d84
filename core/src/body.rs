//! Request body shapes and their encoding.
//!
//! # Design
//! A body is one of a closed set of shapes. Structured values are serialized
//! according to the declared `content-type` (JSON when none is declared);
//! text and bytes go out untouched. Whatever the shape, a missing
//! `content-length` is filled in from the encoded byte length.

use serde::Serialize;
use serde_json::Value;

use crate::error::HttpsError;
use crate::http::{Headers, CONTENT_LENGTH_HEADER, CONTENT_TYPE_HEADER, FORM_MEDIA_TYPE, JSON_MEDIA_TYPE};
use crate::query::{encode_pairs, form_pairs};
use crate::response::strip_params;

/// A request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// A value serialized according to the request's `content-type`.
    ///
    /// Only objects and arrays count as structured. A JSON string is sent as
    /// text; other scalars are rejected.
    Structured(Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl RequestBody {
    /// Convert any serializable value into a structured body.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, HttpsError> {
        serde_json::to_value(value)
            .map(RequestBody::Structured)
            .map_err(|e| HttpsError::Encoding {
                media_type: JSON_MEDIA_TYPE.to_string(),
                message: e.to_string(),
            })
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Structured(value)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<&[u8]> for RequestBody {
    fn from(bytes: &[u8]) -> Self {
        RequestBody::Bytes(bytes.to_vec())
    }
}

/// Encode `body` into bytes, updating `content-type` and `content-length`.
pub fn encode_body(headers: &mut Headers, body: RequestBody) -> Result<Vec<u8>, HttpsError> {
    let bytes = match body {
        RequestBody::Structured(Value::String(text)) | RequestBody::Text(text) => text.into_bytes(),
        RequestBody::Bytes(bytes) => bytes,
        RequestBody::Structured(value @ (Value::Object(_) | Value::Array(_))) => {
            encode_structured(headers, &value)?
        }
        RequestBody::Structured(other) => {
            return Err(HttpsError::InvalidRequestData {
                received: json_type_name(&other),
            })
        }
    };
    headers.insert_if_absent(CONTENT_LENGTH_HEADER, bytes.len().to_string());
    Ok(bytes)
}

fn encode_structured(headers: &mut Headers, value: &Value) -> Result<Vec<u8>, HttpsError> {
    let declared = headers.get(CONTENT_TYPE_HEADER).map(|t| strip_params(t).to_ascii_lowercase());
    match declared.as_deref() {
        None => {
            headers.set(CONTENT_TYPE_HEADER, JSON_MEDIA_TYPE);
            encode_json(value)
        }
        Some(JSON_MEDIA_TYPE) => encode_json(value),
        Some(FORM_MEDIA_TYPE) => encode_form(value),
        Some(other) => Err(HttpsError::UnsupportedMediaType {
            media_type: other.to_string(),
        }),
    }
}

fn encode_json(value: &Value) -> Result<Vec<u8>, HttpsError> {
    serde_json::to_vec(value).map_err(|e| HttpsError::Encoding {
        media_type: JSON_MEDIA_TYPE.to_string(),
        message: e.to_string(),
    })
}

/// Form-encode a structured body.
///
/// Only JSON objects are accepted. A top-level array (or any other non-object)
/// has no key names to encode under and fails with `Encoding`, rather than
/// being keyed by index (`0=a&1=b`).
fn encode_form(value: &Value) -> Result<Vec<u8>, HttpsError> {
    let encoding_error = |message: String| HttpsError::Encoding {
        media_type: FORM_MEDIA_TYPE.to_string(),
        message,
    };
    let object = value
        .as_object()
        .ok_or_else(|| encoding_error("only objects can be form encoded".to_string()))?;
    let pairs = form_pairs(object).map_err(encoding_error)?;
    Ok(encode_pairs(&pairs).into_bytes())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
