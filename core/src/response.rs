//! Response decoding and error classification.
//!
//! # Design
//! A response is only interpreted once its body is fully buffered. The
//! stripped `content-type` picks the decoding (JSON, text, or raw bytes). JSON
//! bodies are checked for the error payloads some upstream services return
//! with a success status before the status itself is checked; only 200 and
//! 201 count as success.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::HttpsError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Headers, CONTENT_TYPE_HEADER, JSON_MEDIA_TYPE};

const GENERIC_FAILURE: &str = "The request was not successfully completed.";

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// A successfully completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// `None` for 204 responses and HEAD requests.
    pub body: Option<ResponseBody>,
    /// The response `content-type` without parameters. `None` for 204.
    pub content_type: Option<String>,
    pub headers: Headers,
}

impl Reply {
    /// Deserialize a JSON reply into `T`.
    ///
    /// Returns `None` when the reply has no JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        match &self.body {
            Some(ResponseBody::Json(value)) => Some(T::deserialize(value)),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Some(ResponseBody::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Some(ResponseBody::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }
}

/// Drop any `;`-separated parameters from a media type.
pub fn strip_params(media_type: &str) -> &str {
    match media_type.find(';') {
        Some(semi) => media_type[..semi].trim_end(),
        None => media_type,
    }
}

/// Interpret a buffered response to `request`.
pub fn interpret_response(request: &HttpRequest, response: HttpResponse) -> Result<Reply, HttpsError> {
    let HttpResponse { status, headers, body } = response;
    debug!(status, content_type = ?headers.get(CONTENT_TYPE_HEADER), "response received");

    if status == 204 {
        return Ok(Reply {
            body: None,
            content_type: None,
            headers,
        });
    }

    let content_type = headers.get(CONTENT_TYPE_HEADER).map(|t| strip_params(t).to_string());
    let media_type = content_type.as_deref().map(str::to_ascii_lowercase);

    let decoded = if request.method == HttpMethod::Head {
        None
    } else if media_type.as_deref() == Some(JSON_MEDIA_TYPE) {
        let value = parse_json(request, &body)?;
        if let Some(message) = upstream_error_message(&value) {
            warn!(status, reason = %message, "upstream error payload");
            return Err(upstream(request, status, &message));
        }
        Some(ResponseBody::Json(value))
    } else if media_type.as_deref().is_some_and(is_textual) {
        Some(ResponseBody::Text(String::from_utf8_lossy(&body).into_owned()))
    } else {
        Some(ResponseBody::Bytes(body))
    };

    if status != 200 && status != 201 {
        warn!(status, "request not successfully completed");
        return Err(upstream(request, status, GENERIC_FAILURE));
    }

    Ok(Reply {
        body: decoded,
        content_type,
        headers,
    })
}

fn parse_json(request: &HttpRequest, body: &[u8]) -> Result<Value, HttpsError> {
    let text = String::from_utf8_lossy(body);
    if text.is_empty() {
        warn!("empty JSON response");
        return Err(bad_gateway(request, "Empty Response"));
    }
    serde_json::from_str(&text).map_err(|e| {
        warn!(error = %e, "malformed JSON response");
        bad_gateway(request, &e.to_string())
    })
}

fn is_textual(media_type: &str) -> bool {
    media_type.starts_with("text/") || media_type.ends_with("+xml")
}

/// Message from a recognized upstream error payload, if any.
///
/// Checked in order: `error_description` (first line only), `error.message`,
/// then `odata.error.message.value`. An odata payload of any other shape is
/// ignored.
fn upstream_error_message(value: &Value) -> Option<String> {
    if let Some(description) = value.get("error_description").and_then(Value::as_str) {
        if !description.is_empty() {
            let first = description.split('\n').next().unwrap_or_default();
            return Some(first.strip_suffix('\r').unwrap_or(first).to_string());
        }
    }

    if let Some(message) = value.get("error").and_then(|e| e.get("message")) {
        if let Some(message) = message_text(message) {
            return Some(message);
        }
    }

    value
        .get("odata.error")
        .and_then(|e| e.get("message"))
        .filter(|m| m.is_object())
        .and_then(|m| m.get("value"))
        .and_then(message_text)
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn upstream(request: &HttpRequest, status: u16, message: &str) -> HttpsError {
    HttpsError::Upstream {
        status,
        message: format!("{} {message}", request.context()),
    }
}

fn bad_gateway(request: &HttpRequest, message: &str) -> HttpsError {
    HttpsError::BadGateway {
        message: format!("{} {message}", request.context()),
    }
}
