//! Query string composition and URL-encoded form serialization.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Query appended to a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// A pre-formed query string, used verbatim.
    Raw(String),
    /// Ordered key/value pairs, URL-encoded on use.
    ///
    /// Encoding follows `application/x-www-form-urlencoded`: a space becomes
    /// `+` and `'` becomes `%27`.
    Pairs(Vec<(String, String)>),
}

impl Query {
    pub fn pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Query::Pairs(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// The encoded query string, without a leading `?`.
    pub fn encode(&self) -> String {
        match self {
            Query::Raw(raw) => raw.clone(),
            Query::Pairs(pairs) => encode_pairs(pairs),
        }
    }
}

impl From<&str> for Query {
    fn from(raw: &str) -> Self {
        Query::Raw(raw.to_string())
    }
}

impl From<String> for Query {
    fn from(raw: String) -> Self {
        Query::Raw(raw)
    }
}

/// Append `query` to `path`, using `&` when the path already has a query.
///
/// An absent or empty query leaves the path unchanged.
pub fn append_query(path: &str, query: Option<&Query>) -> String {
    let encoded = match query {
        Some(query) => query.encode(),
        None => return path.to_string(),
    };
    if encoded.is_empty() {
        return path.to_string();
    }
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{encoded}")
}

/// Form-urlencode `pairs`. Only `*-._` and alphanumerics pass through
/// unescaped; a space is written as `+`.
pub(crate) fn encode_pairs(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Flatten a JSON object into form pairs.
///
/// Arrays repeat their key once per element, scalars are stringified and null
/// becomes an empty value. Nested objects have no form representation.
pub(crate) fn form_pairs(object: &Map<String, Value>) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), form_scalar(key, item)?));
                }
            }
            other => pairs.push((key.clone(), form_scalar(key, other)?)),
        }
    }
    Ok(pairs)
}

fn form_scalar(key: &str, value: &Value) -> Result<String, String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(_) | Value::Object(_) => Err(format!("field `{key}` is nested")),
    }
}
