use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/created", any(created))
        .route("/no-content", any(no_content))
        .route("/empty-json", get(empty_json))
        .route("/malformed-json", get(malformed_json))
        .route("/error-description", any(error_description))
        .route("/error-object", any(error_object))
        .route("/odata-error", get(odata_error))
        .route("/server-error", get(server_error))
        .route("/text", get(text))
        .route("/feed", get(feed))
        .route("/binary", get(binary))
        .route("/redirect", any(redirect))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    Json(record(method, uri, headers, body))
}

async fn created(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Echo>) {
    (StatusCode::CREATED, Json(record(method, uri, headers, body)))
}

fn record(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Echo {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

async fn no_content() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::CONTENT_TYPE, "application/json"), (header::ETAG, "\"v1\"")],
    )
}

async fn empty_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "")
}

async fn malformed_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json; charset=utf-8")], "{\"a\":")
}

async fn error_description() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided.\r\nTrace ID: 0f1e\r\nCorrelation ID: 9a8b",
        })),
    )
}

async fn error_object() -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": {
                "code": "Authorization_RequestDenied",
                "message": "Insufficient privileges to complete the operation.",
            }
        })),
    )
}

async fn odata_error() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "odata.error": {
                "code": "Request_ResourceNotFound",
                "message": {"lang": "en", "value": "Resource 'alice' does not exist."},
            }
        })),
    )
}

async fn server_error() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json")],
        "{\"status\":\"down\"}",
    )
}

async fn text() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], "plain text")
}

async fn feed() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/atom+xml")], "<feed xmlns=\"http://www.w3.org/2005/Atom\"/>")
}

async fn binary() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/octet-stream")], vec![0u8, 1, 2, 255])
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/echo")])
}
