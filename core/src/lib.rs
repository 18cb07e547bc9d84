//! Minimal HTTPS client helper.
//!
//! # Overview
//! `HttpsService` sends GET/HEAD/POST/PUT/PATCH/DELETE requests to one host,
//! encodes request bodies from their content type, buffers and decodes
//! response bodies from the response content type, and folds failure
//! statuses and known error payloads into a single `HttpsError`.
//!
//! # Design
//! - `HttpsService` is stateless apart from its immutable `Endpoint`; every
//!   call is one independent round trip.
//! - Request building and response interpretation are pure functions over
//!   `HttpRequest` / `HttpResponse`; the `Transport` trait is the only place
//!   I/O happens (host-does-IO pattern).
//! - No pooling, retries, timeouts or redirects.

pub mod body;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod query;
pub mod response;
pub mod transport;

pub use body::RequestBody;
pub use client::HttpsService;
pub use endpoint::Endpoint;
pub use error::{BoxError, HttpsError};
pub use http::{
    Headers, HttpMethod, HttpRequest, HttpResponse, CONTENT_LENGTH_HEADER, CONTENT_TYPE_HEADER, FORM_MEDIA_TYPE,
    JSON_MEDIA_TYPE,
};
pub use query::{append_query, Query};
pub use response::{Reply, ResponseBody};
pub use transport::{ReqwestTransport, Transport};
