//! HTTPS service bound to one endpoint.
//!
//! # Design
//! `HttpsService` holds only its immutable `Endpoint` and a `Transport`; no
//! mutable state is shared between calls. `request` is split into
//! `build_request` (normalize, encode) and `parse_response` (decode,
//! classify) around a single `Transport::send`, so hosts that drive their own
//! I/O can call the two halves directly.

use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::body::{encode_body, RequestBody};
use crate::endpoint::Endpoint;
use crate::error::HttpsError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};
use crate::query::{append_query, Query};
use crate::response::{interpret_response, Reply};
use crate::transport::{ReqwestTransport, Transport};

/// Client for a single HTTPS host.
///
/// Each call is one independent round trip that resolves exactly once.
#[derive(Debug, Clone)]
pub struct HttpsService<T = ReqwestTransport> {
    endpoint: Endpoint,
    transport: T,
}

impl HttpsService<ReqwestTransport> {
    /// Accepts a hostname (`example.com`) or an https URI
    /// (`https://example.com:443`) and uses the default rustls transport.
    pub fn new(uri: &str) -> Result<Self, HttpsError> {
        let endpoint = Endpoint::parse(uri)?;
        let transport = ReqwestTransport::new().map_err(HttpsError::transport)?;
        Ok(Self { endpoint, transport })
    }
}

impl<T: Transport> HttpsService<T> {
    pub fn with_transport(uri: &str, transport: T) -> Result<Self, HttpsError> {
        Ok(Self {
            endpoint: Endpoint::parse(uri)?,
            transport,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn host(&self) -> &str {
        self.endpoint.host()
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port()
    }

    pub async fn get(&self, path: &str, query: Option<&Query>) -> Result<Reply, HttpsError> {
        self.request("GET", &append_query(path, query), None, None).await
    }

    pub async fn head(&self, path: &str, query: Option<&Query>) -> Result<Reply, HttpsError> {
        self.request("HEAD", &append_query(path, query), None, None).await
    }

    pub async fn post(&self, path: &str, data: impl Into<RequestBody>) -> Result<Reply, HttpsError> {
        self.request("POST", path, None, Some(data.into())).await
    }

    pub async fn put(&self, path: &str, data: impl Into<RequestBody>) -> Result<Reply, HttpsError> {
        self.request("PUT", path, None, Some(data.into())).await
    }

    pub async fn patch(&self, path: &str, data: impl Into<RequestBody>) -> Result<Reply, HttpsError> {
        self.request("PATCH", path, None, Some(data.into())).await
    }

    pub async fn delete(&self, path: &str) -> Result<Reply, HttpsError> {
        self.request("DELETE", path, None, None).await
    }

    /// Send `method` to `path` with optional headers and body.
    ///
    /// Encoding errors are returned before anything is sent. Transport
    /// failures are returned unwrapped; every other error carries the
    /// `[METHOD https://host:port/path]` context.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        headers: Option<Headers>,
        data: Option<RequestBody>,
    ) -> Result<Reply, HttpsError> {
        let request = self.build_request(method, path, headers, data)?;
        let span = tracing::debug_span!(
            "https_request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            host = %request.host,
            port = request.port,
            path = %request.path,
        );

        async move {
            debug!(body_len = request.body.as_ref().map_or(0, Vec::len), "dispatching request");
            let response = self
                .transport
                .send(request.clone())
                .await
                .map_err(HttpsError::Transport)?;
            self.parse_response(&request, response)
        }
        .instrument(span)
        .await
    }

    /// Build the request `request` would send, without sending it.
    pub fn build_request(
        &self,
        method: &str,
        path: &str,
        headers: Option<Headers>,
        data: Option<RequestBody>,
    ) -> Result<HttpRequest, HttpsError> {
        let method = HttpMethod::from_name(method);
        let mut headers = headers.unwrap_or_default();
        let body = data.map(|data| encode_body(&mut headers, data)).transpose()?;

        Ok(HttpRequest {
            method,
            host: self.endpoint.host().to_string(),
            port: self.endpoint.port(),
            path: path.to_string(),
            headers,
            body,
        })
    }

    /// Interpret the buffered response to a request built by `build_request`.
    pub fn parse_response(&self, request: &HttpRequest, response: HttpResponse) -> Result<Reply, HttpsError> {
        interpret_response(request, response)
    }
}
