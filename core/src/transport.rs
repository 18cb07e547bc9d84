//! The secure transport the service sends requests through.
//!
//! # Design
//! `Transport` is the I/O boundary: it takes a fully built `HttpRequest`,
//! performs one exchange and returns the response with its body buffered.
//! Errors are returned as-is so the service can surface them unwrapped.
//! `ReqwestTransport` is the default, a rustls-backed client that keeps no
//! idle connections and never follows redirects.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::debug;

use crate::error::BoxError;
use crate::http::{Headers, HttpRequest, HttpResponse};

/// Executes a single HTTPS exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

/// `Transport` over a reqwest client using rustls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = client_builder().build()?;
        Ok(Self { client })
    }

    /// Like `new`, additionally trusting the PEM-encoded root certificate.
    pub fn with_root_certificate(pem: &[u8]) -> Result<Self, reqwest::Error> {
        let root = reqwest::Certificate::from_pem(pem)?;
        let client = client_builder().add_root_certificate(root).build()?;
        Ok(Self { client })
    }

    /// Wrap a caller-configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .use_rustls_tls()
        .pool_max_idle_per_host(0)
        .redirect(Policy::none())
}

fn url_for(request: &HttpRequest) -> String {
    format!("https://{}:{}{}", request.host, request.port, request.path)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())?;
        let url = url_for(&request);
        debug!(%url, "sending over rustls");

        let mut builder = self.client.request(method, url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, headers, body })
    }
}
