//! Target host and port for an `HttpsService`.

use std::fmt;

use url::Url;

use crate::error::HttpsError;

pub const DEFAULT_PORT: u16 = 443;

/// Host and port every request of a service is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Accepts a hostname (`example.com`) or an https URI
    /// (`https://example.com:8443`).
    ///
    /// Input without a scheme is taken as the hostname in full. Any scheme
    /// other than `https` is rejected.
    pub fn parse(input: &str) -> Result<Self, HttpsError> {
        if input.is_empty() {
            return Err(HttpsError::InvalidUri {
                uri: input.to_string(),
                reason: "empty host".to_string(),
            });
        }
        if !input.contains("://") {
            return Ok(Self::new(input, DEFAULT_PORT));
        }

        let parsed = Url::parse(input).map_err(|e| HttpsError::InvalidUri {
            uri: input.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "https" {
            return Err(HttpsError::InvalidProtocol {
                uri: input.to_string(),
            });
        }
        let host = parsed.host_str().ok_or_else(|| HttpsError::InvalidUri {
            uri: input.to_string(),
            reason: "missing host".to_string(),
        })?;

        Ok(Self::new(host, parsed.port().unwrap_or(DEFAULT_PORT)))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "https://{}:{}", self.host, self.port)
    }
}
