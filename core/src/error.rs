//! Error types for the HTTPS service.
//!
//! # Design
//! Misuse is reported before any I/O happens (`InvalidProtocol`, `InvalidUri`,
//! `InvalidRequestData`, `UnsupportedMediaType`, `Encoding`). Errors derived
//! from an HTTP exchange (`Upstream`, `BadGateway`) carry a status code and a
//! message prefixed with the `[METHOD https://host:port/path]` request context.
//! Transport failures pass through untouched.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error produced by a [`Transport`](crate::Transport) implementation.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors returned by `HttpsService` and its helpers.
#[derive(Debug, Error)]
pub enum HttpsError {
    /// A full URI was supplied whose scheme is not `https`.
    #[error("{uri}: invalid protocol (expected https)")]
    InvalidProtocol { uri: String },

    /// The endpoint could not be parsed or has no host.
    #[error("{uri}: invalid uri ({reason})")]
    InvalidUri { uri: String, reason: String },

    /// The request body is not a structured value, text, or raw bytes.
    #[error("invalid request data (must be an object, array, string or bytes): {received}")]
    InvalidRequestData { received: &'static str },

    /// A structured body was paired with a media type nothing can serialize to.
    #[error("unsupported media type (cannot serialize object): {media_type}")]
    UnsupportedMediaType { media_type: String },

    /// The structured body cannot be represented in the declared media type.
    #[error("cannot encode request body as {media_type}: {message}")]
    Encoding { media_type: String, message: String },

    /// The server answered with a failure status or a recognized error payload.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The server promised JSON but sent an empty or malformed body.
    #[error("{message}")]
    BadGateway { message: String },

    /// The transport failed before a response was obtained.
    #[error(transparent)]
    Transport(BoxError),
}

impl HttpsError {
    /// HTTP status associated with the error, or 0 when none applies.
    pub fn status(&self) -> u16 {
        match self {
            HttpsError::Upstream { status, .. } => *status,
            HttpsError::BadGateway { .. } => 502,
            _ => 0,
        }
    }

    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        HttpsError::Transport(err.into())
    }
}
