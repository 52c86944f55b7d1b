//! Outbound transport abstraction.
//!
//! The session core never talks to the network directly. It hands a fully
//! serialized [`Exchange`] to a [`Transport`] and gets back the raw status and
//! body. Status interpretation ([`StatusCategory`]) happens in the core, so a
//! transport only reports failures that prevented an answer (timeouts,
//! connection errors).
//!
//! # Examples
//!
//! An in-memory transport for tests:
//!
//! ```
//! use tenant_billing::{
//!     error::Result,
//!     transport::{Exchange, Transport, TransportResponse},
//! };
//!
//! #[derive(Debug)]
//! struct Canned;
//!
//! impl Transport for Canned {
//!     async fn send<'a>(&'a self, _exchange: Exchange<'a>) -> Result<TransportResponse> {
//!         Ok(TransportResponse { status: 404, body: Vec::new(), headers: Vec::new() })
//!     }
//!
//!     fn protocol_name(&self) -> &'static str {
//!         "canned"
//!     }
//! }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::fmt;

use crate::{error::Result, session::Credential};

pub mod config;
pub mod http;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Update or state transition.
    Put,
    /// Delete.
    Delete,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound request, fully serialized.
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    /// Credential the request is authenticated with.
    pub credential: &'a Credential,
    /// Request method.
    pub method: Method,
    /// Resource path relative to the service base URL, with query string.
    pub path: &'a str,
    /// Serialized request body.
    pub body: Option<&'a [u8]>,
    /// Media type of the body and of the expected response.
    pub content_type: &'static str,
}

/// Raw answer from the billing service.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Response headers.
    pub headers: Vec<(String, String)>,
}

impl TransportResponse {
    /// Category of the response status.
    #[must_use]
    pub fn category(&self) -> StatusCategory {
        StatusCategory::from_status(self.status)
    }
}

/// Classification of a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    /// 2xx.
    Success,
    /// 404.
    NotFound,
    /// Any other 4xx.
    ClientError,
    /// 5xx, and anything outside the ranges above.
    ServerError,
}

impl StatusCategory {
    /// Classifies an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            404 => Self::NotFound,
            400..=499 => Self::ClientError,
            _ => Self::ServerError,
        }
    }
}

/// Outbound transport to the billing service.
///
/// Implementations must be safe to share across tasks; the session registry
/// holds one instance for all credentials. The credential travels with every
/// [`Exchange`], so an implementation never stores per-tenant state.
///
/// # Protocol Support
///
/// | Protocol | Implementation |
/// |----------|----------------|
/// | HTTP/1.1 | [`HttpTransport`] |
/// | HTTP/2   | [`HttpTransport`] |
pub trait Transport: Send + Sync + 'static {
    /// Performs one exchange.
    ///
    /// Returns the response for every status the service answers with.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Transport`](crate::error::BillingError::Transport)
    /// when no response was received, and
    /// [`BillingError::InvalidInput`](crate::error::BillingError::InvalidInput)
    /// for a path or header the transport refuses to send.
    fn send<'a>(&'a self, exchange: Exchange<'a>) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    ///
    /// Examples: "http/1.1", "http/2"
    fn protocol_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_categories() {
        assert_eq!(StatusCategory::from_status(200), StatusCategory::Success);
        assert_eq!(StatusCategory::from_status(201), StatusCategory::Success);
        assert_eq!(StatusCategory::from_status(204), StatusCategory::Success);
        assert_eq!(StatusCategory::from_status(404), StatusCategory::NotFound);
        assert_eq!(StatusCategory::from_status(401), StatusCategory::ClientError);
        assert_eq!(StatusCategory::from_status(422), StatusCategory::ClientError);
        assert_eq!(StatusCategory::from_status(500), StatusCategory::ServerError);
        assert_eq!(StatusCategory::from_status(503), StatusCategory::ServerError);
        assert_eq!(StatusCategory::from_status(302), StatusCategory::ServerError);
    }

    #[test]
    fn test_response_category() {
        let response = TransportResponse { status: 404, body: b"Not Found".to_vec(), headers: vec![] };
        assert_eq!(response.category(), StatusCategory::NotFound);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }
}
