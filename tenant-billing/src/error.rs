//! Error types for the billing client.
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! type [`BillingError`] classifies a failure precisely enough for callers to
//! tell a credential or network problem apart from an unexpected entity shape
//! or a missing resource.
//!
//! # Error Categories
//!
//! - **Transport** ([`BillingError::Transport`]): the exchange with the billing
//!   service failed or returned a client/server error status
//! - **Missing resources** ([`BillingError::NotFound`]): nothing exists at the
//!   requested path
//! - **Mapping** ([`BillingError::Mapping`]): a payload could not be coerced
//!   into the target entity schema
//! - **Lifecycle** ([`BillingError::Closed`]): the session registry was closed
//!
//! # Examples
//!
//! ```
//! use tenant_billing::error::{BillingError, Result};
//!
//! fn require_code(code: &str) -> Result<&str> {
//!     if code.is_empty() {
//!         return Err(BillingError::InvalidInput("resource code cannot be empty".to_owned()));
//!     }
//!     Ok(code)
//! }
//! # assert!(require_code("").is_err());
//! ```

use std::fmt;

use thiserror::Error;

/// Result type alias for billing operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Classification of a failed transport exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The exchange did not complete within the transport's timeout.
    Timeout,
    /// A connection to the service could not be established.
    Connect,
    /// The service answered with a client or server error status.
    Status(u16),
    /// Any other transport failure (TLS, protocol, body read).
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Connect => f.write_str("connect"),
            Self::Status(status) => write!(f, "status {status}"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// Errors that can occur while dispatching billing requests.
///
/// # Error Recovery
///
/// - **Transport errors** ([`Transport`](Self::Transport)): the core never
///   retries; callers or the transport decide whether to try again
/// - **Not found** ([`NotFound`](Self::NotFound)): the resource does not exist
///   for this credential; check the identifier and tenant
/// - **Mapping errors** ([`Mapping`](Self::Mapping)): the response shape did
///   not match the entity schema; usually a service-side contract change
/// - **Closed** ([`Closed`](Self::Closed)): open a new registry
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum BillingError {
    /// The exchange with the billing service failed.
    ///
    /// Raised for network failures, timeouts, and any client or server error
    /// status other than 404.
    ///
    /// # Recovery
    ///
    /// Inspect `kind`. `Timeout` and `Connect` are usually transient;
    /// `Status(401)` points at a bad credential.
    #[error("transport error ({kind}): {message}")]
    Transport {
        /// What went wrong at the transport layer.
        kind: TransportErrorKind,
        /// Human-readable detail, including a truncated response body for
        /// status errors.
        message: String,
    },

    /// No resource exists at the requested path.
    ///
    /// Single-resource reads surface this error; list reads return an empty
    /// list instead.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A payload could not be projected onto the target schema.
    ///
    /// Never silently dropped: a single unmappable element fails a whole list.
    #[error("mapping failed: {0}")]
    Mapping(String),

    /// The session registry has been closed.
    #[error("session registry is closed")]
    Closed,

    /// Client configuration is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_billing::error::BillingError;
    ///
    /// let err = BillingError::Config("base_url must use HTTPS".to_owned());
    /// assert!(err.to_string().contains("invalid configuration"));
    /// ```
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Caller-supplied input was rejected before any request was issued.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl BillingError {
    /// Creates a transport error of the given kind.
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport { kind, message: message.into() }
    }

    /// Creates a mapping error for a specific field.
    pub fn mapping(field: &str, detail: impl fmt::Display) -> Self {
        Self::Mapping(format!("field '{field}': {detail}"))
    }

    /// Returns true if this error reports a missing resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this error came from the transport exchange.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns true if this error came from payload mapping.
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }
}

impl From<reqwest::Error> for BillingError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if let Some(status) = err.status() {
            TransportErrorKind::Status(status.as_u16())
        } else {
            TransportErrorKind::Other
        };
        Self::Transport { kind, message: err.to_string() }
    }
}
