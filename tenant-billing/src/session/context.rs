use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use tracing::{debug, instrument, warn};

use super::{Credential, DispatchResponse};
use crate::{
    error::{BillingError, Result, TransportErrorKind},
    mapper::ResourceMapper,
    payload::Payload,
    transport::{Exchange, Method, StatusCategory, Transport, TransportResponse},
};

/// Longest response excerpt carried by a status error.
const ERROR_BODY_LIMIT: usize = 256;

/// State of the context bound to a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// No context exists yet; the next acquire creates one.
    Uninitialized,
    /// The context is dispatching.
    Active,
    /// The registry was closed; dispatch fails with
    /// [`BillingError::Closed`].
    Closed,
}

/// Registry-wide open/closed flag shared with every context.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

const OPEN: u8 = 0;
const CLOSED: u8 = 1;

impl Lifecycle {
    pub(crate) const fn new() -> Self {
        Self { state: AtomicU8::new(OPEN) }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED
    }

    /// Marks closed. Returns false if it already was.
    pub(crate) fn close(&self) -> bool {
        self.state.swap(CLOSED, Ordering::AcqRel) == OPEN
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(BillingError::Closed);
        }
        Ok(())
    }
}

/// Everything needed to issue requests under one credential.
///
/// Immutable after construction. Contexts are created by
/// [`SessionRegistry::acquire`](super::SessionRegistry::acquire) and shared
/// between every caller using the same credential, so no request can pick up
/// another tenant's key.
pub struct DispatchContext<T> {
    credential: Credential,
    transport: Arc<T>,
    mapper: ResourceMapper,
    lifecycle: Arc<Lifecycle>,
}

impl<T: Transport> DispatchContext<T> {
    pub(crate) fn new(
        credential: Credential,
        transport: Arc<T>,
        mapper: ResourceMapper,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self { credential, transport, mapper, lifecycle }
    }

    /// Credential this context is bound to.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Mapper used for request and response bodies.
    #[must_use]
    pub fn mapper(&self) -> ResourceMapper {
        self.mapper
    }

    /// `Active` until the owning registry closes.
    #[must_use]
    pub fn state(&self) -> ContextState {
        if self.lifecycle.is_closed() {
            ContextState::Closed
        } else {
            ContextState::Active
        }
    }

    /// Serializes `body`, sends it, and decodes the answer as `R`.
    ///
    /// A 404 answer is resolved by [`DispatchResponse::on_not_found`]. Any
    /// other non-2xx status is a transport error carrying the status and the
    /// start of the response body.
    ///
    /// # Errors
    ///
    /// - [`BillingError::Closed`] if the registry was closed
    /// - [`BillingError::Transport`] for exchange failures and error statuses
    /// - [`BillingError::NotFound`] for a missing single resource
    /// - [`BillingError::Mapping`] if a body cannot be encoded or decoded
    #[instrument(
        skip(self, body),
        fields(
            credential = %self.credential,
            protocol = self.transport.protocol_name(),
            format = %self.mapper.format(),
        )
    )]
    pub async fn dispatch<R: DispatchResponse>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Payload>,
    ) -> Result<R> {
        self.lifecycle.ensure_open()?;

        let encoded = body.map(|payload| self.mapper.to_wire(payload, R::request_schema())).transpose()?;
        let exchange = Exchange {
            credential: &self.credential,
            method,
            path,
            body: encoded.as_deref(),
            content_type: self.mapper.format().content_type(),
        };
        let response = self.transport.send(exchange).await?;

        match response.category() {
            StatusCategory::Success => R::from_body(&self.mapper, &response.body),
            StatusCategory::NotFound => {
                debug!(path, "resource not found");
                R::on_not_found(path)
            }
            StatusCategory::ClientError | StatusCategory::ServerError => {
                warn!(status = response.status, "billing service returned an error status");
                Err(status_error(&response))
            }
        }
    }
}

fn status_error(response: &TransportResponse) -> BillingError {
    let body = String::from_utf8_lossy(&response.body);
    let mut excerpt: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
    if body.trim().chars().count() > ERROR_BODY_LIMIT {
        excerpt.push_str("...");
    }
    BillingError::transport(TransportErrorKind::Status(response.status), excerpt)
}

impl<T> fmt::Debug for DispatchContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("credential", &self.credential)
            .field("mapper", &self.mapper)
            .field("closed", &self.lifecycle.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> TransportResponse {
        TransportResponse { status, body: body.as_bytes().to_vec(), headers: Vec::new() }
    }

    #[test]
    fn test_lifecycle_close_once() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.ensure_open().is_ok());
        assert!(lifecycle.close());
        assert!(!lifecycle.close());
        assert!(matches!(lifecycle.ensure_open(), Err(BillingError::Closed)));
    }

    #[test]
    fn test_status_error_carries_status() {
        let error = status_error(&response(422, "<errors><error>invalid plan</error></errors>"));
        match error {
            BillingError::Transport { kind, message } => {
                assert_eq!(kind, TransportErrorKind::Status(422));
                assert!(message.contains("invalid plan"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_error_truncates_body() {
        let error = status_error(&response(500, &"x".repeat(1000)));
        let BillingError::Transport { message, .. } = error else { panic!("expected transport error") };
        assert_eq!(message.len(), ERROR_BODY_LIMIT + 3);
        assert!(message.ends_with("..."));
    }
}
