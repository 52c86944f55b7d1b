use std::{fmt, sync::Arc};

use dashmap::DashMap;
use tracing::{debug, info};

use super::{ContextState, Credential, DispatchContext, DispatchResponse, context::Lifecycle};
use crate::{
    error::{BillingError, Result},
    mapper::{Entity, ResourceMapper, WireFormat},
    model::ResourceList,
    payload::Payload,
    transport::{Method, Transport},
};

/// Maps credentials to their dispatch contexts.
///
/// One registry serves every tenant. Callers pass the credential with each
/// call; the registry resolves it to an immutable [`DispatchContext`] that is
/// created on first use and shared afterwards.
///
/// # Lifecycle
///
/// A registry is open from construction until [`close`](Self::close). After
/// that every acquire and dispatch fails with [`BillingError::Closed`],
/// including dispatches through contexts acquired before the close.
///
/// # Concurrency
///
/// Concurrent acquires for an unseen credential race on a single map entry;
/// exactly one context is created and all callers receive it.
///
/// # Examples
///
/// ```rust,no_run
/// use tenant_billing::{
///     mapper::WireFormat,
///     model::Coupon,
///     session::{Credential, SessionRegistry},
///     transport::HttpTransport,
/// };
///
/// # async fn example() -> tenant_billing::error::Result<()> {
/// let transport = HttpTransport::new("https://acme.billing.example.com/v2")?;
/// let registry = SessionRegistry::open(transport, WireFormat::Xml);
///
/// let tenant = Credential::new("a1b2c3d4e5f6")?;
/// let coupon: Coupon = registry.fetch(&tenant, "/coupons/SUMMER20").await?;
/// println!("{:?}", coupon.discount_percent);
///
/// registry.close();
/// # Ok(())
/// # }
/// ```
pub struct SessionRegistry<T> {
    transport: Arc<T>,
    mapper: ResourceMapper,
    contexts: DashMap<Credential, Arc<DispatchContext<T>>>,
    lifecycle: Arc<Lifecycle>,
}

impl<T: Transport> SessionRegistry<T> {
    /// Opens a registry around `transport`.
    #[must_use]
    pub fn open(transport: T, format: WireFormat) -> Self {
        Self::with_shared(Arc::new(transport), format)
    }

    /// Opens a registry around a transport that is also used elsewhere.
    #[must_use]
    pub fn with_shared(transport: Arc<T>, format: WireFormat) -> Self {
        debug!(protocol = transport.protocol_name(), %format, "session registry opened");
        Self {
            transport,
            mapper: ResourceMapper::new(format),
            contexts: DashMap::new(),
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    /// Returns the context bound to `credential`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Closed`] if the registry is closed.
    pub fn acquire(&self, credential: &Credential) -> Result<Arc<DispatchContext<T>>> {
        self.lifecycle.ensure_open()?;

        if let Some(context) = self.contexts.get(credential) {
            return Ok(Arc::clone(context.value()));
        }

        self.insert_checked(credential)
    }

    /// Inserts (or joins) the entry for `credential`, then drops it again if
    /// a close ran after the open check in [`acquire`](Self::acquire).
    fn insert_checked(&self, credential: &Credential) -> Result<Arc<DispatchContext<T>>> {
        let context = Arc::clone(
            self.contexts
                .entry(credential.clone())
                .or_insert_with(|| {
                    debug!(%credential, "creating dispatch context");
                    Arc::new(DispatchContext::new(
                        credential.clone(),
                        Arc::clone(&self.transport),
                        self.mapper,
                        Arc::clone(&self.lifecycle),
                    ))
                })
                .value(),
        );

        if self.lifecycle.is_closed() {
            self.contexts.remove(credential);
            return Err(BillingError::Closed);
        }
        Ok(context)
    }

    /// State of the context for `credential`.
    #[must_use]
    pub fn context_state(&self, credential: &Credential) -> ContextState {
        if self.lifecycle.is_closed() {
            ContextState::Closed
        } else if self.contexts.contains_key(credential) {
            ContextState::Active
        } else {
            ContextState::Uninitialized
        }
    }

    /// Issues one request under `credential` and decodes the answer as `R`.
    ///
    /// `R` is an [`Entity`] for single resources, a [`ResourceList`] for
    /// lists, or `()` when no body is expected.
    ///
    /// # Errors
    ///
    /// See [`DispatchContext::dispatch`].
    pub async fn dispatch<R: DispatchResponse>(
        &self,
        credential: &Credential,
        method: Method,
        path: &str,
        body: Option<&Payload>,
    ) -> Result<R> {
        self.acquire(credential)?.dispatch(method, path, body).await
    }

    /// `POST`s `payload` to `path`.
    ///
    /// When `R` declares a schema, the payload must carry its required fields;
    /// a payload that does not is rejected with
    /// [`BillingError::InvalidInput`] before any exchange.
    pub async fn create<R: DispatchResponse>(&self, credential: &Credential, path: &str, payload: &Payload) -> Result<R> {
        if let Some(schema) = R::request_schema() {
            schema.check_required(payload)?;
        }
        self.dispatch(credential, Method::Post, path, Some(payload)).await
    }

    /// `PUT`s `payload` to `path`.
    pub async fn update<R: DispatchResponse>(&self, credential: &Credential, path: &str, payload: &Payload) -> Result<R> {
        self.dispatch(credential, Method::Put, path, Some(payload)).await
    }

    /// Reads the single resource at `path`.
    pub async fn fetch<R: DispatchResponse>(&self, credential: &Credential, path: &str) -> Result<R> {
        self.dispatch(credential, Method::Get, path, None).await
    }

    /// Reads the list at `path`. A missing list is empty.
    pub async fn list<E: Entity>(&self, credential: &Credential, path: &str) -> Result<ResourceList<E>> {
        self.dispatch(credential, Method::Get, path, None).await
    }

    /// Deletes the resource at `path`.
    pub async fn delete(&self, credential: &Credential, path: &str) -> Result<()> {
        self.dispatch(credential, Method::Delete, path, None).await
    }

    /// Drops the context for `credential`. The next acquire creates a fresh
    /// one. Returns false if there was none.
    pub fn evict(&self, credential: &Credential) -> bool {
        let evicted = self.contexts.remove(credential).is_some();
        if evicted {
            debug!(%credential, "dispatch context evicted");
        }
        evicted
    }

    /// Closes the registry and releases every context. Idempotent.
    pub fn close(&self) {
        if !self.lifecycle.close() {
            debug!("session registry already closed");
            return;
        }
        let released = self.contexts.len();
        self.contexts.clear();
        info!(released, "session registry closed");
    }

    /// Returns true once [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }

    /// Number of live contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns true if no context has been created since open or the last
    /// close.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Mapper shared by every context.
    #[must_use]
    pub fn mapper(&self) -> ResourceMapper {
        self.mapper
    }

    /// The shared transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

impl<T> fmt::Debug for SessionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("mapper", &self.mapper)
            .field("contexts", &self.contexts.len())
            .field("closed", &self.lifecycle.is_closed())
            .finish_non_exhaustive()
    }
}
