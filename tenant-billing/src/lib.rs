//! Tenant Billing: a multi-tenant client for a hosted subscription-billing API
//!
//! One client issues requests for any number of tenants, each identified by its
//! own API credential, and maps the service's loosely-shaped payloads onto
//! typed entities.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        BillingClient         │  one method per service operation
//! └──────────────┬───────────────┘
//!                │ credential + path + payload
//! ┌──────────────▼───────────────┐
//! │       SessionRegistry        │  credential → immutable DispatchContext
//! └──────┬───────────────┬───────┘
//!        │               │
//! ┌──────▼─────────┐ ┌───▼─────────┐
//! │ ResourceMapper │ │  Transport  │
//! │  XML / JSON    │ │  reqwest    │
//! └────────────────┘ └─────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tenant_billing::{BillingClient, ClientConfig, Credential};
//!
//! # async fn example() -> tenant_billing::Result<()> {
//! let config = ClientConfig::from_file("tenant-billing.toml")?;
//! let client = BillingClient::from_config(&config)?;
//!
//! let tenant = Credential::new(std::env::var("BILLING_API_KEY").unwrap_or_default())?;
//! let coupon = client.get_coupon("SUMMER20", &tenant).await?;
//! println!("{:?} {:?}", coupon.name, coupon.discount_percent);
//!
//! for plan in client.get_plans(&tenant).await?.iter() {
//!     println!("{:?}", plan.plan_code);
//! }
//!
//! client.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`client`]: typed façade over every service operation
//! - [`session`]: credential-scoped contexts and the registry lifecycle
//! - [`mapper`]: wire codecs, coercion, link-derived identifiers
//! - [`model`]: typed entities and list wrappers
//! - [`schema`]: per-entity field tables
//! - [`payload`]: the generic value model
//! - [`endpoint`]: resource paths with encoded identifiers
//! - [`transport`]: outbound transport abstraction and the HTTP transport
//! - [`config`]: TOML configuration
//! - [`error`]: error types with recovery guidance
//!
//! # Mapping Rules
//!
//! - Unknown fields in responses are ignored.
//! - A declared field that cannot be coerced fails the call with
//!   [`BillingError::Mapping`]; a list with one bad element fails as a whole.
//! - Setting an entity's self-link (`href`) overwrites its identifier whenever
//!   the link matches the entity's pattern.
//!
//! # Error Handling
//!
//! All operations return [`Result<T, BillingError>`](error::Result):
//!
//! ```rust
//! use tenant_billing::{BillingClient, BillingError, Credential, HttpTransport};
//!
//! # async fn example(client: BillingClient<HttpTransport>, tenant: Credential) {
//! match client.get_account("acme", &tenant).await {
//!     Ok(account) => println!("{:?}", account.email),
//!     Err(BillingError::NotFound(path)) => eprintln!("no account at {path}"),
//!     Err(BillingError::Transport { kind, message }) => {
//!         eprintln!("transport failure ({kind}): {message}");
//!     }
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest"
)]

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod mapper;
pub mod model;
pub mod payload;
pub mod schema;
pub mod session;
pub mod transport;

pub use client::BillingClient;
pub use config::ClientConfig;
pub use error::{BillingError, Result};
pub use mapper::{ResourceMapper, WireFormat};
pub use session::{Credential, SessionRegistry};
pub use transport::HttpTransport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = std::marker::PhantomData::<BillingError>;
        let _ = std::marker::PhantomData::<BillingClient>;
        assert_eq!(WireFormat::default(), WireFormat::Xml);
    }
}
