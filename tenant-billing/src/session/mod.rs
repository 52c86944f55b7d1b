//! Credential-scoped session management.
//!
//! A [`SessionRegistry`] maps each [`Credential`] to an immutable
//! [`DispatchContext`]. Because every request runs through the context of its
//! own credential, concurrent requests for different tenants never share
//! mutable state and cannot observe each other's key.
//!
//! # Architecture
//!
//! ```text
//! caller ──credential──> SessionRegistry ──acquire──> DispatchContext
//!                                                        │
//!                              ResourceMapper <──────────┤ encode / decode
//!                              Transport      <──────────┘ send
//! ```
//!
//! Response decoding is selected by the requested type through
//! [`DispatchResponse`]: a single entity, a [`ResourceList`](crate::model::ResourceList),
//! or `()`.

mod context;
mod credential;
mod registry;
mod response;

pub use self::{
    context::{ContextState, DispatchContext},
    credential::Credential,
    registry::SessionRegistry,
    response::DispatchResponse,
};
