//! Typed billing entities.
//!
//! Every entity implements [`Entity`](crate::mapper::Entity) and derives
//! structural equality and hashing: two entities are equal when every field
//! is equal, with unset fields (`None`) equal only to each other. Collection
//! fields use [`UnorderedList`], whose equality ignores element order.
//!
//! Entities that carry a self-link keep it private behind `href()` and
//! `set_href()`, because setting the link may rewrite the identifier.

mod account;
mod amounts;
mod billing_info;
mod coupon;
mod invoice;
mod list;
mod plan;
mod subscription;
mod transaction;

pub use self::{
    account::Account,
    amounts::CurrencyAmounts,
    billing_info::BillingInfo,
    coupon::{Coupon, CouponRedeem, Redemption},
    invoice::Invoice,
    list::{Accounts, AddOns, Invoices, Plans, ResourceList, Subscriptions, Transactions, UnorderedList},
    plan::{AddOn, Plan},
    subscription::{Subscription, SubscriptionAddOn},
    transaction::Transaction,
};
