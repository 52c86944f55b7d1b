//! Explicit per-entity schema tables.
//!
//! Each entity type has one [`EntitySchema`]: the XML root element, the list
//! element, the ordered field table (Rust field name, wire name, kind,
//! required flag), and an optional self-link rule used to derive an
//! identifier from the entity's `href`. The tables are built once on first use
//! and are read-only afterwards.
//!
//! Field order in the table is the order fields are written to the wire.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::{BillingError, Result},
    mapper::link::extract_identifier_from_link,
    payload::Payload,
};

/// Every entity kind known to the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Customer account.
    Account,
    /// Stored payment details of an account.
    BillingInfo,
    /// Subscription of an account to a plan.
    Subscription,
    /// Add-on attached to a subscription.
    SubscriptionAddOn,
    /// Subscription plan.
    Plan,
    /// Add-on defined on a plan.
    AddOn,
    /// Discount coupon.
    Coupon,
    /// Coupon redemption recorded on an account.
    Redemption,
    /// Request to redeem a coupon for an account.
    CouponRedeem,
    /// Invoice.
    Invoice,
    /// Payment transaction.
    Transaction,
}

impl EntityKind {
    /// All kinds, in catalog order.
    pub const ALL: [Self; 11] = [
        Self::Account,
        Self::BillingInfo,
        Self::Subscription,
        Self::SubscriptionAddOn,
        Self::Plan,
        Self::AddOn,
        Self::Coupon,
        Self::Redemption,
        Self::CouponRedeem,
        Self::Invoice,
        Self::Transaction,
    ];
}

/// Scalar type a field normalizes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Free text.
    Text,
    /// Signed integer.
    Integer,
    /// Boolean flag.
    Boolean,
    /// RFC 3339 timestamp.
    DateTime,
}

/// Structural kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A scalar of the given type.
    Scalar(ScalarKind),
    /// The entity's self-link. Written as an XML attribute.
    Link,
    /// Map of currency code to amount in cents.
    Amounts,
    /// A single nested entity.
    Nested(EntityKind),
    /// A collection of nested entities.
    Sequence(EntityKind),
}

/// One row of an entity's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Rust-side field name.
    pub name: &'static str,
    /// Field name on the wire.
    pub wire: &'static str,
    /// Structural kind.
    pub kind: FieldKind,
    /// Whether a create request must carry a non-null value.
    pub required: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, wire: &'static str, kind: FieldKind) -> Self {
        Self { name, wire, kind, required: false }
    }

    const fn required(self) -> Self {
        Self { required: true, ..self }
    }
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, name, FieldKind::Scalar(ScalarKind::Text))
}

const fn integer(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, name, FieldKind::Scalar(ScalarKind::Integer))
}

const fn boolean(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, name, FieldKind::Scalar(ScalarKind::Boolean))
}

const fn datetime(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, name, FieldKind::Scalar(ScalarKind::DateTime))
}

const fn amounts(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, name, FieldKind::Amounts)
}

const fn nested(name: &'static str, kind: EntityKind) -> FieldSpec {
    FieldSpec::new(name, name, FieldKind::Nested(kind))
}

const fn sequence(name: &'static str, kind: EntityKind) -> FieldSpec {
    FieldSpec::new(name, name, FieldKind::Sequence(kind))
}

const HREF: FieldSpec = FieldSpec::new("href", "href", FieldKind::Link);

/// Derives an identifier field from the self-link.
#[derive(Debug)]
pub struct LinkRule {
    /// Rust-side name of the field the captured value is written to.
    pub target: &'static str,
    pattern: Regex,
}

impl LinkRule {
    /// The capture pattern applied to the self-link.
    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Applies the pattern to `link`, returning the captured identifier.
    #[must_use]
    pub fn derive(&self, link: &str) -> Option<String> {
        extract_identifier_from_link(link, &self.pattern)
    }
}

/// Schema of one entity type.
#[derive(Debug)]
pub struct EntitySchema {
    /// Entity kind.
    pub kind: EntityKind,
    /// XML root element of a single entity.
    pub root: &'static str,
    /// XML root element of a list of entities.
    pub collection: &'static str,
    fields: &'static [FieldSpec],
    link: Option<LinkRule>,
}

impl EntitySchema {
    /// Field table in wire order.
    #[must_use]
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Looks up a field by its Rust-side name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Looks up a field by its wire name.
    #[must_use]
    pub fn field_by_wire(&self, wire: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.wire == wire)
    }

    /// The self-link rule, if this entity derives an identifier from `href`.
    #[must_use]
    pub fn link_rule(&self) -> Option<&LinkRule> {
        self.link.as_ref()
    }

    /// Applies the link rule to `link`. `None` when the entity has no rule or
    /// the pattern does not match.
    #[must_use]
    pub fn derive_identifier(&self, link: &str) -> Option<String> {
        self.link.as_ref()?.derive(link)
    }

    /// Checks that a create request carries every required field.
    ///
    /// A required field that is the target of the link rule is satisfied by a
    /// self-link the rule can extract from. Decoding never calls this: the
    /// service may answer with entities that lack any field.
    pub fn check_required(&self, payload: &Payload) -> Result<()> {
        for spec in self.fields.iter().filter(|spec| spec.required) {
            if !payload.get(spec.wire).is_empty() || self.derivable(spec, payload) {
                continue;
            }
            return Err(BillingError::InvalidInput(format!(
                "required field '{}' missing from {}",
                spec.wire, self.root
            )));
        }
        Ok(())
    }

    fn derivable(&self, spec: &FieldSpec, payload: &Payload) -> bool {
        let Some(rule) = self.link.as_ref().filter(|rule| rule.target == spec.name) else {
            return false;
        };
        payload.get(HREF.wire).as_text().and_then(|link| rule.derive(link)).is_some()
    }
}

const ACCOUNT_FIELDS: &[FieldSpec] = &[
    HREF,
    text("account_code").required(),
    text("state"),
    text("username"),
    text("email"),
    text("first_name"),
    text("last_name"),
    text("company_name"),
    text("accept_language"),
    text("hosted_login_token"),
    datetime("created_at"),
    nested("billing_info", EntityKind::BillingInfo),
];

const BILLING_INFO_FIELDS: &[FieldSpec] = &[
    nested("account", EntityKind::Account),
    text("first_name"),
    text("last_name"),
    text("company"),
    text("address1"),
    text("address2"),
    text("city"),
    text("state"),
    text("zip"),
    text("country"),
    text("phone"),
    text("vat_number"),
    text("ip_address"),
    text("card_type"),
    FieldSpec::new("expiration_year", "year", FieldKind::Scalar(ScalarKind::Integer)),
    FieldSpec::new("expiration_month", "month", FieldKind::Scalar(ScalarKind::Integer)),
    text("first_six"),
    text("last_four"),
    FieldSpec::new("card_number", "number", FieldKind::Scalar(ScalarKind::Text)),
    FieldSpec::new(
        "card_verification_value",
        "verification_value",
        FieldKind::Scalar(ScalarKind::Text),
    ),
];

const SUBSCRIPTION_FIELDS: &[FieldSpec] = &[
    HREF,
    nested("account", EntityKind::Account),
    nested("plan", EntityKind::Plan),
    text("plan_code"),
    text("uuid"),
    text("state"),
    integer("unit_amount_in_cents"),
    text("currency"),
    integer("quantity"),
    text("coupon_code"),
    text("timeframe"),
    datetime("activated_at"),
    datetime("canceled_at"),
    datetime("expires_at"),
    datetime("current_period_started_at"),
    datetime("current_period_ends_at"),
    datetime("trial_ends_at"),
    FieldSpec::new(
        "add_ons",
        "subscription_add_ons",
        FieldKind::Sequence(EntityKind::SubscriptionAddOn),
    ),
];

const SUBSCRIPTION_ADD_ON_FIELDS: &[FieldSpec] = &[
    text("add_on_code").required(),
    integer("unit_amount_in_cents"),
    integer("quantity"),
];

const PLAN_FIELDS: &[FieldSpec] = &[
    HREF,
    text("plan_code").required(),
    text("name"),
    text("description"),
    text("accounting_code"),
    text("plan_interval_unit"),
    integer("plan_interval_length"),
    text("trial_interval_unit"),
    integer("trial_interval_length"),
    boolean("display_quantity"),
    amounts("setup_fee_in_cents"),
    amounts("unit_amount_in_cents"),
    datetime("created_at"),
];

const ADD_ON_FIELDS: &[FieldSpec] = &[
    HREF,
    text("add_on_code").required(),
    text("name"),
    integer("default_quantity"),
    boolean("display_quantity_on_hosted_page"),
    amounts("unit_amount_in_cents"),
    datetime("created_at"),
];

const COUPON_FIELDS: &[FieldSpec] = &[
    HREF,
    text("name"),
    text("coupon_code").required(),
    text("discount_type"),
    integer("discount_percent"),
    integer("applies_for_months"),
];

const REDEMPTION_FIELDS: &[FieldSpec] = &[
    nested("coupon", EntityKind::Coupon),
    nested("account", EntityKind::Account),
    boolean("single_use"),
    integer("total_discounted_in_cents"),
    text("currency"),
    text("state"),
    datetime("created_at"),
];

const COUPON_REDEEM_FIELDS: &[FieldSpec] = &[text("account_code"), text("currency")];

const INVOICE_FIELDS: &[FieldSpec] = &[
    HREF,
    nested("account", EntityKind::Account),
    text("uuid"),
    text("state"),
    integer("invoice_number"),
    text("po_number"),
    text("vat_number"),
    integer("subtotal_in_cents"),
    integer("tax_in_cents"),
    integer("total_in_cents"),
    text("currency"),
    datetime("created_at"),
    sequence("transactions", EntityKind::Transaction),
];

const TRANSACTION_FIELDS: &[FieldSpec] = &[
    HREF,
    nested("account", EntityKind::Account),
    text("uuid"),
    text("action"),
    integer("amount_in_cents"),
    integer("tax_in_cents"),
    text("currency"),
    text("status"),
    text("reference"),
    text("source"),
    text("description"),
    boolean("test"),
    boolean("voidable"),
    boolean("refundable"),
    datetime("created_at"),
];

#[allow(
    clippy::expect_used,
    reason = "link patterns are compile-time constants covered by tests"
)]
fn link(target: &'static str, pattern: &str) -> Option<LinkRule> {
    let pattern = Regex::new(pattern).expect("link pattern must be a valid regex");
    Some(LinkRule { target, pattern })
}

/// Process-wide schema catalog, indexed by [`EntityKind`] discriminant.
static CATALOG: LazyLock<Vec<EntitySchema>> = LazyLock::new(|| {
    EntityKind::ALL
        .into_iter()
        .map(|kind| {
            let (root, collection, fields, rule) = match kind {
                EntityKind::Account => (
                    "account",
                    "accounts",
                    ACCOUNT_FIELDS,
                    link("account_code", "/accounts/(.+)$"),
                ),
                EntityKind::BillingInfo => {
                    ("billing_info", "billing_infos", BILLING_INFO_FIELDS, None)
                }
                EntityKind::Subscription => (
                    "subscription",
                    "subscriptions",
                    SUBSCRIPTION_FIELDS,
                    link("uuid", "/subscriptions/(.+)$"),
                ),
                EntityKind::SubscriptionAddOn => (
                    "subscription_add_on",
                    "subscription_add_ons",
                    SUBSCRIPTION_ADD_ON_FIELDS,
                    None,
                ),
                EntityKind::Plan => {
                    ("plan", "plans", PLAN_FIELDS, link("plan_code", "/plans/(.+)$"))
                }
                EntityKind::AddOn => {
                    ("add_on", "add_ons", ADD_ON_FIELDS, link("add_on_code", "/add_ons/(.+)$"))
                }
                EntityKind::Coupon => {
                    ("coupon", "coupons", COUPON_FIELDS, link("coupon_code", "/coupons/(.+)$"))
                }
                EntityKind::Redemption => ("redemption", "redemptions", REDEMPTION_FIELDS, None),
                EntityKind::CouponRedeem => {
                    ("redemption", "redemptions", COUPON_REDEEM_FIELDS, None)
                }
                EntityKind::Invoice => (
                    "invoice",
                    "invoices",
                    INVOICE_FIELDS,
                    link("invoice_number", r"/invoices/(\d+)$"),
                ),
                EntityKind::Transaction => (
                    "transaction",
                    "transactions",
                    TRANSACTION_FIELDS,
                    link("uuid", "/transactions/(.+)$"),
                ),
            };
            EntitySchema { kind, root, collection, fields, link: rule }
        })
        .collect()
});

/// Returns the schema of an entity kind.
#[must_use]
pub fn of(kind: EntityKind) -> &'static EntitySchema {
    &CATALOG[kind as usize]
}
