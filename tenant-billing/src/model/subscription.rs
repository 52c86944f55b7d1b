use chrono::{DateTime, Utc};

use super::{Account, Plan, UnorderedList};
use crate::{
    error::Result,
    mapper::{Entity, PayloadWriter, coerce, unknown_field},
    payload::{Payload, Value},
    schema::EntityKind,
};

/// A subscription of an account to a plan.
///
/// Equality ignores the order of `add_ons`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Subscription {
    href: Option<String>,
    /// Subscribed account, usually only its link.
    pub account: Option<Account>,
    /// Subscribed plan as returned by the service.
    pub plan: Option<Plan>,
    /// Plan code, used when creating or changing a subscription.
    pub plan_code: Option<String>,
    /// Unique subscription id.
    pub uuid: Option<String>,
    /// `active`, `canceled`, `expired`, `future`, ...
    pub state: Option<String>,
    /// Price override per unit.
    pub unit_amount_in_cents: Option<i64>,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
    /// Number of plan units.
    pub quantity: Option<i64>,
    /// Coupon to redeem on creation.
    pub coupon_code: Option<String>,
    /// `now` or `renewal`, for updates.
    pub timeframe: Option<String>,
    /// Activation time.
    pub activated_at: Option<DateTime<Utc>>,
    /// Cancellation time.
    pub canceled_at: Option<DateTime<Utc>>,
    /// Expiration time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Start of the current billing period.
    pub current_period_started_at: Option<DateTime<Utc>>,
    /// End of the current billing period.
    pub current_period_ends_at: Option<DateTime<Utc>>,
    /// End of the trial.
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Add-ons on this subscription. Wire name `subscription_add_ons`.
    pub add_ons: UnorderedList<SubscriptionAddOn>,
}

impl Subscription {
    /// The self-link, if known.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Sets the self-link. A link matching `/subscriptions/(.+)$` overwrites
    /// `uuid`; any other link leaves it untouched.
    pub fn set_href(&mut self, href: Option<String>) {
        if let Some(uuid) = href.as_deref().and_then(|link| Self::schema().derive_identifier(link)) {
            self.uuid = Some(uuid);
        }
        self.href = href;
    }
}

impl Entity for Subscription {
    const KIND: EntityKind = EntityKind::Subscription;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "href" => self.set_href(coerce::text(field, value)?),
            "account" => self.account = coerce::nested(field, value)?,
            "plan" => self.plan = coerce::nested(field, value)?,
            "plan_code" => self.plan_code = coerce::text(field, value)?,
            "uuid" => self.uuid = coerce::text(field, value)?,
            "state" => self.state = coerce::text(field, value)?,
            "unit_amount_in_cents" => self.unit_amount_in_cents = coerce::integer(field, value)?,
            "currency" => self.currency = coerce::text(field, value)?,
            "quantity" => self.quantity = coerce::integer(field, value)?,
            "coupon_code" => self.coupon_code = coerce::text(field, value)?,
            "timeframe" => self.timeframe = coerce::text(field, value)?,
            "activated_at" => self.activated_at = coerce::datetime(field, value)?,
            "canceled_at" => self.canceled_at = coerce::datetime(field, value)?,
            "expires_at" => self.expires_at = coerce::datetime(field, value)?,
            "current_period_started_at" => {
                self.current_period_started_at = coerce::datetime(field, value)?;
            }
            "current_period_ends_at" => self.current_period_ends_at = coerce::datetime(field, value)?,
            "trial_ends_at" => self.trial_ends_at = coerce::datetime(field, value)?,
            "add_ons" => self.add_ons = coerce::sequence::<SubscriptionAddOn>(field, value)?.into(),
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .field("href", self.href.clone())
            .nested("account", self.account.as_ref())
            .nested("plan", self.plan.as_ref())
            .field("plan_code", self.plan_code.clone())
            .field("uuid", self.uuid.clone())
            .field("state", self.state.clone())
            .field("unit_amount_in_cents", self.unit_amount_in_cents)
            .field("currency", self.currency.clone())
            .field("quantity", self.quantity)
            .field("coupon_code", self.coupon_code.clone())
            .field("timeframe", self.timeframe.clone())
            .field("activated_at", self.activated_at)
            .field("canceled_at", self.canceled_at)
            .field("expires_at", self.expires_at)
            .field("current_period_started_at", self.current_period_started_at)
            .field("current_period_ends_at", self.current_period_ends_at)
            .field("trial_ends_at", self.trial_ends_at)
            .sequence("add_ons", &self.add_ons)
            .finish()
    }
}

/// An add-on attached to a subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SubscriptionAddOn {
    /// Code of the plan add-on.
    pub add_on_code: Option<String>,
    /// Price override per unit.
    pub unit_amount_in_cents: Option<i64>,
    /// Number of units.
    pub quantity: Option<i64>,
}

impl SubscriptionAddOn {
    /// Add-on with a code and quantity.
    #[must_use]
    pub fn new(add_on_code: impl Into<String>, quantity: i64) -> Self {
        Self { add_on_code: Some(add_on_code.into()), quantity: Some(quantity), ..Self::default() }
    }
}

impl Entity for SubscriptionAddOn {
    const KIND: EntityKind = EntityKind::SubscriptionAddOn;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "add_on_code" => self.add_on_code = coerce::text(field, value)?,
            "unit_amount_in_cents" => self.unit_amount_in_cents = coerce::integer(field, value)?,
            "quantity" => self.quantity = coerce::integer(field, value)?,
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .field("add_on_code", self.add_on_code.clone())
            .field("unit_amount_in_cents", self.unit_amount_in_cents)
            .field("quantity", self.quantity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_add_ons(codes: &[&str]) -> Subscription {
        let mut subscription = Subscription::default();
        subscription.set_href(Some("https://api.example.com/v2/subscriptions/44f83d7cba354d5b84812419f923ea96".to_owned()));
        subscription.add_ons = codes.iter().map(|code| SubscriptionAddOn::new(*code, 1)).collect();
        subscription
    }

    #[test]
    fn test_uuid_from_link() {
        let subscription = with_add_ons(&[]);
        assert_eq!(subscription.uuid.as_deref(), Some("44f83d7cba354d5b84812419f923ea96"));
    }

    #[test]
    fn test_add_on_order_is_ignored() {
        assert_eq!(with_add_ons(&["ip", "seats"]), with_add_ons(&["seats", "ip"]));
        assert_ne!(with_add_ons(&["ip", "seats"]), with_add_ons(&["ip"]));
    }

    #[test]
    fn test_nested_plan_and_account_links() {
        let payload = Payload::new()
            .with("account", Payload::new().with("href", "https://api.example.com/v2/accounts/acme"))
            .with(
                "plan",
                Payload::new().with("href", "https://api.example.com/v2/plans/gold").with("name", "Gold"),
            )
            .with("state", "active");
        let subscription = Subscription::from_payload(&payload).unwrap();
        assert_eq!(subscription.account.unwrap().account_code.as_deref(), Some("acme"));
        let plan = subscription.plan.unwrap();
        assert_eq!(plan.plan_code.as_deref(), Some("gold"));
        assert_eq!(plan.name.as_deref(), Some("Gold"));
    }

    #[test]
    fn test_add_ons_from_container() {
        let add_on = Payload::new().with("add_on_code", "ip").with("quantity", "2");
        let payload = Payload::new()
            .with("uuid", "abc")
            .with("subscription_add_ons", Payload::new().with("subscription_add_on", add_on));
        let subscription = Subscription::from_payload(&payload).unwrap();
        assert_eq!(subscription.add_ons.len(), 1);
        assert_eq!(subscription.add_ons[0].quantity, Some(2));
    }

    #[test]
    fn test_payload_round_trip() {
        let subscription = with_add_ons(&["ip", "seats"]);
        assert_eq!(Subscription::from_payload(&subscription.to_payload()).unwrap(), subscription);
    }
}
