use chrono::{DateTime, Utc};

use super::CurrencyAmounts;
use crate::{
    error::Result,
    mapper::{Entity, PayloadWriter, coerce, unknown_field},
    payload::{Payload, Value},
    schema::EntityKind,
};

/// A subscription plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Plan {
    href: Option<String>,
    /// Unique plan code.
    pub plan_code: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Accounting code for exports.
    pub accounting_code: Option<String>,
    /// `days` or `months`.
    pub plan_interval_unit: Option<String>,
    /// Billing interval length in `plan_interval_unit`s.
    pub plan_interval_length: Option<i64>,
    /// `days` or `months`.
    pub trial_interval_unit: Option<String>,
    /// Trial length in `trial_interval_unit`s.
    pub trial_interval_length: Option<i64>,
    /// Whether hosted pages show a quantity field.
    pub display_quantity: Option<bool>,
    /// One-time setup fee per currency.
    pub setup_fee_in_cents: Option<CurrencyAmounts>,
    /// Recurring price per currency.
    pub unit_amount_in_cents: Option<CurrencyAmounts>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
}

impl Plan {
    /// The self-link, if known.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Sets the self-link. A link matching `/plans/(.+)$` overwrites
    /// `plan_code`; any other link leaves it untouched.
    pub fn set_href(&mut self, href: Option<String>) {
        if let Some(code) = href.as_deref().and_then(|link| Self::schema().derive_identifier(link)) {
            self.plan_code = Some(code);
        }
        self.href = href;
    }
}

impl Entity for Plan {
    const KIND: EntityKind = EntityKind::Plan;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "href" => self.set_href(coerce::text(field, value)?),
            "plan_code" => self.plan_code = coerce::text(field, value)?,
            "name" => self.name = coerce::text(field, value)?,
            "description" => self.description = coerce::text(field, value)?,
            "accounting_code" => self.accounting_code = coerce::text(field, value)?,
            "plan_interval_unit" => self.plan_interval_unit = coerce::text(field, value)?,
            "plan_interval_length" => self.plan_interval_length = coerce::integer(field, value)?,
            "trial_interval_unit" => self.trial_interval_unit = coerce::text(field, value)?,
            "trial_interval_length" => self.trial_interval_length = coerce::integer(field, value)?,
            "display_quantity" => self.display_quantity = coerce::boolean(field, value)?,
            "setup_fee_in_cents" => self.setup_fee_in_cents = coerce::amounts(field, value)?,
            "unit_amount_in_cents" => self.unit_amount_in_cents = coerce::amounts(field, value)?,
            "created_at" => self.created_at = coerce::datetime(field, value)?,
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .field("href", self.href.clone())
            .field("plan_code", self.plan_code.clone())
            .field("name", self.name.clone())
            .field("description", self.description.clone())
            .field("accounting_code", self.accounting_code.clone())
            .field("plan_interval_unit", self.plan_interval_unit.clone())
            .field("plan_interval_length", self.plan_interval_length)
            .field("trial_interval_unit", self.trial_interval_unit.clone())
            .field("trial_interval_length", self.trial_interval_length)
            .field("display_quantity", self.display_quantity)
            .field("setup_fee_in_cents", self.setup_fee_in_cents.as_ref())
            .field("unit_amount_in_cents", self.unit_amount_in_cents.as_ref())
            .field("created_at", self.created_at)
            .finish()
    }
}

/// An add-on defined on a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AddOn {
    href: Option<String>,
    /// Add-on code, unique within its plan.
    pub add_on_code: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Quantity preselected on hosted pages.
    pub default_quantity: Option<i64>,
    /// Whether hosted pages show a quantity field.
    pub display_quantity_on_hosted_page: Option<bool>,
    /// Price per unit per currency.
    pub unit_amount_in_cents: Option<CurrencyAmounts>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
}

impl AddOn {
    /// The self-link, if known.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Sets the self-link. A link matching `/add_ons/(.+)$` overwrites
    /// `add_on_code`; any other link leaves it untouched.
    pub fn set_href(&mut self, href: Option<String>) {
        if let Some(code) = href.as_deref().and_then(|link| Self::schema().derive_identifier(link)) {
            self.add_on_code = Some(code);
        }
        self.href = href;
    }
}

impl Entity for AddOn {
    const KIND: EntityKind = EntityKind::AddOn;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "href" => self.set_href(coerce::text(field, value)?),
            "add_on_code" => self.add_on_code = coerce::text(field, value)?,
            "name" => self.name = coerce::text(field, value)?,
            "default_quantity" => self.default_quantity = coerce::integer(field, value)?,
            "display_quantity_on_hosted_page" => {
                self.display_quantity_on_hosted_page = coerce::boolean(field, value)?;
            }
            "unit_amount_in_cents" => self.unit_amount_in_cents = coerce::amounts(field, value)?,
            "created_at" => self.created_at = coerce::datetime(field, value)?,
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .field("href", self.href.clone())
            .field("add_on_code", self.add_on_code.clone())
            .field("name", self.name.clone())
            .field("default_quantity", self.default_quantity)
            .field("display_quantity_on_hosted_page", self.display_quantity_on_hosted_page)
            .field("unit_amount_in_cents", self.unit_amount_in_cents.as_ref())
            .field("created_at", self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_link_extraction() {
        let mut plan = Plan::default();
        plan.set_href(Some("https://api.example.com/v2/plans/gold".to_owned()));
        assert_eq!(plan.plan_code.as_deref(), Some("gold"));
    }

    #[test]
    fn test_add_on_link_is_not_a_plan_link() {
        let mut add_on = AddOn::default();
        add_on.set_href(Some("https://api.example.com/v2/plans/gold".to_owned()));
        assert_eq!(add_on.add_on_code, None);

        add_on.set_href(Some("https://api.example.com/v2/plans/gold/add_ons/ipaddresses".to_owned()));
        assert_eq!(add_on.add_on_code.as_deref(), Some("ipaddresses"));
    }

    #[test]
    fn test_plan_prices_per_currency() {
        let payload = Payload::new()
            .with("plan_code", "gold")
            .with("unit_amount_in_cents", Payload::new().with("USD", "1000").with("EUR", "800"))
            .with("setup_fee_in_cents", Value::Null);
        let plan = Plan::from_payload(&payload).unwrap();
        let prices = plan.unit_amount_in_cents.unwrap();
        assert_eq!(prices.get("USD"), Some(1000));
        assert_eq!(prices.len(), 2);
        assert_eq!(plan.setup_fee_in_cents, None);
    }

    #[test]
    fn test_plan_payload_round_trip() {
        let mut plan = Plan::default();
        plan.set_href(Some("https://api.example.com/v2/plans/gold".to_owned()));
        plan.name = Some("Gold".to_owned());
        plan.plan_interval_length = Some(1);
        plan.display_quantity = Some(false);
        plan.unit_amount_in_cents = Some([("USD", 1000)].into_iter().collect());
        assert_eq!(Plan::from_payload(&plan.to_payload()).unwrap(), plan);
    }
}
