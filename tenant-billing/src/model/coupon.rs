use chrono::{DateTime, Utc};

use super::Account;
use crate::{
    error::Result,
    mapper::{Entity, PayloadWriter, coerce, unknown_field},
    payload::{Payload, Value},
    schema::EntityKind,
};

/// A discount coupon.
///
/// The coupon code is derived from the self-link: setting `href` to
/// `https://…/coupons/SUMMER20` sets `coupon_code` to `SUMMER20`.
///
/// # Examples
///
/// ```
/// use tenant_billing::{mapper::Entity, model::Coupon};
///
/// let mut coupon = Coupon::default();
/// coupon.set("coupon_code", "ORIGINAL").unwrap();
/// coupon.set("discount_percent", "20").unwrap();
/// coupon.set("href", "https://api.example.com/v2/coupons/SUMMER20").unwrap();
///
/// assert_eq!(coupon.coupon_code.as_deref(), Some("SUMMER20"));
/// assert_eq!(coupon.discount_percent, Some(20));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Coupon {
    href: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Unique code customers redeem.
    pub coupon_code: Option<String>,
    /// `percent` or `dollars`.
    pub discount_type: Option<String>,
    /// Percentage discount for `percent` coupons.
    pub discount_percent: Option<i64>,
    /// Number of billing cycles the discount applies to.
    pub applies_for_months: Option<i64>,
}

impl Coupon {
    /// The self-link, if known.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Sets the self-link.
    ///
    /// When the link matches `/coupons/(.+)$` the captured value replaces
    /// `coupon_code` unconditionally, even if a code was set explicitly. A
    /// link that does not match leaves `coupon_code` untouched.
    pub fn set_href(&mut self, href: Option<String>) {
        if let Some(code) = href.as_deref().and_then(|link| Self::schema().derive_identifier(link)) {
            self.coupon_code = Some(code);
        }
        self.href = href;
    }
}

impl Entity for Coupon {
    const KIND: EntityKind = EntityKind::Coupon;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "href" => self.set_href(coerce::text(field, value)?),
            "name" => self.name = coerce::text(field, value)?,
            "coupon_code" => self.coupon_code = coerce::text(field, value)?,
            "discount_type" => self.discount_type = coerce::text(field, value)?,
            "discount_percent" => self.discount_percent = coerce::integer(field, value)?,
            "applies_for_months" => self.applies_for_months = coerce::integer(field, value)?,
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .field("href", self.href.clone())
            .field("name", self.name.clone())
            .field("coupon_code", self.coupon_code.clone())
            .field("discount_type", self.discount_type.clone())
            .field("discount_percent", self.discount_percent)
            .field("applies_for_months", self.applies_for_months)
            .finish()
    }
}

/// A coupon redemption recorded on an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Redemption {
    /// The redeemed coupon, usually only its link.
    pub coupon: Option<Coupon>,
    /// The redeeming account, usually only its link.
    pub account: Option<Account>,
    /// Whether the coupon can be redeemed once per account only.
    pub single_use: Option<bool>,
    /// Total discount granted so far.
    pub total_discounted_in_cents: Option<i64>,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
    /// `active` or `inactive`.
    pub state: Option<String>,
    /// When the coupon was redeemed.
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Redemption {
    const KIND: EntityKind = EntityKind::Redemption;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "coupon" => self.coupon = coerce::nested(field, value)?,
            "account" => self.account = coerce::nested(field, value)?,
            "single_use" => self.single_use = coerce::boolean(field, value)?,
            "total_discounted_in_cents" => {
                self.total_discounted_in_cents = coerce::integer(field, value)?;
            }
            "currency" => self.currency = coerce::text(field, value)?,
            "state" => self.state = coerce::text(field, value)?,
            "created_at" => self.created_at = coerce::datetime(field, value)?,
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .nested("coupon", self.coupon.as_ref())
            .nested("account", self.account.as_ref())
            .field("single_use", self.single_use)
            .field("total_discounted_in_cents", self.total_discounted_in_cents)
            .field("currency", self.currency.clone())
            .field("state", self.state.clone())
            .field("created_at", self.created_at)
            .finish()
    }
}

/// Request and response body for redeeming a coupon on an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CouponRedeem {
    /// Account the coupon is redeemed for.
    pub account_code: Option<String>,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
}

impl CouponRedeem {
    /// Redemption request for an account in a currency.
    #[must_use]
    pub fn new(account_code: impl Into<String>, currency: impl Into<String>) -> Self {
        Self { account_code: Some(account_code.into()), currency: Some(currency.into()) }
    }
}

impl Entity for CouponRedeem {
    const KIND: EntityKind = EntityKind::CouponRedeem;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "account_code" => self.account_code = coerce::text(field, value)?,
            "currency" => self.currency = coerce::text(field, value)?,
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .field("account_code", self.account_code.clone())
            .field("currency", self.currency.clone())
            .finish()
    }
}
