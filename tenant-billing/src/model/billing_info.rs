use super::Account;
use crate::{
    error::Result,
    mapper::{Entity, PayloadWriter, coerce, unknown_field},
    payload::{Payload, Value},
    schema::EntityKind,
};

/// Stored payment details of an account.
///
/// Card number and verification value are write-only on the service side;
/// responses carry `first_six`, `last_four`, and `card_type` instead.
#[allow(missing_docs, reason = "fields are named after the service's wire fields")]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BillingInfo {
    /// Owning account, usually only its link.
    pub account: Option<Box<Account>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub vat_number: Option<String>,
    pub ip_address: Option<String>,
    pub card_type: Option<String>,
    /// Wire name `year`.
    pub expiration_year: Option<i64>,
    /// Wire name `month`.
    pub expiration_month: Option<i64>,
    pub first_six: Option<String>,
    pub last_four: Option<String>,
    /// Wire name `number`.
    pub card_number: Option<String>,
    /// Wire name `verification_value`.
    pub card_verification_value: Option<String>,
}

impl Entity for BillingInfo {
    const KIND: EntityKind = EntityKind::BillingInfo;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "account" => self.account = coerce::nested::<Account>(field, value)?.map(Box::new),
            "first_name" => self.first_name = coerce::text(field, value)?,
            "last_name" => self.last_name = coerce::text(field, value)?,
            "company" => self.company = coerce::text(field, value)?,
            "address1" => self.address1 = coerce::text(field, value)?,
            "address2" => self.address2 = coerce::text(field, value)?,
            "city" => self.city = coerce::text(field, value)?,
            "state" => self.state = coerce::text(field, value)?,
            "zip" => self.zip = coerce::text(field, value)?,
            "country" => self.country = coerce::text(field, value)?,
            "phone" => self.phone = coerce::text(field, value)?,
            "vat_number" => self.vat_number = coerce::text(field, value)?,
            "ip_address" => self.ip_address = coerce::text(field, value)?,
            "card_type" => self.card_type = coerce::text(field, value)?,
            "expiration_year" => self.expiration_year = coerce::integer(field, value)?,
            "expiration_month" => self.expiration_month = coerce::integer(field, value)?,
            "first_six" => self.first_six = coerce::text(field, value)?,
            "last_four" => self.last_four = coerce::text(field, value)?,
            "card_number" => self.card_number = coerce::text(field, value)?,
            "card_verification_value" => self.card_verification_value = coerce::text(field, value)?,
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .nested("account", self.account.as_deref())
            .field("first_name", self.first_name.clone())
            .field("last_name", self.last_name.clone())
            .field("company", self.company.clone())
            .field("address1", self.address1.clone())
            .field("address2", self.address2.clone())
            .field("city", self.city.clone())
            .field("state", self.state.clone())
            .field("zip", self.zip.clone())
            .field("country", self.country.clone())
            .field("phone", self.phone.clone())
            .field("vat_number", self.vat_number.clone())
            .field("ip_address", self.ip_address.clone())
            .field("card_type", self.card_type.clone())
            .field("expiration_year", self.expiration_year)
            .field("expiration_month", self.expiration_month)
            .field("first_six", self.first_six.clone())
            .field("last_four", self.last_four.clone())
            .field("card_number", self.card_number.clone())
            .field("card_verification_value", self.card_verification_value.clone())
            .finish()
    }
}
