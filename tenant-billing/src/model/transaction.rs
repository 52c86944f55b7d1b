use chrono::{DateTime, Utc};

use super::Account;
use crate::{
    error::Result,
    mapper::{Entity, PayloadWriter, coerce, unknown_field},
    payload::{Payload, Value},
    schema::EntityKind,
};

/// A payment transaction.
#[allow(missing_docs, reason = "fields are named after the service's wire fields")]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Transaction {
    href: Option<String>,
    /// Charged account. Required when creating a one-time transaction.
    pub account: Option<Account>,
    pub uuid: Option<String>,
    /// `purchase`, `refund`, or `verify`.
    pub action: Option<String>,
    pub amount_in_cents: Option<i64>,
    pub tax_in_cents: Option<i64>,
    pub currency: Option<String>,
    /// `success`, `failed`, or `void`.
    pub status: Option<String>,
    pub reference: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    /// Whether the transaction ran against the gateway's test mode.
    pub test: Option<bool>,
    pub voidable: Option<bool>,
    pub refundable: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// The self-link, if known.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Sets the self-link. A link matching `/transactions/(.+)$` overwrites
    /// `uuid`; any other link leaves it untouched.
    pub fn set_href(&mut self, href: Option<String>) {
        if let Some(uuid) = href.as_deref().and_then(|link| Self::schema().derive_identifier(link)) {
            self.uuid = Some(uuid);
        }
        self.href = href;
    }
}

impl Entity for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "href" => self.set_href(coerce::text(field, value)?),
            "account" => self.account = coerce::nested(field, value)?,
            "uuid" => self.uuid = coerce::text(field, value)?,
            "action" => self.action = coerce::text(field, value)?,
            "amount_in_cents" => self.amount_in_cents = coerce::integer(field, value)?,
            "tax_in_cents" => self.tax_in_cents = coerce::integer(field, value)?,
            "currency" => self.currency = coerce::text(field, value)?,
            "status" => self.status = coerce::text(field, value)?,
            "reference" => self.reference = coerce::text(field, value)?,
            "source" => self.source = coerce::text(field, value)?,
            "description" => self.description = coerce::text(field, value)?,
            "test" => self.test = coerce::boolean(field, value)?,
            "voidable" => self.voidable = coerce::boolean(field, value)?,
            "refundable" => self.refundable = coerce::boolean(field, value)?,
            "created_at" => self.created_at = coerce::datetime(field, value)?,
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .field("href", self.href.clone())
            .nested("account", self.account.as_ref())
            .field("uuid", self.uuid.clone())
            .field("action", self.action.clone())
            .field("amount_in_cents", self.amount_in_cents)
            .field("tax_in_cents", self.tax_in_cents)
            .field("currency", self.currency.clone())
            .field("status", self.status.clone())
            .field("reference", self.reference.clone())
            .field("source", self.source.clone())
            .field("description", self.description.clone())
            .field("test", self.test)
            .field("voidable", self.voidable)
            .field("refundable", self.refundable)
            .field("created_at", self.created_at)
            .finish()
    }
}
