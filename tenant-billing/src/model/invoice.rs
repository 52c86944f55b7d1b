use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Account, Transaction, UnorderedList};
use crate::{
    error::Result,
    mapper::{Entity, PayloadWriter, coerce, unknown_field},
    payload::{Payload, Value},
    schema::EntityKind,
};

/// An invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Invoice {
    href: Option<String>,
    /// Invoiced account, usually only its link.
    pub account: Option<Account>,
    /// Unique invoice id.
    pub uuid: Option<String>,
    /// `open`, `collected`, `failed`, or `past_due`.
    pub state: Option<String>,
    /// Sequential invoice number.
    pub invoice_number: Option<i64>,
    /// Purchase order number.
    pub po_number: Option<String>,
    /// VAT registration number.
    pub vat_number: Option<String>,
    /// Total before tax.
    pub subtotal_in_cents: Option<i64>,
    /// Tax amount.
    pub tax_in_cents: Option<i64>,
    /// Total including tax.
    pub total_in_cents: Option<i64>,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Payments against this invoice.
    pub transactions: UnorderedList<Transaction>,
}

impl Invoice {
    /// The self-link, if known.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Sets the self-link. A link matching `/invoices/(\d+)$` overwrites
    /// `invoice_number`; any other link leaves it untouched.
    pub fn set_href(&mut self, href: Option<String>) {
        let derived = href.as_deref().and_then(|link| Self::schema().derive_identifier(link));
        if let Some(number) = derived {
            match number.parse() {
                Ok(number) => self.invoice_number = Some(number),
                Err(err) => debug!(%number, %err, "invoice number in link out of range"),
            }
        }
        self.href = href;
    }
}

impl Entity for Invoice {
    const KIND: EntityKind = EntityKind::Invoice;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "href" => self.set_href(coerce::text(field, value)?),
            "account" => self.account = coerce::nested(field, value)?,
            "uuid" => self.uuid = coerce::text(field, value)?,
            "state" => self.state = coerce::text(field, value)?,
            "invoice_number" => self.invoice_number = coerce::integer(field, value)?,
            "po_number" => self.po_number = coerce::text(field, value)?,
            "vat_number" => self.vat_number = coerce::text(field, value)?,
            "subtotal_in_cents" => self.subtotal_in_cents = coerce::integer(field, value)?,
            "tax_in_cents" => self.tax_in_cents = coerce::integer(field, value)?,
            "total_in_cents" => self.total_in_cents = coerce::integer(field, value)?,
            "currency" => self.currency = coerce::text(field, value)?,
            "created_at" => self.created_at = coerce::datetime(field, value)?,
            "transactions" => self.transactions = coerce::sequence::<Transaction>(field, value)?.into(),
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .field("href", self.href.clone())
            .nested("account", self.account.as_ref())
            .field("uuid", self.uuid.clone())
            .field("state", self.state.clone())
            .field("invoice_number", self.invoice_number)
            .field("po_number", self.po_number.clone())
            .field("vat_number", self.vat_number.clone())
            .field("subtotal_in_cents", self.subtotal_in_cents)
            .field("tax_in_cents", self.tax_in_cents)
            .field("total_in_cents", self.total_in_cents)
            .field("currency", self.currency.clone())
            .field("created_at", self.created_at)
            .sequence("transactions", &self.transactions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_from_link() {
        let mut invoice = Invoice::default();
        invoice.set_href(Some("https://api.example.com/v2/invoices/1005".to_owned()));
        assert_eq!(invoice.invoice_number, Some(1005));
    }

    #[test]
    fn test_non_numeric_link_leaves_number() {
        let mut invoice = Invoice { invoice_number: Some(7), ..Invoice::default() };
        invoice.set_href(Some("https://api.example.com/v2/invoices/draft".to_owned()));
        assert_eq!(invoice.invoice_number, Some(7));

        invoice.set_href(Some("https://api.example.com/v2/invoices/99999999999999999999999".to_owned()));
        assert_eq!(invoice.invoice_number, Some(7));
    }

    #[test]
    fn test_transactions_collection() {
        let transaction = Payload::new().with("uuid", "t1").with("amount_in_cents", 500);
        let payload = Payload::new()
            .with("invoice_number", "1005")
            .with("transactions", Payload::new().with("transaction", transaction));
        let invoice = Invoice::from_payload(&payload).unwrap();
        assert_eq!(invoice.transactions.len(), 1);
        assert_eq!(invoice.transactions[0].amount_in_cents, Some(500));
    }
}
