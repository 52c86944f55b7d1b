use chrono::{DateTime, Utc};

use super::BillingInfo;
use crate::{
    error::Result,
    mapper::{Entity, PayloadWriter, coerce, unknown_field},
    payload::{Payload, Value},
    schema::EntityKind,
};

/// A customer account.
#[allow(missing_docs, reason = "fields are named after the service's wire fields")]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Account {
    href: Option<String>,
    /// Unique account code chosen by the merchant.
    pub account_code: Option<String>,
    /// `active` or `closed`.
    pub state: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub accept_language: Option<String>,
    /// Token for the hosted account management page.
    pub hosted_login_token: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Billing info, when sent inline on account creation.
    pub billing_info: Option<BillingInfo>,
}

impl Account {
    /// Account with only its code set, as used for nested account references.
    #[must_use]
    pub fn with_code(account_code: impl Into<String>) -> Self {
        Self { account_code: Some(account_code.into()), ..Self::default() }
    }

    /// The self-link, if known.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Sets the self-link. A link matching `/accounts/(.+)$` overwrites
    /// `account_code`; any other link leaves it untouched.
    pub fn set_href(&mut self, href: Option<String>) {
        if let Some(code) = href.as_deref().and_then(|link| Self::schema().derive_identifier(link)) {
            self.account_code = Some(code);
        }
        self.href = href;
    }
}

impl Entity for Account {
    const KIND: EntityKind = EntityKind::Account;

    fn apply(&mut self, field: &str, value: &Value) -> Result<()> {
        match field {
            "href" => self.set_href(coerce::text(field, value)?),
            "account_code" => self.account_code = coerce::text(field, value)?,
            "state" => self.state = coerce::text(field, value)?,
            "username" => self.username = coerce::text(field, value)?,
            "email" => self.email = coerce::text(field, value)?,
            "first_name" => self.first_name = coerce::text(field, value)?,
            "last_name" => self.last_name = coerce::text(field, value)?,
            "company_name" => self.company_name = coerce::text(field, value)?,
            "accept_language" => self.accept_language = coerce::text(field, value)?,
            "hosted_login_token" => self.hosted_login_token = coerce::text(field, value)?,
            "created_at" => self.created_at = coerce::datetime(field, value)?,
            "billing_info" => self.billing_info = coerce::nested(field, value)?,
            _ => return Err(unknown_field::<Self>(field)),
        }
        Ok(())
    }

    fn to_payload(&self) -> Payload {
        PayloadWriter::new(Self::schema())
            .field("href", self.href.clone())
            .field("account_code", self.account_code.clone())
            .field("state", self.state.clone())
            .field("username", self.username.clone())
            .field("email", self.email.clone())
            .field("first_name", self.first_name.clone())
            .field("last_name", self.last_name.clone())
            .field("company_name", self.company_name.clone())
            .field("accept_language", self.accept_language.clone())
            .field("hosted_login_token", self.hosted_login_token.clone())
            .field("created_at", self.created_at)
            .nested("billing_info", self.billing_info.as_ref())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_from_link() {
        let payload = Payload::new().with("href", "https://api.example.com/v2/accounts/acme-1");
        let account = Account::from_payload(&payload).unwrap();
        assert_eq!(account.account_code.as_deref(), Some("acme-1"));
    }

    #[test]
    fn test_missing_code_and_link_fails() {
        let err = Account::from_payload(&Payload::new().with("email", "a@example.com")).unwrap_err();
        assert!(err.to_string().contains("account_code"));
    }

    #[test]
    fn test_nested_billing_info() {
        let payload = Payload::new()
            .with("account_code", "acme")
            .with("billing_info", Payload::new().with("first_name", "Ada").with("month", "11"));
        let account = Account::from_payload(&payload).unwrap();
        let info = account.billing_info.unwrap();
        assert_eq!(info.first_name.as_deref(), Some("Ada"));
        assert_eq!(info.expiration_month, Some(11));
    }

    #[test]
    fn test_with_code() {
        let payload = Account::with_code("acme").to_payload();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get("account_code").as_text(), Some("acme"));
    }
}
