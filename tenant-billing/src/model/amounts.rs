use std::collections::BTreeMap;

use crate::payload::{Payload, Value};

/// Amounts in cents keyed by ISO 4217 currency code, as plans and add-ons
/// price themselves in several currencies at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CurrencyAmounts(BTreeMap<String, i64>);

impl CurrencyAmounts {
    /// Sets the amount for a currency.
    pub fn insert(&mut self, currency: impl Into<String>, cents: i64) {
        self.0.insert(currency.into(), cents);
    }

    /// Amount for a currency, if priced.
    #[must_use]
    pub fn get(&self, currency: &str) -> Option<i64> {
        self.0.get(currency).copied()
    }

    /// Iterates currencies in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(currency, cents)| (currency.as_str(), *cents))
    }

    /// Number of currencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no currency is priced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for CurrencyAmounts {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(currency, cents)| (currency.into(), cents)).collect())
    }
}

impl From<&CurrencyAmounts> for Value {
    fn from(amounts: &CurrencyAmounts) -> Self {
        Self::Nested(amounts.iter().map(|(currency, cents)| (currency, Value::from(cents))).collect::<Payload>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_value() {
        let amounts: CurrencyAmounts = [("USD", 1000), ("EUR", 900)].into_iter().collect();
        let Value::Nested(payload) = Value::from(&amounts) else {
            panic!("amounts encode as a nested payload");
        };
        let currencies: Vec<&str> = payload.iter().map(|(name, _)| name).collect();
        assert_eq!(currencies, ["EUR", "USD"]);
        assert_eq!(payload.get("USD"), &Value::from(1000));
    }
}
