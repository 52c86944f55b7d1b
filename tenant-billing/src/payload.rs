//! Generic payload model.
//!
//! A [`Payload`] is the untyped, ordered field map used as input for create
//! and update requests and as the intermediate form of every decoded response.
//! Field values are a closed set of variants ([`Value`]) that keep the
//! distinction between a field that is missing and a field that is explicitly
//! null, because the billing service treats the two differently on the wire.
//!
//! # Examples
//!
//! ```
//! use tenant_billing::payload::{Payload, Value};
//!
//! let coupon = Payload::new()
//!     .with("coupon_code", "SUMMER20")
//!     .with("discount_percent", 20)
//!     .with("redeem_by_date", Value::Null);
//!
//! assert_eq!(coupon.get("coupon_code").as_text(), Some("SUMMER20"));
//! assert!(coupon.get("redeem_by_date").is_null());
//! assert!(coupon.get("name").is_absent());
//! ```

use chrono::{DateTime, Utc};

/// A scalar field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// Free text. Decoded XML content always arrives as text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Boolean flag.
    Boolean(bool),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
}

impl Scalar {
    /// Renders the scalar in its canonical wire text form.
    #[must_use]
    pub fn to_wire_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Boolean(flag) => flag.to_string(),
            Self::DateTime(at) => at.to_rfc3339(),
        }
    }
}

/// A field value inside a [`Payload`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// The field is not present. Never stored; returned by lookups of missing
    /// fields and omitted from the wire.
    #[default]
    Absent,
    /// The field is present and explicitly null.
    Null,
    /// A scalar value.
    Scalar(Scalar),
    /// A nested payload.
    Nested(Payload),
    /// An ordered sequence, normally of nested payloads.
    Sequence(Vec<Value>),
}

static ABSENT: Value = Value::Absent;

impl Value {
    /// Returns true for [`Value::Absent`].
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for both absent and null values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Absent | Self::Null)
    }

    /// Returns the text if this is a text scalar.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the nested payload, if any.
    #[must_use]
    pub fn as_nested(&self) -> Option<&Payload> {
        match self {
            Self::Nested(payload) => Some(payload),
            _ => None,
        }
    }

    /// Short name of the variant, used in mapping error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Null => "null",
            Self::Scalar(Scalar::Text(_)) => "text",
            Self::Scalar(Scalar::Integer(_)) => "integer",
            Self::Scalar(Scalar::Boolean(_)) => "boolean",
            Self::Scalar(Scalar::DateTime(_)) => "datetime",
            Self::Nested(_) => "nested payload",
            Self::Sequence(_) => "sequence",
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Scalar(Scalar::Text(text.to_owned()))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Scalar(Scalar::Text(text))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Integer(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Scalar(Scalar::Integer(i64::from(value)))
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Scalar(Scalar::Boolean(flag))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Scalar(Scalar::DateTime(at))
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        Self::Nested(payload)
    }
}

impl From<Vec<Payload>> for Value {
    fn from(items: Vec<Payload>) -> Self {
        Self::Sequence(items.into_iter().map(Value::Nested).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    /// `None` maps to [`Value::Absent`], so optional entity fields that were
    /// never set stay off the wire.
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// An insertion-ordered map from field name to [`Value`].
///
/// Field names are unique; setting an existing field replaces its value in
/// place without changing its position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    fields: Vec<(String, Value)>,
}

impl Payload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field. Setting [`Value::Absent`] removes the field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let position = self.fields.iter().position(|(existing, _)| *existing == name);
        match (position, value) {
            (Some(index), Value::Absent) => {
                self.fields.remove(index);
            }
            (Some(index), value) => self.fields[index].1 = value,
            (None, Value::Absent) => {}
            (None, value) => self.fields.push((name, value)),
        }
    }

    /// Returns the value of a field, or [`Value::Absent`] if it is not present.
    #[must_use]
    pub fn get(&self, name: &str) -> &Value {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map_or(&ABSENT, |(_, value)| value)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|(existing, _)| existing == name).map(|(_, value)| value)
    }

    /// Returns true if the field is present (null counts as present).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(existing, _)| existing == name)
    }

    /// Removes a field and returns its previous value.
    pub fn remove(&mut self, name: &str) -> Value {
        self.fields
            .iter()
            .position(|(existing, _)| existing == name)
            .map_or(Value::Absent, |index| self.fields.remove(index).1)
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of present fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (name, value) in iter {
            payload.set(name, value);
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_null_are_distinct() {
        let payload = Payload::new().with("state", Value::Null);
        assert!(payload.get("state").is_null());
        assert!(payload.contains("state"));
        assert!(payload.get("email").is_absent());
        assert!(!payload.contains("email"));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut payload = Payload::new().with("a", 1).with("b", 2).with("c", 3);
        payload.set("b", "two");

        let names: Vec<&str> = payload.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(payload.get("b").as_text(), Some("two"));
    }

    #[test]
    fn test_setting_absent_removes_field() {
        let mut payload = Payload::new().with("a", 1).with("b", 2);
        payload.set("a", Value::Absent);
        assert_eq!(payload.len(), 1);
        assert!(!payload.contains("a"));

        payload.set("z", Value::Absent);
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_option_conversion() {
        let payload = Payload::new().with("name", None::<String>).with("code", Some("gold"));
        assert!(!payload.contains("name"));
        assert_eq!(payload.get("code").as_text(), Some("gold"));
    }

    #[test]
    fn test_remove_returns_previous_value() {
        let mut payload = Payload::new().with("quantity", 3);
        assert_eq!(payload.remove("quantity"), Value::from(3));
        assert!(payload.remove("quantity").is_absent());
        assert!(payload.is_empty());
    }

    #[test]
    fn test_from_iterator_deduplicates() {
        let payload: Payload = [("a", 1), ("b", 2), ("a", 5)].into_iter().collect();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.get("a"), &Value::from(5));
    }

    #[test]
    fn test_scalar_wire_text() {
        assert_eq!(Scalar::Integer(-4).to_wire_text(), "-4");
        assert_eq!(Scalar::Boolean(true).to_wire_text(), "true");
        let at = DateTime::parse_from_rfc3339("2013-05-01T10:00:00Z")
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap();
        assert_eq!(Scalar::DateTime(at).to_wire_text(), "2013-05-01T10:00:00+00:00");
    }
}
