//! Wire formats.
//!
//! Both formats share one field ordering rule: fields declared in the entity
//! schema come first, in schema order, followed by undeclared fields in
//! insertion order. [`Value::Absent`] never reaches the wire and
//! [`Value::Null`] is always written explicitly.

mod json;
mod xml;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    payload::{Payload, Value},
    schema::{self, EntitySchema, FieldKind, FieldSpec},
};

/// Serialization format of request and response bodies.
///
/// # Examples
///
/// ```
/// use tenant_billing::mapper::WireFormat;
///
/// let format: WireFormat = "json".parse().unwrap();
/// assert_eq!(format.content_type(), "application/json");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// XML, the billing service's native format.
    #[default]
    Xml,
    /// JSON.
    Json,
}

impl WireFormat {
    /// Media type used for `Accept` and `Content-Type` headers.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Xml => "application/xml; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    /// Encodes a payload, ordering fields by `schema` when given.
    ///
    /// An XML body needs a root element: the schema's, or else the single
    /// nested element the payload holds. JSON bodies are written as given.
    pub fn encode(self, payload: &Payload, schema: Option<&'static EntitySchema>) -> Result<Vec<u8>> {
        match self {
            Self::Xml => xml::encode(payload, schema),
            Self::Json => json::encode(payload, schema),
        }
    }

    /// Decodes a body into a value tree.
    ///
    /// XML bodies yield the content of the root element; the root name itself
    /// is discarded.
    pub fn decode(self, body: &[u8]) -> Result<Value> {
        match self {
            Self::Xml => xml::decode(body),
            Self::Json => json::decode(body),
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => f.write_str("xml"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for WireFormat {
    type Err = crate::error::BillingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            other => Err(crate::error::BillingError::Config(format!(
                "unknown wire format '{other}', expected 'xml' or 'json'"
            ))),
        }
    }
}

/// A payload field paired with its schema entry, if declared.
#[derive(Debug, Clone, Copy)]
struct Field<'a> {
    wire: &'a str,
    value: &'a Value,
    spec: Option<&'static FieldSpec>,
}

impl Field<'_> {
    fn is_link(&self) -> bool {
        self.spec.is_some_and(|spec| spec.kind == FieldKind::Link)
    }

    /// Schema of the nested entity or of each collection item.
    fn nested_schema(&self) -> Option<&'static EntitySchema> {
        match self.spec?.kind {
            FieldKind::Nested(kind) | FieldKind::Sequence(kind) => Some(schema::of(kind)),
            _ => None,
        }
    }

    /// Element name of each collection item in XML.
    fn item_tag(&self) -> &str {
        match self.nested_schema() {
            Some(schema) => schema.root,
            None => singular(self.wire),
        }
    }
}

fn singular(wire: &str) -> &str {
    wire.strip_suffix('s').filter(|stem| !stem.is_empty()).unwrap_or("item")
}

fn ordered_fields<'a>(payload: &'a Payload, schema: Option<&'static EntitySchema>) -> Vec<Field<'a>> {
    let Some(schema) = schema else {
        return payload.iter().map(|(wire, value)| Field { wire, value, spec: None }).collect();
    };
    let declared = schema.fields().iter().filter_map(|spec| {
        let value = payload.get(spec.wire);
        (!value.is_absent()).then_some(Field { wire: spec.wire, value, spec: Some(spec) })
    });
    let undeclared = payload
        .iter()
        .filter(|(wire, _)| schema.field_by_wire(wire).is_none())
        .map(|(wire, value)| Field { wire, value, spec: None });
    declared.chain(undeclared).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityKind;

    #[test]
    fn test_schema_order_then_insertion_order() {
        let payload = Payload::new()
            .with("zeta", 1)
            .with("discount_percent", 20)
            .with("coupon_code", "SUMMER20")
            .with("alpha", 2);
        let names: Vec<&str> = ordered_fields(&payload, Some(schema::of(EntityKind::Coupon)))
            .iter()
            .map(|field| field.wire)
            .collect();
        assert_eq!(names, ["coupon_code", "discount_percent", "zeta", "alpha"]);
    }

    #[test]
    fn test_insertion_order_without_schema() {
        let payload = Payload::new().with("b", 1).with("a", 2);
        let names: Vec<&str> = ordered_fields(&payload, None).iter().map(|field| field.wire).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_singular() {
        assert_eq!(singular("add_ons"), "add_on");
        assert_eq!(singular("s"), "item");
        assert_eq!(singular("data"), "item");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("XML".parse::<WireFormat>().unwrap(), WireFormat::Xml);
        assert!("yaml".parse::<WireFormat>().is_err());
        assert_eq!(WireFormat::default().to_string(), "xml");
    }
}
