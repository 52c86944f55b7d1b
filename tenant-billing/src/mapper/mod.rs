//! Resource mapping between wire bodies, generic payloads, and typed entities.
//!
//! The mapper is stateless apart from its [`WireFormat`]; one instance is
//! shared by every dispatch context.
//!
//! # Architecture
//!
//! ```text
//! Entity ──to_payload──> Payload ──encode──> bytes
//! bytes  ──decode──> Value ──from_payload──> Entity
//! ```
//!
//! Decoding ignores fields the entity schema does not declare, and fails with
//! [`BillingError::Mapping`](crate::error::BillingError::Mapping) when a
//! declared field cannot be coerced to its type.

pub mod coerce;
mod codec;
pub mod link;

use std::fmt;

use tracing::debug;

pub use self::{codec::WireFormat, link::extract_identifier_from_link};
use crate::{
    error::{BillingError, Result},
    model::ResourceList,
    payload::{Payload, Scalar, Value},
    schema::{self, EntityKind, EntitySchema, FieldKind, FieldSpec},
};

/// A typed billing resource with a declared schema.
///
/// Implementors provide a field setter ([`apply`](Self::apply)) that accepts a
/// loosely-typed [`Value`] and normalizes it, and the reverse projection
/// ([`to_payload`](Self::to_payload)). Decoding is derived from both.
///
/// # Self-link identifiers
///
/// Entities whose schema carries a link rule derive their identifier from the
/// `href` field. Applying `href` overwrites the identifier whenever the
/// pattern matches, so the link always wins over an explicit identifier in
/// the same payload.
pub trait Entity: Default + Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Schema catalog key.
    const KIND: EntityKind;

    /// Schema of this entity.
    #[must_use]
    fn schema() -> &'static EntitySchema {
        schema::of(Self::KIND)
    }

    /// Applies one field value, normalizing it to the field's declared type.
    ///
    /// `field` is the Rust-side field name. Unknown names and values that do
    /// not coerce fail with a mapping error.
    fn apply(&mut self, field: &str, value: &Value) -> Result<()>;

    /// Projects this entity onto a payload keyed by wire names. Unset fields
    /// are omitted.
    fn to_payload(&self) -> Payload;

    /// Loosely-typed setter. See [`apply`](Self::apply).
    fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.apply(field, &value.into())
    }

    /// Projects a payload onto this entity.
    ///
    /// Applies every declared field present in the payload, self-link last.
    /// No field is required.
    fn from_payload(payload: &Payload) -> Result<Self> {
        let schema = Self::schema();
        let mut entity = Self::default();
        let (links, fields): (Vec<&FieldSpec>, Vec<&FieldSpec>) =
            schema.fields().iter().partition(|spec| spec.kind == FieldKind::Link);
        for spec in fields.into_iter().chain(links) {
            let value = payload.get(spec.wire);
            if !value.is_absent() {
                entity.apply(spec.name, value)?;
            }
        }
        Ok(entity)
    }
}

/// Error for a field name the entity does not declare.
pub(crate) fn unknown_field<E: Entity>(field: &str) -> BillingError {
    BillingError::mapping(field, format_args!("not a field of {}", E::schema().root))
}

/// Writes entity fields into a payload under their wire names.
///
/// # Examples
///
/// ```
/// use tenant_billing::{mapper::{Entity, PayloadWriter}, model::Coupon};
///
/// let payload = PayloadWriter::new(Coupon::schema())
///     .field("coupon_code", Some("SUMMER20"))
///     .field("discount_percent", Some(20))
///     .field("name", None::<String>)
///     .finish();
/// assert_eq!(payload.len(), 2);
/// ```
#[derive(Debug)]
pub struct PayloadWriter {
    schema: &'static EntitySchema,
    payload: Payload,
}

impl PayloadWriter {
    /// Starts an empty payload for `schema`.
    #[must_use]
    pub fn new(schema: &'static EntitySchema) -> Self {
        Self { schema, payload: Payload::new() }
    }

    fn wire(&self, field: &'static str) -> &'static str {
        debug_assert!(self.schema.field(field).is_some(), "{field} not declared on {}", self.schema.root);
        self.schema.field(field).map_or(field, |spec| spec.wire)
    }

    /// Writes a scalar field. `None` leaves the field absent.
    #[must_use]
    pub fn field(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        let wire = self.wire(field);
        self.payload.set(wire, value);
        self
    }

    /// Writes a nested entity.
    #[must_use]
    pub fn nested<E: Entity>(self, field: &'static str, entity: Option<&E>) -> Self {
        let value = entity.map(Entity::to_payload);
        self.field(field, value)
    }

    /// Writes a collection of entities. An empty collection is omitted.
    #[must_use]
    pub fn sequence<'a, E: Entity>(self, field: &'static str, entities: impl IntoIterator<Item = &'a E>) -> Self {
        let items: Vec<Payload> = entities.into_iter().map(Entity::to_payload).collect();
        if items.is_empty() {
            return self;
        }
        self.field(field, items)
    }

    /// Returns the finished payload.
    #[must_use]
    pub fn finish(self) -> Payload {
        self.payload
    }
}

/// Converts between wire bodies and typed entities in one [`WireFormat`].
///
/// # Examples
///
/// ```
/// use tenant_billing::{mapper::{ResourceMapper, WireFormat}, model::Coupon};
///
/// let mapper = ResourceMapper::new(WireFormat::Xml);
/// let coupon: Coupon = mapper
///     .from_wire(br#"<coupon href="https://api.example.com/v2/coupons/SUMMER20"><name>Summer</name></coupon>"#)
///     .unwrap();
/// assert_eq!(coupon.coupon_code.as_deref(), Some("SUMMER20"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceMapper {
    format: WireFormat,
}

impl ResourceMapper {
    /// Creates a mapper for `format`.
    #[must_use]
    pub const fn new(format: WireFormat) -> Self {
        Self { format }
    }

    /// The wire format in use.
    #[must_use]
    pub const fn format(&self) -> WireFormat {
        self.format
    }

    /// Serializes a payload. Declared fields of `schema` come first, in schema
    /// order; everything else follows in insertion order.
    pub fn to_wire(&self, payload: &Payload, schema: Option<&'static EntitySchema>) -> Result<Vec<u8>> {
        let body = self.format.encode(payload, schema)?;
        debug!(format = %self.format, bytes = body.len(), "encoded request body");
        Ok(body)
    }

    /// Serializes a typed entity.
    pub fn entity_to_wire<E: Entity>(&self, entity: &E) -> Result<Vec<u8>> {
        self.to_wire(&entity.to_payload(), Some(E::schema()))
    }

    /// Deserializes a single entity. Unknown fields are ignored.
    pub fn from_wire<E: Entity>(&self, body: &[u8]) -> Result<E> {
        let value = self.format.decode(body)?;
        project(&value)
    }

    /// Deserializes a list body, preserving server order.
    ///
    /// Any element that fails to map fails the whole list.
    pub fn from_wire_list<E: Entity>(&self, body: &[u8]) -> Result<ResourceList<E>> {
        let value = self.format.decode(body)?;
        let items = coerce::sequence::<E>(E::schema().collection, &value)?;
        debug!(format = %self.format, count = items.len(), entity = E::schema().root, "decoded list");
        Ok(ResourceList::from(items))
    }
}

/// Projects a decoded body onto `E`.
///
/// A JSON body wrapped in a single key named after the entity root is
/// unwrapped; an empty XML element decodes to an empty payload.
fn project<E: Entity>(value: &Value) -> Result<E> {
    let root = E::schema().root;
    match value {
        Value::Nested(payload) => match payload.get(root) {
            Value::Nested(inner) if payload.len() == 1 => E::from_payload(inner),
            _ => E::from_payload(payload),
        },
        Value::Scalar(Scalar::Text(text)) if text.trim().is_empty() => E::from_payload(&Payload::new()),
        other => Err(BillingError::mapping(root, format_args!("expected an element, got {}", other.kind_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coupon, Plan};

    const COUPON_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
        <coupon href="https://api.example.com/v2/coupons/SUMMER20">
          <name>Summer</name>
          <discount_type>percent</discount_type>
          <discount_percent type="integer">20</discount_percent>
          <applies_for_months type="integer">3</applies_for_months>
          <redeem_by_date type="datetime">2030-01-01T00:00:00Z</redeem_by_date>
        </coupon>"#;

    #[test]
    fn test_from_wire_ignores_unknown_fields() {
        let coupon: Coupon = ResourceMapper::new(WireFormat::Xml).from_wire(COUPON_XML).unwrap();
        assert_eq!(coupon.name.as_deref(), Some("Summer"));
        assert_eq!(coupon.coupon_code.as_deref(), Some("SUMMER20"));
        assert_eq!(coupon.discount_percent, Some(20));
        assert_eq!(coupon.applies_for_months, Some(3));
    }

    #[test]
    fn test_link_wins_over_explicit_identifier() {
        let body = br#"<coupon href="/v2/coupons/FROM_LINK"><coupon_code>EXPLICIT</coupon_code></coupon>"#;
        let coupon: Coupon = ResourceMapper::new(WireFormat::Xml).from_wire(body).unwrap();
        assert_eq!(coupon.coupon_code.as_deref(), Some("FROM_LINK"));
    }

    #[test]
    fn test_entity_without_identifier_decodes() {
        let coupon: Coupon = ResourceMapper::new(WireFormat::Xml)
            .from_wire(b"<coupon><name>Summer</name></coupon>")
            .unwrap();
        assert_eq!(coupon.name.as_deref(), Some("Summer"));
        assert_eq!(coupon.coupon_code, None);
    }

    #[test]
    fn test_json_root_wrapper_is_unwrapped() {
        let mapper = ResourceMapper::new(WireFormat::Json);
        let wrapped: Plan = mapper.from_wire(br#"{"plan":{"plan_code":"gold"}}"#).unwrap();
        let bare: Plan = mapper.from_wire(br#"{"plan_code":"gold"}"#).unwrap();
        assert_eq!(wrapped, bare);
    }

    #[test]
    fn test_scalar_body_is_rejected() {
        let err = ResourceMapper::new(WireFormat::Json).from_wire::<Plan>(b"42").unwrap_err();
        assert!(err.is_mapping());
    }

    #[test]
    fn test_list_single_item_container() {
        let body = b"<plans><plan><plan_code>gold</plan_code></plan></plans>";
        let plans = ResourceMapper::new(WireFormat::Xml).from_wire_list::<Plan>(body).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].plan_code.as_deref(), Some("gold"));
    }

    #[test]
    fn test_list_preserves_order() {
        let body = br#"<plans type="array">
            <plan><plan_code>c</plan_code></plan>
            <plan><plan_code>a</plan_code></plan>
            <plan><plan_code>b</plan_code></plan>
        </plans>"#;
        let plans = ResourceMapper::new(WireFormat::Xml).from_wire_list::<Plan>(body).unwrap();
        let codes: Vec<_> = plans.iter().filter_map(|plan| plan.plan_code.as_deref()).collect();
        assert_eq!(codes, ["c", "a", "b"]);
    }

    #[test]
    fn test_empty_list() {
        let mapper = ResourceMapper::new(WireFormat::Xml);
        assert!(mapper.from_wire_list::<Plan>(b"<plans></plans>").unwrap().is_empty());
        assert!(mapper.from_wire_list::<Plan>(br#"<plans type="array"></plans>"#).unwrap().is_empty());
        let json = ResourceMapper::new(WireFormat::Json);
        assert!(json.from_wire_list::<Plan>(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_payload_writer_uses_wire_names() {
        let payload = PayloadWriter::new(crate::model::BillingInfo::schema())
            .field("card_number", Some("4111111111111111"))
            .field("expiration_month", Some(11))
            .finish();
        assert_eq!(payload.get("number").as_text(), Some("4111111111111111"));
        assert_eq!(payload.get("month"), &Value::from(11));
    }
}
