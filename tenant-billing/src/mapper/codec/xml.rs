//! XML encoding and decoding.
//!
//! Decoding rules:
//! - attributes other than `nil` and `type` become fields (notably `href`)
//! - `nil` marks an explicit null
//! - `type="array"` turns the element into a sequence of its children; every
//!   other `type` annotation is ignored
//! - repeated child elements with the same name form a sequence
//! - an element with neither children nor attributes is its text, kept
//!   verbatim (possibly empty or all whitespace); text between child elements
//!   is dropped

use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use super::{Field, ordered_fields};
use crate::{
    error::{BillingError, Result},
    payload::{Payload, Value},
    schema::EntitySchema,
};

type XmlWriter = Writer<Vec<u8>>;

/// Encodes `payload` as a document rooted at the schema's element.
///
/// Without a schema the payload must hold exactly one nested element, which
/// becomes the root: `Payload::new().with("account", fields)`.
pub(super) fn encode(payload: &Payload, schema: Option<&'static EntitySchema>) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_failed)?;
    match schema {
        Some(schema) => write_payload(&mut writer, schema.root, payload, Some(schema))?,
        None => {
            let (root, fields) = sole_root(payload)?;
            write_payload(&mut writer, root, fields, None)?;
        }
    }
    Ok(writer.into_inner())
}

fn sole_root(payload: &Payload) -> Result<(&str, &Payload)> {
    let mut fields = payload.iter();
    match (fields.next(), fields.next()) {
        (Some((root, Value::Nested(inner))), None) => Ok((root, inner)),
        _ => Err(BillingError::Mapping(
            "an XML body without an entity schema needs exactly one nested root element".to_owned(),
        )),
    }
}

/// Accepts names made of letters, digits, `_`, `-` and `.`, starting with a
/// letter or `_`.
fn xml_name(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(name)
    } else {
        Err(BillingError::Mapping(format!("{name:?} is not a valid XML element name")))
    }
}

fn write_failed(err: impl std::fmt::Display) -> BillingError {
    BillingError::Mapping(format!("XML encoding failed: {err}"))
}

fn write_payload(
    writer: &mut XmlWriter,
    tag: &str,
    payload: &Payload,
    schema: Option<&'static EntitySchema>,
) -> Result<()> {
    let fields = ordered_fields(payload, schema);
    let mut start = BytesStart::new(xml_name(tag)?);
    for field in fields.iter().filter(|field| field.is_link()) {
        if let Value::Scalar(scalar) = field.value {
            start.push_attribute((xml_name(field.wire)?, scalar.to_wire_text().as_str()));
        }
    }
    writer.write_event(Event::Start(start)).map_err(write_failed)?;
    for field in fields.iter().filter(|field| !field.is_link()) {
        write_field(writer, field)?;
    }
    close(writer, tag)
}

fn write_field(writer: &mut XmlWriter, field: &Field<'_>) -> Result<()> {
    match field.value {
        Value::Sequence(items) => {
            let item_tag = field.item_tag();
            let item_schema = field.nested_schema();
            open(writer, field.wire)?;
            for item in items {
                write_value(writer, item_tag, item, item_schema)?;
            }
            close(writer, field.wire)
        }
        value => write_value(writer, field.wire, value, field.nested_schema()),
    }
}

fn write_value(
    writer: &mut XmlWriter,
    tag: &str,
    value: &Value,
    schema: Option<&'static EntitySchema>,
) -> Result<()> {
    match value {
        Value::Absent => Ok(()),
        Value::Null => {
            let mut start = BytesStart::new(xml_name(tag)?);
            start.push_attribute(("nil", "nil"));
            writer.write_event(Event::Start(start)).map_err(write_failed)?;
            close(writer, tag)
        }
        Value::Scalar(scalar) => {
            open(writer, tag)?;
            let text = scalar.to_wire_text();
            writer.write_event(Event::Text(BytesText::new(&text))).map_err(write_failed)?;
            close(writer, tag)
        }
        Value::Nested(payload) => write_payload(writer, tag, payload, schema),
        Value::Sequence(items) => {
            open(writer, tag)?;
            for item in items {
                write_value(writer, "item", item, None)?;
            }
            close(writer, tag)
        }
    }
}

fn open(writer: &mut XmlWriter, tag: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(xml_name(tag)?))).map_err(write_failed)
}

fn close(writer: &mut XmlWriter, tag: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(tag))).map_err(write_failed)
}

pub(super) fn decode(body: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(body)
        .map_err(|err| BillingError::Mapping(format!("XML body is not valid UTF-8: {err}")))?;
    let mut reader = Reader::from_str(text);

    loop {
        match reader.read_event().map_err(syntax)? {
            Event::Start(start) => {
                let element = Element::open(&start)?;
                return parse_element(&mut reader, element);
            }
            Event::Empty(start) => return Ok(Element::open(&start)?.finish()),
            Event::Eof => return Err(BillingError::Mapping("XML body has no root element".to_owned())),
            _ => {}
        }
    }
}

fn parse_element(reader: &mut Reader<&[u8]>, mut element: Element) -> Result<Value> {
    loop {
        match reader.read_event().map_err(syntax)? {
            Event::Start(start) => {
                let name = tag_name(&start);
                let child = Element::open(&start)?;
                let value = parse_element(reader, child)?;
                element.push_child(name, value);
            }
            Event::Empty(start) => {
                let name = tag_name(&start);
                let value = Element::open(&start)?.finish();
                element.push_child(name, value);
            }
            Event::Text(text) => element.text.push_str(&text.unescape().map_err(syntax)?),
            Event::CData(data) => element.text.push_str(&String::from_utf8_lossy(&data.into_inner())),
            Event::End(_) => return Ok(element.finish()),
            Event::Eof => return Err(BillingError::Mapping("unexpected end of XML body".to_owned())),
            _ => {}
        }
    }
}

fn tag_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn syntax(err: impl std::fmt::Display) -> BillingError {
    BillingError::Mapping(format!("malformed XML: {err}"))
}

/// An element being decoded.
#[derive(Debug, Default)]
struct Element {
    fields: Payload,
    items: Vec<Value>,
    text: String,
    nil: bool,
    array: bool,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = Self::default();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(syntax)?;
            let value = attribute.unescape_value().map_err(syntax)?;
            match attribute.key.local_name().as_ref() {
                b"nil" => element.nil = true,
                b"type" => element.array = value == "array",
                _ if attribute.key.as_ref().starts_with(b"xmlns") => {}
                key => element.fields.set(String::from_utf8_lossy(key).into_owned(), value.into_owned()),
            }
        }
        Ok(element)
    }

    fn push_child(&mut self, name: String, value: Value) {
        if self.array {
            self.items.push(value);
            return;
        }
        match self.fields.get_mut(&name) {
            Some(Value::Sequence(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Value::Sequence(vec![first, value]);
            }
            None => self.fields.set(name, value),
        }
    }

    fn finish(self) -> Value {
        if self.nil {
            Value::Null
        } else if self.array {
            Value::Sequence(self.items)
        } else if !self.fields.is_empty() {
            Value::Nested(self.fields)
        } else {
            Value::from(self.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{self, EntityKind};

    fn decode_str(xml: &str) -> Value {
        decode(xml.as_bytes()).unwrap()
    }

    fn encode_str(payload: &Payload, schema: Option<&'static EntitySchema>) -> String {
        String::from_utf8(encode(payload, schema).unwrap()).unwrap()
    }

    #[test]
    fn test_decode_attributes_and_children() {
        let value = decode_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <coupon href="https://api.example.com/v2/coupons/SUMMER20">
              <coupon_code>SUMMER20</coupon_code>
              <discount_percent type="integer">20</discount_percent>
            </coupon>"#,
        );
        let payload = value.as_nested().unwrap();
        assert_eq!(payload.get("href").as_text(), Some("https://api.example.com/v2/coupons/SUMMER20"));
        assert_eq!(payload.get("coupon_code").as_text(), Some("SUMMER20"));
        assert_eq!(payload.get("discount_percent").as_text(), Some("20"));
    }

    #[test]
    fn test_decode_nil_and_empty() {
        let value = decode_str(r#"<account><email nil="nil"></email><company_name></company_name><state/></account>"#);
        let payload = value.as_nested().unwrap();
        assert!(payload.get("email").is_null());
        assert_eq!(payload.get("company_name").as_text(), Some(""));
        assert_eq!(payload.get("state").as_text(), Some(""));
    }

    #[test]
    fn test_decode_repeated_children() {
        let value = decode_str("<plans><plan><plan_code>a</plan_code></plan><plan><plan_code>b</plan_code></plan></plans>");
        let Value::Sequence(items) = value.as_nested().unwrap().get("plan") else {
            panic!("repeated children should form a sequence");
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_decode_typed_array() {
        let value = decode_str(r#"<plans type="array"><plan><plan_code>a</plan_code></plan></plans>"#);
        let Value::Sequence(items) = value else {
            panic!("type=array should decode to a sequence");
        };
        assert_eq!(items.len(), 1);

        assert_eq!(decode_str(r#"<plans type="array"/>"#), Value::Sequence(Vec::new()));
    }

    #[test]
    fn test_decode_unescapes() {
        let value = decode_str("<plan><name>Gold &amp; Silver</name><description><![CDATA[<b>x</b>]]></description></plan>");
        let payload = value.as_nested().unwrap();
        assert_eq!(payload.get("name").as_text(), Some("Gold & Silver"));
        assert_eq!(payload.get("description").as_text(), Some("<b>x</b>"));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode(b"<coupon><name>x</coupon>").is_err());
        assert!(decode(b"").is_err());
        assert!(decode(b"<coupon>").is_err());
    }

    #[test]
    fn test_encode_with_schema() {
        let payload = Payload::new()
            .with("discount_percent", 20)
            .with("coupon_code", "SUMMER20")
            .with("name", Value::Null)
            .with("href", "https://api.example.com/v2/coupons/SUMMER20");
        let xml = encode_str(&payload, Some(schema::of(EntityKind::Coupon)));
        assert_eq!(
            xml,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<coupon href="https://api.example.com/v2/coupons/SUMMER20">"#,
                r#"<name nil="nil"></name>"#,
                "<coupon_code>SUMMER20</coupon_code>",
                "<discount_percent>20</discount_percent>",
                "</coupon>"
            )
        );
    }

    #[test]
    fn test_encode_escapes_text() {
        let payload = Payload::new().with("plan", Payload::new().with("name", "Gold & <Silver>"));
        let xml = encode_str(&payload, None);
        assert!(xml.contains("<plan><name>Gold &amp; &lt;Silver&gt;</name></plan>"));
    }

    #[test]
    fn test_encode_without_schema_needs_one_root() {
        let wrapped = Payload::new().with("account", Payload::new().with("account_code", "acme"));
        assert_eq!(
            encode_str(&wrapped, None),
            r#"<?xml version="1.0" encoding="UTF-8"?><account><account_code>acme</account_code></account>"#
        );

        let flat = Payload::new().with("account_code", "acme").with("currency", "USD");
        assert!(encode(&flat, None).unwrap_err().is_mapping());
        assert!(encode(&Payload::new(), None).is_err());
    }

    #[test]
    fn test_encode_rejects_invalid_names() {
        let injected = Payload::new().with("a><admin>true</admin><b", "x");
        let err = encode(&injected, Some(schema::of(EntityKind::Account))).unwrap_err();
        assert!(err.is_mapping());

        for name in ["", "1st", "a b", "x/y", "-lead"] {
            let payload = Payload::new().with(name, "x");
            assert!(encode(&payload, Some(schema::of(EntityKind::Coupon))).is_err(), "{name:?}");
        }

        let fine = Payload::new().with("custom_field.v-2", "x");
        assert!(encode(&fine, Some(schema::of(EntityKind::Coupon))).is_ok());
    }

    #[test]
    fn test_decode_keeps_text_verbatim() {
        let value = decode_str("<coupon>\n  <name>  Summer sale </name>\n  <description>   </description>\n</coupon>");
        let payload = value.as_nested().unwrap();
        assert_eq!(payload.get("name").as_text(), Some("  Summer sale "));
        assert_eq!(payload.get("description").as_text(), Some("   "));
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn test_encode_nested_and_sequence() {
        let add_on = Payload::new().with("add_on_code", "extra").with("quantity", 2);
        let payload = Payload::new()
            .with("plan_code", "gold")
            .with("subscription_add_ons", vec![add_on])
            .with("account", Payload::new().with("account_code", "acme"));
        let xml = encode_str(&payload, Some(schema::of(EntityKind::Subscription)));
        assert!(xml.contains(
            "<account><account_code>acme</account_code></account><plan_code>gold</plan_code>"
        ));
        assert!(xml.contains(
            "<subscription_add_ons><subscription_add_on><add_on_code>extra</add_on_code>\
             <quantity>2</quantity></subscription_add_on></subscription_add_ons>"
        ));
    }

    #[test]
    fn test_encode_then_decode_preserves_null() {
        let payload = Payload::new().with("coupon_code", "A").with("name", Value::Null);
        let decoded = decode(&encode(&payload, Some(schema::of(EntityKind::Coupon))).unwrap()).unwrap();
        assert!(decoded.as_nested().unwrap().get("name").is_null());
    }
}
