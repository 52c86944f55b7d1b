//! JSON encoding and decoding.

use serde_json::{Map, Number, Value as Json};

use super::ordered_fields;
use crate::{
    error::{BillingError, Result},
    payload::{Payload, Scalar, Value},
    schema::EntitySchema,
};

pub(super) fn encode(payload: &Payload, schema: Option<&'static EntitySchema>) -> Result<Vec<u8>> {
    serde_json::to_vec(&object(payload, schema))
        .map_err(|err| BillingError::Mapping(format!("JSON encoding failed: {err}")))
}

fn object(payload: &Payload, schema: Option<&'static EntitySchema>) -> Json {
    let mut map = Map::new();
    for field in ordered_fields(payload, schema) {
        if let Some(node) = node(field.value, field.nested_schema()) {
            map.insert(field.wire.to_owned(), node);
        }
    }
    Json::Object(map)
}

fn node(value: &Value, schema: Option<&'static EntitySchema>) -> Option<Json> {
    let json = match value {
        Value::Absent => return None,
        Value::Null => Json::Null,
        Value::Scalar(Scalar::Text(text)) => Json::String(text.clone()),
        Value::Scalar(Scalar::Integer(number)) => Json::Number(Number::from(*number)),
        Value::Scalar(Scalar::Boolean(flag)) => Json::Bool(*flag),
        Value::Scalar(Scalar::DateTime(at)) => Json::String(at.to_rfc3339()),
        Value::Nested(payload) => object(payload, schema),
        Value::Sequence(items) => Json::Array(items.iter().filter_map(|item| node(item, schema)).collect()),
    };
    Some(json)
}

pub(super) fn decode(body: &[u8]) -> Result<Value> {
    let json: Json = serde_json::from_slice(body)
        .map_err(|err| BillingError::Mapping(format!("malformed JSON: {err}")))?;
    Ok(from_json(json))
}

fn from_json(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(flag) => Value::from(flag),
        Json::Number(number) => number.as_i64().map_or_else(|| Value::from(number.to_string()), Value::from),
        Json::String(text) => Value::from(text),
        Json::Array(items) => Value::Sequence(items.into_iter().map(from_json).collect()),
        Json::Object(map) => Value::Nested(map.into_iter().map(|(name, value)| (name, from_json(value))).collect()),
    }
}
