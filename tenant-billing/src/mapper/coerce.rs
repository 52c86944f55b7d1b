//! Strict coercion of loosely-typed payload values.
//!
//! Every function takes the field name (for error messages) and a [`Value`].
//! [`Value::Absent`] and [`Value::Null`] coerce to `None` or an empty
//! collection. Anything that cannot be normalized to the requested type fails
//! with [`BillingError::Mapping`]; nothing is silently dropped.

use chrono::{DateTime, Utc};

use super::Entity;
use crate::{
    error::{BillingError, Result},
    model::CurrencyAmounts,
    payload::{Payload, Scalar, Value},
};

fn mismatch(field: &str, expected: &str, value: &Value) -> BillingError {
    BillingError::mapping(field, format_args!("expected {expected}, got {}", value.kind_name()))
}

/// Normalizes to text. Numbers, booleans, and timestamps render in their wire
/// form.
pub fn text(field: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Absent | Value::Null => Ok(None),
        Value::Scalar(scalar) => Ok(Some(scalar.to_wire_text())),
        other => Err(mismatch(field, "text", other)),
    }
}

/// Normalizes to a signed integer. Text must parse as a decimal integer.
pub fn integer(field: &str, value: &Value) -> Result<Option<i64>> {
    match value {
        Value::Absent | Value::Null => Ok(None),
        Value::Scalar(Scalar::Integer(number)) => Ok(Some(*number)),
        Value::Scalar(Scalar::Text(raw)) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| BillingError::mapping(field, format_args!("expected integer, got '{raw}'"))),
        other => Err(mismatch(field, "integer", other)),
    }
}

/// Normalizes to a boolean. Text accepts `true`/`false` (any case) and `1`/`0`.
pub fn boolean(field: &str, value: &Value) -> Result<Option<bool>> {
    match value {
        Value::Absent | Value::Null => Ok(None),
        Value::Scalar(Scalar::Boolean(flag)) => Ok(Some(*flag)),
        Value::Scalar(Scalar::Text(raw)) => match raw.trim() {
            flag if flag.eq_ignore_ascii_case("true") || flag == "1" => Ok(Some(true)),
            flag if flag.eq_ignore_ascii_case("false") || flag == "0" => Ok(Some(false)),
            _ => Err(BillingError::mapping(field, format_args!("expected boolean, got '{raw}'"))),
        },
        other => Err(mismatch(field, "boolean", other)),
    }
}

/// Normalizes to a UTC timestamp. Text must be RFC 3339.
pub fn datetime(field: &str, value: &Value) -> Result<Option<DateTime<Utc>>> {
    match value {
        Value::Absent | Value::Null => Ok(None),
        Value::Scalar(Scalar::DateTime(at)) => Ok(Some(*at)),
        Value::Scalar(Scalar::Text(raw)) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|at| Some(at.with_timezone(&Utc)))
            .map_err(|err| BillingError::mapping(field, format_args!("invalid timestamp '{raw}': {err}"))),
        other => Err(mismatch(field, "timestamp", other)),
    }
}

/// Normalizes a currency map such as `<unit_amount_in_cents><USD>1000</USD></unit_amount_in_cents>`.
///
/// An empty element is an empty map, not a missing one.
pub fn amounts(field: &str, value: &Value) -> Result<Option<CurrencyAmounts>> {
    match value {
        Value::Absent | Value::Null => Ok(None),
        Value::Scalar(Scalar::Text(raw)) if raw.trim().is_empty() => Ok(Some(CurrencyAmounts::default())),
        Value::Nested(payload) => {
            let mut amounts = CurrencyAmounts::default();
            for (currency, cents) in payload.iter() {
                let qualified = format!("{field}.{currency}");
                if let Some(cents) = integer(&qualified, cents)? {
                    amounts.insert(currency, cents);
                }
            }
            Ok(Some(amounts))
        }
        other => Err(mismatch(field, "currency amounts", other)),
    }
}

/// Projects a nested payload onto entity `E`.
///
/// An empty XML element (`<account></account>`) is an entity with no fields
/// set; only an absent or nil element is `None`.
pub fn nested<E: Entity>(field: &str, value: &Value) -> Result<Option<E>> {
    match value {
        Value::Absent | Value::Null => Ok(None),
        Value::Scalar(Scalar::Text(raw)) if raw.trim().is_empty() => {
            E::from_payload(&Payload::new()).map(Some).map_err(|err| within(field, err))
        }
        Value::Nested(payload) => E::from_payload(payload).map(Some).map_err(|err| within(field, err)),
        other => Err(mismatch(field, "nested element", other)),
    }
}

/// Projects a collection onto a vector of `E`, preserving order.
///
/// Accepts every shape a collection arrives in: a sequence, a container
/// element whose children are named after `E`'s root (one child decodes to a
/// single nested value, several to a sequence), or a lone nested payload.
/// A single element that fails to map fails the whole collection.
pub fn sequence<E: Entity>(field: &str, value: &Value) -> Result<Vec<E>> {
    items(field, value, E::schema().root, E::schema().collection)?
        .into_iter()
        .enumerate()
        .map(|(index, payload)| {
            E::from_payload(payload).map_err(|err| within(&format!("{field}[{index}]"), err))
        })
        .collect()
}

/// Flattens a collection value into the payloads of its items.
pub(crate) fn items<'a>(
    field: &str,
    value: &'a Value,
    item_tag: &str,
    collection_tag: &str,
) -> Result<Vec<&'a Payload>> {
    match value {
        Value::Absent | Value::Null => Ok(Vec::new()),
        Value::Scalar(Scalar::Text(raw)) if raw.trim().is_empty() => Ok(Vec::new()),
        Value::Sequence(elements) => elements
            .iter()
            .map(|element| element.as_nested().ok_or_else(|| mismatch(field, "nested element", element)))
            .collect(),
        Value::Nested(payload) if payload.is_empty() => Ok(Vec::new()),
        Value::Nested(payload) => {
            for tag in [item_tag, collection_tag] {
                let inner = payload.get(tag);
                if !inner.is_absent() {
                    return items(field, inner, item_tag, collection_tag);
                }
            }
            Ok(vec![payload])
        }
        other => Err(mismatch(field, "collection", other)),
    }
}

fn within(field: &str, err: BillingError) -> BillingError {
    match err {
        BillingError::Mapping(detail) => BillingError::Mapping(format!("in '{field}': {detail}")),
        other => other,
    }
}
