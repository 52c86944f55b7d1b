use crate::{
    error::{BillingError, Result},
    mapper::{Entity, ResourceMapper},
    model::ResourceList,
    schema::EntitySchema,
};

/// Shape a dispatched request is decoded into.
///
/// Implemented for every [`Entity`] (single resource), for
/// [`ResourceList<E>`] (list), and for `()` (no response body).
pub trait DispatchResponse: Sized + Send + 'static {
    /// Schema used to order the fields of a request body, if any.
    fn request_schema() -> Option<&'static EntitySchema>;

    /// Decodes a successful response body.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Mapping`] if the body does not fit the shape.
    fn from_body(mapper: &ResourceMapper, body: &[u8]) -> Result<Self>;

    /// Result for a 404 answer at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::NotFound`] unless the shape has a natural empty
    /// value.
    fn on_not_found(path: &str) -> Result<Self> {
        Err(BillingError::NotFound(path.to_owned()))
    }
}

impl<E: Entity> DispatchResponse for E {
    fn request_schema() -> Option<&'static EntitySchema> {
        Some(E::schema())
    }

    fn from_body(mapper: &ResourceMapper, body: &[u8]) -> Result<Self> {
        if is_blank(body) {
            return Err(BillingError::mapping(E::schema().root, "empty response body"));
        }
        mapper.from_wire(body)
    }
}

/// A missing list is an empty list.
impl<E: Entity> DispatchResponse for ResourceList<E> {
    fn request_schema() -> Option<&'static EntitySchema> {
        Some(E::schema())
    }

    fn from_body(mapper: &ResourceMapper, body: &[u8]) -> Result<Self> {
        if is_blank(body) {
            return Ok(Self::empty());
        }
        mapper.from_wire_list(body)
    }

    fn on_not_found(_path: &str) -> Result<Self> {
        Ok(Self::empty())
    }
}

impl DispatchResponse for () {
    fn request_schema() -> Option<&'static EntitySchema> {
        None
    }

    fn from_body(_mapper: &ResourceMapper, _body: &[u8]) -> Result<Self> {
        Ok(())
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mapper::WireFormat,
        model::{Coupon, Plans},
    };

    #[test]
    fn test_not_found_asymmetry() {
        assert!(matches!(Coupon::on_not_found("/coupons/GONE"), Err(BillingError::NotFound(p)) if p == "/coupons/GONE"));
        assert!(Plans::on_not_found("/plans").unwrap().is_empty());
        assert!(<()>::on_not_found("/plans/gold").unwrap_err().is_not_found());
    }

    #[test]
    fn test_blank_bodies() {
        let mapper = ResourceMapper::new(WireFormat::Xml);
        assert!(Plans::from_body(&mapper, b"  \n").unwrap().is_empty());
        assert!(Coupon::from_body(&mapper, b"").unwrap_err().is_mapping());
        <()>::from_body(&mapper, b"<ignored/>").unwrap();
    }

    #[test]
    fn test_request_schema() {
        assert_eq!(Coupon::request_schema().map(|s| s.root), Some("coupon"));
        assert_eq!(Plans::request_schema().map(|s| s.root), Some("plan"));
        assert!(<()>::request_schema().is_none());
    }
}
