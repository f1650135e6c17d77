// src/extractor.rs

use axum::http::{HeaderName, HeaderValue};
use axum_extra::headers::{self, Header};
use once_cell::sync::Lazy;
use uuid::Uuid;

static X_WISHLIST_ID: Lazy<HeaderName> = Lazy::new(|| HeaderName::from_static("x-wishlist-id"));

/// Session key of the shopper's wishlist, sent by the storefront with every
/// wishlist request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XWishlistId(pub Uuid);

impl Header for XWishlistId {
    fn name() -> &'static HeaderName {
        &X_WISHLIST_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let raw = value.to_str().map_err(|_| headers::Error::invalid())?;
        let uuid = Uuid::parse_str(raw.trim()).map_err(|_| headers::Error::invalid())?;
        Ok(XWishlistId(uuid))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        // A hyphenated UUID is always a valid header value.
        let value = HeaderValue::from_str(&self.0.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static(""));
        values.extend(std::iter::once(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_uuid_header() {
        let id = Uuid::new_v4();
        let value = HeaderValue::from_str(&id.to_string()).unwrap();
        let decoded = XWishlistId::decode(&mut std::iter::once(&value)).unwrap();
        assert_eq!(decoded, XWishlistId(id));
    }

    #[test]
    fn rejects_garbage() {
        let value = HeaderValue::from_static("not-a-uuid");
        assert!(XWishlistId::decode(&mut std::iter::once(&value)).is_err());
    }

    #[test]
    fn encode_round_trips_through_decode() {
        let id = XWishlistId(Uuid::new_v4());
        let mut values = Vec::new();
        id.encode(&mut values);
        assert_eq!(XWishlistId::decode(&mut values.iter()).unwrap(), id);
    }
}
