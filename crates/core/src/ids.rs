//! Typed Ids
//!
//! Numeric identifiers as issued by the backend, wrapped so that a product id
//! cannot be passed where a seller id is expected.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A numeric id tagged with the record type it identifies.
pub struct TypedId<T>(u64, PhantomData<T>);

impl<T> TypedId<T> {
    /// Wrap a raw backend id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id, PhantomData)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl<T> Clone for TypedId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedId<T> {}

impl<T> Debug for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedId<T> {}

impl<T> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<u64> for TypedId<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<T> From<TypedId<T>> for u64 {
    fn from(value: TypedId<T>) -> Self {
        value.as_u64()
    }
}

impl<T> Serialize for TypedId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for TypedId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::new)
    }
}

/// Marker for product records.
#[derive(Debug)]
pub enum ProductRecord {}

/// Marker for seller records.
#[derive(Debug)]
pub enum SellerRecord {}

/// Marker for order records.
#[derive(Debug)]
pub enum OrderRecord {}

/// Marker for delivery-district records.
#[derive(Debug)]
pub enum DistrictRecord {}

/// Product id.
pub type ProductId = TypedId<ProductRecord>;

/// Seller id.
pub type SellerId = TypedId<SellerRecord>;

/// Order id.
pub type OrderId = TypedId<OrderRecord>;

/// Delivery-district id.
pub type DistrictId = TypedId<DistrictRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_with_equal_values_are_equal() {
        assert_eq!(ProductId::new(7), ProductId::new(7));
        assert!(ProductId::new(7) != ProductId::new(8), "distinct raw values");
    }

    #[test]
    fn serializes_as_bare_number() -> testresult::TestResult {
        let value = serde_json::to_value(SellerId::new(42))?;

        assert_eq!(value, serde_json::json!(42));

        Ok(())
    }

    #[test]
    fn deserializes_from_bare_number() -> testresult::TestResult {
        let id: SellerId = serde_json::from_value(serde_json::json!(42))?;

        assert_eq!(id, SellerId::new(42));

        Ok(())
    }
}
