//! Type-safe money and discount representation using decimal arithmetic.
//!
//! Amounts are plain decimals in the store currency (VND). They serialize as
//! JSON numbers and deserialize from either numbers or numeric strings.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

/// Errors raised when constructing a [`Price`] or [`DiscountPercent`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// Discounts are percentages in `[0, 100]`.
    #[error("discount must be between 0 and 100 (got {0})")]
    DiscountOutOfRange(Decimal),
}

/// A non-negative monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price after taking `discount` percent off.
    ///
    /// ```
    /// use oceanfood_core::{DiscountPercent, Price};
    ///
    /// let original = Price::from_units(200_000);
    /// let discount = DiscountPercent::from_units(10).unwrap();
    /// assert_eq!(original.apply_discount(discount), Price::from_units(180_000));
    /// ```
    #[must_use]
    pub fn apply_discount(self, discount: DiscountPercent) -> Self {
        let factor = Decimal::ONE - discount.0 / Decimal::ONE_HUNDRED;
        Self((self.0 * factor).normalize())
    }

    /// Line total for `quantity` units at this price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self((self.0 * Decimal::from(quantity)).normalize())
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// A discount percentage in the inclusive range `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct DiscountPercent(Decimal);

impl DiscountPercent {
    /// No discount.
    pub const NONE: Self = Self(Decimal::ZERO);

    /// Create a discount, rejecting values outside `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::DiscountOutOfRange`] for out-of-range values.
    pub fn new(percent: Decimal) -> Result<Self, PriceError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(PriceError::DiscountOutOfRange(percent));
        }
        Ok(Self(percent.normalize()))
    }

    /// Create a discount from a whole percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::DiscountOutOfRange`] if `percent` exceeds 100.
    pub fn from_units(percent: u32) -> Result<Self, PriceError> {
        Self::new(Decimal::from(percent))
    }

    /// Get the percentage value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Whether any discount applies.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl TryFrom<Decimal> for DiscountPercent {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for DiscountPercent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    use rust_decimal::Decimal;
    use sqlx::encode::IsNull;
    use sqlx::error::BoxDynError;
    use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
    use sqlx::{Decode, Encode, Postgres, Type};

    use super::{DiscountPercent, Price};

    impl Type<Postgres> for Price {
        fn type_info() -> PgTypeInfo {
            <Decimal as Type<Postgres>>::type_info()
        }

        fn compatible(ty: &PgTypeInfo) -> bool {
            <Decimal as Type<Postgres>>::compatible(ty)
        }
    }

    impl<'r> Decode<'r, Postgres> for Price {
        fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
            let amount = <Decimal as Decode<Postgres>>::decode(value)?;
            Ok(Self::new(amount)?)
        }
    }

    impl Encode<'_, Postgres> for Price {
        fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
            <Decimal as Encode<Postgres>>::encode_by_ref(&self.0, buf)
        }
    }

    impl Type<Postgres> for DiscountPercent {
        fn type_info() -> PgTypeInfo {
            <Decimal as Type<Postgres>>::type_info()
        }

        fn compatible(ty: &PgTypeInfo) -> bool {
            <Decimal as Type<Postgres>>::compatible(ty)
        }
    }

    impl<'r> Decode<'r, Postgres> for DiscountPercent {
        fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
            let percent = <Decimal as Decode<Postgres>>::decode(value)?;
            Ok(Self::new(percent)?)
        }
    }

    impl Encode<'_, Postgres> for DiscountPercent {
        fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
            <Decimal as Encode<Postgres>>::encode_by_ref(&self.0, buf)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_rejects_negative() {
        assert!(Price::new(Decimal::from(-1)).is_err());
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_apply_discount_normalizes() {
        let price = Price::from_units(150_000).apply_discount(DiscountPercent::from_units(20).unwrap());
        assert_eq!(price.to_string(), "120000");
    }

    #[test]
    fn test_discount_bounds() {
        assert!(DiscountPercent::from_units(100).is_ok());
        assert!(DiscountPercent::from_units(101).is_err());
        assert!(DiscountPercent::new(Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_price_serializes_as_number() {
        let json = serde_json::to_value(Price::from_units(500_000)).unwrap();
        assert_eq!(json.as_f64(), Some(500_000.0));
    }

    #[test]
    fn test_price_deserializes_from_number_or_string() {
        let a: Price = serde_json::from_str("250000").unwrap();
        let b: Price = serde_json::from_str("\"250000\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Price>("-3").is_err());
    }

    #[test]
    fn test_sum_and_times() {
        let total: Price = [Price::from_units(10), Price::from_units(5).times(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_units(25));
    }
}
