//! Effective price resolution.
//!
//! This is the only place the discount rule lives. Listing, filtering, cart
//! snapshots and flash-sale views all call [`effective_price`].

use oceanfood_core::Price;

use crate::models::Product;

/// The price actually charged for `product`.
///
/// `original_price` minus `discount` percent when a discount is set and an
/// original price is present, otherwise the raw `price`.
#[must_use]
pub fn effective_price(product: &Product) -> Price {
    match product.original_price {
        Some(original) if product.discount.is_positive() => {
            original.apply_discount(product.discount)
        }
        _ => product.price,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use oceanfood_core::DiscountPercent;

    use super::*;
    use crate::models::NewProduct;

    fn product(price: u64, original: Option<u64>, discount: u32) -> Product {
        let mut input = NewProduct::new("Tôm hùm", Price::from_units(price));
        input.original_price = original.map(Price::from_units);
        input.discount = DiscountPercent::from_units(discount).unwrap();
        input.into_product(Utc::now())
    }

    #[test]
    fn test_discount_applies_to_original_price() {
        assert_eq!(
            effective_price(&product(90_000, Some(100_000), 30)),
            Price::from_units(70_000)
        );
    }

    #[test]
    fn test_no_discount_uses_price() {
        assert_eq!(
            effective_price(&product(90_000, Some(100_000), 0)),
            Price::from_units(90_000)
        );
    }

    #[test]
    fn test_discount_without_original_uses_price() {
        assert_eq!(
            effective_price(&product(90_000, None, 15)),
            Price::from_units(90_000)
        );
    }

    #[test]
    fn test_full_discount_is_free() {
        assert_eq!(effective_price(&product(90_000, Some(100_000), 100)), Price::ZERO);
    }
}
