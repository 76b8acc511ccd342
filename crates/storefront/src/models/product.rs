//! Catalog product records.

use chrono::{DateTime, Utc};
use oceanfood_core::{BrandId, DiscountPercent, Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::pricing;

/// A titled block of product description text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// A catalog product as stored by the catalog.
///
/// The effective (discounted) price is deliberately not a field here: it is
/// derived on every read by [`pricing::effective_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub discount: DiscountPercent,
    pub image: String,
    pub images: Vec<String>,
    #[sqlx(json)]
    pub description: Vec<DescriptionSection>,
    pub origin: String,
    pub commitment: String,
    pub category: String,
    #[serde(rename = "type")]
    pub product_type: String,
    #[sqlx(rename = "brand_id")]
    pub brand: Option<BrandId>,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub weight: Option<Decimal>,
    pub in_stock: bool,
    pub stock_quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    pub review_count: i32,
    pub is_new: bool,
    pub is_featured: bool,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// All description text, titles and bodies, in order.
    pub fn description_text(&self) -> impl Iterator<Item = &str> {
        self.description
            .iter()
            .flat_map(|section| [section.title.as_str(), section.content.as_str()])
    }
}

/// Product as returned by the API: the stored record plus its current price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub current_price: Price,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let current_price = pricing::effective_price(&product);
        Self {
            product,
            current_price,
        }
    }
}

/// Input for adding a product to the catalog (seeding and tests).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub original_price: Option<Price>,
    #[serde(default)]
    pub discount: DiscountPercent,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: Vec<DescriptionSection>,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub commitment: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub brand: Option<BrandId>,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub review_count: i32,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_unit() -> String {
    "kg".to_owned()
}

const fn default_true() -> bool {
    true
}

impl NewProduct {
    /// A minimal in-stock product with the given name and price.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            price,
            original_price: None,
            discount: DiscountPercent::NONE,
            image: String::new(),
            images: Vec::new(),
            description: Vec::new(),
            origin: String::new(),
            commitment: String::new(),
            category: String::new(),
            product_type: String::new(),
            brand: None,
            unit: default_unit(),
            weight: None,
            in_stock: true,
            stock_quantity: 0,
            rating: Decimal::ZERO,
            review_count: 0,
            is_new: false,
            is_featured: false,
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Materialize the record with a fresh ID and the given creation time.
    #[must_use]
    pub fn into_product(self, created_at: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::generate(),
            name: self.name.trim().to_owned(),
            price: self.price,
            original_price: self.original_price,
            discount: self.discount,
            image: self.image,
            images: self.images,
            description: self.description,
            origin: self.origin.trim().to_owned(),
            commitment: self.commitment.trim().to_owned(),
            category: self.category,
            product_type: self.product_type,
            brand: self.brand,
            unit: self.unit,
            weight: self.weight,
            in_stock: self.in_stock,
            stock_quantity: self.stock_quantity,
            rating: self.rating,
            review_count: self.review_count,
            is_new: self.is_new,
            is_featured: self.is_featured,
            categories: self.categories,
            tags: self.tags,
            created_at,
            updated_at: created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_view_carries_current_price() {
        let mut input = NewProduct::new("Cua hoàng đế", Price::from_units(900_000));
        input.original_price = Some(Price::from_units(1_000_000));
        input.discount = DiscountPercent::from_units(25).unwrap();
        let view = ProductView::from(input.into_product(Utc::now()));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["currentPrice"].as_f64(), Some(750_000.0));
        assert_eq!(json["price"].as_f64(), Some(900_000.0));
        assert_eq!(json["type"], "");
    }

    #[test]
    fn test_new_product_defaults_from_json() {
        let input: NewProduct =
            serde_json::from_str(r#"{"name": "Mực một nắng", "price": 350000}"#).unwrap();
        assert!(input.in_stock);
        assert_eq!(input.unit, "kg");
        assert_eq!(input.discount, DiscountPercent::NONE);
    }
}
