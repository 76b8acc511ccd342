//! Flash-sale discount associations.

use chrono::{DateTime, Utc};
use oceanfood_core::{DiscountPercent, FlashSaleId, Price, ProductId};
use serde::Serialize;

use crate::catalog::pricing;
use crate::models::product::Product;

/// A time-boxed discount attached to a product.
///
/// `is_active` is an explicit flag: nothing clears it when `end_date` passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FlashSale {
    pub id: FlashSaleId,
    #[sqlx(rename = "product_id")]
    pub product: ProductId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub discount_percentage: DiscountPercent,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The product fields shown alongside a flash sale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashSaleProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub discount: DiscountPercent,
    pub current_price: Price,
    pub image: String,
    pub categories: Vec<String>,
    pub origin: String,
}

impl From<&Product> for FlashSaleProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            original_price: product.original_price,
            discount: product.discount,
            current_price: pricing::effective_price(product),
            image: product.image.clone(),
            categories: product.categories.clone(),
            origin: product.origin.clone(),
        }
    }
}

/// A flash sale with its product denormalized for listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashSaleView {
    pub id: FlashSaleId,
    /// `None` when the product has since been removed from the catalog.
    pub product: Option<FlashSaleProduct>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub discount_percentage: DiscountPercent,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlashSaleView {
    /// Pair a sale with its (possibly missing) product.
    #[must_use]
    pub fn new(sale: FlashSale, product: Option<&Product>) -> Self {
        Self {
            id: sale.id,
            product: product.map(FlashSaleProduct::from),
            start_date: sale.start_date,
            end_date: sale.end_date,
            discount_percentage: sale.discount_percentage,
            is_active: sale.is_active,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
        }
    }
}
