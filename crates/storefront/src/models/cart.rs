//! Per-user cart documents.
//!
//! A cart holds at most one line per product. Each line carries the price
//! captured when the product was first added; merges and quantity edits never
//! touch it, and later catalog price changes are not reflected.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use oceanfood_core::{CartItemId, Price, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::db::UserDocument;
use crate::models::product::{Product, ProductView};

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product: ProductId,
    pub quantity: u32,
    /// Price snapshot taken when the line was created.
    pub price: Price,
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Add `quantity` of a product.
    ///
    /// Merges into the existing line for the product if there is one (the
    /// snapshot is left alone), otherwise appends a line priced at `snapshot`.
    /// Returns `false` if the merged quantity would overflow.
    pub fn add_product(&mut self, product: ProductId, quantity: u32, snapshot: Price) -> bool {
        if let Some(item) = self.items.iter_mut().find(|item| item.product == product) {
            let Some(merged) = item.quantity.checked_add(quantity) else {
                return false;
            };
            item.quantity = merged;
        } else {
            self.items.push(CartItem {
                id: CartItemId::generate(),
                product,
                quantity,
                price: snapshot,
            });
        }
        true
    }

    /// Replace the quantity of a line, deleting it at zero.
    ///
    /// Returns `false` if no line has the given ID.
    pub fn set_item_quantity(&mut self, item_id: CartItemId, quantity: u32) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id == item_id) else {
            return false;
        };
        self.apply_quantity(index, quantity);
        true
    }

    /// Replace the quantity of the line for `product`, deleting it at zero.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_product_quantity(&mut self, product: ProductId, quantity: u32) -> bool {
        let Some(index) = self.items.iter().position(|item| item.product == product) else {
            return false;
        };
        self.apply_quantity(index, quantity);
        true
    }

    /// Remove a line. Returns `false` if it was not present.
    pub fn remove_item(&mut self, item_id: CartItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        self.items.len() != before
    }

    /// Remove every line. Returns `false` if the cart was already empty.
    pub fn clear(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        changed
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    fn apply_quantity(&mut self, index: usize, quantity: u32) {
        if quantity == 0 {
            self.items.remove(index);
        } else if let Some(item) = self.items.get_mut(index) {
            item.quantity = quantity;
        }
    }
}

impl UserDocument for Cart {
    fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn stamp(&mut self, version: i64, at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = at;
    }
}

/// A cart line with its product resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub id: CartItemId,
    /// `None` when the product has since been removed from the catalog.
    pub product: Option<ProductView>,
    pub quantity: u32,
    pub price: Price,
    pub line_total: Price,
}

/// A cart with every line's product resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub user_id: UserId,
    pub items: Vec<CartLineView>,
    pub total_quantity: u64,
    pub subtotal: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartView {
    /// Denormalize `cart` against the products fetched for its lines.
    ///
    /// Subtotal is computed from the snapshots, not the catalog.
    #[must_use]
    pub fn build(cart: Cart, products: Vec<Product>) -> Self {
        let mut by_id: HashMap<ProductId, Product> =
            products.into_iter().map(|p| (p.id, p)).collect();

        let total_quantity = cart.total_quantity();
        let items: Vec<CartLineView> = cart
            .items
            .into_iter()
            .map(|item| CartLineView {
                id: item.id,
                product: by_id.remove(&item.product).map(ProductView::from),
                quantity: item.quantity,
                price: item.price,
                line_total: item.price.times(item.quantity),
            })
            .collect();
        let subtotal = items.iter().map(|line| line.line_total).sum();

        Self {
            user_id: cart.user_id,
            items,
            total_quantity,
            subtotal,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}
