//! Cart service.
//!
//! Carts are created lazily by `get` and `add_item`; every other mutation
//! requires an existing cart. Every call returns the cart with its products
//! resolved.

use std::sync::Arc;
use std::time::Duration;

use oceanfood_core::{CartItemId, ProductId, UserId};
use tracing::{info, instrument};

use super::{Deadline, OnMissing, load_document, update_document};
use crate::catalog::effective_price;
use crate::db::{CatalogStore, DocumentStore};
use crate::error::AppError;
use crate::models::{Cart, CartView};

const CART: &str = "Cart";
const CART_ITEM: &str = "Cart item";
const PRODUCT: &str = "Product";

/// A requested line quantity, `0` meaning "remove the line".
fn line_quantity(quantity: i64) -> Result<u32, AppError> {
    u32::try_from(quantity).map_err(|_| {
        AppError::BadRequest(format!("quantity must be between 0 and {}", u32::MAX))
    })
}

/// Per-user cart operations.
#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn CatalogStore>,
    carts: Arc<dyn DocumentStore<Cart>>,
    budget: Duration,
}

impl CartService {
    /// Create a cart service; `budget` bounds each operation.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        carts: Arc<dyn DocumentStore<Cart>>,
        budget: Duration,
    ) -> Self {
        Self {
            catalog,
            carts,
            budget,
        }
    }

    /// The user's cart, created empty on first access.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or the deadline passes.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn get(&self, user: &UserId) -> Result<CartView, AppError> {
        let deadline = Deadline::after(self.budget);
        let cart = load_document(self.carts.as_ref(), user, OnMissing::Create, deadline).await?;
        self.resolve(cart, deadline).await
    }

    /// Add `quantity` units of a product, merging into an existing line.
    ///
    /// A new line snapshots the product's effective price; a merge leaves the
    /// existing snapshot alone.
    ///
    /// # Errors
    ///
    /// `NotFound` if the product does not exist, `BadRequest` if the merged
    /// quantity overflows.
    #[instrument(skip_all, fields(user = %user, product = %product, quantity = quantity))]
    pub async fn add_item(
        &self,
        user: &UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<CartView, AppError> {
        if quantity == 0 {
            return Err(AppError::BadRequest("quantity must be a positive integer".into()));
        }
        let deadline = Deadline::after(self.budget);
        let record = deadline
            .run(self.catalog.get_product(product))
            .await?
            .ok_or_else(|| AppError::NotFound(PRODUCT.into()))?;
        let snapshot = effective_price(&record);

        let cart = update_document(
            self.carts.as_ref(),
            user,
            OnMissing::Create,
            deadline,
            |cart: &mut Cart| {
                if cart.add_product(product, quantity, snapshot) {
                    Ok(true)
                } else {
                    Err(AppError::BadRequest("cart quantity too large".into()))
                }
            },
        )
        .await?;

        info!(quantity, price = %snapshot, "Added to cart");
        self.resolve(cart, deadline).await
    }

    /// Replace a line's quantity; `quantity <= 0` removes the line.
    ///
    /// # Errors
    ///
    /// `BadRequest` above `u32::MAX`, `NotFound` if the cart or the line does
    /// not exist.
    #[instrument(skip_all, fields(user = %user, item = %item, quantity = quantity))]
    pub async fn update_item(
        &self,
        user: &UserId,
        item: CartItemId,
        quantity: i64,
    ) -> Result<CartView, AppError> {
        let quantity = line_quantity(quantity.max(0))?;
        let deadline = Deadline::after(self.budget);
        let cart = update_document(
            self.carts.as_ref(),
            user,
            OnMissing::Fail(CART),
            deadline,
            |cart: &mut Cart| {
                if cart.set_item_quantity(item, quantity) {
                    Ok(true)
                } else {
                    Err(AppError::NotFound(CART_ITEM.into()))
                }
            },
        )
        .await?;
        self.resolve(cart, deadline).await
    }

    /// Remove a line. Removing a line that is not there is a no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` if the cart does not exist.
    #[instrument(skip_all, fields(user = %user, item = %item))]
    pub async fn remove_item(&self, user: &UserId, item: CartItemId) -> Result<CartView, AppError> {
        let deadline = Deadline::after(self.budget);
        let cart = update_document(
            self.carts.as_ref(),
            user,
            OnMissing::Fail(CART),
            deadline,
            |cart: &mut Cart| Ok(cart.remove_item(item)),
        )
        .await?;
        self.resolve(cart, deadline).await
    }

    /// Replace the quantity of the line holding `product`; zero removes it.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a negative quantity, `NotFound` if the cart or the
    /// product's line does not exist.
    #[instrument(skip_all, fields(user = %user, product = %product, quantity = quantity))]
    pub async fn set_quantity_by_product(
        &self,
        user: &UserId,
        product: ProductId,
        quantity: i64,
    ) -> Result<CartView, AppError> {
        let quantity = line_quantity(quantity)?;
        let deadline = Deadline::after(self.budget);
        let cart = update_document(
            self.carts.as_ref(),
            user,
            OnMissing::Fail(CART),
            deadline,
            |cart: &mut Cart| {
                if cart.set_product_quantity(product, quantity) {
                    Ok(true)
                } else {
                    Err(AppError::NotFound(CART_ITEM.into()))
                }
            },
        )
        .await?;
        self.resolve(cart, deadline).await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// `NotFound` if the cart does not exist.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn clear(&self, user: &UserId) -> Result<CartView, AppError> {
        let deadline = Deadline::after(self.budget);
        let cart = update_document(
            self.carts.as_ref(),
            user,
            OnMissing::Fail(CART),
            deadline,
            |cart: &mut Cart| Ok(cart.clear()),
        )
        .await?;
        info!("Cleared cart");
        self.resolve(cart, deadline).await
    }

    /// Attach current product records to each line.
    async fn resolve(&self, cart: Cart, deadline: Deadline) -> Result<CartView, AppError> {
        let ids: Vec<ProductId> = cart.items.iter().map(|item| item.product).collect();
        let products = deadline.run(self.catalog.get_products(&ids)).await?;
        Ok(CartView::build(cart, products))
    }
}
