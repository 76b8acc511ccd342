//! Favorites service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use oceanfood_core::{ProductId, UserId};
use tracing::instrument;

use super::{Deadline, OnMissing, load_document, update_document};
use crate::db::{CatalogStore, DocumentStore};
use crate::error::AppError;
use crate::models::{Favorite, ProductView};

const FAVORITES: &str = "Favorites";

/// Per-user favorite product sets.
#[derive(Clone)]
pub struct FavoritesService {
    catalog: Arc<dyn CatalogStore>,
    favorites: Arc<dyn DocumentStore<Favorite>>,
    budget: Duration,
}

impl FavoritesService {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        favorites: Arc<dyn DocumentStore<Favorite>>,
        budget: Duration,
    ) -> Self {
        Self {
            catalog,
            favorites,
            budget,
        }
    }

    /// The user's favorite products in the order they were added.
    ///
    /// Creates an empty set on first access. Products that have left the
    /// catalog are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or the deadline passes.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn get(&self, user: &UserId) -> Result<Vec<ProductView>, AppError> {
        let deadline = Deadline::after(self.budget);
        let favorite =
            load_document(self.favorites.as_ref(), user, OnMissing::Create, deadline).await?;
        self.resolve(&favorite, deadline).await
    }

    /// Add a product. Adding one that is already there changes nothing.
    ///
    /// # Errors
    ///
    /// `NotFound` if the product does not exist.
    #[instrument(skip_all, fields(user = %user, product = %product))]
    pub async fn add(&self, user: &UserId, product: ProductId) -> Result<Vec<ProductView>, AppError> {
        let deadline = Deadline::after(self.budget);
        deadline
            .run(self.catalog.get_product(product))
            .await?
            .ok_or_else(|| AppError::NotFound("Product".into()))?;

        let favorite = update_document(
            self.favorites.as_ref(),
            user,
            OnMissing::Create,
            deadline,
            |favorite: &mut Favorite| Ok(favorite.add(product)),
        )
        .await?;
        self.resolve(&favorite, deadline).await
    }

    /// Remove a product. Removing one that is not there changes nothing.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no favorites record.
    #[instrument(skip_all, fields(user = %user, product = %product))]
    pub async fn remove(
        &self,
        user: &UserId,
        product: ProductId,
    ) -> Result<Vec<ProductView>, AppError> {
        let deadline = Deadline::after(self.budget);
        let favorite = update_document(
            self.favorites.as_ref(),
            user,
            OnMissing::Fail(FAVORITES),
            deadline,
            |favorite: &mut Favorite| Ok(favorite.remove(product)),
        )
        .await?;
        self.resolve(&favorite, deadline).await
    }

    /// Whether `product` is among the user's favorites. Never creates a record.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or the deadline passes.
    #[instrument(skip_all, fields(user = %user, product = %product))]
    pub async fn is_favorite(&self, user: &UserId, product: ProductId) -> Result<bool, AppError> {
        let deadline = Deadline::after(self.budget);
        let favorite = deadline.run(self.favorites.find(user)).await?;
        Ok(favorite.is_some_and(|f| f.contains(product)))
    }

    /// Empty the set.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no favorites record.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn clear(&self, user: &UserId) -> Result<Vec<ProductView>, AppError> {
        let deadline = Deadline::after(self.budget);
        update_document(
            self.favorites.as_ref(),
            user,
            OnMissing::Fail(FAVORITES),
            deadline,
            |favorite: &mut Favorite| Ok(favorite.clear()),
        )
        .await?;
        Ok(Vec::new())
    }

    /// Number of favorite products.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no favorites record.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn count(&self, user: &UserId) -> Result<usize, AppError> {
        let deadline = Deadline::after(self.budget);
        let favorite = load_document(
            self.favorites.as_ref(),
            user,
            OnMissing::Fail(FAVORITES),
            deadline,
        )
        .await?;
        Ok(favorite.product_ids.len())
    }

    async fn resolve(
        &self,
        favorite: &Favorite,
        deadline: Deadline,
    ) -> Result<Vec<ProductView>, AppError> {
        let products = deadline
            .run(self.catalog.get_products(&favorite.product_ids))
            .await?;
        let mut by_id: HashMap<ProductId, _> = products.into_iter().map(|p| (p.id, p)).collect();
        Ok(favorite
            .product_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(ProductView::from)
            .collect())
    }
}
