//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::Storage;
use crate::services::{CartService, CatalogService, FavoritesService, FlashSaleService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the services built over one [`Storage`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    catalog: CatalogService,
    cart: CartService,
    favorites: FavoritesService,
    flash_sales: FlashSaleService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Every service gets `config.operation_timeout` as its per-operation
    /// deadline.
    #[must_use]
    pub fn new(config: StorefrontConfig, storage: Storage) -> Self {
        let budget = config.operation_timeout;
        let Storage {
            catalog,
            carts,
            favorites,
            flash_sales,
            pool,
        } = storage;

        let inner = AppStateInner {
            catalog: CatalogService::new(catalog.clone(), budget),
            cart: CartService::new(catalog.clone(), carts, budget),
            favorites: FavoritesService::new(catalog.clone(), favorites, budget),
            flash_sales: FlashSaleService::new(
                catalog,
                flash_sales,
                budget,
                config.flash_sale_cache_ttl,
            ),
            pool,
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The database pool, when running on `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn favorites(&self) -> &FavoritesService {
        &self.inner.favorites
    }

    #[must_use]
    pub fn flash_sales(&self) -> &FlashSaleService {
        &self.inner.flash_sales
    }
}
