//! Persistence ports and their adapters.
//!
//! # Stores
//!
//! - [`CatalogStore`] - read-only product catalog
//! - [`DocumentStore`] - one versioned document per user (carts, favorites)
//! - [`FlashSaleStore`] - flash-sale associations
//!
//! Two adapters implement every port: [`memory`] (tests and database-less
//! runs) and [`postgres`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p oceanfood-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oceanfood_core::{FlashSaleId, ProductId, UserId};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::catalog::ProductFilter;
use crate::models::{Cart, Favorite, FlashSale, Product};

/// Errors that can occur during persistence operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Version check failed or a constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Ports
// =============================================================================

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch one product.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Fetch the products that exist among `ids`, in no particular order.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Candidate products for `filter`.
    ///
    /// Adapters may push down as much of the filter as they can; callers
    /// re-apply [`ProductFilter::matches`] to the result.
    async fn query_products(&self, filter: &ProductFilter)
    -> Result<Vec<Product>, RepositoryError>;
}

/// A document stored once per user under optimistic concurrency.
pub trait UserDocument: Clone + Send + Sync + 'static {
    /// A fresh, empty document at version 0.
    fn empty(user_id: UserId, now: DateTime<Utc>) -> Self;

    fn user_id(&self) -> &UserId;

    /// Version the document was read at.
    fn version(&self) -> i64;

    /// Record a successful write.
    fn stamp(&mut self, version: i64, at: DateTime<Utc>);
}

/// Per-user versioned documents.
#[async_trait]
pub trait DocumentStore<D: UserDocument>: Send + Sync {
    /// Load the document for `user`.
    async fn find(&self, user: &UserId) -> Result<Option<D>, RepositoryError>;

    /// Store `doc` unless one already exists for its user, then return the
    /// stored document (the existing one if another writer got there first).
    async fn insert_if_absent(&self, doc: D) -> Result<D, RepositoryError>;

    /// Replace the stored document if it is still at `expected_version`.
    ///
    /// Returns the stored document with its new version.
    ///
    /// # Errors
    ///
    /// `RepositoryError::Conflict` when the stored version differs, and
    /// `RepositoryError::NotFound` when there is no document.
    async fn replace(&self, doc: D, expected_version: i64) -> Result<D, RepositoryError>;
}

/// Flash-sale association storage.
#[async_trait]
pub trait FlashSaleStore: Send + Sync {
    /// Associations flagged active, newest first.
    async fn list_active(&self) -> Result<Vec<FlashSale>, RepositoryError>;

    async fn get(&self, id: FlashSaleId) -> Result<Option<FlashSale>, RepositoryError>;

    async fn insert(&self, sale: &FlashSale) -> Result<(), RepositoryError>;

    /// Overwrite an association.
    ///
    /// # Errors
    ///
    /// `RepositoryError::NotFound` if `sale.id` is unknown.
    async fn update(&self, sale: &FlashSale) -> Result<(), RepositoryError>;

    /// # Errors
    ///
    /// `RepositoryError::NotFound` if `id` is unknown.
    async fn delete(&self, id: FlashSaleId) -> Result<(), RepositoryError>;
}

// =============================================================================
// Storage bundle
// =============================================================================

/// The set of stores a running service uses.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn CatalogStore>,
    pub carts: Arc<dyn DocumentStore<Cart>>,
    pub favorites: Arc<dyn DocumentStore<Favorite>>,
    pub flash_sales: Arc<dyn FlashSaleStore>,
    /// Present when backed by `PostgreSQL`; used for readiness checks.
    pub pool: Option<PgPool>,
}

impl Storage {
    /// In-memory stores over the given catalog.
    #[must_use]
    pub fn in_memory(catalog: Arc<memory::MemoryCatalog>) -> Self {
        Self {
            catalog,
            carts: Arc::new(memory::MemoryDocumentStore::<Cart>::default()),
            favorites: Arc::new(memory::MemoryDocumentStore::<Favorite>::default()),
            flash_sales: Arc::new(memory::MemoryFlashSales::default()),
            pool: None,
        }
    }

    /// `PostgreSQL`-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            catalog: Arc::new(postgres::PgCatalog::new(pool.clone())),
            carts: Arc::new(postgres::PgCarts::new(pool.clone())),
            favorites: Arc::new(postgres::PgFavorites::new(pool.clone())),
            flash_sales: Arc::new(postgres::PgFlashSales::new(pool.clone())),
            pool: Some(pool),
        }
    }
}
