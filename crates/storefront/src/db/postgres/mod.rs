//! `PostgreSQL` store adapters.
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow`; the
//! schema lives in `crates/storefront/migrations/`.

mod carts;
mod favorites;
mod flash_sales;
mod products;

pub use carts::PgCarts;
pub use favorites::PgFavorites;
pub use flash_sales::PgFlashSales;
pub use products::PgCatalog;

use oceanfood_core::UserId;

use super::RepositoryError;

/// Parse a stored user key, reporting bad rows as corruption.
fn parse_user_id(raw: &str) -> Result<UserId, RepositoryError> {
    UserId::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid user id in database: {e}")))
}
