//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Product listing, filtering and lookup
//! - `cart` - Per-user carts with quantity merge and price snapshots
//! - `favorites` - Per-user favorite product sets
//! - `flash_sale` - Time-boxed discount associations
//!
//! Cart and favorites mutations are read, edit in memory, then a single
//! version-checked replace. A version mismatch re-reads and retries, so
//! concurrent writers for one user never lose each other's updates.
//!
//! Every operation runs under a [`Deadline`]. Reads are cancelled when it
//! passes; the deadline is checked once more before the final write, and the
//! write itself is never interrupted, so an operation either applies fully or
//! not at all.

pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod flash_sale;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use favorites::FavoritesService;
pub use flash_sale::FlashSaleService;

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use oceanfood_core::UserId;
use tokio::time::Instant;

use crate::db::{DocumentStore, RepositoryError, UserDocument};
use crate::error::AppError;

/// Attempts at a read-modify-write before giving up with a conflict.
pub const MAX_WRITE_ATTEMPTS: usize = 128;

/// The point in time an operation must finish by.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Instant);

impl Deadline {
    /// A deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    /// Run a read under the deadline.
    ///
    /// # Errors
    ///
    /// `AppError::Timeout` if the deadline passes first, otherwise the
    /// future's own error.
    pub async fn run<T, E>(self, fut: impl Future<Output = Result<T, E>>) -> Result<T, AppError>
    where
        AppError: From<E>,
    {
        match tokio::time::timeout_at(self.0, fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::Timeout),
        }
    }

    /// Fail if the deadline has passed.
    ///
    /// # Errors
    ///
    /// `AppError::Timeout` once the deadline is reached.
    pub fn check(self) -> Result<(), AppError> {
        if Instant::now() >= self.0 {
            return Err(AppError::Timeout);
        }
        Ok(())
    }
}

/// What to do when a user has no document yet.
#[derive(Debug, Clone, Copy)]
pub enum OnMissing {
    /// Lazily create an empty one.
    Create,
    /// Report `NotFound` with this label.
    Fail(&'static str),
}

/// Load a user's document, creating it if allowed.
///
/// # Errors
///
/// `NotFound` when absent and `on_missing` is `Fail`; store errors otherwise.
pub async fn load_document<D: UserDocument>(
    store: &dyn DocumentStore<D>,
    user: &UserId,
    on_missing: OnMissing,
    deadline: Deadline,
) -> Result<D, AppError> {
    if let Some(doc) = deadline.run(store.find(user)).await? {
        return Ok(doc);
    }
    match on_missing {
        OnMissing::Fail(what) => Err(AppError::NotFound(what.to_owned())),
        OnMissing::Create => {
            deadline.check()?;
            Ok(store
                .insert_if_absent(D::empty(user.clone(), Utc::now()))
                .await?)
        }
    }
}

/// Apply `edit` to a user's document under optimistic concurrency.
///
/// `edit` returns whether it changed the document; unchanged documents are
/// not written. It may run more than once, always against a fresh read.
///
/// # Errors
///
/// Whatever `edit` returns, `NotFound` per `on_missing`, `Conflict` after
/// [`MAX_WRITE_ATTEMPTS`] lost races, `Timeout` past the deadline.
pub async fn update_document<D, F>(
    store: &dyn DocumentStore<D>,
    user: &UserId,
    on_missing: OnMissing,
    deadline: Deadline,
    mut edit: F,
) -> Result<D, AppError>
where
    D: UserDocument,
    F: FnMut(&mut D) -> Result<bool, AppError> + Send,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let mut doc = load_document(store, user, on_missing, deadline).await?;
        let version = doc.version();
        if !edit(&mut doc)? {
            return Ok(doc);
        }

        deadline.check()?;
        match store.replace(doc, version).await {
            Ok(saved) => return Ok(saved),
            Err(RepositoryError::Conflict(reason)) => {
                tracing::debug!(%user, attempt, %reason, "Write conflict, retrying");
                tokio::task::yield_now().await;
            }
            // Deleted between read and write; treat like any other missing doc.
            Err(RepositoryError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
    }

    tracing::warn!(%user, attempts = MAX_WRITE_ATTEMPTS, "Giving up after repeated write conflicts");
    Err(AppError::Conflict(format!(
        "document for user {user} changed {MAX_WRITE_ATTEMPTS} times during update"
    )))
}

/// Parse a user ID from a path segment.
///
/// # Errors
///
/// `BadRequest` if empty or too long.
pub fn parse_user(raw: &str) -> Result<UserId, AppError> {
    UserId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use oceanfood_core::{Price, ProductId};

    use super::*;
    use crate::db::memory::MemoryDocumentStore;
    use crate::models::Cart;

    fn user() -> UserId {
        UserId::parse("u1").unwrap()
    }

    #[tokio::test]
    async fn test_unchanged_edit_skips_write() {
        let store = MemoryDocumentStore::<Cart>::default();
        let deadline = Deadline::after(Duration::from_secs(5));
        let cart = update_document(&store, &user(), OnMissing::Create, deadline, |_| Ok(false))
            .await
            .unwrap();
        assert_eq!(cart.version, 0);
    }

    #[tokio::test]
    async fn test_missing_document_fails_when_not_created() {
        let store = MemoryDocumentStore::<Cart>::default();
        let deadline = Deadline::after(Duration::from_secs(5));
        let result =
            update_document(&store, &user(), OnMissing::Fail("Cart"), deadline, |_| Ok(true)).await;
        assert!(matches!(result, Err(AppError::NotFound(what)) if what == "Cart"));
        assert!(store.find(&user()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_edit_error_leaves_document_untouched() {
        let store = MemoryDocumentStore::<Cart>::default();
        let deadline = Deadline::after(Duration::from_secs(5));
        let result = update_document(&store, &user(), OnMissing::Create, deadline, |cart: &mut Cart| {
            cart.add_product(ProductId::generate(), 1, Price::ZERO);
            Err(AppError::BadRequest("nope".into()))
        })
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(store.find(&user()).await.unwrap().unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_expired_deadline_writes_nothing() {
        let store = MemoryDocumentStore::<Cart>::default();
        let deadline = Deadline::after(Duration::ZERO);
        let result = update_document(&store, &user(), OnMissing::Create, deadline, |cart: &mut Cart| {
            cart.add_product(ProductId::generate(), 1, Price::ZERO);
            Ok(true)
        })
        .await;
        assert!(matches!(result, Err(AppError::Timeout)));
        assert!(store.find(&user()).await.unwrap().is_none());
    }
}
