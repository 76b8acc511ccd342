//! In-memory store adapters.
//!
//! Used by tests and when no database is configured. Each store guards its
//! map with a `tokio::sync::RwLock`; no lock is held across an `.await`
//! outside the store itself.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use oceanfood_core::{FlashSaleId, ProductId, UserId};
use tokio::sync::RwLock;

use super::{CatalogStore, DocumentStore, FlashSaleStore, RepositoryError, UserDocument};
use crate::catalog::ProductFilter;
use crate::models::{FlashSale, NewProduct, Product};

// =============================================================================
// Catalog
// =============================================================================

/// A catalog held in memory.
///
/// The catalog is read-only to the storefront; the inherent methods here exist
/// for seeding and for tests that change a product underneath a cart.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl MemoryCatalog {
    /// Add a product and return the stored record.
    pub async fn insert(&self, product: NewProduct) -> Product {
        let product = product.into_product(Utc::now());
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        product
    }

    /// Add every product in a JSON array of [`NewProduct`]s and return how
    /// many were added.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `json` is not such an array; nothing is
    /// added in that case.
    pub async fn load_json(&self, json: &str) -> Result<usize, serde_json::Error> {
        let now = Utc::now();
        let products: Vec<NewProduct> = serde_json::from_str(json)?;
        let count = products.len();
        self.extend(products.into_iter().map(|p| p.into_product(now)))
            .await;
        Ok(count)
    }

    /// Add many products at once.
    pub async fn extend(&self, products: impl IntoIterator<Item = Product>) {
        let mut map = self.products.write().await;
        for product in products {
            map.insert(product.id, product);
        }
    }

    /// Edit a product in place. Returns `None` if it does not exist.
    pub async fn update(&self, id: ProductId, edit: impl FnOnce(&mut Product)) -> Option<Product> {
        let mut map = self.products.write().await;
        let product = map.get_mut(&id)?;
        edit(product);
        product.updated_at = Utc::now();
        Some(product.clone())
    }

    /// Drop a product. Returns `false` if it did not exist.
    pub async fn remove(&self, id: ProductId) -> bool {
        self.products.write().await.remove(&id).is_some()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let map = self.products.read().await;
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    async fn query_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Per-user documents
// =============================================================================

/// Versioned per-user documents in memory.
#[derive(Debug)]
pub struct MemoryDocumentStore<D> {
    docs: RwLock<HashMap<UserId, D>>,
}

impl<D> Default for MemoryDocumentStore<D> {
    fn default() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<D: UserDocument> DocumentStore<D> for MemoryDocumentStore<D> {
    async fn find(&self, user: &UserId) -> Result<Option<D>, RepositoryError> {
        Ok(self.docs.read().await.get(user).cloned())
    }

    async fn insert_if_absent(&self, doc: D) -> Result<D, RepositoryError> {
        let mut docs = self.docs.write().await;
        Ok(docs.entry(doc.user_id().clone()).or_insert(doc).clone())
    }

    async fn replace(&self, mut doc: D, expected_version: i64) -> Result<D, RepositoryError> {
        let mut docs = self.docs.write().await;
        let stored = docs
            .get_mut(doc.user_id())
            .ok_or(RepositoryError::NotFound)?;
        if stored.version() != expected_version {
            return Err(RepositoryError::Conflict(format!(
                "expected version {expected_version}, found {}",
                stored.version()
            )));
        }
        doc.stamp(expected_version + 1, Utc::now());
        *stored = doc.clone();
        Ok(doc)
    }
}

// =============================================================================
// Flash sales
// =============================================================================

/// Flash-sale associations in memory.
#[derive(Debug, Default)]
pub struct MemoryFlashSales {
    sales: RwLock<HashMap<FlashSaleId, FlashSale>>,
}

#[async_trait]
impl FlashSaleStore for MemoryFlashSales {
    async fn list_active(&self) -> Result<Vec<FlashSale>, RepositoryError> {
        let mut active: Vec<FlashSale> = self
            .sales
            .read()
            .await
            .values()
            .filter(|sale| sale.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(active)
    }

    async fn get(&self, id: FlashSaleId) -> Result<Option<FlashSale>, RepositoryError> {
        Ok(self.sales.read().await.get(&id).cloned())
    }

    async fn insert(&self, sale: &FlashSale) -> Result<(), RepositoryError> {
        let mut sales = self.sales.write().await;
        if sales.contains_key(&sale.id) {
            return Err(RepositoryError::Conflict(format!(
                "flash sale {} already exists",
                sale.id
            )));
        }
        sales.insert(sale.id, sale.clone());
        Ok(())
    }

    async fn update(&self, sale: &FlashSale) -> Result<(), RepositoryError> {
        let mut sales = self.sales.write().await;
        let stored = sales.get_mut(&sale.id).ok_or(RepositoryError::NotFound)?;
        *stored = sale.clone();
        Ok(())
    }

    async fn delete(&self, id: FlashSaleId) -> Result<(), RepositoryError> {
        self.sales
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use oceanfood_core::Price;

    use super::*;
    use crate::models::Cart;

    fn user() -> UserId {
        UserId::parse("u1").unwrap()
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_first() {
        let store = MemoryDocumentStore::<Cart>::default();
        let mut first = Cart::empty(user(), Utc::now());
        first.add_product(ProductId::generate(), 1, Price::ZERO);
        store.insert_if_absent(first.clone()).await.unwrap();

        let second = store
            .insert_if_absent(Cart::empty(user(), Utc::now()))
            .await
            .unwrap();
        assert_eq!(second.items, first.items);
    }

    #[tokio::test]
    async fn test_replace_checks_version() {
        let store = MemoryDocumentStore::<Cart>::default();
        let cart = store
            .insert_if_absent(Cart::empty(user(), Utc::now()))
            .await
            .unwrap();

        let saved = store.replace(cart.clone(), 0).await.unwrap();
        assert_eq!(saved.version, 1);

        let stale = store.replace(cart, 0).await;
        assert!(matches!(stale, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let store = MemoryDocumentStore::<Cart>::default();
        let result = store.replace(Cart::empty(user(), Utc::now()), 0).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_catalog_query_applies_filter() {
        let catalog = MemoryCatalog::default();
        let mut shrimp = NewProduct::new("shrimp", Price::from_units(1));
        shrimp.category = "seafood".into();
        catalog.insert(shrimp).await;
        catalog
            .insert(NewProduct::new("knife", Price::from_units(1)))
            .await;

        let found = catalog
            .query_products(&ProductFilter::in_category("seafood"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "shrimp");
    }

    #[tokio::test]
    async fn test_load_json_seeds_catalog() {
        let catalog = MemoryCatalog::default();
        let count = catalog
            .load_json(r#"[{"name": "Cua hoàng đế", "price": 1200000, "category": "crab"},
                           {"name": "Hàu", "price": 20000}]"#)
            .await
            .unwrap();
        assert_eq!(count, 2);
        let crabs = catalog
            .query_products(&ProductFilter::in_category("crab"))
            .await
            .unwrap();
        assert_eq!(crabs.len(), 1);

        assert!(catalog.load_json(r#"{"name": "x"}"#).await.is_err());
        let all = catalog.query_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
