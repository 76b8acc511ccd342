//! Flash-sale service.
//!
//! The active listing is cached with `moka` and invalidated on every write.
//! Writes also bump a generation counter; a listing read that overlaps a
//! write drops its result from the cache instead of keeping it for the TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use moka::future::Cache;
use oceanfood_core::{DiscountPercent, FlashSaleId, ProductId};
use tracing::{debug, info, instrument};

use super::Deadline;
use crate::db::{CatalogStore, FlashSaleStore, RepositoryError};
use crate::error::AppError;
use crate::models::{FlashSale, FlashSaleView};

const FLASH_SALE: &str = "Flash sale";

/// Input for creating a flash sale.
#[derive(Debug, Clone)]
pub struct NewFlashSale {
    pub product: ProductId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub discount_percentage: DiscountPercent,
}

/// Partial update of a flash sale; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct FlashSaleChanges {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub discount_percentage: Option<DiscountPercent>,
    pub is_active: Option<bool>,
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
///
/// # Errors
///
/// `BadRequest` naming `field` if neither form parses.
pub fn parse_date(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| AppError::BadRequest(format!("{field} is not a valid date: {raw}")))
}

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if end < start {
        return Err(AppError::BadRequest(
            "endDate must not be earlier than startDate".into(),
        ));
    }
    Ok(())
}

/// Flash-sale associations with a cached active listing.
#[derive(Clone)]
pub struct FlashSaleService {
    catalog: Arc<dyn CatalogStore>,
    sales: Arc<dyn FlashSaleStore>,
    budget: Duration,
    active: Option<Cache<(), Arc<Vec<FlashSaleView>>>>,
    generation: Arc<AtomicU64>,
}

impl FlashSaleService {
    /// Create the service. A zero `cache_ttl` disables caching.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        sales: Arc<dyn FlashSaleStore>,
        budget: Duration,
        cache_ttl: Duration,
    ) -> Self {
        let active = (!cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1)
                .time_to_live(cache_ttl)
                .build()
        });
        Self {
            catalog,
            sales,
            budget,
            active,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Associations flagged active, with their products.
    ///
    /// Only the `is_active` flag is consulted; an association whose end date
    /// has passed stays listed until it is deactivated.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or the deadline passes.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Arc<Vec<FlashSaleView>>, AppError> {
        if let Some(cached) = self.cached().await {
            debug!("Cache hit for active flash sales");
            return Ok(cached);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let deadline = Deadline::after(self.budget);
        let sales = deadline.run(self.sales.list_active()).await?;
        let ids: Vec<ProductId> = sales.iter().map(|sale| sale.product).collect();
        let products: HashMap<_, _> = deadline
            .run(self.catalog.get_products(&ids))
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let views: Arc<Vec<FlashSaleView>> = Arc::new(
            sales
                .into_iter()
                .map(|sale| {
                    let product = products.get(&sale.product);
                    FlashSaleView::new(sale, product)
                })
                .collect(),
        );

        if let Some(cache) = &self.active {
            cache.insert((), views.clone()).await;
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!("Flash sales changed during listing, not caching");
                cache.invalidate(&()).await;
            }
        }
        Ok(views)
    }

    /// Attach a discount window to a product.
    ///
    /// # Errors
    ///
    /// `NotFound` if the product does not exist, `BadRequest` if the window
    /// ends before it starts.
    #[instrument(skip(self), fields(product = %input.product))]
    pub async fn create(&self, input: NewFlashSale) -> Result<FlashSaleView, AppError> {
        check_window(input.start_date, input.end_date)?;
        let deadline = Deadline::after(self.budget);
        let product = deadline
            .run(self.catalog.get_product(input.product))
            .await?
            .ok_or_else(|| AppError::NotFound("Product".into()))?;

        let now = Utc::now();
        let sale = FlashSale {
            id: FlashSaleId::generate(),
            product: input.product,
            start_date: input.start_date,
            end_date: input.end_date,
            discount_percentage: input.discount_percentage,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        deadline.check()?;
        self.sales.insert(&sale).await?;
        self.invalidate().await;

        info!(flash_sale = %sale.id, discount = %sale.discount_percentage, "Created flash sale");
        Ok(FlashSaleView::new(sale, Some(&product)))
    }

    /// Change the window, discount or active flag of an association.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` does not exist, `BadRequest` if the resulting
    /// window ends before it starts.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: FlashSaleId,
        changes: FlashSaleChanges,
    ) -> Result<FlashSaleView, AppError> {
        let deadline = Deadline::after(self.budget);
        let mut sale = deadline
            .run(self.sales.get(id))
            .await?
            .ok_or_else(|| AppError::NotFound(FLASH_SALE.into()))?;

        if let Some(start) = changes.start_date {
            sale.start_date = start;
        }
        if let Some(end) = changes.end_date {
            sale.end_date = end;
        }
        if let Some(discount) = changes.discount_percentage {
            sale.discount_percentage = discount;
        }
        if let Some(active) = changes.is_active {
            sale.is_active = active;
        }
        check_window(sale.start_date, sale.end_date)?;
        sale.updated_at = Utc::now();

        let product = deadline.run(self.catalog.get_product(sale.product)).await?;
        deadline.check()?;
        self.sales.update(&sale).await.map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(FLASH_SALE.into()),
            other => other.into(),
        })?;
        self.invalidate().await;

        info!(is_active = sale.is_active, "Updated flash sale");
        Ok(FlashSaleView::new(sale, product.as_ref()))
    }

    /// Delete an association.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: FlashSaleId) -> Result<(), AppError> {
        Deadline::after(self.budget).check()?;
        self.sales.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(FLASH_SALE.into()),
            other => other.into(),
        })?;
        self.invalidate().await;
        info!("Deleted flash sale");
        Ok(())
    }

    async fn cached(&self) -> Option<Arc<Vec<FlashSaleView>>> {
        match &self.active {
            Some(cache) => cache.get(&()).await,
            None => None,
        }
    }

    async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(cache) = &self.active {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use oceanfood_core::Price;
    use tokio::sync::Notify;

    use super::*;
    use crate::db::memory::{MemoryCatalog, MemoryFlashSales};
    use crate::models::NewProduct;

    /// Holds the next `list_active` after its read until released.
    #[derive(Default)]
    struct PausedListing {
        inner: MemoryFlashSales,
        armed: AtomicBool,
        read_done: Notify,
        release: Notify,
    }

    #[async_trait]
    impl FlashSaleStore for PausedListing {
        async fn list_active(&self) -> Result<Vec<FlashSale>, RepositoryError> {
            let sales = self.inner.list_active().await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.read_done.notify_one();
                self.release.notified().await;
            }
            Ok(sales)
        }

        async fn get(&self, id: FlashSaleId) -> Result<Option<FlashSale>, RepositoryError> {
            self.inner.get(id).await
        }

        async fn insert(&self, sale: &FlashSale) -> Result<(), RepositoryError> {
            self.inner.insert(sale).await
        }

        async fn update(&self, sale: &FlashSale) -> Result<(), RepositoryError> {
            self.inner.update(sale).await
        }

        async fn delete(&self, id: FlashSaleId) -> Result<(), RepositoryError> {
            self.inner.delete(id).await
        }
    }

    fn service(catalog: Arc<MemoryCatalog>, ttl: Duration) -> FlashSaleService {
        FlashSaleService::new(
            catalog,
            Arc::new(MemoryFlashSales::default()),
            Duration::from_secs(5),
            ttl,
        )
    }

    fn sale_for(product: ProductId, percent: u32) -> NewFlashSale {
        let start = Utc::now();
        NewFlashSale {
            product,
            start_date: start,
            end_date: start + ChronoDuration::days(1),
            discount_percentage: DiscountPercent::from_units(percent).unwrap(),
        }
    }

    #[test]
    fn test_parse_date_forms() {
        let at = parse_date("startDate", "2026-03-01T08:30:00+07:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-01T01:30:00+00:00");
        let day = parse_date("startDate", "2026-03-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert!(matches!(
            parse_date("endDate", "next tuesday"),
            Err(AppError::BadRequest(msg)) if msg.starts_with("endDate")
        ));
    }

    #[tokio::test]
    async fn test_empty_listing_is_ok() {
        let service = service(Arc::default(), Duration::from_secs(30));
        assert!(service.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_lists_with_product() {
        let catalog = Arc::new(MemoryCatalog::default());
        let product = catalog
            .insert(NewProduct::new("Bào ngư", Price::from_units(2_000_000)))
            .await;
        let service = service(catalog, Duration::from_secs(30));

        // Prime the cache so the write has to invalidate it.
        assert!(service.list_active().await.unwrap().is_empty());
        let created = service.create(sale_for(product.id, 30)).await.unwrap();
        assert!(created.is_active);

        let listed = service.list_active().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product.as_ref().unwrap().name, "Bào ngư");
    }

    #[tokio::test]
    async fn test_create_for_missing_product_is_not_found() {
        let service = service(Arc::default(), Duration::ZERO);
        let result = service.create(sale_for(ProductId::generate(), 10)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_inverted_window_is_rejected() {
        let catalog = Arc::new(MemoryCatalog::default());
        let product = catalog.insert(NewProduct::new("x", Price::from_units(1))).await;
        let service = service(catalog, Duration::ZERO);

        let mut input = sale_for(product.id, 10);
        input.end_date = input.start_date - ChronoDuration::hours(1);
        assert!(matches!(service.create(input).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_deactivated_sale_leaves_listing() {
        let catalog = Arc::new(MemoryCatalog::default());
        let product = catalog.insert(NewProduct::new("x", Price::from_units(1))).await;
        let service = service(catalog, Duration::from_secs(30));
        let sale = service.create(sale_for(product.id, 10)).await.unwrap();
        assert_eq!(service.list_active().await.unwrap().len(), 1);

        let changes = FlashSaleChanges {
            is_active: Some(false),
            ..FlashSaleChanges::default()
        };
        service.update(sale.id, changes).await.unwrap();
        assert!(service.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_but_active_sale_is_still_listed() {
        let catalog = Arc::new(MemoryCatalog::default());
        let product = catalog.insert(NewProduct::new("x", Price::from_units(1))).await;
        let service = service(catalog, Duration::ZERO);

        let mut input = sale_for(product.id, 10);
        input.start_date = Utc::now() - ChronoDuration::days(10);
        input.end_date = Utc::now() - ChronoDuration::days(9);
        service.create(input).await.unwrap();

        assert_eq!(service.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_are_not_found() {
        let service = service(Arc::default(), Duration::ZERO);
        let id = FlashSaleId::generate();
        assert!(matches!(
            service.update(id, FlashSaleChanges::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(service.delete(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_changes_discount() {
        let catalog = Arc::new(MemoryCatalog::default());
        let product = catalog.insert(NewProduct::new("x", Price::from_units(1))).await;
        let service = service(catalog, Duration::ZERO);
        let sale = service.create(sale_for(product.id, 10)).await.unwrap();

        let changes = FlashSaleChanges {
            discount_percentage: Some(DiscountPercent::from_units(45).unwrap()),
            ..FlashSaleChanges::default()
        };
        let updated = service.update(sale.id, changes).await.unwrap();
        assert_eq!(updated.discount_percentage, DiscountPercent::from_units(45).unwrap());
    }

    #[tokio::test]
    async fn test_listing_overlapping_a_create_is_not_cached() {
        let catalog = Arc::new(MemoryCatalog::default());
        let product = catalog.insert(NewProduct::new("Mực ống", Price::from_units(1))).await;
        let sales = Arc::new(PausedListing::default());
        let service = FlashSaleService::new(
            catalog,
            sales.clone(),
            Duration::from_secs(5),
            Duration::from_secs(30),
        );

        sales.armed.store(true, Ordering::SeqCst);
        let reader = tokio::spawn({
            let service = service.clone();
            async move { service.list_active().await }
        });
        sales.read_done.notified().await;
        service.create(sale_for(product.id, 20)).await.unwrap();
        sales.release.notify_one();

        // The overlapping read saw the store before the create.
        assert!(reader.await.unwrap().unwrap().is_empty());
        assert_eq!(service.list_active().await.unwrap().len(), 1);
    }
}
