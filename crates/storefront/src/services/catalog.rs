//! Catalog read service: listing, filtering and lookup.

use std::sync::Arc;
use std::time::Duration;

use oceanfood_core::ProductId;
use tracing::{debug, instrument};

use super::Deadline;
use crate::catalog::filter::{self, Page, PageRequest, ProductFilter, Sort};
use crate::db::CatalogStore;
use crate::error::AppError;
use crate::models::ProductView;

/// Catalog reads with derived pricing.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    budget: Duration,
}

impl CatalogService {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, budget: Duration) -> Self {
        Self { catalog, budget }
    }

    /// Filter, sort and paginate the catalog.
    ///
    /// An empty result is a successful empty page.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or the deadline passes.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: Sort,
        page: PageRequest,
    ) -> Result<Page<ProductView>, AppError> {
        let deadline = Deadline::after(self.budget);
        let candidates = deadline.run(self.catalog.query_products(filter)).await?;
        let page = filter::apply(candidates, filter, sort, page);
        debug!(
            total = page.pagination.total_items,
            returned = page.items.len(),
            "Listed products"
        );
        Ok(page.map(ProductView::from))
    }

    /// One product by ID.
    ///
    /// # Errors
    ///
    /// `NotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<ProductView, AppError> {
        let deadline = Deadline::after(self.budget);
        deadline
            .run(self.catalog.get_product(id))
            .await?
            .map(ProductView::from)
            .ok_or_else(|| AppError::NotFound("Product".into()))
    }

    /// Newest featured products.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a zero limit; store errors otherwise.
    pub async fn featured(&self, limit: u32) -> Result<Vec<ProductView>, AppError> {
        self.newest(&ProductFilter::featured(), limit).await
    }

    /// Newest products flagged as new.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a zero limit; store errors otherwise.
    pub async fn new_arrivals(&self, limit: u32) -> Result<Vec<ProductView>, AppError> {
        self.newest(&ProductFilter::new_arrivals(), limit).await
    }

    /// Paginated listing of one category.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or the deadline passes.
    pub async fn by_category(
        &self,
        category: &str,
        sort: Sort,
        page: PageRequest,
    ) -> Result<Page<ProductView>, AppError> {
        self.list(&ProductFilter::in_category(category), sort, page)
            .await
    }

    async fn newest(
        &self,
        filter: &ProductFilter,
        limit: u32,
    ) -> Result<Vec<ProductView>, AppError> {
        let page = PageRequest::new(1, limit)?;
        Ok(self.list(filter, Sort::default(), page).await?.items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration as ChronoDuration, Utc};
    use oceanfood_core::Price;

    use super::*;
    use crate::catalog::PriceBucket;
    use crate::db::memory::MemoryCatalog;
    use crate::models::NewProduct;

    async fn seeded() -> CatalogService {
        let catalog = Arc::new(MemoryCatalog::default());
        let start = Utc::now();
        let products = (0..12).map(|i| {
            let mut input = NewProduct::new(format!("p{i:02}"), Price::from_units(100_000 * (i + 1)));
            input.is_featured = i % 3 == 0;
            input.is_new = i >= 10;
            input.category = if i % 2 == 0 { "fish" } else { "shellfish" }.into();
            input.into_product(start + ChronoDuration::seconds(i64::try_from(i).unwrap()))
        });
        catalog.extend(products).await;
        CatalogService::new(catalog, Duration::from_secs(5))
    }

    fn names(products: &[ProductView]) -> Vec<&str> {
        products.iter().map(|p| p.product.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_featured_is_newest_first_and_limited() {
        let service = seeded().await;
        let featured = service.featured(3).await.unwrap();
        assert_eq!(names(&featured), ["p09", "p06", "p03"]);
    }

    #[tokio::test]
    async fn test_new_arrivals() {
        let service = seeded().await;
        assert_eq!(names(&service.new_arrivals(8).await.unwrap()), ["p11", "p10"]);
    }

    #[tokio::test]
    async fn test_category_listing_paginates() {
        let service = seeded().await;
        let page = service
            .by_category("fish", Sort::parse("name").unwrap(), PageRequest::new(2, 4).unwrap())
            .await
            .unwrap();
        assert_eq!(names(&page.items), ["p08", "p10"]);
        assert_eq!(page.pagination.total_items, 6);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_list_by_bucket() {
        let service = seeded().await;
        let filter = ProductFilter {
            price_range: Some(PriceBucket::Under500k),
            ..ProductFilter::default()
        };
        let page = service
            .list(&filter, Sort::parse("price").unwrap(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&page.items), ["p00", "p01", "p02", "p03"]);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let service = seeded().await;
        let result = service.get(ProductId::generate()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let service = seeded().await;
        assert!(matches!(service.featured(0).await, Err(AppError::BadRequest(_))));
    }
}
