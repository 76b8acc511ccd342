//! Catalog reads.

use async_trait::async_trait;
use oceanfood_core::ProductId;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::catalog::{ProductFilter, normalize_origin};
use crate::db::{CatalogStore, RepositoryError};
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "id, name, price, original_price, discount, image, images, \
     description, origin, commitment, category, product_type, brand_id, unit, weight, \
     in_stock, stock_quantity, rating, review_count, is_new, is_featured, categories, tags, \
     created_at, updated_at";

/// Catalog backed by the `products` table.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a catalog record. Used by seeding; the API never writes here.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails (including a duplicate ID).
    pub async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}, origin_key) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
              $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)"
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.original_price)
        .bind(product.discount)
        .bind(&product.image)
        .bind(&product.images)
        .bind(Json(&product.description))
        .bind(&product.origin)
        .bind(&product.commitment)
        .bind(&product.category)
        .bind(&product.product_type)
        .bind(product.brand)
        .bind(&product.unit)
        .bind(product.weight)
        .bind(product.in_stock)
        .bind(product.stock_quantity)
        .bind(product.rating)
        .bind(product.review_count)
        .bind(product.is_new)
        .bind(product.is_featured)
        .bind(&product.categories)
        .bind(&product.tags)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(origin_key(product))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// The stored matching key for a product's origin. Must equal the key
/// [`ProductFilter::matches`] compares against.
fn origin_key(product: &Product) -> String {
    normalize_origin(&product.origin)
}

/// Push the indexable facets of `filter` into a `WHERE` clause.
///
/// Free-text search and price buckets stay in process: both depend on
/// derived values (description text, effective price).
fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    query.push(" WHERE TRUE");
    if let Some(category) = &filter.category {
        query.push(" AND category = ").push_bind(category.clone());
    }
    if !filter.types.is_empty() {
        query
            .push(" AND product_type = ANY(")
            .push_bind(filter.types.clone())
            .push(")");
    }
    if let Some(brand) = filter.brand {
        query.push(" AND brand_id = ").push_bind(brand);
    }
    if let Some(min) = filter.min_price {
        query.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND price <= ").push_bind(max);
    }
    if let Some(in_stock) = filter.in_stock {
        query.push(" AND in_stock = ").push_bind(in_stock);
    }
    if let Some(is_new) = filter.is_new {
        query.push(" AND is_new = ").push_bind(is_new);
    }
    if let Some(is_featured) = filter.is_featured {
        query.push(" AND is_featured = ").push_bind(is_featured);
    }
    if !filter.origins().is_empty() {
        query
            .push(" AND origin_key = ANY(")
            .push_bind(filter.origins().to_vec())
            .push(")");
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn query_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filter(&mut query, filter);
        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }
}
