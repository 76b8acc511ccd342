//! Flash-sale associations.

use async_trait::async_trait;
use oceanfood_core::FlashSaleId;
use sqlx::PgPool;

use crate::db::{FlashSaleStore, RepositoryError};
use crate::models::FlashSale;

/// Flash sales stored in the `flash_sale_products` table.
#[derive(Debug, Clone)]
pub struct PgFlashSales {
    pool: PgPool,
}

impl PgFlashSales {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a foreign-key or check violation to a conflict.
fn constraint_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.constraint().is_some() => {
            RepositoryError::Conflict(db.message().to_owned())
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl FlashSaleStore for PgFlashSales {
    async fn list_active(&self) -> Result<Vec<FlashSale>, RepositoryError> {
        let sales = sqlx::query_as::<_, FlashSale>(
            r"
            SELECT id, product_id, start_date, end_date, discount_percentage,
                   is_active, created_at, updated_at
            FROM flash_sale_products
            WHERE is_active
            ORDER BY created_at DESC, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    async fn get(&self, id: FlashSaleId) -> Result<Option<FlashSale>, RepositoryError> {
        let sale = sqlx::query_as::<_, FlashSale>(
            r"
            SELECT id, product_id, start_date, end_date, discount_percentage,
                   is_active, created_at, updated_at
            FROM flash_sale_products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sale)
    }

    async fn insert(&self, sale: &FlashSale) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO flash_sale_products
                (id, product_id, start_date, end_date, discount_percentage,
                 is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(sale.id)
        .bind(sale.product)
        .bind(sale.start_date)
        .bind(sale.end_date)
        .bind(sale.discount_percentage)
        .bind(sale.is_active)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&self.pool)
        .await
        .map_err(constraint_error)?;
        Ok(())
    }

    async fn update(&self, sale: &FlashSale) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE flash_sale_products
            SET product_id = $2, start_date = $3, end_date = $4,
                discount_percentage = $5, is_active = $6, updated_at = $7
            WHERE id = $1
            ",
        )
        .bind(sale.id)
        .bind(sale.product)
        .bind(sale.start_date)
        .bind(sale.end_date)
        .bind(sale.discount_percentage)
        .bind(sale.is_active)
        .bind(sale.updated_at)
        .execute(&self.pool)
        .await
        .map_err(constraint_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: FlashSaleId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM flash_sale_products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
