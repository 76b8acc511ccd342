//! Cart documents, one row per user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oceanfood_core::UserId;
use sqlx::PgPool;
use sqlx::types::Json;

use super::parse_user_id;
use crate::db::{DocumentStore, RepositoryError, UserDocument};
use crate::models::{Cart, CartItem};

#[derive(sqlx::FromRow)]
struct CartRow {
    user_id: String,
    items: Json<Vec<CartItem>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: parse_user_id(&row.user_id)?,
            items: row.items.0,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Carts stored in the `carts` table.
#[derive(Debug, Clone)]
pub struct PgCarts {
    pool: PgPool,
}

impl PgCarts {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore<Cart> for PgCarts {
    async fn find(&self, user: &UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT user_id, items, version, created_at, updated_at
            FROM carts
            WHERE user_id = $1
            ",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Cart::try_from).transpose()
    }

    async fn insert_if_absent(&self, cart: Cart) -> Result<Cart, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO carts (user_id, items, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(cart.user_id.as_str())
        .bind(Json(&cart.items))
        .bind(cart.version)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        self.find(&cart.user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn replace(&self, mut cart: Cart, expected_version: i64) -> Result<Cart, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r"
            UPDATE carts
            SET items = $2, version = version + 1, updated_at = $3
            WHERE user_id = $1 AND version = $4
            ",
        )
        .bind(cart.user_id.as_str())
        .bind(Json(&cart.items))
        .bind(now)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(match self.find(&cart.user_id).await? {
                Some(stored) => RepositoryError::Conflict(format!(
                    "expected version {expected_version}, found {}",
                    stored.version
                )),
                None => RepositoryError::NotFound,
            });
        }

        cart.stamp(expected_version + 1, now);
        Ok(cart)
    }
}
