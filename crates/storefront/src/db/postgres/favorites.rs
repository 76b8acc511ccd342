//! Favorites documents, one row per user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oceanfood_core::{ProductId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use super::parse_user_id;
use crate::db::{DocumentStore, RepositoryError, UserDocument};
use crate::models::Favorite;

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    user_id: String,
    product_ids: Vec<Uuid>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FavoriteRow> for Favorite {
    type Error = RepositoryError;

    fn try_from(row: FavoriteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: parse_user_id(&row.user_id)?,
            product_ids: row.product_ids.into_iter().map(ProductId::from).collect(),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn uuids(favorite: &Favorite) -> Vec<Uuid> {
    favorite.product_ids.iter().map(ProductId::as_uuid).collect()
}

/// Favorites stored in the `favorites` table.
#[derive(Debug, Clone)]
pub struct PgFavorites {
    pool: PgPool,
}

impl PgFavorites {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore<Favorite> for PgFavorites {
    async fn find(&self, user: &UserId) -> Result<Option<Favorite>, RepositoryError> {
        let row = sqlx::query_as::<_, FavoriteRow>(
            r"
            SELECT user_id, product_ids, version, created_at, updated_at
            FROM favorites
            WHERE user_id = $1
            ",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Favorite::try_from).transpose()
    }

    async fn insert_if_absent(&self, favorite: Favorite) -> Result<Favorite, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO favorites (user_id, product_ids, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(favorite.user_id.as_str())
        .bind(uuids(&favorite))
        .bind(favorite.version)
        .bind(favorite.created_at)
        .bind(favorite.updated_at)
        .execute(&self.pool)
        .await?;

        self.find(&favorite.user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn replace(
        &self,
        mut favorite: Favorite,
        expected_version: i64,
    ) -> Result<Favorite, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r"
            UPDATE favorites
            SET product_ids = $2, version = version + 1, updated_at = $3
            WHERE user_id = $1 AND version = $4
            ",
        )
        .bind(favorite.user_id.as_str())
        .bind(uuids(&favorite))
        .bind(now)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(match self.find(&favorite.user_id).await? {
                Some(stored) => RepositoryError::Conflict(format!(
                    "expected version {expected_version}, found {}",
                    stored.version
                )),
                None => RepositoryError::NotFound,
            });
        }

        favorite.stamp(expected_version + 1, now);
        Ok(favorite)
    }
}
