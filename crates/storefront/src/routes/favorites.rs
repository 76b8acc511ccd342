//! Favorites route handlers.

use axum::extract::{Path, State};
use oceanfood_core::ProductId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::parse_id;
use super::response::{ApiJson, ApiResponse};
use crate::error::Result;
use crate::models::ProductView;
use crate::services::parse_user;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavorite {
    pub product_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCheck {
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCount {
    pub user_id: String,
    pub count: usize,
}

/// `GET /api/favorites/{userId}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<ProductView>>> {
    let user = parse_user(&user_id)?;
    Ok(ApiResponse::ok(state.favorites().get(&user).await?))
}

/// `POST /api/favorites/{userId}/add`
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<AddFavorite>,
) -> Result<ApiResponse<Vec<ProductView>>> {
    let user = parse_user(&user_id)?;
    let product = parse_id::<ProductId>("productId", &body.product_id)?;
    let favorites = state.favorites().add(&user, product).await?;
    Ok(ApiResponse::ok(favorites).with_message("Added to favorites"))
}

/// `DELETE /api/favorites/{userId}/remove/{productId}`
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Result<ApiResponse<Vec<ProductView>>> {
    let user = parse_user(&user_id)?;
    let product = parse_id::<ProductId>("product ID", &product_id)?;
    let favorites = state.favorites().remove(&user, product).await?;
    Ok(ApiResponse::ok(favorites).with_message("Removed from favorites"))
}

/// `GET /api/favorites/{userId}/check/{productId}`
///
/// A malformed product ID cannot be a favorite, so it answers `false`.
#[instrument(skip(state))]
pub async fn check(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Result<ApiResponse<FavoriteCheck>> {
    let user = parse_user(&user_id)?;
    let is_favorite = match product_id.parse::<ProductId>() {
        Ok(product) => state.favorites().is_favorite(&user, product).await?,
        Err(_) => false,
    };
    Ok(ApiResponse::ok(FavoriteCheck { is_favorite }))
}

/// `GET /api/favorites/{userId}/count`
#[instrument(skip(state))]
pub async fn count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<FavoriteCount>> {
    let user = parse_user(&user_id)?;
    let count = state.favorites().count(&user).await?;
    Ok(ApiResponse::ok(FavoriteCount {
        user_id: user.into(),
        count,
    }))
}

/// `DELETE /api/favorites/{userId}/clear`
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<ProductView>>> {
    let user = parse_user(&user_id)?;
    let favorites = state.favorites().clear(&user).await?;
    Ok(ApiResponse::ok(favorites).with_message("Favorites cleared"))
}
