//! Cart route handlers.
//!
//! Every mutation returns the whole cart with its products resolved, so the
//! client can redraw without a second request.

use axum::extract::{Path, State};
use oceanfood_core::{CartItemId, ProductId};
use serde::Deserialize;
use tracing::instrument;

use super::parse_id;
use super::response::{ApiJson, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::CartView;
use crate::services::parse_user;
use crate::state::AppState;

/// Body of `POST /api/cart/{userId}/add`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

const fn one() -> i64 {
    1
}

/// Body of the quantity endpoints.
#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: i64,
}

/// `GET /api/cart/{userId}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<CartView>> {
    let user = parse_user(&user_id)?;
    Ok(ApiResponse::ok(state.cart().get(&user).await?))
}

/// `POST /api/cart/{userId}/add`
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<AddToCart>,
) -> Result<ApiResponse<CartView>> {
    let user = parse_user(&user_id)?;
    let product = parse_id::<ProductId>("productId", &body.product_id)?;
    let quantity = u32::try_from(body.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| AppError::BadRequest("quantity must be a positive integer".into()))?;

    let cart = state.cart().add_item(&user, product, quantity).await?;
    Ok(ApiResponse::ok(cart).with_message("Added to cart"))
}

/// `PUT /api/cart/{userId}/item/{itemId}`
///
/// A quantity of zero or less deletes the line.
#[instrument(skip(state, body))]
pub async fn update_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<SetQuantity>,
) -> Result<ApiResponse<CartView>> {
    let user = parse_user(&user_id)?;
    let item = parse_id::<CartItemId>("item ID", &item_id)?;
    let cart = state.cart().update_item(&user, item, body.quantity).await?;
    Ok(ApiResponse::ok(cart).with_message("Cart updated"))
}

/// `DELETE /api/cart/{userId}/item/{itemId}`
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(String, String)>,
) -> Result<ApiResponse<CartView>> {
    let user = parse_user(&user_id)?;
    let item = parse_id::<CartItemId>("item ID", &item_id)?;
    let cart = state.cart().remove_item(&user, item).await?;
    Ok(ApiResponse::ok(cart).with_message("Removed from cart"))
}

/// `PUT /api/cart/{userId}/item/{productId}/quantity`
#[instrument(skip(state, body))]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<SetQuantity>,
) -> Result<ApiResponse<CartView>> {
    let user = parse_user(&user_id)?;
    let product = parse_id::<ProductId>("product ID", &product_id)?;
    let cart = state
        .cart()
        .set_quantity_by_product(&user, product, body.quantity)
        .await?;
    Ok(ApiResponse::ok(cart).with_message("Quantity updated"))
}

/// `DELETE /api/cart/{userId}/clear`
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<CartView>> {
    let user = parse_user(&user_id)?;
    let cart = state.cart().clear(&user).await?;
    Ok(ApiResponse::ok(cart).with_message("Cart cleared"))
}
