//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                   - Liveness
//! GET    /health/ready                             - Readiness (pings the database)
//! GET    /api/health                               - Service info envelope
//!
//! # Products
//! GET    /api/products                             - Filtered, sorted, paginated listing
//! GET    /api/products/filter                      - Same, with priceRange/types/origins
//! GET    /api/products/featured?limit=8            - Featured, newest first
//! GET    /api/products/new?limit=8                 - New arrivals, newest first
//! GET    /api/products/category/{category}         - Category listing
//! GET    /api/products/{id}                        - Product detail
//!
//! # Cart
//! GET    /api/cart/{userId}                        - Cart (created on first access)
//! POST   /api/cart/{userId}/add                    - Add {productId, quantity?}
//! PUT    /api/cart/{userId}/item/{itemId}          - Set line quantity {quantity}
//! DELETE /api/cart/{userId}/item/{itemId}          - Remove line
//! PUT    /api/cart/{userId}/item/{productId}/quantity - Set quantity by product
//! DELETE /api/cart/{userId}/clear                  - Empty the cart
//!
//! # Favorites
//! GET    /api/favorites/{userId}                   - Favorite products
//! POST   /api/favorites/{userId}/add               - Add {productId}
//! DELETE /api/favorites/{userId}/remove/{productId} - Remove
//! GET    /api/favorites/{userId}/check/{productId} - {isFavorite}
//! GET    /api/favorites/{userId}/count             - {userId, count}
//! DELETE /api/favorites/{userId}/clear             - Empty the set
//!
//! # Flash sales
//! GET    /api/flash-sale                           - Active associations
//! POST   /api/flash-sale                           - Create
//! PUT    /api/flash-sale/{id}                      - Partial update
//! PATCH  /api/flash-sale/{id}/active               - Flip the active flag
//! DELETE /api/flash-sale/{id}                      - Delete
//! ```

pub mod cart;
pub mod favorites;
pub mod flash_sale;
pub mod health;
pub mod products;
pub mod response;

use std::str::FromStr;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// Parse an ID from a path segment or body field.
///
/// # Errors
///
/// `BadRequest` naming `what` if `raw` is not a valid ID.
pub fn parse_id<T: FromStr>(what: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid {what}: {raw:?}")))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list))
        .route("/filter", get(products::list))
        .route("/featured", get(products::featured))
        .route("/new", get(products::new_arrivals))
        .route("/category/{category}", get(products::by_category))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/{user_id}", get(cart::show))
        .route("/{user_id}/add", post(cart::add))
        .route(
            "/{user_id}/item/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/{user_id}/item/{id}/quantity", put(cart::set_quantity))
        .route("/{user_id}/clear", delete(cart::clear))
}

/// Create the favorites routes router.
pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/{user_id}", get(favorites::show))
        .route("/{user_id}/add", post(favorites::add))
        .route("/{user_id}/remove/{product_id}", delete(favorites::remove))
        .route("/{user_id}/check/{product_id}", get(favorites::check))
        .route("/{user_id}/count", get(favorites::count))
        .route("/{user_id}/clear", delete(favorites::clear))
}

/// Create the flash-sale routes router.
pub fn flash_sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(flash_sale::list).post(flash_sale::create))
        .route(
            "/{id}",
            put(flash_sale::update).delete(flash_sale::delete),
        )
        .route("/{id}/active", patch(flash_sale::set_active))
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::info))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/favorites", favorites_routes())
        .nest("/flash-sale", flash_sale_routes())
}

/// Create the complete route tree (without middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use oceanfood_core::ProductId;

    use super::*;

    #[test]
    fn test_parse_id() {
        let id = ProductId::generate();
        assert_eq!(parse_id::<ProductId>("product", &id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_id::<ProductId>("product", "not-a-uuid"),
            Err(AppError::BadRequest(msg)) if msg.contains("product")
        ));
    }
}
