//! Integration tests for OceanFood.
//!
//! Tests drive the complete storefront service (routes, middleware, services)
//! in process over in-memory storage, so no database or running server is
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p oceanfood-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use oceanfood_core::Price;
use oceanfood_storefront::config::StorefrontConfig;
use oceanfood_storefront::db::Storage;
use oceanfood_storefront::db::memory::MemoryCatalog;
use oceanfood_storefront::models::{NewProduct, Product};
use oceanfood_storefront::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

pub use serde_json::json;

/// The storefront service over a fresh in-memory catalog.
#[derive(Clone)]
pub struct TestApp {
    pub catalog: Arc<MemoryCatalog>,
    state: AppState,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StorefrontConfig::default())
    }

    #[must_use]
    pub fn with_config(config: StorefrontConfig) -> Self {
        let catalog = Arc::new(MemoryCatalog::default());
        let state = AppState::new(config, Storage::in_memory(catalog.clone()));
        Self { catalog, state }
    }

    /// Add a product with just a name and price.
    pub async fn product(&self, name: &str, price: u64) -> Product {
        self.catalog
            .insert(NewProduct::new(name, Price::from_units(price)))
            .await
    }

    /// Add a fully specified product.
    pub async fn insert(&self, product: NewProduct) -> Product {
        self.catalog.insert(product).await
    }

    /// Send a request and return the status and the JSON body
    /// (`Value::Null` when the body is not JSON).
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = oceanfood_storefront::service(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert a failure envelope with the given status.
pub fn assert_failure(response: &(StatusCode, Value), status: StatusCode) {
    assert_eq!(response.0, status, "unexpected body: {}", response.1);
    assert_eq!(response.1["success"], false);
    assert!(response.1["message"].is_string());
}

/// Names of the products in a JSON array of product views.
#[must_use]
pub fn names(products: &Value) -> Vec<String> {
    products
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_owned())
        .collect()
}
