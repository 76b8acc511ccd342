//! Catalog listing, filtering and lookup over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use oceanfood_core::{DiscountPercent, Price};
use oceanfood_integration_tests::{TestApp, assert_failure, names};
use oceanfood_storefront::models::NewProduct;

/// Products whose effective prices are 400k, 600k, 2M, 6.5M and 8M.
/// The last is priced by discount: 10M original at 20% off.
async fn bucket_fixture() -> TestApp {
    let app = TestApp::new();
    for (name, price) in [
        ("Nghêu", 400_000),
        ("Mực", 600_000),
        ("Tôm hùm", 2_000_000),
        ("Cua King", 6_500_000),
    ] {
        app.product(name, price).await;
    }
    let mut discounted = NewProduct::new("Cá ngừ đại dương", Price::from_units(9_500_000));
    discounted.original_price = Some(Price::from_units(10_000_000));
    discounted.discount = DiscountPercent::from_units(20).unwrap();
    app.insert(discounted).await;
    app
}

#[tokio::test]
async fn test_bucket_filters_on_effective_price() {
    let app = bucket_fixture().await;

    let (status, body) = app.get("/api/products/filter?priceRange=1m-3m").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]), ["Tôm hùm"]);

    let (_, body) = app.get("/api/products/filter?priceRange=over-7m").await;
    assert_eq!(names(&body["data"]), ["Cá ngừ đại dương"]);
    assert_eq!(body["data"][0]["currentPrice"].as_f64(), Some(8_000_000.0));

    // 9.5M raw price, but 8M effective: not in 5m-7m, not dropped from over-7m
    let (_, body) = app.get("/api/products/filter?priceRange=5m-7m").await;
    assert_eq!(names(&body["data"]), ["Cua King"]);
}

#[tokio::test]
async fn test_unknown_bucket_returns_everything() {
    let app = bucket_fixture().await;
    let (status, body) = app.get("/api/products/filter?priceRange=bargain").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["totalItems"], 5);
}

#[tokio::test]
async fn test_pagination_page_two_of_three() {
    let app = TestApp::new();
    for i in 1..=25 {
        app.product(&format!("item-{i:02}"), 100_000).await;
    }

    let (status, body) = app.get("/api/products?page=2&limit=10&sort=name").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let expected: Vec<String> = (11..=20).map(|i| format!("item-{i:02}")).collect();
    assert_eq!(names(&body["data"]), expected);
    assert_eq!(body["pagination"]["currentPage"], 2);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["totalItems"], 25);
    assert_eq!(body["pagination"]["itemsPerPage"], 10);
}

#[tokio::test]
async fn test_no_match_is_an_empty_page() {
    let app = bucket_fixture().await;
    let (status, body) = app.get("/api/products?category=seaweed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!([]));
    assert_eq!(body["pagination"]["totalPages"], 0);
}

#[tokio::test]
async fn test_search_matches_name_description_or_tags() {
    let app = TestApp::new();
    let mut by_tag = NewProduct::new("Sò điệp", Price::from_units(1));
    by_tag.tags = vec!["Hokkaido".into()];
    app.insert(by_tag).await;
    app.product("Hokkaido scallops", 1).await;
    app.product("Bạch tuộc", 1).await;

    let (_, body) = app.get("/api/products?search=hokkaido&sort=name").await;
    assert_eq!(names(&body["data"]), ["Hokkaido scallops", "Sò điệp"]);
}

#[tokio::test]
async fn test_origins_are_normalized() {
    let app = TestApp::new();
    let mut norway = NewProduct::new("Cá hồi", Price::from_units(1));
    norway.origin = "Na Uy".into();
    app.insert(norway).await;
    app.product("Local", 1).await;

    let (_, body) = app.get("/api/products/filter?origins=na%20uy").await;
    assert_eq!(names(&body["data"]), ["Cá hồi"]);
}

#[tokio::test]
async fn test_invalid_query_values_are_rejected() {
    let app = TestApp::new();
    assert_failure(&app.get("/api/products?sort=colour").await, StatusCode::BAD_REQUEST);
    assert_failure(&app.get("/api/products?page=0").await, StatusCode::BAD_REQUEST);
    assert_failure(&app.get("/api/products?minPrice=cheap").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_detail() {
    let app = TestApp::new();
    let product = app.product("Ốc hương", 450_000).await;

    let (status, body) = app.get(&format!("/api/products/{}", product.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ốc hương");
    assert_eq!(body["data"]["currentPrice"].as_f64(), Some(450_000.0));

    let missing = oceanfood_core::ProductId::generate();
    assert_failure(
        &app.get(&format!("/api/products/{missing}")).await,
        StatusCode::NOT_FOUND,
    );
    assert_failure(&app.get("/api/products/not-an-id").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_featured_and_new_strips() {
    let app = TestApp::new();
    for i in 0..10 {
        let mut input = NewProduct::new(format!("f{i}"), Price::from_units(1));
        input.is_featured = true;
        input.is_new = i < 2;
        app.insert(input).await;
    }

    let (_, body) = app.get("/api/products/featured").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 8);
    let (_, body) = app.get("/api/products/featured?limit=3").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    let (_, body) = app.get("/api/products/new").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_category_listing() {
    let app = TestApp::new();
    for (name, category) in [("a", "crab"), ("b", "fish"), ("c", "crab")] {
        let mut input = NewProduct::new(name, Price::from_units(1));
        input.category = category.into();
        app.insert(input).await;
    }

    let (status, body) = app.get("/api/products/category/crab?sort=name").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]), ["a", "c"]);
    assert_eq!(body["pagination"]["totalItems"], 2);
}

#[tokio::test]
async fn test_health_and_trailing_slash() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["storage"], "memory");

    let (status, body) = app.get("/api/products/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}
