//! Favorites over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use oceanfood_core::ProductId;
use oceanfood_integration_tests::{TestApp, assert_failure, json, names};

#[tokio::test]
async fn test_add_twice_keeps_one() {
    let app = TestApp::new();
    let p = app.product("Cá thu", 220_000).await;

    app.post("/api/favorites/u1/add", json!({"productId": p.id})).await;
    let (status, body) = app.post("/api/favorites/u1/add", json!({"productId": p.id})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]), ["Cá thu"]);

    let (_, body) = app.get("/api/favorites/u1/count").await;
    assert_eq!(body["data"], json!({"userId": "u1", "count": 1}));
}

#[tokio::test]
async fn test_get_is_lazy_and_ordered() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/favorites/u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let a = app.product("a", 1).await;
    let b = app.product("b", 1).await;
    app.post("/api/favorites/u1/add", json!({"productId": b.id})).await;
    app.post("/api/favorites/u1/add", json!({"productId": a.id})).await;

    let (_, body) = app.get("/api/favorites/u1").await;
    assert_eq!(names(&body["data"]), ["b", "a"]);
}

#[tokio::test]
async fn test_remove_absent_is_noop() {
    let app = TestApp::new();
    let p = app.product("Ốc móng tay", 60_000).await;
    app.post("/api/favorites/u1/add", json!({"productId": p.id})).await;

    let other = ProductId::generate();
    let (status, body) = app.delete(&format!("/api/favorites/u1/remove/{other}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]), ["Ốc móng tay"]);

    let (_, body) = app.delete(&format!("/api/favorites/u1/remove/{}", p.id)).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_check_never_fails() {
    let app = TestApp::new();
    let p = app.product("Cá hồi", 500_000).await;

    let (status, body) = app.get(&format!("/api/favorites/nobody/check/{}", p.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isFavorite"], false);

    app.post("/api/favorites/u1/add", json!({"productId": p.id})).await;
    let (_, body) = app.get(&format!("/api/favorites/u1/check/{}", p.id)).await;
    assert_eq!(body["data"]["isFavorite"], true);

    let (status, body) = app.get("/api/favorites/u1/check/garbage").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isFavorite"], false);
}

#[tokio::test]
async fn test_record_required_for_remove_count_clear() {
    let app = TestApp::new();
    let p = ProductId::generate();
    assert_failure(
        &app.delete(&format!("/api/favorites/u1/remove/{p}")).await,
        StatusCode::NOT_FOUND,
    );
    assert_failure(&app.get("/api/favorites/u1/count").await, StatusCode::NOT_FOUND);
    assert_failure(&app.delete("/api/favorites/u1/clear").await, StatusCode::NOT_FOUND);

    // check did not create a record
    app.get(&format!("/api/favorites/u1/check/{p}")).await;
    assert_failure(&app.get("/api/favorites/u1/count").await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let app = TestApp::new();
    let missing = ProductId::generate();
    assert_failure(
        &app.post("/api/favorites/u1/add", json!({"productId": missing})).await,
        StatusCode::NOT_FOUND,
    );
}

#[tokio::test]
async fn test_clear_returns_empty_list() {
    let app = TestApp::new();
    let p = app.product("Tôm càng", 350_000).await;
    app.post("/api/favorites/u1/add", json!({"productId": p.id})).await;

    let (status, body) = app.delete("/api/favorites/u1/clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    let (_, body) = app.get("/api/favorites/u1/count").await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_adds_converge_to_one() {
    let app = TestApp::new();
    let product_id = app.product("Cá chim", 180_000).await.id;

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                app.post("/api/favorites/u1/add", json!({"productId": product_id}))
                    .await
                    .0
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let (_, body) = app.get("/api/favorites/u1/count").await;
    assert_eq!(body["data"]["count"], 1);
}
