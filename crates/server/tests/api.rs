//! Router-level tests exercising the ordering API end to end, without a
//! running listener.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use mesa_core::catalog::MenuCatalog;
use mesa_server::app;
use mesa_server::config::ServerConfig;
use mesa_server::state::AppState;

fn temp_menu_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mesa-api-{name}-{}.json", std::process::id()))
}

fn test_app(name: &str) -> Router {
    let config = ServerConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        menu_path: temp_menu_path(name),
        openai_api_key: None,
        realtime_url: "https://api.invalid/v1/realtime/sessions".to_string(),
        realtime_model: "gpt-4o-realtime-preview".to_string(),
        realtime_voice: "verse".to_string(),
        realtime_timeout: Duration::from_secs(20),
        sentry_dsn: None,
    };
    let catalog = MenuCatalog::from_raw(&[
        json!({"name": "Margherita", "price": 8.5, "img_ref": "margherita.png"}),
        json!({"name": "Pad Thai", "price": 11.0, "img_ref": "padthai.png"}),
    ]);
    app(AppState::new(config, catalog).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_is_alive() {
    let app = test_app("health");
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_status_requires_client_id() {
    let app = test_app("missing-id");
    let (status, body) = get(&app, "/api/order_status").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["error"], json!("missing client_id"));
}

#[tokio::test]
async fn cart_ops_accumulate_and_reconcile_status() {
    let app = test_app("cart-flow");

    let (status, body) = post(
        &app,
        "/api/cart",
        json!({
            "client_id": "c1",
            "ops": [
                {"op": "add", "name": "Margherita", "qty": 2},
                {"op": "add", "name": "margherita", "qty": 3},
                {"op": "add", "name": "Nonexistent", "qty": 1},
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], json!(3));
    assert_eq!(body["cart"].as_array().unwrap().len(), 1);
    assert_eq!(body["cart"][0]["qty"], json!(5));

    let (status, body) = get(&app, "/api/cart/state?client_id=c1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_status"], json!(1), "status reconciled from cart");
    assert!((body["total"].as_f64().unwrap() - 42.5).abs() < f64::EPSILON);

    // clearing the cart pulls the status back to 0
    let (_, body) = post(
        &app,
        "/api/cart",
        json!({"client_id": "c1", "ops": [{"op": "clear"}]}),
    )
    .await;
    assert!(body["cart"].as_array().unwrap().is_empty());

    let (_, body) = get(&app, "/api/order_status?client_id=c1").await;
    assert_eq!(body["status"], json!(0));
}

#[tokio::test]
async fn unknown_op_is_rejected_at_deserialization() {
    let app = test_app("bad-op");
    let (status, _) = post(
        &app,
        "/api/cart",
        json!({"client_id": "c1", "ops": [{"op": "explode", "name": "Margherita"}]}),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn optimistic_from_mismatch_conflicts() {
    let app = test_app("conflict");
    post(
        &app,
        "/api/cart",
        json!({"client_id": "c1", "ops": [{"op": "add", "name": "Pad Thai"}]}),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/order_status/transition",
        json!({"client_id": "c1", "from": 2, "to": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("state_conflict"));
    assert_eq!(body["current"], json!(1));
    assert_eq!(body["requested_from"], json!(2));

    let (_, body) = get(&app, "/api/order_status?client_id=c1").await;
    assert_eq!(body["status"], json!(1), "conflict leaves status untouched");
}

#[tokio::test]
async fn checkout_flow_reaches_confirmation() {
    let app = test_app("checkout");
    post(
        &app,
        "/api/cart",
        json!({"client_id": "c1", "ops": [{"op": "add", "name": "Margherita", "qty": 2}]}),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/order_status/transition",
        json!({"client_id": "c1", "to": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!(2));

    // first partial patch leaves the form incomplete
    let (status, body) = post(
        &app,
        "/api/order_status/transition",
        json!({
            "client_id": "c1",
            "to": 3,
            "prefill": {"name": "Ana", "phone": "5551234567"},
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!(3));
    assert_eq!(body["applied_prefill"], json!(false));
    assert!(body["missing"].as_array().unwrap().contains(&json!("email")));

    // the second patch completes the accumulated record and gates to 4
    let (status, body) = post(
        &app,
        "/api/order_status/transition",
        json!({
            "client_id": "c1",
            "to": 3,
            "prefill": {
                "email": "a@b.com",
                "card": "4111111111111111",
                "exp": "09/27",
                "cvv": "123",
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!(4), "valid prefill forces 4");
    assert_eq!(body["applied_prefill"], json!(true));
    assert_eq!(body["missing"], json!([]));
    assert_eq!(body["prefill"]["name"], json!("Ana"), "first patch survived the merge");

    let (status, body) = post(
        &app,
        "/api/order_status/transition",
        json!({"client_id": "c1", "from": 4, "to": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!(5));
}

#[tokio::test]
async fn five_is_unreachable_without_four() {
    let app = test_app("strict-five");
    post(
        &app,
        "/api/cart",
        json!({"client_id": "c1", "ops": [{"op": "add", "name": "Pad Thai"}]}),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/order_status/transition",
        json!({"client_id": "c1", "to": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("invalid_transition"));
}

#[tokio::test]
async fn transitions_to_cart_statuses_check_the_cart() {
    let app = test_app("preconditions");

    // empty cart refuses 1 and 2
    let (status, body) = post(
        &app,
        "/api/order_status/transition",
        json!({"client_id": "c1", "to": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("cart_empty"));

    // non-empty cart refuses 0
    post(
        &app,
        "/api/cart",
        json!({"client_id": "c1", "ops": [{"op": "add", "name": "Pad Thai"}]}),
    )
    .await;
    let (status, body) = post(
        &app,
        "/api/order_status/transition",
        json!({"client_id": "c1", "to": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("cart_not_empty"));

    // unrecognized target
    let (status, body) = post(
        &app,
        "/api/order_status/transition",
        json!({"client_id": "c1", "to": 9}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("unknown_target"));
}

#[tokio::test]
async fn menu_replace_normalizes_and_persists() {
    let app = test_app("menu");
    let path = temp_menu_path("menu");

    let (status, body) = post(
        &app,
        "/api/menu",
        json!([
            {"name": "  Tacos  ", "price": "9.0", "description": "three per order"},
            {"name": "Agua fresca", "price": 3},
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["count"], json!(2));

    let (_, body) = get(&app, "/api/menu").await;
    assert_eq!(body[0]["name"], json!("Tacos"));
    assert!((body[0]["price"].as_f64().unwrap() - 9.0).abs() < f64::EPSILON);

    let persisted = tokio::fs::read(&path).await.unwrap();
    let persisted: Value = serde_json::from_slice(&persisted).unwrap();
    assert_eq!(persisted.as_array().unwrap().len(), 2);
    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn concurrent_cart_realtime_and_menu_requests_all_complete() {
    // cart nests stores -> catalog, the session route reads the catalog
    // and then locks stores, and menu replace queues a catalog writer;
    // every interleaving of the three must terminate.
    let app = test_app("lock-order");

    let run = async {
        for _ in 0..25 {
            let cart = post(
                &app,
                "/api/cart",
                json!({"client_id": "c1", "ops": [{"op": "add", "name": "Margherita"}]}),
            );
            let session = post(
                &app,
                "/api/realtime/session",
                json!({"client_id": "c1"}),
            );
            let menu = post(
                &app,
                "/api/menu",
                json!([{"name": "Margherita", "price": 8.5}]),
            );

            let (cart, session, menu) = tokio::join!(cart, session, menu);
            assert_eq!(cart.0, StatusCode::OK);
            // no API key is configured, but the handler must still get
            // through its locking and answer
            assert_eq!(session.0, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(menu.0, StatusCode::OK);
        }
    };

    tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("handlers must not block each other indefinitely");

    let _ = tokio::fs::remove_file(temp_menu_path("lock-order")).await;
}

#[tokio::test]
async fn concurrent_menu_replaces_leave_file_matching_served_catalog() {
    let app = test_app("menu-race");
    let path = temp_menu_path("menu-race");

    let first = post(&app, "/api/menu", json!([{"name": "Soup", "price": 4.0}]));
    let second = post(&app, "/api/menu", json!([{"name": "Salad", "price": 6.0}]));
    let (first, second) = tokio::join!(first, second);
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);

    let (_, served) = get(&app, "/api/menu").await;
    let persisted = tokio::fs::read(&path).await.unwrap();
    let persisted: Value = serde_json::from_slice(&persisted).unwrap();
    assert_eq!(
        persisted, served,
        "whichever replace won, the file must hold the served snapshot"
    );

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn recommend_broadcasts_and_resets() {
    let app = test_app("recommend");

    let (status, body) = post(
        &app,
        "/api/recommend",
        json!({"names": ["Margherita", "  ", 42]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["names"], json!(["Margherita", "42"]));

    let (status, body) = post(&app, "/api/recommend", json!({"reset": true})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reset"], json!(true));
}
