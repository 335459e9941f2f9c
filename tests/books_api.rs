//! Full-stack checks: HTTP router, books module and the SQLite repository.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookshelf_kernel::settings::{DatabaseSettings, Settings};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let pool = bookshelf_db::connect(&DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
    .unwrap();
    let registry = bookshelf_app::build_registry(&pool);
    bookshelf_db::run_migrations(&pool, &registry.collect_migrations())
        .await
        .unwrap();
    bookshelf_http::build_router(&registry, &Settings::default())
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn sample_book() -> Value {
    json!({
        "title": "Sapiens",
        "author": "Yuval Noah",
        "pages": 650,
        "price": 29.99,
        "releaseDate": "2019-12-01",
        "online": false
    })
}

#[tokio::test]
async fn book_lifecycle_over_sqlite() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/api/books/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);

    let (status, created) = call(&app, Method::POST, "/api/books", Some(sample_book())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Sapiens");
    assert_eq!(created["releaseDate"], "2019-12-01");
    let id = created["id"].as_i64().unwrap();

    let mut changed = created.clone();
    changed["pages"] = json!(700);
    let (status, saved) = call(&app, Method::PUT, "/api/books", Some(changed.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved, changed);

    let (status, listed) = call(&app, Method::GET, "/api/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([changed]));

    let uri = format!("/api/books/{id}");
    let (status, _) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejected_requests_leave_storage_untouched() {
    let app = app().await;

    let mut with_id = sample_book();
    with_id["id"] = json!(5);
    let (status, body) = call(&app, Method::POST, "/api/books", Some(with_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::Null);

    let (status, body) = call(&app, Method::PUT, "/api/books", Some(sample_book())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::Null);

    let (_, listed) = call(&app, Method::GET, "/api/books", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn openapi_lists_book_routes() {
    let app = app().await;
    let (status, spec) = call(&app, Method::GET, "/docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"]["/api/books"]["post"].is_object());
    assert!(spec["paths"]["/api/books/{id}"]["delete"].is_object());
}
