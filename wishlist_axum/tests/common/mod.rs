//! Shared setup for the HTTP tests

use std::sync::Once;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use serde_json::Value;
use tokio::sync::OnceCell;
use tower::ServiceExt;

/// Host that receives the development session outside production
pub const LOCAL_HOST: &str = "localhost:3001";

pub async fn app() -> Router {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_ok() {
            return;
        }
        let tmp = std::env::temp_dir();
        let pid = std::process::id();
        let db_path = tmp.join(format!("wishlist_axum_test_{pid}.db"));
        let _ = std::fs::remove_file(&db_path);

        let defaults = [
            ("GENERIC_DATA_STORE_TYPE", "sqlite".to_string()),
            ("GENERIC_DATA_STORE_URL", format!("sqlite:{}", db_path.display())),
            ("GENERIC_CACHE_STORE_TYPE", "memory".to_string()),
            ("GENERIC_CACHE_STORE_URL", "memory".to_string()),
            ("ORIGIN", "http://localhost:3001".to_string()),
            ("SESSION_SECRET", "test-session-secret".to_string()),
            (
                "UPLOAD_DIR",
                tmp.join(format!("wishlist_axum_uploads_{pid}"))
                    .display()
                    .to_string(),
            ),
        ];
        for (key, value) in defaults {
            // Set before any store reads the environment
            unsafe {
                std::env::set_var(key, value);
            }
        }
    });

    static INIT: OnceCell<()> = OnceCell::const_new();
    INIT.get_or_init(|| async {
        wishlist_axum::init()
            .await
            .expect("Failed to initialize stores");
    })
    .await;

    wishlist_axum::wishlist_router_no_trace()
}

pub fn json_request(method: &str, uri: &str, host: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(host) = host {
        builder = builder.header(header::HOST, host);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, host: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(host) = host {
        builder = builder.header(header::HOST, host);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Creates an item through the admin API and returns its id
pub async fn create_item(app: &Router, title: &str) -> i64 {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/admin/items",
            Some(LOCAL_HOST),
            serde_json::json!({ "title": title, "price": "$64" }),
        ),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["id"].as_i64().unwrap()
}
