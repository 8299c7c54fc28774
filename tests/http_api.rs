// tests/http_api.rs
// Drives the axum router directly with tower::ServiceExt::oneshot.


use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use basalt::api::router;
use basalt::vault::VaultPath;
use test_helpers::{ScriptedOracle, create_test_state};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn test_router() -> (Router, tempfile::TempDir) {
    let (state, dir) = create_test_state(Arc::new(ScriptedOracle::safe())).await;
    (router(state), dir)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _dir) = test_router().await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn file_crud_round_trip() {
    let (app, _dir) = test_router().await;

    let response = app
        .clone()
        .oneshot(send("PUT", "/files/src/lib/x.js", json!({ "content": "v1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["path"], "/src/lib/x.js");
    assert_eq!(body["content"], "v1");

    let response = app.clone().oneshot(get("/files/src/lib/x.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/stats")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["artifacts"], 1);
    assert_eq!(body["folders"], 2);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/files/src/lib/x.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/files/src/lib/x.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn folders_can_be_created_and_listed() {
    let (app, _dir) = test_router().await;

    let response = app
        .clone()
        .oneshot(send("POST", "/folders", json!({ "path": "/src/components" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let folders: Vec<String> = serde_json::from_value(body["folders"].clone()).unwrap();
    assert_eq!(folders, ["/", "/src/", "/src/components/"]);

    // The root cannot be re-created.
    let response = app
        .oneshot(send("POST", "/folders", json!({ "path": "/" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_path_is_rejected() {
    let (app, _dir) = test_router().await;
    let response = app
        .oneshot(send("POST", "/folders", json!({ "path": "  " })))
        .await
        .unwrap();
    // Serde-level rejection of the path string.
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn import_export_document_round_trip() {
    let (state, _dir) = create_test_state(Arc::new(ScriptedOracle::safe())).await;
    state
        .store
        .put(&VaultPath::parse("/src").unwrap(), "x.js", "v1")
        .await
        .unwrap();
    let app = router(state.clone());

    let response = app.clone().oneshot(get("/export?name=backup")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let document = body_json(response).await;
    assert_eq!(document["name"], "backup");
    assert_eq!(document["version"], "3.0");

    state.store.clear().await.unwrap();

    let response = app
        .clone()
        .oneshot(send("POST", "/import?policy=replace", document))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["artifacts"], 1);

    assert_eq!(
        state
            .store
            .get(&VaultPath::parse("/src").unwrap(), "x.js")
            .await
            .unwrap(),
        "v1"
    );
}

#[tokio::test]
async fn malformed_import_is_a_bad_request() {
    let (app, _dir) = test_router().await;
    let response = app
        .oneshot(send("POST", "/import", json!({ "no": "filesystem" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_import_lands_files() {
    let (app, _dir) = test_router().await;
    let response = app
        .clone()
        .oneshot(send(
            "POST",
            "/import",
            json!({ "entries": [
                { "relativePath": "proj/src/a.js", "content": "a" },
                { "relativePath": "proj/readme.md", "content": "r" }
            ]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["imported"], 2);

    let response = app.oneshot(get("/files/src/a.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn move_endpoint_relocates() {
    let (state, _dir) = create_test_state(Arc::new(ScriptedOracle::safe())).await;
    state
        .store
        .put(&VaultPath::parse("/src/lib").unwrap(), "x.js", "v1")
        .await
        .unwrap();
    let app = router(state.clone());

    let response = app
        .clone()
        .oneshot(send(
            "POST",
            "/move",
            json!({ "from": "/src/lib", "name": "x.js", "to": "/src" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/files/src/x.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.oneshot(get("/files/src/lib/x.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clear_tree_empties_everything() {
    let (state, _dir) = create_test_state(Arc::new(ScriptedOracle::safe())).await;
    state
        .store
        .put(&VaultPath::parse("/a").unwrap(), "x.txt", "x")
        .await
        .unwrap();
    let app = router(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/tree")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.store.count_artifacts().await, 0);
}

#[tokio::test]
async fn export_files_lists_manifest_first() {
    let (state, _dir) = create_test_state(Arc::new(ScriptedOracle::safe())).await;
    state
        .store
        .put(&VaultPath::root(), "a.txt", "hello")
        .await
        .unwrap();
    let app = router(state);

    let response = app.oneshot(get("/export/files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items = body_json(response).await;
    let items = items.as_array().unwrap();
    assert_eq!(items[0]["path"], "/_FOLDER_STRUCTURE.txt");
    assert_eq!(items[1]["path"], "/a.txt");
}
