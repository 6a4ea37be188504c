use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, AccessKey, AccessKeyList, Db, ServerInfo, TransferMetrics};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- server ---

#[tokio::test]
async fn server_info_has_defaults() {
    let resp = app().oneshot(empty_request("GET", "/server")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let info: ServerInfo = body_json(resp).await;
    assert_eq!(info.name, "Outline Server");
    assert!(!info.metrics_enabled);
}

#[tokio::test]
async fn change_default_port_rejects_out_of_range() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/server/port-for-new-access-keys",
            r#"{"port":70000}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_default_limit_returns_204() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/server/access-key-data-limit"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// --- access keys ---

#[tokio::test]
async fn list_keys_empty() {
    let resp = app().oneshot(empty_request("GET", "/access-keys")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let list: AccessKeyList = body_json(resp).await;
    assert!(list.access_keys.is_empty());
}

#[tokio::test]
async fn create_key_returns_201_with_requested_method() {
    let resp = app()
        .oneshot(json_request("POST", "/access-keys", r#"{"method":"aes-192-gcm"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let key: AccessKey = body_json(resp).await;
    assert_eq!(key.id, "0");
    assert_eq!(key.method, "aes-192-gcm");
    assert_eq!(key.port, 12345);
    assert!(key.access_url.starts_with("ss://"));
}

#[tokio::test]
async fn delete_unknown_key_returns_404() {
    let resp = app().oneshot(empty_request("DELETE", "/access-keys/42")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rename_unknown_key_returns_404() {
    let resp = app()
        .oneshot(json_request("PUT", "/access-keys/42/name", r#"{"name":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transfer_reports_seeded_state() {
    let db = Db::default();
    db.write().await.transfer.insert("3".to_string(), 512);

    let resp = app_with_state(db)
        .oneshot(empty_request("GET", "/metrics/transfer"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let metrics: TransferMetrics = body_json(resp).await;
    assert_eq!(metrics.bytes_transferred_by_user_id["3"], 512);
}

// --- full key lifecycle ---

#[tokio::test]
async fn key_lifecycle() {
    use tower::Service;

    let db = Db::default();
    let mut app = app_with_state(db.clone()).into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/access-keys", r#"{"method":"aes-192-gcm"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: AccessKey = body_json(resp).await;
    let id = created.id.clone();

    // rename
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/access-keys/{id}/name"),
            r#"{"name":"alice"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // limit, then lift it
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/access-keys/{id}/data-limit"),
            r#"{"limit":{"bytes":1000}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(db.read().await.key_limits.get(&id), Some(&1000));

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/access-keys/{id}/data-limit")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(db.read().await.key_limits.is_empty());

    // list shows the renamed key
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/access-keys"))
        .await
        .unwrap();
    let list: AccessKeyList = body_json(resp).await;
    assert_eq!(list.access_keys.len(), 1);
    assert_eq!(list.access_keys[0].name, "alice");

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/access-keys/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // delete again — 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/access-keys/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(db.read().await.list_requests, 1);
}
