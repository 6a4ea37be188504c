use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessKey {
    pub id: String,
    pub name: String,
    pub password: String,
    pub port: u16,
    pub method: String,
    pub access_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub name: String,
    pub server_id: String,
    pub metrics_enabled: bool,
    pub created_timestamp_ms: i64,
    pub version: String,
    pub port_for_new_access_keys: u16,
    pub hostname_for_access_keys: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyList {
    pub access_keys: Vec<AccessKey>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMetrics {
    pub bytes_transferred_by_user_id: HashMap<String, i64>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsFlag {
    pub metrics_enabled: bool,
}

#[derive(Deserialize)]
pub struct NameInput {
    pub name: String,
}

#[derive(Deserialize)]
pub struct HostnameInput {
    pub hostname: String,
}

#[derive(Deserialize)]
pub struct PortInput {
    pub port: i64,
}

#[derive(Deserialize)]
pub struct LimitBytes {
    pub bytes: i64,
}

#[derive(Deserialize)]
pub struct DataLimitInput {
    pub limit: LimitBytes,
}

#[derive(Deserialize)]
pub struct CreateKeyInput {
    #[serde(default)]
    pub method: Option<String>,
}

/// In-memory state of one management server.
#[derive(Debug)]
pub struct Outline {
    pub server: ServerInfo,
    pub access_keys: Vec<AccessKey>,
    pub next_id: u64,
    pub key_limits: HashMap<String, i64>,
    pub default_limit: Option<i64>,
    pub transfer: HashMap<String, i64>,
    /// Number of `GET /access-keys` calls served.
    pub list_requests: usize,
}

impl Default for Outline {
    fn default() -> Self {
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        Self {
            server: ServerInfo {
                name: "Outline Server".to_string(),
                server_id: Uuid::new_v4().to_string(),
                metrics_enabled: false,
                created_timestamp_ms: created,
                version: "1.9.0".to_string(),
                port_for_new_access_keys: 12345,
                hostname_for_access_keys: "127.0.0.1".to_string(),
            },
            access_keys: Vec::new(),
            next_id: 0,
            key_limits: HashMap::new(),
            default_limit: None,
            transfer: HashMap::new(),
            list_requests: 0,
        }
    }
}

pub type Db = Arc<RwLock<Outline>>;

pub fn app() -> Router {
    app_with_state(Db::default())
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/server", get(server_info))
        .route("/server/hostname-for-access-keys", put(change_hostname))
        .route("/server/port-for-new-access-keys", put(change_default_port))
        .route(
            "/server/access-key-data-limit",
            put(set_default_limit).delete(delete_default_limit),
        )
        .route("/name", put(rename_server))
        .route("/metrics/enabled", get(metrics_enabled).put(change_metrics))
        .route("/metrics/transfer", get(transfer))
        .route("/access-keys", get(list_keys).post(create_key))
        .route("/access-keys/{id}", delete(delete_key))
        .route("/access-keys/{id}/name", put(rename_key))
        .route(
            "/access-keys/{id}/data-limit",
            put(set_key_limit).delete(delete_key_limit),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(db)).await
}

async fn server_info(State(db): State<Db>) -> Json<ServerInfo> {
    Json(db.read().await.server.clone())
}

async fn change_hostname(State(db): State<Db>, Json(input): Json<HostnameInput>) -> StatusCode {
    if input.hostname.is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    db.write().await.server.hostname_for_access_keys = input.hostname;
    StatusCode::OK
}

async fn rename_server(State(db): State<Db>, Json(input): Json<NameInput>) -> StatusCode {
    db.write().await.server.name = input.name;
    StatusCode::OK
}

async fn metrics_enabled(State(db): State<Db>) -> Json<MetricsFlag> {
    Json(MetricsFlag {
        metrics_enabled: db.read().await.server.metrics_enabled,
    })
}

async fn change_metrics(State(db): State<Db>, Json(input): Json<MetricsFlag>) -> StatusCode {
    db.write().await.server.metrics_enabled = input.metrics_enabled;
    StatusCode::OK
}

async fn change_default_port(State(db): State<Db>, Json(input): Json<PortInput>) -> StatusCode {
    match u16::try_from(input.port) {
        Ok(port) if port != 0 => {
            db.write().await.server.port_for_new_access_keys = port;
            StatusCode::OK
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

async fn set_default_limit(State(db): State<Db>, Json(input): Json<DataLimitInput>) -> StatusCode {
    if input.limit.bytes < 0 {
        return StatusCode::BAD_REQUEST;
    }
    db.write().await.default_limit = Some(input.limit.bytes);
    StatusCode::OK
}

async fn delete_default_limit(State(db): State<Db>) -> StatusCode {
    db.write().await.default_limit = None;
    StatusCode::NO_CONTENT
}

async fn create_key(
    State(db): State<Db>,
    Json(input): Json<CreateKeyInput>,
) -> (StatusCode, Json<AccessKey>) {
    let mut state = db.write().await;
    let id = state.next_id.to_string();
    state.next_id += 1;

    let method = input
        .method
        .unwrap_or_else(|| "chacha20-ietf-poly1305".to_string());
    let password = Uuid::new_v4().simple().to_string();
    let host = state.server.hostname_for_access_keys.clone();
    let port = state.server.port_for_new_access_keys;
    let key = AccessKey {
        access_url: format!("ss://{method}:{password}@{host}:{port}/?outline=1"),
        id,
        name: String::new(),
        password,
        port,
        method,
    };
    tracing::info!(id = %key.id, method = %key.method, "access key created");
    state.access_keys.push(key.clone());
    (StatusCode::CREATED, Json(key))
}

async fn list_keys(State(db): State<Db>) -> Json<AccessKeyList> {
    let mut state = db.write().await;
    state.list_requests += 1;
    Json(AccessKeyList {
        access_keys: state.access_keys.clone(),
    })
}

async fn delete_key(State(db): State<Db>, Path(id): Path<String>) -> StatusCode {
    let mut state = db.write().await;
    let before = state.access_keys.len();
    state.access_keys.retain(|key| key.id != id);
    if state.access_keys.len() == before {
        return StatusCode::NOT_FOUND;
    }
    state.key_limits.remove(&id);
    state.transfer.remove(&id);
    tracing::info!(%id, "access key deleted");
    StatusCode::NO_CONTENT
}

async fn rename_key(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<NameInput>,
) -> StatusCode {
    let mut state = db.write().await;
    match state.access_keys.iter_mut().find(|key| key.id == id) {
        Some(key) => {
            key.name = input.name;
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn set_key_limit(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<DataLimitInput>,
) -> StatusCode {
    let mut state = db.write().await;
    if !state.access_keys.iter().any(|key| key.id == id) {
        return StatusCode::NOT_FOUND;
    }
    if input.limit.bytes < 0 {
        return StatusCode::BAD_REQUEST;
    }
    state.key_limits.insert(id, input.limit.bytes);
    StatusCode::OK
}

async fn delete_key_limit(State(db): State<Db>, Path(id): Path<String>) -> StatusCode {
    let mut state = db.write().await;
    if !state.access_keys.iter().any(|key| key.id == id) {
        return StatusCode::NOT_FOUND;
    }
    state.key_limits.remove(&id);
    StatusCode::NO_CONTENT
}

async fn transfer(State(db): State<Db>) -> Json<TransferMetrics> {
    Json(TransferMetrics {
        bytes_transferred_by_user_id: db.read().await.transfer.clone(),
    })
}
