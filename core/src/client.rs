//! Typed client for the Outline server management API.
//!
//! # Design
//! Each endpoint is split into a pure `build_*` method that produces an
//! `HttpRequest` and a pure `parse_*` method that consumes an `HttpResponse`.
//! The executing methods glue the two together through `execute`, which hands
//! the request to the client's `Transport` and turns any status of 400 or
//! above into an error. There is no retry: one failed attempt propagates.
//!
//! `PUT` endpoints succeed only on exactly 200 and `DELETE` endpoints only on
//! exactly 204. Other statuses below 400 yield `Ok(false)`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{AccessKeyCache, TransferCache};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, StatusOutcome};
use crate::transport::{Transport, TransportConfig, UreqTransport};
use crate::types::{
    AccessKey, AccessKeysResponse, CreateAccessKeyRequest, DataLimit, DataLimitRequest,
    HostnameRequest, ManagerConfig, MetricsResponse, NameRequest, PortRequest, ServerResponse,
    TransferData,
};

const CONTENT_TYPE_JSON: &str = "application/json";

/// Cipher requested for every new access key.
pub const ACCESS_KEY_METHOD: &str = "aes-192-gcm";

const SERVER_INFO_TIMEOUT: Duration = Duration::from_secs(5);
const METRICS_TIMEOUT: Duration = Duration::from_secs(10);
const CREATE_KEY_TIMEOUT: Duration = Duration::from_secs(5);
const LIST_KEYS_TIMEOUT: Duration = Duration::from_secs(2);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(30);
const PUT_TIMEOUT: Duration = Duration::from_secs(10);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one Outline server.
///
/// Endpoint methods take `&self`. The convenience methods that consult the
/// access-key and transferred-data caches take `&mut self`, so sharing one
/// client between threads requires the caller to wrap it in a lock.
#[derive(Debug)]
pub struct OutlineClient<T = UreqTransport> {
    base_url: String,
    transport: T,
    pub(crate) access_keys: AccessKeyCache,
    pub(crate) transferred: TransferCache,
}

impl OutlineClient<UreqTransport> {
    /// Client with the default transport: certificate verification off,
    /// 20s idle and handshake timeouts.
    pub fn new(base_url: &str) -> Self {
        Self::with_config(base_url, &TransportConfig::default())
    }

    pub fn with_config(base_url: &str, config: &TransportConfig) -> Self {
        Self::with_transport(base_url, UreqTransport::new(config))
    }

    /// Client for the `apiUrl` of an installer-printed access config.
    pub fn from_manager_config(config: &ManagerConfig) -> Self {
        Self::new(&config.api_url)
    }
}

impl<T: Transport> OutlineClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            access_keys: AccessKeyCache::default(),
            transferred: TransferCache::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one request and fail on any status of 400 or above.
    ///
    /// Statuses below 400 are returned as-is, so callers that care about the
    /// exact 2xx code still see it.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.transport.execute(&request)?;
        if let Err(err) = check_status(&response) {
            tracing::warn!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                "request rejected"
            );
            return Err(err);
        }
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_server_info(&self) -> HttpRequest {
        self.get_request("/server", SERVER_INFO_TIMEOUT)
    }

    pub fn build_change_hostname(&self, hostname: &str) -> Result<HttpRequest, ApiError> {
        self.put_request("/server/hostname-for-access-keys", &HostnameRequest { hostname })
    }

    pub fn build_rename_server(&self, name: &str) -> Result<HttpRequest, ApiError> {
        self.put_request("/name", &NameRequest { name })
    }

    pub fn build_check_metrics(&self) -> HttpRequest {
        self.get_request("/metrics/enabled", METRICS_TIMEOUT)
    }

    pub fn build_change_metrics(&self, enabled: bool) -> Result<HttpRequest, ApiError> {
        self.put_request(
            "/metrics/enabled",
            &MetricsResponse {
                metrics_enabled: enabled,
            },
        )
    }

    pub fn build_change_default_port(&self, port: u16) -> Result<HttpRequest, ApiError> {
        self.put_request("/server/port-for-new-access-keys", &PortRequest { port })
    }

    pub fn build_set_data_limit_all_keys(&self, bytes: i64) -> Result<HttpRequest, ApiError> {
        self.put_request("/server/access-key-data-limit", &data_limit(bytes))
    }

    /// Unlike the other deletes, this one sends no headers at all.
    pub fn build_delete_all_data_limits(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.url("/server/access-key-data-limit"),
            headers: Vec::new(),
            body: None,
            timeout: DELETE_TIMEOUT,
        }
    }

    pub fn build_create_access_key(&self) -> Result<HttpRequest, ApiError> {
        let body = to_json(&CreateAccessKeyRequest {
            method: ACCESS_KEY_METHOD,
        })?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url("/access-keys"),
            headers: vec![("content-type".to_string(), CONTENT_TYPE_JSON.to_string())],
            body: Some(body),
            timeout: CREATE_KEY_TIMEOUT,
        })
    }

    pub fn build_list_access_keys(&self) -> HttpRequest {
        self.get_request("/access-keys", LIST_KEYS_TIMEOUT)
    }

    pub fn build_delete_access_key(&self, id: &str) -> HttpRequest {
        self.delete_request(&format!("/access-keys/{id}"))
    }

    /// Numeric id, unlike the string ids the list endpoint returns.
    pub fn build_rename_access_key(&self, id: i64, name: &str) -> Result<HttpRequest, ApiError> {
        self.put_request(&format!("/access-keys/{id}/name"), &NameRequest { name })
    }

    pub fn build_set_data_limit_access_key(&self, id: i64, bytes: i64) -> Result<HttpRequest, ApiError> {
        self.put_request(&format!("/access-keys/{id}/data-limit"), &data_limit(bytes))
    }

    pub fn build_delete_data_limit_access_key(&self, id: i64) -> HttpRequest {
        self.delete_request(&format!("/access-keys/{id}/data-limit"))
    }

    pub fn build_data_transferred(&self) -> HttpRequest {
        self.get_request("/metrics/transfer", TRANSFER_TIMEOUT)
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_server_info(&self, response: HttpResponse) -> Result<ServerResponse, ApiError> {
        decode(response)
    }

    pub fn parse_check_metrics(&self, response: HttpResponse) -> Result<MetricsResponse, ApiError> {
        decode(response)
    }

    pub fn parse_create_access_key(&self, response: HttpResponse) -> Result<AccessKey, ApiError> {
        decode(response)
    }

    pub fn parse_list_access_keys(&self, response: HttpResponse) -> Result<AccessKeysResponse, ApiError> {
        decode(response)
    }

    pub fn parse_data_transferred(&self, response: HttpResponse) -> Result<TransferData, ApiError> {
        decode(response)
    }

    /// Outcome of a `PUT`: success only on exactly 200.
    pub fn parse_put_status(&self, response: &HttpResponse) -> Result<StatusOutcome, ApiError> {
        check_status(response)?;
        Ok(StatusOutcome::expecting(response, 200))
    }

    /// Outcome of a `DELETE`: success only on exactly 204.
    pub fn parse_delete_status(&self, response: &HttpResponse) -> Result<StatusOutcome, ApiError> {
        check_status(response)?;
        Ok(StatusOutcome::expecting(response, 204))
    }

    // -----------------------------------------------------------------------
    // Endpoint methods
    // -----------------------------------------------------------------------

    pub fn get_server_info(&self) -> Result<ServerResponse, ApiError> {
        let response = self.execute(self.build_server_info())?;
        self.parse_server_info(response)
    }

    /// Set the hostname embedded in newly created access URLs.
    pub fn change_hostname(&self, hostname: &str) -> Result<bool, ApiError> {
        self.send_put(self.build_change_hostname(hostname)?)
    }

    pub fn rename_server(&self, name: &str) -> Result<bool, ApiError> {
        self.send_put(self.build_rename_server(name)?)
    }

    pub fn check_metrics(&self) -> Result<MetricsResponse, ApiError> {
        let response = self.execute(self.build_check_metrics())?;
        self.parse_check_metrics(response)
    }

    pub fn change_metrics(&self, enabled: bool) -> Result<bool, ApiError> {
        self.send_put(self.build_change_metrics(enabled)?)
    }

    pub fn change_default_port(&self, port: u16) -> Result<bool, ApiError> {
        self.send_put(self.build_change_default_port(port)?)
    }

    pub fn set_data_limit_all_keys(&self, bytes: i64) -> Result<bool, ApiError> {
        self.send_put(self.build_set_data_limit_all_keys(bytes)?)
    }

    pub fn delete_all_data_limits(&self) -> Result<bool, ApiError> {
        let response = self.execute(self.build_delete_all_data_limits())?;
        Ok(response.status == 204)
    }

    /// Create a key using the fixed `aes-192-gcm` cipher.
    pub fn create_access_key(&self) -> Result<AccessKey, ApiError> {
        let response = self.execute(self.build_create_access_key()?)?;
        self.parse_create_access_key(response)
    }

    /// Fetch every access key. Always hits the server; the cache is untouched.
    pub fn list_access_keys(&self) -> Result<AccessKeysResponse, ApiError> {
        let response = self.execute(self.build_list_access_keys())?;
        self.parse_list_access_keys(response)
    }

    pub fn delete_access_key(&self, id: &str) -> Result<bool, ApiError> {
        self.send_delete(self.build_delete_access_key(id))
    }

    /// Takes a numeric id while the list endpoint hands out string ids; the
    /// two only line up for servers that number their keys.
    pub fn rename_access_key(&self, id: i64, name: &str) -> Result<bool, ApiError> {
        self.send_put(self.build_rename_access_key(id, name)?)
    }

    pub fn set_data_limit_access_key(&self, id: i64, bytes: i64) -> Result<bool, ApiError> {
        self.send_put(self.build_set_data_limit_access_key(id, bytes)?)
    }

    pub fn delete_data_limit_access_key(&self, id: i64) -> Result<bool, ApiError> {
        self.send_delete(self.build_delete_data_limit_access_key(id))
    }

    /// Bytes transferred per access key. Always hits the server.
    pub fn data_transferred(&self) -> Result<TransferData, ApiError> {
        let response = self.execute(self.build_data_transferred())?;
        self.parse_data_transferred(response)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn get_request(&self, endpoint: &str, timeout: Duration) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.url(endpoint),
            headers: vec![("content-type".to_string(), CONTENT_TYPE_JSON.to_string())],
            body: None,
            timeout,
        }
    }

    fn put_request<B: Serialize>(&self, endpoint: &str, payload: &B) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: self.url(endpoint),
            headers: json_header(),
            body: Some(to_json(payload)?),
            timeout: PUT_TIMEOUT,
        })
    }

    fn delete_request(&self, endpoint: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.url(endpoint),
            headers: json_header(),
            body: None,
            timeout: DELETE_TIMEOUT,
        }
    }

    fn send_put(&self, request: HttpRequest) -> Result<bool, ApiError> {
        let response = self.execute(request)?;
        Ok(self.parse_put_status(&response)?.success)
    }

    fn send_delete(&self, request: HttpRequest) -> Result<bool, ApiError> {
        let response = self.execute(request)?;
        Ok(self.parse_delete_status(&response)?.success)
    }
}

fn json_header() -> Vec<(String, String)> {
    vec![("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string())]
}

fn data_limit(bytes: i64) -> DataLimitRequest {
    DataLimitRequest {
        limit: DataLimit { bytes },
    }
}

fn to_json<B: Serialize>(payload: &B) -> Result<String, ApiError> {
    serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn decode<R: DeserializeOwned>(response: HttpResponse) -> Result<R, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map statuses of 400 and above to `ApiError::HttpError`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status >= 400 {
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body.clone(),
        });
    }
    Ok(())
}
