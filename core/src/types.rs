//! Wire DTOs for the Outline management API.
//!
//! # Design
//! These types mirror the server's JSON shapes but are defined independently
//! from the mock-server crate; integration tests catch schema drift. Response
//! fields tolerate both omission and an explicit `null`, decoding either to
//! the zero value instead of failing the whole call. The transfer map is the
//! exception: it stays an `Option` so "no map" is distinguishable from an
//! empty one.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` as `T::default()`. Pair with `#[serde(default)]` so a missing
/// field behaves the same way.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One provisioned VPN credential.
///
/// `AccessKey::default()` is the zero value returned by lookups that find
/// nothing; callers check `id.is_empty()` to detect absence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessKey {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub password: String,
    #[serde(deserialize_with = "nullable")]
    pub port: i64,
    #[serde(deserialize_with = "nullable")]
    pub method: String,
    #[serde(deserialize_with = "nullable")]
    pub access_url: String,
}

/// Wire shape of `GET /access-keys`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessKeysResponse {
    #[serde(deserialize_with = "nullable")]
    pub access_keys: Vec<AccessKey>,
}

/// Wire shape of `GET /metrics/transfer`: bytes transferred per access-key id.
///
/// `None` when the server sent no map (field missing or `null`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferData {
    pub bytes_transferred_by_user_id: Option<HashMap<String, i64>>,
}

/// Server configuration snapshot returned by `GET /server`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerResponse {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub server_id: String,
    #[serde(deserialize_with = "nullable")]
    pub metrics_enabled: bool,
    #[serde(deserialize_with = "nullable")]
    pub created_timestamp_ms: i64,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(deserialize_with = "nullable")]
    pub port_for_new_access_keys: i64,
    #[serde(deserialize_with = "nullable")]
    pub hostname_for_access_keys: String,
}

/// Body of `GET /metrics/enabled` and `PUT /metrics/enabled`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct MetricsResponse {
    #[serde(deserialize_with = "nullable")]
    pub metrics_enabled: bool,
}

/// Management access config printed by the server installer:
/// `{"apiUrl": "https://host:port/secret", "certSha256": "..."}`.
///
/// The fingerprint is kept for callers that want to display or compare it;
/// the client does not pin against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagerConfig {
    pub api_url: String,
    #[serde(default)]
    pub cert_sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NameRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct HostnameRequest<'a> {
    pub hostname: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PortRequest {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DataLimit {
    pub bytes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DataLimitRequest {
    pub limit: DataLimit,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateAccessKeyRequest<'a> {
    pub method: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_key_reads_camel_case() {
        let key: AccessKey = serde_json::from_str(
            r#"{"id":"7","name":"alice","password":"pw","port":443,"method":"aes-192-gcm","accessUrl":"ss://x"}"#,
        )
        .unwrap();
        assert_eq!(key.id, "7");
        assert_eq!(key.port, 443);
        assert_eq!(key.access_url, "ss://x");
    }

    #[test]
    fn missing_fields_decode_to_zero_values() {
        let info: ServerResponse = serde_json::from_str(r#"{"name":"box"}"#).unwrap();
        assert_eq!(info.name, "box");
        assert_eq!(info.port_for_new_access_keys, 0);
        assert!(info.hostname_for_access_keys.is_empty());
    }

    #[test]
    fn transfer_data_reads_byte_map() {
        let data: TransferData =
            serde_json::from_str(r#"{"bytesTransferredByUserId":{"0":100,"3":5000000000}}"#).unwrap();
        let map = data.bytes_transferred_by_user_id.unwrap();
        assert_eq!(map["0"], 100);
        assert_eq!(map["3"], 5_000_000_000);
    }

    #[test]
    fn transfer_data_without_map_is_none() {
        let missing: TransferData = serde_json::from_str("{}").unwrap();
        assert!(missing.bytes_transferred_by_user_id.is_none());

        let null: TransferData = serde_json::from_str(r#"{"bytesTransferredByUserId":null}"#).unwrap();
        assert!(null.bytes_transferred_by_user_id.is_none());

        let empty: TransferData = serde_json::from_str(r#"{"bytesTransferredByUserId":{}}"#).unwrap();
        assert_eq!(empty.bytes_transferred_by_user_id, Some(HashMap::new()));
    }

    #[test]
    fn null_fields_decode_to_zero_values() {
        let list: AccessKeysResponse = serde_json::from_str(
            r#"{"accessKeys":[{"id":"a","name":null,"password":null,"port":null,"method":"aes-192-gcm","accessUrl":null}]}"#,
        )
        .unwrap();
        assert_eq!(list.access_keys[0].id, "a");
        assert!(list.access_keys[0].name.is_empty());
        assert_eq!(list.access_keys[0].port, 0);

        let none: AccessKeysResponse = serde_json::from_str(r#"{"accessKeys":null}"#).unwrap();
        assert!(none.access_keys.is_empty());

        let info: ServerResponse =
            serde_json::from_str(r#"{"name":null,"metricsEnabled":null,"version":"1.9.0"}"#).unwrap();
        assert!(info.name.is_empty());
        assert!(!info.metrics_enabled);
        assert_eq!(info.version, "1.9.0");
    }

    #[test]
    fn out_of_range_port_passes_through() {
        let key: AccessKey = serde_json::from_str(r#"{"id":"1","port":70000}"#).unwrap();
        assert_eq!(key.port, 70000);
    }

    #[test]
    fn manager_config_reads_installer_output() {
        let config: ManagerConfig = serde_json::from_str(
            r#"{"apiUrl":"https://10.0.0.1:8081/abc","certSha256":"DEADBEEF"}"#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://10.0.0.1:8081/abc");
        assert_eq!(config.cert_sha256, "DEADBEEF");
    }

    #[test]
    fn data_limit_request_nests_bytes() {
        let body = serde_json::to_value(DataLimitRequest {
            limit: DataLimit { bytes: 1024 },
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"limit": {"bytes": 1024}}));
    }
}
