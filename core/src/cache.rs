//! Populate-once caches behind the client's convenience methods.
//!
//! # Design
//! Two responses are kept for the lifetime of an `OutlineClient`: the access
//! key list and the transferred-bytes map. Each cache is filled on first use
//! and never expires. Mutating calls (`delete_access_key`, `create_access_key`)
//! do not touch it, so after changing keys the caller must
//! `refresh_*` or `invalidate_caches` to see the new state.
//!
//! The two caches decide emptiness differently. The access key cache counts
//! as empty while it holds no keys, so a server with zero keys is asked again
//! on every lookup. The transfer cache is empty only while unset; an empty
//! map returned by the server counts as populated, a missing or `null` one
//! does not.

use std::collections::HashMap;

use crate::client::OutlineClient;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::AccessKey;

/// Cached copy of `GET /access-keys`, in server order.
#[derive(Debug, Clone, Default)]
pub struct AccessKeyCache {
    keys: Vec<AccessKey>,
}

impl AccessKeyCache {
    pub fn is_populated(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn populate(&mut self, keys: Vec<AccessKey>) {
        self.keys = keys;
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Linear scan by id.
    pub fn find(&self, id: &str) -> Option<&AccessKey> {
        self.keys.iter().find(|key| key.id == id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessKey> {
        self.keys.iter()
    }
}

/// Cached copy of `GET /metrics/transfer`.
#[derive(Debug, Clone, Default)]
pub struct TransferCache {
    bytes_by_id: Option<HashMap<String, i64>>,
}

impl TransferCache {
    pub fn is_populated(&self) -> bool {
        self.bytes_by_id.is_some()
    }

    pub fn populate(&mut self, bytes_by_id: HashMap<String, i64>) {
        self.bytes_by_id = Some(bytes_by_id);
    }

    pub fn clear(&mut self) {
        self.bytes_by_id = None;
    }

    /// Whether the server reported any transfer for `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.bytes_by_id
            .as_ref()
            .is_some_and(|map| map.contains_key(id))
    }

    pub fn bytes(&self, id: &str) -> Option<i64> {
        self.bytes_by_id.as_ref()?.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.bytes_by_id.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Transport> OutlineClient<T> {
    /// Look up a key by id, filling the cache on first use.
    ///
    /// A missing key is not an error: the result is `AccessKey::default()`,
    /// whose `id` is empty.
    pub fn get_access_key_by_id(&mut self, id: &str) -> Result<AccessKey, ApiError> {
        self.ensure_access_keys()?;
        Ok(self.access_keys.find(id).cloned().unwrap_or_default())
    }

    pub fn check_access_key_by_id(&mut self, id: &str) -> Result<bool, ApiError> {
        self.ensure_access_keys()?;
        Ok(self.access_keys.find(id).is_some())
    }

    /// Number of access keys. One key is one user by convention of the API.
    pub fn number_of_users(&mut self) -> Result<usize, ApiError> {
        self.ensure_access_keys()?;
        Ok(self.access_keys.len())
    }

    /// Number of keys the server reports any transfer for.
    pub fn number_of_active_users(&mut self) -> Result<usize, ApiError> {
        self.ensure_transferred_data()?;
        Ok(self.transferred.len())
    }

    /// Delete every key absent from the transferred-data map.
    ///
    /// Stops at the first failed delete and returns its error; keys deleted
    /// before it stay deleted. A delete answered with a non-204 success status
    /// is logged and skipped. Neither cache is updated afterwards.
    pub fn delete_all_keys_without_traffic(&mut self) -> Result<bool, ApiError> {
        self.ensure_transferred_data()?;
        self.ensure_access_keys()?;

        for key in self.access_keys.iter() {
            if self.transferred.contains(&key.id) {
                continue;
            }
            if !self.delete_access_key(&key.id)? {
                tracing::warn!(id = %key.id, "access key delete not acknowledged");
            }
        }
        Ok(true)
    }

    /// Re-fetch the access key list into the cache. Returns the key count.
    pub fn refresh_access_keys(&mut self) -> Result<usize, ApiError> {
        let response = self.list_access_keys()?;
        self.access_keys.populate(response.access_keys);
        tracing::debug!(keys = self.access_keys.len(), "access key cache populated");
        Ok(self.access_keys.len())
    }

    /// Re-fetch the transferred-data map into the cache. Returns its size.
    ///
    /// A response without a map (field missing or `null`) leaves the cache
    /// unset, so the next convenience call fetches again.
    pub fn refresh_transferred_data(&mut self) -> Result<usize, ApiError> {
        let response = self.data_transferred()?;
        match response.bytes_transferred_by_user_id {
            Some(bytes_by_id) => {
                self.transferred.populate(bytes_by_id);
                tracing::debug!(entries = self.transferred.len(), "transfer cache populated");
            }
            None => {
                self.transferred.clear();
                tracing::debug!("transfer response carried no map; cache left unset");
            }
        }
        Ok(self.transferred.len())
    }

    /// Drop both caches; the next convenience call fetches again.
    pub fn invalidate_caches(&mut self) {
        self.access_keys.clear();
        self.transferred.clear();
    }

    pub fn access_key_cache(&self) -> &AccessKeyCache {
        &self.access_keys
    }

    pub fn transfer_cache(&self) -> &TransferCache {
        &self.transferred
    }

    fn ensure_access_keys(&mut self) -> Result<(), ApiError> {
        if !self.access_keys.is_populated() {
            self.refresh_access_keys()?;
        }
        Ok(())
    }

    fn ensure_transferred_data(&mut self) -> Result<(), ApiError> {
        if !self.transferred.is_populated() {
            self.refresh_transferred_data()?;
        }
        Ok(())
    }
}
