//! Session-scoped insight cache.
//!
//! Entries live until the session ends or the cache is cleared; there is no
//! TTL. Every operation is infallible from the caller's point of view:
//! unreadable entries read as misses and failed writes are only logged.

use crate::error::InsightError;
use crate::types::CountryInsights;
use crate::util::next_timestamp_millis;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const INSIGHT_KEY_PREFIX: &str = "country_insights_";

/// Cache of per-country insights, injected into the insight service.
pub trait InsightCache: Send + Sync {
    fn get(&self, country: &str) -> Option<CountryInsights>;
    fn set(&self, country: &str, insights: &CountryInsights);
    fn remove(&self, country: &str);
    /// Drop every insight entry, leaving unrelated storage keys alone.
    fn clear(&self);
    fn list_keys(&self) -> Vec<String>;
}

/// String-to-string session storage with an optional byte quota.
#[derive(Debug, Default)]
pub struct SessionStorage {
    items: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, InsightError> {
        let items = self
            .items
            .lock()
            .map_err(|e| InsightError::CacheIo(e.to_string()))?;
        Ok(items.get(key).cloned())
    }

    pub fn set_item(&self, key: &str, value: String) -> Result<(), InsightError> {
        let mut items = self
            .items
            .lock()
            .map_err(|e| InsightError::CacheIo(e.to_string()))?;
        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(InsightError::CacheIo(format!(
                    "storage quota of {} bytes exceeded",
                    quota
                )));
            }
        }
        items.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), InsightError> {
        let mut items = self
            .items
            .lock()
            .map_err(|e| InsightError::CacheIo(e.to_string()))?;
        items.remove(key);
        Ok(())
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, InsightError> {
        let items = self
            .items
            .lock()
            .map_err(|e| InsightError::CacheIo(e.to_string()))?;
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedEntry {
    data: CountryInsights,
    timestamp: i64,
}

/// [`InsightCache`] backed by a shared [`SessionStorage`].
///
/// Keys are `"{app_prefix}country_insights_{country}"`, matched exactly.
#[derive(Debug, Clone)]
pub struct SessionCache {
    storage: Arc<SessionStorage>,
    app_prefix: String,
}

impl SessionCache {
    pub fn new(storage: Arc<SessionStorage>, app_prefix: impl Into<String>) -> Self {
        Self {
            storage,
            app_prefix: app_prefix.into(),
        }
    }

    pub fn key_prefix(&self) -> String {
        format!("{}{}", self.app_prefix, INSIGHT_KEY_PREFIX)
    }

    pub fn cache_key(&self, country: &str) -> String {
        format!("{}{}", self.key_prefix(), country)
    }
}

impl InsightCache for SessionCache {
    fn get(&self, country: &str) -> Option<CountryInsights> {
        let key = self.cache_key(country);
        let raw = match self.storage.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "insight cache read failed");
                return None;
            }
        };
        match serde_json::from_str::<CachedEntry>(&raw) {
            Ok(entry) => {
                debug!(key = %key, cached_at = entry.timestamp, "insight cache hit");
                Some(entry.data)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "ignoring corrupt insight cache entry");
                None
            }
        }
    }

    fn set(&self, country: &str, insights: &CountryInsights) {
        let key = self.cache_key(country);
        let entry = CachedEntry {
            data: insights.clone(),
            timestamp: next_timestamp_millis(),
        };
        let result = serde_json::to_string(&entry)
            .map_err(InsightError::from)
            .and_then(|raw| self.storage.set_item(&key, raw));
        if let Err(e) = result {
            warn!(key = %key, error = %e, "insight cache write dropped");
        }
    }

    fn remove(&self, country: &str) {
        let key = self.cache_key(country);
        if let Err(e) = self.storage.remove_item(&key) {
            warn!(key = %key, error = %e, "insight cache remove failed");
        }
    }

    fn clear(&self) {
        for key in self.list_keys() {
            if let Err(e) = self.storage.remove_item(&key) {
                warn!(key = %key, error = %e, "insight cache clear failed");
            }
        }
    }

    fn list_keys(&self) -> Vec<String> {
        let prefix = self.key_prefix();
        match self.storage.keys() {
            Ok(keys) => keys.into_iter().filter(|k| k.starts_with(&prefix)).collect(),
            Err(e) => {
                warn!(error = %e, "insight cache key listing failed");
                Vec::new()
            }
        }
    }
}
