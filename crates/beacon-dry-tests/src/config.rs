// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use beacon_app_core::config::{ConfigError, ConfigStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// Clones share storage, so a test can hand one clone to a
/// `ConfigService` and inspect the other.
///
/// # Example
///
/// ```
/// use beacon_dry_tests::InMemoryConfigStore;
/// use beacon_app_core::config::ConfigService;
/// use beacon_app_core::prefs::{DisplayPrefs, DISPLAY_PREFS_KEY};
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// let prefs: DisplayPrefs = service.load_or_init(DISPLAY_PREFS_KEY).unwrap();
/// assert_eq!(prefs, DisplayPrefs::default());
/// assert!(store.contains_key(DISPLAY_PREFS_KEY));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `json` under `key`.
    pub fn with_json(key: &str, json: &str) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_owned(), json.as_bytes().to_vec());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configure the store to fail on save operations.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// Number of `load_raw` attempts.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// Number of `save_raw` attempts, including failed ones.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    /// Raw bytes stored under `key`, as UTF-8.
    pub fn text(&self, key: &str) -> Option<String> {
        self.lock()
            .data
            .get(key)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.lock();
        inner.load_count += 1;
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.save_count += 1;
        if inner.fail_on_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use beacon_app_core::config::ConfigService;
    use beacon_app_core::prefs::{BackendChoice, DisplayPrefs, DISPLAY_PREFS_KEY};

    #[test]
    fn stored_prefs_are_loaded_not_overwritten() {
        let store = InMemoryConfigStore::with_json(DISPLAY_PREFS_KEY, r#"{"backend":"disabled"}"#);
        let service = ConfigService::new(store.clone());
        let prefs: DisplayPrefs = service.load_or_init(DISPLAY_PREFS_KEY).unwrap();
        assert_eq!(prefs.backend, BackendChoice::Disabled);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn failed_default_save_still_yields_defaults() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_save(true);
        let service = ConfigService::new(store.clone());
        let prefs: DisplayPrefs = service.load_or_init(DISPLAY_PREFS_KEY).unwrap();
        assert_eq!(prefs, DisplayPrefs::default());
        assert_eq!(store.save_count(), 1);
        assert!(!store.contains_key(DISPLAY_PREFS_KEY));
    }

    #[test]
    fn missing_key_is_not_found() {
        let store = InMemoryConfigStore::new();
        assert!(matches!(store.load_raw("nope"), Err(ConfigError::NotFound)));
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn defaults_are_written_as_json() {
        let store = InMemoryConfigStore::new();
        let service = ConfigService::new(store.clone());
        let _: DisplayPrefs = service.load_or_init(DISPLAY_PREFS_KEY).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&store.text(DISPLAY_PREFS_KEY).unwrap()).unwrap();
        assert_eq!(json["backend"], "auto");
        assert_eq!(json["debounce_ticks"], 5);
    }
}
