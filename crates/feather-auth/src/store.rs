//! Credential and preference storage boundaries.
//!
//! Two tiers with different protection:
//!
//! - [`CredentialStore`]: secure item storage (platform keychain or
//!   equivalent) holding the passcode hash.
//! - [`KeyValueStore`]: plain string preferences holding the cached
//!   developer token. Not encrypted.
//!
//! Both tiers serialize their own access. Callers re-read them on every use.

use crate::error::{StoreError, StoreResult};
use feather_core::AppConfig;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use zeroize::Zeroizing;

/// File name used by [`FileKeyValueStore::in_data_dir`].
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// When a stored credential may be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// Readable only while the device is unlocked; never migrates to another device.
    WhenUnlockedThisDeviceOnly,
    /// Readable once the device has been unlocked after boot.
    AfterFirstUnlock,
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// An item existed and was removed
    Deleted,
    /// Nothing was stored under the key
    NotFound,
}

/// Secure item storage addressed by a service/account pair.
pub trait CredentialStore: Send + Sync {
    /// Store `secret`, replacing any existing item for the pair.
    fn put(
        &self,
        service: &str,
        account: &str,
        secret: &[u8],
        protection: Protection,
    ) -> StoreResult<()>;

    /// Read the item for the pair.
    fn get(&self, service: &str, account: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Remove the item for the pair.
    fn delete(&self, service: &str, account: &str) -> StoreResult<DeleteOutcome>;
}

/// Plain string preferences.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get_string(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any existing one.
    fn set_string(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a value. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

#[derive(Debug)]
struct StoredItem {
    secret: Zeroizing<Vec<u8>>,
    protection: Protection,
}

/// In-process credential store.
///
/// Items are zeroized when replaced or dropped.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    items: RwLock<HashMap<(String, String), StoredItem>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Protection class recorded for a stored item.
    #[must_use]
    pub fn protection(&self, service: &str, account: &str) -> Option<Protection> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(service.to_string(), account.to_string()))
            .map(|item| item.protection)
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn put(
        &self,
        service: &str,
        account: &str,
        secret: &[u8],
        protection: Protection,
    ) -> StoreResult<()> {
        let key = (service.to_string(), account.to_string());
        let mut items = self.items.write().map_err(poisoned)?;
        // Delete-then-insert so attributes never carry over from an older item.
        items.remove(&key);
        items.insert(
            key,
            StoredItem {
                secret: Zeroizing::new(secret.to_vec()),
                protection,
            },
        );
        Ok(())
    }

    fn get(&self, service: &str, account: &str) -> StoreResult<Option<Vec<u8>>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items
            .get(&(service.to_string(), account.to_string()))
            .map(|item| item.secret.to_vec()))
    }

    fn delete(&self, service: &str, account: &str) -> StoreResult<DeleteOutcome> {
        let mut items = self.items.write().map_err(poisoned)?;
        Ok(
            match items.remove(&(service.to_string(), account.to_string())) {
                Some(_) => DeleteOutcome::Deleted,
                None => DeleteOutcome::NotFound,
            },
        )
    }
}

/// In-process preference store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.values.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        self.values
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.values.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

/// Preference store persisted as a JSON object on disk.
///
/// Values are written in plain text. Only suitable for data the caller has
/// already accepted as low-sensitivity.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Use (or later create) the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `preferences.json` under the platform data directory.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] when no data directory can be resolved.
    pub fn in_data_dir() -> StoreResult<Self> {
        let dir = AppConfig::data_dir().map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self::new(dir.join(PREFERENCES_FILE_NAME)))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> StoreResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_credential_put_replaces() {
        let store = MemoryCredentialStore::new();
        store
            .put("svc", "acct", b"first", Protection::AfterFirstUnlock)
            .expect("put first");
        store
            .put("svc", "acct", b"second", Protection::WhenUnlockedThisDeviceOnly)
            .expect("put second");

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("svc", "acct").expect("get"),
            Some(b"second".to_vec())
        );
        assert_eq!(
            store.protection("svc", "acct"),
            Some(Protection::WhenUnlockedThisDeviceOnly)
        );
    }

    #[test]
    fn test_credential_pairs_are_independent() {
        let store = MemoryCredentialStore::new();
        store
            .put("svc", "a", b"1", Protection::AfterFirstUnlock)
            .expect("put a");
        store
            .put("other", "a", b"2", Protection::AfterFirstUnlock)
            .expect("put other");

        assert_eq!(store.get("svc", "a").expect("get"), Some(b"1".to_vec()));
        assert_eq!(store.get("svc", "b").expect("get"), None);
    }

    #[test]
    fn test_credential_delete_idempotent() {
        let store = MemoryCredentialStore::new();
        store
            .put("svc", "acct", b"x", Protection::AfterFirstUnlock)
            .expect("put");

        assert_eq!(
            store.delete("svc", "acct").expect("delete"),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.delete("svc", "acct").expect("delete again"),
            DeleteOutcome::NotFound
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_kv_roundtrip() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get_string("k").expect("get"), None);

        store.set_string("k", "v").expect("set");
        assert_eq!(store.get_string("k").expect("get"), Some("v".to_string()));

        store.remove("k").expect("remove");
        store.remove("k").expect("remove missing");
        assert_eq!(store.get_string("k").expect("get"), None);
    }

    #[test]
    fn test_file_kv_survives_reopen() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("prefs").join("preferences.json");

        let store = FileKeyValueStore::new(&path);
        assert_eq!(store.get_string("token").expect("get"), None);
        store.set_string("token", "ABC").expect("set");
        store.set_string("other", "1").expect("set other");
        drop(store);

        let reopened = FileKeyValueStore::new(&path);
        assert_eq!(
            reopened.get_string("token").expect("get"),
            Some("ABC".to_string())
        );

        reopened.remove("token").expect("remove");
        assert_eq!(reopened.get_string("token").expect("get"), None);
        assert_eq!(
            reopened.get_string("other").expect("get"),
            Some("1".to_string())
        );
    }

    #[test]
    fn test_file_kv_in_data_dir() {
        // Hosts without a home directory have no data dir.
        if let Ok(store) = FileKeyValueStore::in_data_dir() {
            assert!(store.path().ends_with(PREFERENCES_FILE_NAME));
        }
    }

    #[test]
    fn test_file_kv_rejects_corrupt_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("preferences.json");
        fs::write(&path, "not json").expect("write");

        let store = FileKeyValueStore::new(&path);
        assert!(matches!(
            store.get_string("token"),
            Err(StoreError::Serialization(_))
        ));
    }
}
