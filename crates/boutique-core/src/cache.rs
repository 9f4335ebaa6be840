// ── Local fallback cache ──
//
// Four JSON snapshots under fixed keys: `products`, `categories`,
// `reservations`, `settings`. Written after every successful mutation,
// read at startup when the remote store is unavailable or nobody is
// signed in. A snapshot that fails to parse, or that carries any
// non-canonical identifier, is discarded as a whole.

use std::io;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};
use tracing::{debug, warn};

use crate::config::CacheLocation;
use crate::error::CoreError;
use crate::model::{Category, Product, Reservation, Settings};
use crate::store::{DataStore, StoreSnapshot};

/// Fixed cache keys, one per mutable collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum CacheKey {
    Products,
    Categories,
    Reservations,
    Settings,
}

impl CacheKey {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

enum Backend {
    Dir(PathBuf),
    Memory(DashMap<CacheKey, String>),
}

/// Key-value store backing the local snapshot.
pub struct LocalCache {
    backend: Backend,
}

impl LocalCache {
    pub fn open(location: &CacheLocation) -> Self {
        let backend = match location {
            CacheLocation::Dir(dir) => Backend::Dir(dir.clone()),
            CacheLocation::Memory => Backend::Memory(DashMap::new()),
        };
        Self { backend }
    }

    /// Directory holding the cache files, if file-backed.
    pub fn dir(&self) -> Option<&Path> {
        match &self.backend {
            Backend::Dir(dir) => Some(dir),
            Backend::Memory(_) => None,
        }
    }

    // ── Raw key access ───────────────────────────────────────────────

    pub fn read_raw(&self, key: CacheKey) -> Result<Option<String>, CoreError> {
        match &self.backend {
            Backend::Dir(dir) => match std::fs::read_to_string(key_path(dir, key)) {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_error("read", key, &e)),
            },
            Backend::Memory(map) => Ok(map.get(&key).map(|v| v.value().clone())),
        }
    }

    pub fn write_raw(&self, key: CacheKey, json: &str) -> Result<(), CoreError> {
        match &self.backend {
            Backend::Dir(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| io_error("create", key, &e))?;
                let path = key_path(dir, key);
                let tmp = path.with_extension("json.tmp");
                std::fs::write(&tmp, json).map_err(|e| io_error("write", key, &e))?;
                std::fs::rename(&tmp, &path).map_err(|e| io_error("write", key, &e))?;
            }
            Backend::Memory(map) => {
                map.insert(key, json.to_owned());
            }
        }
        Ok(())
    }

    /// Remove every key.
    pub fn clear(&self) -> Result<(), CoreError> {
        match &self.backend {
            Backend::Dir(dir) => {
                for key in CacheKey::iter() {
                    match std::fs::remove_file(key_path(dir, key)) {
                        Ok(()) => {}
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => return Err(io_error("remove", key, &e)),
                    }
                }
            }
            Backend::Memory(map) => map.clear(),
        }
        Ok(())
    }

    /// `true` when no key holds a value.
    pub fn is_empty(&self) -> bool {
        CacheKey::iter().all(|key| matches!(self.read_raw(key), Ok(None)))
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Load the cached snapshot.
    ///
    /// Missing keys yield empty collections (and `settings: None`). A key
    /// that does not parse, or any entity whose identifiers are not
    /// canonical UUIDs, invalidates the whole cache: every key is cleared
    /// and an empty snapshot is returned.
    pub fn load(&self) -> Result<StoreSnapshot, CoreError> {
        match self.parse_all() {
            Ok(snapshot) if snapshot_is_canonical(&snapshot) => Ok(snapshot),
            Ok(_) => {
                warn!("cache holds non-canonical identifiers, discarding snapshot");
                self.clear()?;
                Ok(StoreSnapshot::default())
            }
            Err(reason) => {
                warn!(%reason, "cache is corrupt, discarding snapshot");
                self.clear()?;
                Ok(StoreSnapshot::default())
            }
        }
    }

    /// Write the named collections from the store.
    pub fn persist(&self, store: &DataStore, keys: &[CacheKey]) -> Result<(), CoreError> {
        for &key in keys {
            let json = match key {
                CacheKey::Products => to_json(key, &*store.products_snapshot())?,
                CacheKey::Categories => to_json(key, &*store.categories_snapshot())?,
                CacheKey::Reservations => to_json(key, &*store.reservations_snapshot())?,
                CacheKey::Settings => to_json(key, &store.settings())?,
            };
            self.write_raw(key, &json)?;
            debug!(key = key.as_str(), "cache written");
        }
        Ok(())
    }

    /// Write all four keys.
    pub fn persist_all(&self, store: &DataStore) -> Result<(), CoreError> {
        let keys: Vec<CacheKey> = CacheKey::iter().collect();
        self.persist(store, &keys)
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn parse_all(&self) -> Result<StoreSnapshot, String> {
        Ok(StoreSnapshot {
            products: self.parse::<Vec<Product>>(CacheKey::Products)?.unwrap_or_default(),
            categories: self
                .parse::<Vec<Category>>(CacheKey::Categories)?
                .unwrap_or_default(),
            reservations: self
                .parse::<Vec<Reservation>>(CacheKey::Reservations)?
                .unwrap_or_default(),
            settings: self.parse::<Settings>(CacheKey::Settings)?,
        })
    }

    fn parse<T: DeserializeOwned>(&self, key: CacheKey) -> Result<Option<T>, String> {
        let Some(raw) = self.read_raw(key).map_err(|e| e.to_string())? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| format!("{key}: {e}"))
    }
}

fn key_path(dir: &Path, key: CacheKey) -> PathBuf {
    dir.join(format!("{}.json", key.as_str()))
}

fn io_error(action: &str, key: CacheKey, err: &io::Error) -> CoreError {
    CoreError::Cache {
        message: format!("failed to {action} cache key `{key}`: {err}"),
    }
}

fn to_json<T: Serialize + ?Sized>(key: CacheKey, value: &T) -> Result<String, CoreError> {
    serde_json::to_string(value).map_err(|e| CoreError::Cache {
        message: format!("failed to serialize cache key `{key}`: {e}"),
    })
}

fn snapshot_is_canonical(snap: &StoreSnapshot) -> bool {
    snap.categories.iter().all(|c| c.id.is_canonical())
        && snap
            .products
            .iter()
            .all(|p| p.id.is_canonical() && p.category_id.is_canonical())
        && snap
            .reservations
            .iter()
            .all(|r| r.id.is_canonical() && r.product_id.is_canonical())
}
