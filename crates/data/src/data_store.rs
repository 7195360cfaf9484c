// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{borrow::Cow, fmt, sync::Arc};

use crate::{
    Get, InMemStore, Insert, IntoKey, KeyValStore, Remove, ScanPrefix, SledStore, StoreKind,
};
use anyhow::{Context, Result};
use cv_config::StorageConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Tree that holds everything this client persists.
pub const STORE_TREE: &str = "cv";

/// Scoped handle onto a shared `KeyValStore`. Values are bincode encoded.
#[derive(Clone)]
pub struct DataStore {
    scope: Vec<u8>,
    store: Arc<dyn KeyValStore>,
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("scope", &String::from_utf8_lossy(&self.scope))
            .field("kind", &self.store.kind())
            .finish()
    }
}

impl DataStore {
    pub fn new(store: Arc<dyn KeyValStore>) -> Self {
        Self {
            scope: vec![],
            store,
        }
    }

    pub fn in_mem() -> Self {
        Self::new(Arc::new(InMemStore::new(false)))
    }

    /// Opens the store described by `config`, failing if a durable store cannot be opened.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        match config {
            StorageConfig::Ephemeral => Ok(Self::in_mem()),
            StorageConfig::Durable { path } => {
                let store = SledStore::new(path, STORE_TREE).with_context(|| {
                    format!("Could not open durable store at '{}'", path.display())
                })?;
                info!("using durable store at {}", path.display());
                Ok(Self::new(Arc::new(store)))
            }
        }
    }

    /// Like `open` but degrades to an ephemeral store when durable storage is unavailable.
    pub fn open_or_ephemeral(config: &StorageConfig) -> Self {
        match Self::open(config) {
            Ok(store) => store,
            Err(e) => {
                warn!("{e:#}; falling back to ephemeral storage for this session");
                Self::in_mem()
            }
        }
    }

    /// Read data at the scope location
    pub fn read<T>(&self) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let Some(bytes) = self.store.get(Get::new(&self.scope))? else {
            return Ok(None);
        };
        let value = bincode::deserialize(&bytes)
            .with_context(|| format!("Could not deserialize value at {}", self.get_scope()))?;
        Ok(Some(value))
    }

    /// Writes data to the scope location
    pub fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        let serialized = bincode::serialize(value)
            .with_context(|| format!("Could not serialize value passed to {}", self.get_scope()))?;
        self.store.insert(Insert::new(&self.scope, serialized))
    }

    /// Removes data from the scope location
    pub fn clear(&self) -> Result<()> {
        self.store.remove(Remove::new(&self.scope))
    }

    /// Every raw entry below this scope, keyed by full path.
    pub fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut prefix = self.scope.clone();
        if !prefix.ends_with(b"/") {
            prefix.push(b'/');
        }
        Ok(self
            .store
            .scan_prefix(ScanPrefix::new(prefix))?
            .into_iter()
            .map(|(k, v)| (String::from_utf8_lossy(&k).into_owned(), v))
            .collect())
    }

    pub fn get_scope(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.scope)
    }

    pub fn kind(&self) -> StoreKind {
        self.store.kind()
    }

    /// Extends the scope. A separating slash is inserted unless the key starts with one.
    /// ```
    /// use cv_data::DataStore;
    ///
    /// let store = DataStore::in_mem();
    /// assert_eq!(
    ///     store.base("//foo").scope("bar").scope("/baz").get_scope(),
    ///     "//foo/bar/baz"
    /// );
    /// ```
    pub fn scope<K: IntoKey>(&self, key: K) -> Self {
        let mut scope = self.scope.clone();
        let encoded_key = key.into_key();
        if !encoded_key.starts_with(b"/") {
            scope.push(b'/');
        }
        scope.extend(encoded_key);
        Self {
            scope,
            store: self.store.clone(),
        }
    }

    /// Replaces the scope with `key`, keeping the same backing store.
    pub fn base<K: IntoKey>(&self, key: K) -> Self {
        Self {
            scope: key.into_key(),
            store: self.store.clone(),
        }
    }
}
