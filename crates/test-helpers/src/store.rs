// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use anyhow::{bail, Result};
use cv_config::StorageConfig;
use cv_data::{DataStore, Get, Insert, KeyValStore, Remove, ScanPrefix, StoreKind};
use tempfile::TempDir;

/// Durable store that reads nothing and refuses every write.
pub struct FailingStore;

impl KeyValStore for FailingStore {
    fn insert(&self, _: Insert) -> Result<()> {
        bail!("No space left on device")
    }

    fn remove(&self, _: Remove) -> Result<()> {
        bail!("No space left on device")
    }

    fn get(&self, _: Get) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn scan_prefix(&self, _: ScanPrefix) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(vec![])
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Durable
    }
}

impl FailingStore {
    pub fn data_store() -> DataStore {
        DataStore::new(Arc::new(FailingStore))
    }
}

/// A sled-backed store in a fresh temporary directory. The directory lives as long as the
/// returned `TempDir`.
pub fn durable_store() -> Result<(TempDir, StorageConfig, DataStore)> {
    let dir = tempfile::tempdir()?;
    let config = StorageConfig::Durable {
        path: dir.path().join("db"),
    };
    let store = DataStore::open(&config)?;
    Ok((dir, config, store))
}
