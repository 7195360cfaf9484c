// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Get, Insert, KeyValStore, Remove, ScanPrefix, StoreKind};
use anyhow::{anyhow, Result};
use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataOp {
    Insert(Insert),
    Remove(Remove),
}

#[derive(Default)]
struct Inner {
    db: BTreeMap<Vec<u8>, Vec<u8>>,
    log: Vec<DataOp>,
}

/// Ephemeral store. With `capture` set, every mutation is recorded so tests can assert on
/// exactly what was written.
#[derive(Default)]
pub struct InMemStore {
    inner: RwLock<Inner>,
    capture: bool,
}

impl InMemStore {
    pub fn new(capture: bool) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capture,
        }
    }

    pub fn get_log(&self) -> Result<Vec<DataOp>> {
        Ok(self.read()?.log.clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.db.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

impl KeyValStore for InMemStore {
    fn insert(&self, msg: Insert) -> Result<()> {
        let mut inner = self.write()?;
        inner.db.insert(msg.key().to_vec(), msg.value().to_vec());
        if self.capture {
            inner.log.push(DataOp::Insert(msg));
        }
        Ok(())
    }

    fn remove(&self, msg: Remove) -> Result<()> {
        let mut inner = self.write()?;
        inner.db.remove(msg.key());
        if self.capture {
            inner.log.push(DataOp::Remove(msg));
        }
        Ok(())
    }

    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>> {
        Ok(self.read()?.db.get(msg.key()).cloned())
    }

    fn scan_prefix(&self, msg: ScanPrefix) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let prefix = msg.prefix();
        Ok(self
            .read()?
            .db
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Ephemeral
    }
}
