// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;

use crate::{Get, Insert, Remove, ScanPrefix};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    /// Survives a process restart.
    Durable,
    /// Lives only as long as the process.
    Ephemeral,
}

/// Byte-oriented key value storage shared between tasks.
pub trait KeyValStore: Send + Sync {
    fn insert(&self, msg: Insert) -> Result<()>;
    fn remove(&self, msg: Remove) -> Result<()>;
    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>>;
    fn scan_prefix(&self, msg: ScanPrefix) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
    fn kind(&self) -> StoreKind;
}
