// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::{Mutex, MutexGuard};

use crate::{Handle, RevealMode};

/// Last revealed value and where it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachedPlaintext {
    pub value: u64,
    pub handle: Handle,
    pub mode: RevealMode,
    /// The ledger has moved on since this value was revealed.
    pub stale: bool,
}

#[derive(Default)]
struct Slot {
    epoch: u64,
    entry: Option<CachedPlaintext>,
}

/// Display cache guarded by an epoch. Every clear advances the epoch, and a read may only
/// install its result under the epoch it started in.
#[derive(Default)]
pub struct PlaintextCache {
    slot: Mutex<Slot>,
}

impl PlaintextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn get(&self) -> Option<CachedPlaintext> {
        self.lock().entry
    }

    pub fn clear(&self) {
        let mut slot = self.lock();
        slot.epoch += 1;
        slot.entry = None;
    }

    /// Installs `entry` unless a clear happened since `epoch` was read.
    pub fn store_if_current(&self, epoch: u64, entry: CachedPlaintext) -> bool {
        let mut slot = self.lock();
        if slot.epoch != epoch {
            return false;
        }
        slot.entry = Some(entry);
        true
    }

    /// Flags the cached value as stale when the ledger now points at another handle.
    pub fn mark_stale_unless(&self, current: Handle) -> bool {
        let mut slot = self.lock();
        match slot.entry.as_mut() {
            Some(entry) if entry.handle != current => {
                entry.stale = true;
                true
            }
            Some(entry) => entry.stale,
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
