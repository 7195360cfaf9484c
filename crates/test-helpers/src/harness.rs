// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{sync::Arc, time::Duration};

use cv_client::{
    AuthorizationCache, InstanceManager, ManualClock, Workflow, DEFAULT_AUTHORIZATION_DURATION_DAYS,
};
use cv_data::DataStore;
use cv_devnet::{DevNetwork, DevRuntimeProvider};

use crate::TestSigner;

/// Start time of every harness clock.
pub const HARNESS_EPOCH: u64 = 1_700_000_000;

/// A devnet, a controllable clock and a store, from which any number of clients can be made.
pub struct Harness {
    pub net: DevNetwork,
    pub clock: ManualClock,
    pub store: DataStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(DataStore::in_mem())
    }

    pub fn with_store(store: DataStore) -> Self {
        let clock = ManualClock::new(HARNESS_EPOCH);
        Self {
            net: DevNetwork::new(Arc::new(clock.clone())),
            clock,
            store,
        }
    }

    /// Runtime boots take `delay`, leaving room for concurrent callers to pile up.
    pub fn with_boot_delay(delay: Duration) -> Self {
        let clock = ManualClock::new(HARNESS_EPOCH);
        Self {
            net: DevNetwork::with_provider(Arc::new(clock.clone()), |chain| {
                DevRuntimeProvider::new(chain).with_boot_delay(delay)
            }),
            clock,
            store: DataStore::in_mem(),
        }
    }

    /// A fresh client process: its own instance manager and authorization cache over the
    /// shared store.
    pub fn workflow(&self) -> Workflow {
        self.workflow_over(self.store.clone())
    }

    pub fn workflow_over(&self, store: DataStore) -> Workflow {
        let authorizations = AuthorizationCache::new(
            store,
            Arc::new(self.clock.clone()),
            DEFAULT_AUTHORIZATION_DURATION_DAYS,
        );
        Workflow::new(
            self.net.settings(),
            Arc::new(InstanceManager::new(self.net.provider.clone())),
            authorizations,
        )
    }

    /// A fresh client connected as `signer`.
    pub fn client(&self, signer: &Arc<TestSigner>) -> Arc<Workflow> {
        let workflow = self.workflow();
        workflow.connect(signer.clone(), self.net.ledger_for(signer.address()));
        Arc::new(workflow)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
