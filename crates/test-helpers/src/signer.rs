// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_primitives::{Address, Signature};
use async_trait::async_trait;
use cv_client::{AuthorizationPayload, ClientError, Result, WalletSigner};
use cv_evm::LocalWallet;
use tokio::sync::Semaphore;
use tracing::debug;

/// A wallet standing in for a person: counts signature prompts, can decline them, and can
/// hold each prompt open until released.
pub struct TestSigner {
    wallet: LocalWallet,
    prompts: AtomicUsize,
    reject_next: AtomicUsize,
    gate: Option<Semaphore>,
}

impl TestSigner {
    pub fn new() -> Self {
        Self::from_wallet(LocalWallet::random())
    }

    pub fn from_wallet(wallet: LocalWallet) -> Self {
        Self {
            wallet,
            prompts: AtomicUsize::new(0),
            reject_next: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Every prompt waits for one `release`.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn reject_next(&self, n: usize) {
        self.reject_next.store(n, Ordering::SeqCst);
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn address(&self) -> Address {
        WalletSigner::address(&self.wallet)
    }
}

impl Default for TestSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletSigner for TestSigner {
    fn address(&self) -> Address {
        WalletSigner::address(&self.wallet)
    }

    async fn sign_typed_data(&self, payload: &AuthorizationPayload) -> Result<Signature> {
        let prompt = self.prompts.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(prompt, "signature requested");
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| ClientError::SigningRejected(e.to_string()))?
                .forget();
        }
        let rejecting = self
            .reject_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejecting {
            return Err(ClientError::SigningRejected(
                "User denied message signature".into(),
            ));
        }
        self.wallet.sign_typed_data(payload).await
    }
}
