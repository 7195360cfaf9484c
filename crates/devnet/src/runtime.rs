// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy_primitives::{keccak256, Address, B256};
use async_trait::async_trait;
use cv_client::{
    Authorization, AuthorizationPayload, ClientError, EncryptedInputRequest, EncryptedInputs,
    FheRuntime, Handle, Keypair, Result, RuntimeProvider,
};
use cv_config::RuntimeConfig;
use tracing::{debug, info};

use crate::DevChain;

/// Boots [`DevRuntime`] sessions against a [`DevChain`]. Counts boots and can be told to fail
/// or to take a while, so callers can observe de-duplication.
pub struct DevRuntimeProvider {
    chain: Arc<DevChain>,
    boots: AtomicUsize,
    fail_next: AtomicUsize,
    boot_delay: Duration,
}

impl DevRuntimeProvider {
    pub fn new(chain: Arc<DevChain>) -> Self {
        Self {
            chain,
            boots: AtomicUsize::new(0),
            fail_next: AtomicUsize::new(0),
            boot_delay: Duration::ZERO,
        }
    }

    pub fn with_boot_delay(mut self, delay: Duration) -> Self {
        self.boot_delay = delay;
        self
    }

    /// The next `n` boots report the relayer as unreachable.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn boots(&self) -> usize {
        self.boots.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeProvider for DevRuntimeProvider {
    async fn init(&self, config: &RuntimeConfig) -> Result<Arc<dyn FheRuntime>> {
        let boot = self.boots.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(boot, "devnet runtime booting");
        if !self.boot_delay.is_zero() {
            tokio::time::sleep(self.boot_delay).await;
        }
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ClientError::runtime("relayer unreachable"));
        }
        self.chain.ensure_relayer()?;
        if config.chain_id != self.chain.chain_id() {
            return Err(ClientError::Configuration(format!(
                "relayer serves chain {}, not {}",
                self.chain.chain_id(),
                config.chain_id
            )));
        }
        info!(chain_id = config.chain_id, "devnet runtime ready");
        Ok(Arc::new(DevRuntime {
            chain: self.chain.clone(),
            config: config.clone(),
        }))
    }
}

/// Runtime session that encrypts into the chain's ciphertext table and re-checks every
/// authorization the way a gateway would: expiry, signer and scope.
pub struct DevRuntime {
    chain: Arc<DevChain>,
    config: RuntimeConfig,
}

impl DevRuntime {
    fn verify(&self, handle: Handle, contract: Address, authorization: &Authorization) -> Result<()> {
        let now = self.chain.now();
        if !authorization.is_valid_at(now) {
            return Err(ClientError::AuthorizationExpired {
                expired_at: authorization.expires_at(),
                now,
            });
        }
        let denied = |reason: String| ClientError::DecryptionDenied { handle, reason };
        let payload = AuthorizationPayload::new(
            &self.config,
            authorization.keypair().public_key(),
            authorization.contract_addresses(),
            authorization.issued_at(),
            authorization.duration_days(),
        );
        let signer = payload
            .recover_signer(authorization.signature())
            .map_err(|e| denied(e.to_string()))?;
        if signer != authorization.user_address() {
            return Err(denied(format!(
                "authorization signed by {signer}, not {}",
                authorization.user_address()
            )));
        }
        if !authorization.covers(contract) {
            return Err(denied(format!("authorization does not cover {contract}")));
        }
        Ok(())
    }
}

#[async_trait]
impl FheRuntime for DevRuntime {
    async fn encrypt(&self, request: &EncryptedInputRequest) -> Result<EncryptedInputs> {
        self.chain.ensure_relayer()?;
        let handles: Vec<Handle> = request
            .values()
            .iter()
            .map(|v| self.chain.mint(v.fhe_type, v.value))
            .collect();
        let proof = self
            .chain
            .input_proof(request.contract(), request.user(), &handles);
        Ok(EncryptedInputs { handles, proof })
    }

    fn generate_keypair(&self) -> Keypair {
        let private_key = B256::from(rand::random::<[u8; 32]>());
        Keypair::new(keccak256(private_key).to_vec(), private_key.to_vec())
    }

    async fn user_decrypt(
        &self,
        handle: Handle,
        contract: Address,
        authorization: &Authorization,
    ) -> Result<u64> {
        self.chain.ensure_relayer()?;
        self.verify(handle, contract, authorization)?;
        self.chain
            .reveal_to(handle, authorization.user_address(), contract)
    }

    async fn public_decrypt(&self, handle: Handle) -> Result<u64> {
        self.chain.ensure_relayer()?;
        self.chain.reveal_public(handle)
    }
}
