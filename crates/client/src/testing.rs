// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! In-crate fakes for unit tests. Cross-crate scenarios use the devnet instead.
//!
//! `cv-devnet` implements this crate's traits, so a dev-dependency on it would link a second
//! copy of `cv-client` whose traits are not the ones under test here. These fakes also
//! expose hooks the devnet has no use for: gated boots, held ledger reads and injected
//! gateway expiry.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use alloy::signers::{local::PrivateKeySigner, Signer};
use alloy_primitives::{keccak256, Address, Bytes, Signature, B256};
use async_trait::async_trait;
use cv_config::{ContractsConfig, NetworkConfig, RuntimeConfig, RuntimeSettings};
use tokio::sync::{watch, Semaphore};

use crate::{
    Authorization, AuthorizationPayload, ClientError, ConfidentialLedger, EncryptedInput,
    EncryptedInputRequest, EncryptedInputs, FheRuntime, Handle, Instance, InstanceManager,
    Keypair, Result, RuntimeProvider, TxReceipt, WalletSigner,
};

pub fn settings() -> RuntimeSettings {
    RuntimeSettings {
        network: NetworkConfig {
            name: "unit".into(),
            chain_id: 31337,
            gateway_chain_id: 55815,
            relayer_url: "http://127.0.0.1:3000".into(),
            rpc_url: "http://127.0.0.1:8545".into(),
            ..NetworkConfig::default()
        },
        contracts: ContractsConfig {
            acl: "0x0000000000000000000000000000000000000a01".into(),
            kms_verifier: "0x0000000000000000000000000000000000000a02".into(),
            input_verifier: "0x0000000000000000000000000000000000000a03".into(),
            decryption_oracle: "0x0000000000000000000000000000000000000a04".into(),
            app: "0x00000000000000000000000000000000000000c0".into(),
        },
    }
}

pub async fn instance() -> anyhow::Result<Arc<Instance>> {
    instance_with(Arc::new(FakeProvider::default())).await
}

pub async fn instance_with(provider: Arc<FakeProvider>) -> anyhow::Result<Arc<Instance>> {
    Ok(InstanceManager::new(provider)
        .ensure_instance(&settings())
        .await?)
}

#[derive(Default)]
struct Ledgerless {
    values: Mutex<HashMap<Handle, u64>>,
    acl: Mutex<HashSet<(Handle, Address)>>,
    public: Mutex<HashSet<Handle>>,
    nonce: AtomicU64,
    offline: AtomicBool,
    encryptions: AtomicUsize,
    user_decryptions: AtomicUsize,
    expired_next: AtomicUsize,
}

impl Ledgerless {
    fn mint(&self, value: u64) -> Handle {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let handle = Handle::new(keccak256(nonce.to_be_bytes()));
        self.values.lock().unwrap().insert(handle, value);
        handle
    }

    fn proof(contract: Address, user: Address, handles: &[Handle]) -> Bytes {
        let mut preimage = Vec::new();
        preimage.extend_from_slice(contract.as_slice());
        preimage.extend_from_slice(user.as_slice());
        for handle in handles {
            preimage.extend_from_slice(handle.as_slice());
        }
        Bytes::copy_from_slice(keccak256(preimage).as_slice())
    }
}

/// Runtime provider with boot counting, failure injection and an optional boot gate.
#[derive(Default)]
pub struct FakeProvider {
    state: Arc<Ledgerless>,
    boots: AtomicUsize,
    fail_next: AtomicUsize,
    gate: Option<Semaphore>,
}

impl FakeProvider {
    /// Every boot waits for one `release`.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn boots(&self) -> usize {
        self.boots.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::SeqCst);
    }

    pub fn encryptions(&self) -> usize {
        self.state.encryptions.load(Ordering::SeqCst)
    }

    pub fn user_decryptions(&self) -> usize {
        self.state.user_decryptions.load(Ordering::SeqCst)
    }

    pub fn report_expired_next(&self, n: usize) {
        self.state.expired_next.store(n, Ordering::SeqCst);
    }

    pub fn allow(&self, handle: Handle, account: Address) {
        self.state.acl.lock().unwrap().insert((handle, account));
    }

    pub fn make_public(&self, handle: Handle) {
        self.state.public.lock().unwrap().insert(handle);
    }
}

#[async_trait]
impl RuntimeProvider for FakeProvider {
    async fn init(&self, config: &RuntimeConfig) -> Result<Arc<dyn FheRuntime>> {
        self.boots.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(ClientError::runtime)?
                .forget();
        }
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ClientError::runtime("relayer unreachable"));
        }
        Ok(Arc::new(FakeRuntime {
            config: config.clone(),
            state: self.state.clone(),
        }))
    }
}

struct FakeRuntime {
    config: RuntimeConfig,
    state: Arc<Ledgerless>,
}

#[async_trait]
impl FheRuntime for FakeRuntime {
    async fn encrypt(&self, request: &EncryptedInputRequest) -> Result<EncryptedInputs> {
        self.state.encryptions.fetch_add(1, Ordering::SeqCst);
        if self.state.offline.load(Ordering::SeqCst) {
            return Err(ClientError::runtime("relayer unreachable"));
        }
        let handles: Vec<Handle> = request
            .values()
            .iter()
            .map(|v| self.state.mint(v.value))
            .collect();
        let proof = Ledgerless::proof(request.contract(), request.user(), &handles);
        Ok(EncryptedInputs { handles, proof })
    }

    fn generate_keypair(&self) -> Keypair {
        let secret = B256::from(rand::random::<[u8; 32]>());
        Keypair::new(keccak256(secret).to_vec(), secret.to_vec())
    }

    async fn user_decrypt(
        &self,
        handle: Handle,
        contract: Address,
        authorization: &Authorization,
    ) -> Result<u64> {
        self.state.user_decryptions.fetch_add(1, Ordering::SeqCst);
        let expired = self
            .state
            .expired_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if expired {
            return Err(ClientError::AuthorizationExpired {
                expired_at: authorization.expires_at(),
                now: authorization.expires_at(),
            });
        }
        let payload = AuthorizationPayload::new(
            &self.config,
            authorization.keypair().public_key(),
            authorization.contract_addresses(),
            authorization.issued_at(),
            authorization.duration_days(),
        );
        let user = authorization.user_address();
        let denied = |reason: &str| ClientError::DecryptionDenied {
            handle,
            reason: reason.to_string(),
        };
        if payload.recover_signer(authorization.signature())? != user {
            return Err(denied("signature does not match user"));
        }
        if !authorization.contract_addresses().contains(&contract) {
            return Err(denied("contract outside authorization"));
        }
        if !self.state.acl.lock().unwrap().contains(&(handle, user)) {
            return Err(denied("not allowed"));
        }
        self.state
            .values
            .lock()
            .unwrap()
            .get(&handle)
            .copied()
            .ok_or_else(|| denied("unknown handle"))
    }

    async fn public_decrypt(&self, handle: Handle) -> Result<u64> {
        if !self.state.public.lock().unwrap().contains(&handle) {
            return Err(ClientError::DecryptionDenied {
                handle,
                reason: "not publicly decryptable".into(),
            });
        }
        self.state
            .values
            .lock()
            .unwrap()
            .get(&handle)
            .copied()
            .ok_or_else(|| ClientError::runtime("unknown handle"))
    }
}

/// Signer that counts prompts and can reject or hold them.
pub struct FakeSigner {
    wallet: PrivateKeySigner,
    prompts: AtomicUsize,
    reject_next: AtomicUsize,
    gate: Option<Semaphore>,
}

impl FakeSigner {
    pub fn random() -> Self {
        Self {
            wallet: PrivateKeySigner::random(),
            prompts: AtomicUsize::new(0),
            reject_next: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::random()
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
}

#[async_trait]
impl WalletSigner for FakeSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_typed_data(&self, payload: &AuthorizationPayload) -> Result<Signature> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
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
            return Err(ClientError::SigningRejected("user rejected the request".into()));
        }
        self.wallet
            .sign_hash(&payload.signing_hash())
            .await
            .map_err(|e| ClientError::SigningRejected(e.to_string()))
    }
}

struct LedgerInner {
    provider: Arc<FakeProvider>,
    address: Address,
    total: Mutex<Handle>,
    submissions: AtomicUsize,
    publications: AtomicUsize,
    value_reads: AtomicUsize,
    fail_submit: AtomicBool,
    hold: watch::Sender<bool>,
}

/// Accumulating program: each submission adds to an encrypted total.
#[derive(Clone)]
pub struct FakeLedger {
    inner: Arc<LedgerInner>,
}

impl FakeLedger {
    pub fn new(provider: Arc<FakeProvider>, address: Address) -> Self {
        let total = provider.state.mint(0);
        provider.allow(total, address);
        let (hold, _) = watch::channel(false);
        Self {
            inner: Arc::new(LedgerInner {
                provider,
                address,
                total: Mutex::new(total),
                submissions: AtomicUsize::new(0),
                publications: AtomicUsize::new(0),
                value_reads: AtomicUsize::new(0),
                fail_submit: AtomicBool::new(false),
                hold,
            }),
        }
    }

    pub fn connect(&self, user: Address) -> Arc<FakeLedgerClient> {
        Arc::new(FakeLedgerClient {
            ledger: self.clone(),
            user,
        })
    }

    pub fn address(&self) -> Address {
        self.inner.address
    }

    pub fn submissions(&self) -> usize {
        self.inner.submissions.load(Ordering::SeqCst)
    }

    pub fn publications(&self) -> usize {
        self.inner.publications.load(Ordering::SeqCst)
    }

    pub fn value_reads(&self) -> usize {
        self.inner.value_reads.load(Ordering::SeqCst)
    }

    pub fn fail_next_submit(&self) {
        self.inner.fail_submit.store(true, Ordering::SeqCst);
    }

    /// Reads of the current handle capture it, then wait until released.
    pub fn hold_reads(&self) {
        self.inner.hold.send_replace(true);
    }

    pub fn release_reads(&self) {
        self.inner.hold.send_replace(false);
    }

    /// Submits `value` on behalf of another account.
    pub async fn add_as(&self, user: Address, value: u64) -> Result<TxReceipt> {
        let handle = self.inner.provider.state.mint(value);
        let proof = Ledgerless::proof(self.inner.address, user, &[handle]);
        self.apply(user, &EncryptedInput { handle, proof })
    }

    fn apply(&self, user: Address, input: &EncryptedInput) -> Result<TxReceipt> {
        if self.inner.fail_submit.swap(false, Ordering::SeqCst) {
            return Err(ClientError::ledger("execution reverted"));
        }
        let state = &self.inner.provider.state;
        if input.proof != Ledgerless::proof(self.inner.address, user, &[input.handle]) {
            return Err(ClientError::ledger("invalid input proof"));
        }
        let mut total = self.inner.total.lock().unwrap();
        let sum = {
            let values = state.values.lock().unwrap();
            values.get(&total).copied().unwrap_or_default()
                + values.get(&input.handle).copied().unwrap_or_default()
        };
        let next = state.mint(sum);
        self.inner.provider.allow(next, self.inner.address);
        self.inner.provider.allow(next, user);
        *total = next;
        let n = self.inner.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(TxReceipt {
            tx_hash: keccak256((n as u64).to_be_bytes()),
            block_number: Some(n as u64 + 1),
        })
    }
}

pub struct FakeLedgerClient {
    ledger: FakeLedger,
    user: Address,
}

#[async_trait]
impl ConfidentialLedger for FakeLedgerClient {
    fn address(&self) -> Address {
        self.ledger.address()
    }

    async fn submit(&self, input: &EncryptedInput) -> Result<TxReceipt> {
        self.ledger.apply(self.user, input)
    }

    async fn make_public(&self) -> Result<TxReceipt> {
        let inner = &self.ledger.inner;
        let total = *inner.total.lock().unwrap();
        inner.provider.make_public(total);
        let n = inner.publications.fetch_add(1, Ordering::SeqCst);
        Ok(TxReceipt {
            tx_hash: keccak256(total.as_slice()),
            block_number: Some(n as u64 + 1),
        })
    }

    async fn current_encrypted_value(&self) -> Result<Handle> {
        let inner = &self.ledger.inner;
        inner.value_reads.fetch_add(1, Ordering::SeqCst);
        let handle = *inner.total.lock().unwrap();
        let mut held = inner.hold.subscribe();
        let _ = held.wait_for(|held| !*held).await;
        Ok(handle)
    }
}
