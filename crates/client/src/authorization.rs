// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use alloy_primitives::Address;
use anyhow::Context;
use cv_config::StoreKeys;
use cv_data::DataStore;
use cv_utils::{formatters::hexf, CancelToken, SingleFlight};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::{
    clock::SECONDS_PER_DAY, AuthorizationPayload, ClientError, Clock, Instance, Keypair, Result,
    WalletSigner,
};

/// A signed capability letting the runtime decrypt for one user and a fixed set of contracts.
/// Never mutated once issued; a renewal is a new authorization.
#[derive(Clone)]
pub struct Authorization {
    keypair: Keypair,
    signature: Vec<u8>,
    user_address: Address,
    contract_addresses: Vec<Address>,
    issued_at: u64,
    duration_days: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizationState {
    Absent,
    Valid,
    Expired,
}

impl Authorization {
    pub fn new(
        keypair: Keypair,
        signature: Vec<u8>,
        user_address: Address,
        contract_addresses: Vec<Address>,
        issued_at: u64,
        duration_days: u64,
    ) -> Self {
        Self {
            keypair,
            signature,
            user_address,
            contract_addresses,
            issued_at,
            duration_days,
        }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn user_address(&self) -> Address {
        self.user_address
    }

    pub fn contract_addresses(&self) -> &[Address] {
        &self.contract_addresses
    }

    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    pub fn duration_days(&self) -> u64 {
        self.duration_days
    }

    /// First second at which the authorization is no longer valid.
    pub fn expires_at(&self) -> u64 {
        self.issued_at
            .saturating_add(self.duration_days.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        now < self.expires_at()
    }

    pub fn state_at(&self, now: u64) -> AuthorizationState {
        if self.is_valid_at(now) {
            AuthorizationState::Valid
        } else {
            AuthorizationState::Expired
        }
    }

    /// Exact scope match: same user and the same set of contracts.
    pub fn is_scoped_to(&self, user: Address, contracts: &[Address]) -> bool {
        let ours: BTreeSet<_> = self.contract_addresses.iter().collect();
        let theirs: BTreeSet<_> = contracts.iter().collect();
        self.user_address == user && ours == theirs
    }

    pub fn covers(&self, contract: Address) -> bool {
        self.contract_addresses.contains(&contract)
    }

    /// Checks the authorization may be used by `user` against `contract` at `now`.
    pub fn ensure_usable(&self, user: Address, contract: Address, now: u64) -> Result<()> {
        if self.user_address != user {
            return Err(ClientError::AuthorizationMismatch(format!(
                "user {user} (issued to {})",
                self.user_address
            )));
        }
        if !self.covers(contract) {
            return Err(ClientError::AuthorizationMismatch(format!(
                "contract {contract}"
            )));
        }
        if !self.is_valid_at(now) {
            return Err(ClientError::AuthorizationExpired {
                expired_at: self.expires_at(),
                now,
            });
        }
        Ok(())
    }

    /// Rebuilds the payload that was signed, so a verifier can recover the signer.
    pub fn payload(&self, instance: &Instance) -> AuthorizationPayload {
        instance.create_authorization_payload(
            self.keypair.public_key(),
            &self.contract_addresses,
            self.issued_at,
            self.duration_days,
        )
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Sig<'a>(&'a [u8]);
        impl fmt::Debug for Sig<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                hexf(self.0, f)
            }
        }
        f.debug_struct("Authorization")
            .field("user_address", &self.user_address)
            .field("contract_addresses", &self.contract_addresses)
            .field("issued_at", &self.issued_at)
            .field("duration_days", &self.duration_days)
            .field("keypair", &self.keypair)
            .field("signature", &Sig(&self.signature))
            .finish()
    }
}

/// On-disk form. Addresses are kept as lower-case hex so records stay readable.
#[derive(Serialize, Deserialize)]
struct AuthorizationRecord {
    public_key: Vec<u8>,
    private_key: Vec<u8>,
    signature: Vec<u8>,
    user_address: String,
    contract_addresses: Vec<String>,
    issued_at: u64,
    duration_days: u64,
}

impl Drop for AuthorizationRecord {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl From<&Authorization> for AuthorizationRecord {
    fn from(value: &Authorization) -> Self {
        Self {
            public_key: value.keypair.public_key().to_vec(),
            private_key: value.keypair.private_key().to_vec(),
            signature: value.signature.clone(),
            user_address: format!("{:#x}", value.user_address),
            contract_addresses: value
                .contract_addresses
                .iter()
                .map(|a| format!("{a:#x}"))
                .collect(),
            issued_at: value.issued_at,
            duration_days: value.duration_days,
        }
    }
}

impl TryFrom<&AuthorizationRecord> for Authorization {
    type Error = anyhow::Error;

    fn try_from(record: &AuthorizationRecord) -> anyhow::Result<Self> {
        let user_address = Address::from_str(&record.user_address)
            .context("stored user address is malformed")?;
        let contract_addresses = record
            .contract_addresses
            .iter()
            .map(|a| Address::from_str(a).context("stored contract address is malformed"))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Authorization::new(
            Keypair::new(record.public_key.clone(), record.private_key.clone()),
            record.signature.clone(),
            user_address,
            contract_addresses,
            record.issued_at,
            record.duration_days,
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct AuthorizationKey {
    user: Address,
    contract: Address,
}

impl AuthorizationKey {
    fn store_key(&self) -> String {
        StoreKeys::authorization(&self.user, &self.contract)
    }
}

struct CacheInner {
    store: DataStore,
    memory: Mutex<HashMap<AuthorizationKey, Authorization>>,
    clock: Arc<dyn Clock>,
    duration_days: u64,
}

impl CacheInner {
    fn memory(&self) -> MutexGuard<'_, HashMap<AuthorizationKey, Authorization>> {
        self.memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, key: &AuthorizationKey) -> Option<Authorization> {
        let now = self.clock.now();
        let contracts = [key.contract];

        let remembered = self.memory().get(key).cloned();
        if let Some(found) = remembered {
            if found.is_scoped_to(key.user, &contracts) && found.is_valid_at(now) {
                debug!(user = %key.user, contract = %key.contract, "authorization cache hit");
                return Some(found);
            }
            self.memory().remove(key);
        }

        let slot = self.store.base(key.store_key());
        let record = match slot.read::<AuthorizationRecord>() {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!("ignoring unreadable stored authorization: {e:#}");
                return None;
            }
        };
        let stored = match Authorization::try_from(&record) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("ignoring malformed stored authorization: {e:#}");
                return None;
            }
        };
        if !stored.is_scoped_to(key.user, &contracts) {
            debug!(
                user = %key.user,
                contract = %key.contract,
                "stored authorization belongs to another scope"
            );
            return None;
        }
        if !stored.is_valid_at(now) {
            info!(
                user = %key.user,
                contract = %key.contract,
                expired_at = stored.expires_at(),
                "stored authorization expired"
            );
            if let Err(e) = slot.clear() {
                warn!("could not remove expired authorization: {e:#}");
            }
            return None;
        }

        debug!(user = %key.user, contract = %key.contract, "authorization restored from store");
        self.memory().insert(*key, stored.clone());
        Some(stored)
    }

    fn remember(&self, key: &AuthorizationKey, authorization: &Authorization) {
        self.memory().insert(*key, authorization.clone());
        if let Err(e) = self
            .store
            .base(key.store_key())
            .write(&AuthorizationRecord::from(authorization))
        {
            warn!("authorization not persisted, usable for this session only: {e:#}");
        }
    }

    async fn create(
        self: Arc<Self>,
        instance: Arc<Instance>,
        key: AuthorizationKey,
        signer: Arc<dyn WalletSigner>,
        cancel: CancelToken,
    ) -> Result<Authorization> {
        let keypair = instance.generate_keypair();
        let issued_at = self.clock.now();
        let contracts = vec![key.contract];
        let payload = instance.create_authorization_payload(
            keypair.public_key(),
            &contracts,
            issued_at,
            self.duration_days,
        );

        info!(user = %key.user, contract = %key.contract, "requesting decryption authorization signature");
        let signature = match cancel.run(signer.sign_typed_data(&payload)).await {
            None => {
                info!("authorization signature prompt cancelled");
                return Err(ClientError::Cancelled);
            }
            Some(Err(e @ (ClientError::SigningRejected(_) | ClientError::Cancelled))) => {
                return Err(e)
            }
            Some(Err(e)) => return Err(ClientError::SigningRejected(e.to_string())),
            Some(Ok(signature)) => signature,
        };
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let authorization = Authorization::new(
            keypair,
            signature.as_bytes().to_vec(),
            key.user,
            contracts,
            issued_at,
            self.duration_days,
        );
        self.remember(&key, &authorization);
        info!(
            user = %key.user,
            contract = %key.contract,
            expires_at = authorization.expires_at(),
            "decryption authorization issued"
        );
        Ok(authorization)
    }
}

/// Creates, persists and expires decryption authorizations, keyed by (user, contract).
///
/// Lookups consult an in-memory layer first, then the configured store. Creation for the
/// same key is single-flight so concurrent readers produce one signature prompt.
#[derive(Clone)]
pub struct AuthorizationCache {
    inner: Arc<CacheInner>,
    creations: Arc<SingleFlight<AuthorizationKey, Authorization, ClientError>>,
}

impl AuthorizationCache {
    pub fn new(store: DataStore, clock: Arc<dyn Clock>, duration_days: u64) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store,
                memory: Mutex::new(HashMap::new()),
                clock,
                duration_days,
            }),
            creations: Arc::new(SingleFlight::new()),
        }
    }

    pub fn duration_days(&self) -> u64 {
        self.inner.duration_days
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.inner.clock.clone()
    }

    /// A valid authorization for (user, contract) if one is cached.
    pub fn lookup(&self, user: Address, contract: Address) -> Option<Authorization> {
        self.inner.lookup(&AuthorizationKey { user, contract })
    }

    /// Inspects the entry for (user, contract) without evicting or prompting.
    pub fn state(&self, user: Address, contract: Address) -> AuthorizationState {
        let key = AuthorizationKey { user, contract };
        let remembered = self.inner.memory().get(&key).cloned();
        let candidate = remembered.or_else(|| {
            let record = self
                .inner
                .store
                .base(key.store_key())
                .read::<AuthorizationRecord>()
                .ok()
                .flatten()?;
            Authorization::try_from(&record).ok()
        });
        match candidate {
            Some(found) if found.is_scoped_to(user, &[contract]) => {
                found.state_at(self.inner.clock.now())
            }
            _ => AuthorizationState::Absent,
        }
    }

    /// Returns the cached authorization for the signer and `contract`, or asks the signer for a
    /// new one. Cancelling `cancel` stops this caller waiting; the prompt itself is abandoned,
    /// with nothing cached, once no caller is waiting on it.
    pub async fn load_or_create(
        &self,
        instance: &Arc<Instance>,
        contract: Address,
        signer: Arc<dyn WalletSigner>,
        cancel: &CancelToken,
    ) -> Result<Authorization> {
        let key = AuthorizationKey {
            user: signer.address(),
            contract,
        };
        if let Some(found) = self.inner.lookup(&key) {
            return Ok(found);
        }

        let inner = self.inner.clone();
        let instance = instance.clone();
        let creation = self.creations.run(key, move |flight_cancel| {
            inner.create(instance, key, signer, flight_cancel)
        });
        match cancel.run(creation).await {
            Some(outcome) => outcome,
            None => Err(ClientError::Cancelled),
        }
    }

    /// Drops the entry for (user, contract) from memory and the store.
    pub fn invalidate(&self, user: Address, contract: Address) {
        let key = AuthorizationKey { user, contract };
        self.inner.memory().remove(&key);
        if let Err(e) = self.inner.store.base(key.store_key()).clear() {
            warn!("could not remove stored authorization: {e:#}");
        }
        debug!(%user, %contract, "authorization invalidated");
    }

    /// Removes every authorization held for `user`. Returns how many stored entries went.
    pub fn logout(&self, user: Address) -> usize {
        self.inner.memory().retain(|key, _| key.user != user);
        let scope = self.inner.store.base(StoreKeys::authorizations_for(&user));
        let removed = match scope.entries() {
            Ok(entries) => entries
                .into_iter()
                .filter(|(key, _)| match scope.base(key.as_str()).clear() {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("could not remove {key}: {e:#}");
                        false
                    }
                })
                .count(),
            Err(e) => {
                warn!("could not list stored authorizations for {user}: {e:#}");
                0
            }
        };
        info!(%user, removed, "logged out");
        removed
    }

    /// Every well-formed stored authorization, expired ones included.
    pub fn stored(&self) -> anyhow::Result<Vec<Authorization>> {
        let scope = self.inner.store.base(StoreKeys::authorizations());
        let mut found = Vec::new();
        for (key, _) in scope.entries()? {
            let Some(record) = scope.base(key.as_str()).read::<AuthorizationRecord>()? else {
                continue;
            };
            match Authorization::try_from(&record) {
                Ok(authorization) => found.push(authorization),
                Err(e) => warn!("skipping {key}: {e:#}"),
            }
        }
        Ok(found)
    }
}
