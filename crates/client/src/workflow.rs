// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::{Arc, RwLock};

use alloy_primitives::Address;
use cv_config::{ClientConfig, RuntimeSettings};
use cv_data::DataStore;
use cv_utils::{CancelToken, SingleFlight};
use tracing::{debug, info, warn};

use crate::{
    build_typed_input, AuthorizationCache, CachedPlaintext, ClientError, Clock,
    ConfidentialLedger, DecryptionPipeline, DecryptionTarget, FheType, Handle, Instance,
    InstanceManager, PlaintextCache, Result, RevealMode, RuntimeProvider, TxReceipt, WalletSigner,
    DEFAULT_VALUE_TYPE,
};

/// The connected wallet and the ledger program it talks to.
#[derive(Clone)]
pub struct Session {
    pub signer: Arc<dyn WalletSigner>,
    pub ledger: Arc<dyn ConfidentialLedger>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ReadOp {
    Private,
    Public { publish: bool },
}

/// Everything a read needs, detached from the workflow so it can run as a shared flight.
struct ReadContext {
    settings: RuntimeSettings,
    instances: Arc<InstanceManager>,
    authorizations: AuthorizationCache,
    pipeline: DecryptionPipeline,
    session: Session,
}

impl ReadContext {
    async fn run(self, op: ReadOp, cancel: CancelToken) -> Result<CachedPlaintext> {
        let instance = self.instances.ensure_instance(&self.settings).await?;
        let ledger = self.session.ledger.clone();
        match op {
            ReadOp::Private => {
                let handle = ledger.current_encrypted_value().await?;
                let value = self.decrypt_private(&instance, handle, &cancel).await?;
                Ok(CachedPlaintext {
                    value,
                    handle,
                    mode: RevealMode::Private,
                    stale: false,
                })
            }
            ReadOp::Public { publish } => {
                if publish {
                    let receipt = ledger.make_public().await?;
                    info!(tx = %receipt.tx_hash, "value marked publicly decryptable");
                }
                let handle = ledger.current_encrypted_value().await?;
                let value = self.pipeline.decrypt_public(&instance, handle).await?;
                Ok(CachedPlaintext {
                    value,
                    handle,
                    mode: RevealMode::Public,
                    stale: false,
                })
            }
        }
    }

    async fn decrypt_private(
        &self,
        instance: &Arc<Instance>,
        handle: Handle,
        cancel: &CancelToken,
    ) -> Result<u64> {
        let signer = self.session.signer.clone();
        let target = DecryptionTarget {
            handle,
            contract: self.session.ledger.address(),
            user: signer.address(),
        };
        let authorization = self
            .authorizations
            .load_or_create(instance, target.contract, signer.clone(), cancel)
            .await?;

        match self.pipeline.decrypt(instance, &target, &authorization).await {
            Err(ClientError::AuthorizationExpired { expired_at, .. }) => {
                warn!(expired_at, "decryption authorization expired, requesting a new one");
                self.authorizations.invalidate(target.user, target.contract);
                let renewed = self
                    .authorizations
                    .load_or_create(instance, target.contract, signer, cancel)
                    .await?;
                self.pipeline.decrypt(instance, &target, &renewed).await
            }
            outcome => outcome,
        }
    }
}

/// Ties writes and reads of the confidential value together.
///
/// A successful `submit` clears the cached plaintext before it returns. Reads are lazy and
/// single-flight per reveal mode; a read that straddles a write never repopulates the cache.
pub struct Workflow {
    settings: RuntimeSettings,
    instances: Arc<InstanceManager>,
    authorizations: AuthorizationCache,
    pipeline: DecryptionPipeline,
    plaintext: PlaintextCache,
    session: RwLock<Option<Session>>,
    reads: SingleFlight<(ReadOp, u64), CachedPlaintext, ClientError>,
    value_type: FheType,
}

impl Workflow {
    pub fn new(
        settings: RuntimeSettings,
        instances: Arc<InstanceManager>,
        authorizations: AuthorizationCache,
    ) -> Self {
        let pipeline = DecryptionPipeline::new(authorizations.clock());
        Self {
            settings,
            instances,
            authorizations,
            pipeline,
            plaintext: PlaintextCache::new(),
            session: RwLock::new(None),
            reads: SingleFlight::new(),
            value_type: DEFAULT_VALUE_TYPE,
        }
    }

    /// Wires a workflow from loaded configuration. Durable storage that cannot be opened
    /// degrades to an ephemeral store.
    pub fn from_config(
        config: &ClientConfig,
        provider: Arc<dyn RuntimeProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let duration_days = config
            .authorization_duration_days()
            .map_err(ClientError::configuration)?;
        let store = DataStore::open_or_ephemeral(&config.storage);
        let authorizations = AuthorizationCache::new(store, clock, duration_days);
        Ok(Self::new(
            config.runtime_settings(),
            Arc::new(InstanceManager::new(provider)),
            authorizations,
        ))
    }

    pub fn with_value_type(mut self, value_type: FheType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn instances(&self) -> &Arc<InstanceManager> {
        &self.instances
    }

    pub fn authorizations(&self) -> &AuthorizationCache {
        &self.authorizations
    }

    pub fn connect(
        &self,
        signer: Arc<dyn WalletSigner>,
        ledger: Arc<dyn ConfidentialLedger>,
    ) {
        let user = signer.address();
        let contract = ledger.address();
        let previous = self
            .session_write()
            .replace(Session { signer, ledger })
            .map(|s| (s.signer.address(), s.ledger.address()));
        if previous != Some((user, contract)) {
            self.plaintext.clear();
        }
        info!(%user, %contract, "wallet connected");
    }

    /// Logs the wallet out: forgets the displayed value and every authorization of the user.
    pub fn disconnect(&self) -> Option<Address> {
        let previous = self.session_write().take();
        self.plaintext.clear();
        let user = previous?.signer.address();
        self.authorizations.logout(user);
        info!(%user, "wallet disconnected");
        Some(user)
    }

    pub fn current_user(&self) -> Option<Address> {
        self.session_read().as_ref().map(|s| s.signer.address())
    }

    /// Last revealed value, if any survives.
    pub fn cached(&self) -> Option<CachedPlaintext> {
        self.plaintext.get()
    }

    /// Encrypts `value` and submits it. Resolves only after the cached plaintext is cleared.
    pub async fn submit(&self, value: u64) -> Result<TxReceipt> {
        self.value_type.check(value)?;
        let session = self.session()?;
        let instance = self.instances.ensure_instance(&self.settings).await?;
        let input = build_typed_input(
            &instance,
            session.ledger.address(),
            session.signer.address(),
            self.value_type,
            value,
        )
        .await?;
        let receipt = session.ledger.submit(&input).await?;
        self.plaintext.clear();
        info!(tx = %receipt.tx_hash, handle = %input.handle, "encrypted value submitted");
        Ok(receipt)
    }

    pub async fn reveal_private(&self) -> Result<CachedPlaintext> {
        self.reveal_private_with(&CancelToken::new()).await
    }

    /// Private reveal this caller can stop waiting on through `cancel`. A signature prompt is
    /// abandoned once no reader is waiting on it.
    pub async fn reveal_private_with(&self, cancel: &CancelToken) -> Result<CachedPlaintext> {
        self.read(ReadOp::Private, cancel).await
    }

    /// Marks the value public on the ledger, waits for confirmation, then decrypts it.
    pub async fn reveal_public(&self) -> Result<CachedPlaintext> {
        self.read(ReadOp::Public { publish: true }, &CancelToken::new())
            .await
    }

    /// Re-runs the read path in the mode of the last reveal without writing anything.
    pub async fn refresh(&self) -> Result<CachedPlaintext> {
        let op = match self.plaintext.get().map(|entry| entry.mode) {
            Some(RevealMode::Public) => ReadOp::Public { publish: false },
            _ => ReadOp::Private,
        };
        self.read(op, &CancelToken::new()).await
    }

    /// Compares the ledger's current handle with the cached one and flags a mismatch.
    pub async fn check_staleness(&self) -> Result<bool> {
        let session = self.session()?;
        let handle = session.ledger.current_encrypted_value().await?;
        Ok(self.plaintext.mark_stale_unless(handle))
    }

    async fn read(&self, op: ReadOp, cancel: &CancelToken) -> Result<CachedPlaintext> {
        let session = self.session()?;
        let epoch = self.plaintext.epoch();
        let context = ReadContext {
            settings: self.settings.clone(),
            instances: self.instances.clone(),
            authorizations: self.authorizations.clone(),
            pipeline: self.pipeline.clone(),
            session,
        };
        let flight = self
            .reads
            .run((op, epoch), move |flight_cancel| context.run(op, flight_cancel));
        let entry = match cancel.run(flight).await {
            Some(outcome) => outcome?,
            None => return Err(ClientError::Cancelled),
        };
        if !self.plaintext.store_if_current(epoch, entry) {
            debug!("value changed while reading, not caching {:?} result", entry.mode);
        }
        Ok(entry)
    }

    fn session(&self) -> Result<Session> {
        self.session_read()
            .clone()
            .ok_or(ClientError::WalletUnavailable)
    }

    fn session_read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn session_write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
