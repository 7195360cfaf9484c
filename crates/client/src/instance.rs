// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use alloy_primitives::Address;
use cv_config::{RuntimeConfig, RuntimeSettings};
use cv_utils::SingleFlight;
use tracing::{debug, error, info};

use crate::{
    Authorization, AuthorizationPayload, ClientError, EncryptedInputRequest, EncryptedInputs,
    FheRuntime, Handle, Keypair, Result, RuntimeProvider,
};

/// A ready runtime bound to the configuration it was booted with.
pub struct Instance {
    id: u64,
    config: RuntimeConfig,
    runtime: Arc<dyn FheRuntime>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("network", &self.config.network)
            .field("chain_id", &self.config.chain_id)
            .finish()
    }
}

impl Instance {
    pub fn new(id: u64, config: RuntimeConfig, runtime: Arc<dyn FheRuntime>) -> Self {
        Self {
            id,
            config,
            runtime,
        }
    }

    /// Distinguishes instances booted by the same manager.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub async fn encrypt(&self, request: &EncryptedInputRequest) -> Result<EncryptedInputs> {
        if request.is_empty() {
            return Err(ClientError::Validation(
                "encrypted input request carries no values".into(),
            ));
        }
        let inputs = self.runtime.encrypt(request).await?;
        if inputs.handles.len() != request.len() {
            return Err(ClientError::runtime(format!(
                "runtime returned {} handles for {} values",
                inputs.handles.len(),
                request.len()
            )));
        }
        Ok(inputs)
    }

    pub fn generate_keypair(&self) -> Keypair {
        self.runtime.generate_keypair()
    }

    pub fn create_authorization_payload(
        &self,
        public_key: &[u8],
        contracts: &[Address],
        issued_at: u64,
        duration_days: u64,
    ) -> AuthorizationPayload {
        AuthorizationPayload::new(&self.config, public_key, contracts, issued_at, duration_days)
    }

    pub async fn user_decrypt(
        &self,
        handle: Handle,
        contract: Address,
        authorization: &Authorization,
    ) -> Result<u64> {
        self.runtime
            .user_decrypt(handle, contract, authorization)
            .await
    }

    pub async fn public_decrypt(&self, handle: Handle) -> Result<u64> {
        self.runtime.public_decrypt(handle).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceStatus {
    Uninitialised,
    Initialising,
    Ready,
}

/// Owns the one runtime instance of a process.
///
/// Concurrent first calls to [`InstanceManager::ensure_instance`] share a single boot. A failed
/// boot is reported to every waiter and forgotten, so the next call starts over. `reset`
/// bumps a generation counter; a boot that began under an older generation never installs.
pub struct InstanceManager {
    provider: Arc<dyn RuntimeProvider>,
    ready: Mutex<Option<Arc<Instance>>>,
    generation: AtomicU64,
    boots: SingleFlight<u64, Arc<Instance>, ClientError>,
}

impl InstanceManager {
    pub fn new(provider: Arc<dyn RuntimeProvider>) -> Self {
        Self {
            provider,
            ready: Mutex::new(None),
            generation: AtomicU64::new(0),
            boots: SingleFlight::new(),
        }
    }

    pub async fn ensure_instance(&self, settings: &RuntimeSettings) -> Result<Arc<Instance>> {
        let config = settings.validate().map_err(ClientError::configuration)?;

        if let Some(instance) = self.current() {
            debug!("runtime instance {} already ready", instance.id());
            return Self::matching(instance, &config);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let provider = self.provider.clone();
        let boot_config = config.clone();
        let instance = self
            .boots
            .run(generation, move |_| async move {
                info!(
                    network = %boot_config.network,
                    chain_id = boot_config.chain_id,
                    "initialising encryption runtime"
                );
                match provider.init(&boot_config).await {
                    Ok(runtime) => {
                        info!("encryption runtime ready");
                        Ok(Arc::new(Instance::new(generation, boot_config, runtime)))
                    }
                    Err(e) => {
                        error!("encryption runtime failed to initialise: {e}");
                        Err(e)
                    }
                }
            })
            .await?;

        {
            let mut ready = self.lock();
            if self.generation.load(Ordering::SeqCst) != generation {
                return Err(ClientError::runtime(
                    "runtime was reset while initialising",
                ));
            }
            match ready.as_ref() {
                Some(existing) => return Self::matching(existing.clone(), &config),
                None => *ready = Some(instance.clone()),
            }
        }
        Self::matching(instance, &config)
    }

    /// The ready instance, if any. Never boots.
    pub fn current(&self) -> Option<Arc<Instance>> {
        self.lock().clone()
    }

    pub fn status(&self) -> InstanceStatus {
        if self.lock().is_some() {
            InstanceStatus::Ready
        } else if self
            .boots
            .is_pending(&self.generation.load(Ordering::SeqCst))
        {
            InstanceStatus::Initialising
        } else {
            InstanceStatus::Uninitialised
        }
    }

    /// Drops the current instance, e.g. on a network switch.
    pub fn reset(&self) {
        let mut ready = self.lock();
        let previous = self.generation.fetch_add(1, Ordering::SeqCst);
        self.boots.forget(&previous);
        if ready.take().is_some() {
            info!("runtime instance dropped");
        }
    }

    fn matching(instance: Arc<Instance>, config: &RuntimeConfig) -> Result<Arc<Instance>> {
        if instance.config() != config {
            return Err(ClientError::Configuration(format!(
                "runtime already initialised for network '{}' (chain {}); reset first",
                instance.config().network,
                instance.config().chain_id
            )));
        }
        Ok(instance)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Instance>>> {
        self.ready
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
