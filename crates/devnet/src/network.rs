// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use alloy_primitives::{address, Address};
use cv_client::{Clock, SystemClock};
use cv_config::{ContractsConfig, NetworkConfig, RuntimeSettings};

use crate::{DevChain, DevJar, DevJarClient, DevRuntimeProvider};

pub const DEVNET_CHAIN_ID: u64 = 31337;
pub const DEVNET_GATEWAY_CHAIN_ID: u64 = 55815;
pub const ACL_ADDRESS: Address = address!("0x50157cffd6bbfa2dece204a89ec419c23ef5755d");
pub const KMS_VERIFIER_ADDRESS: Address = address!("0x1364cbbf2cdf5032c47d8226a6f6fbd2afcdacac");
pub const INPUT_VERIFIER_ADDRESS: Address = address!("0x901f8942346f7ab3a01f6d7613119bca447bb030");
pub const DECRYPTION_ORACLE_ADDRESS: Address =
    address!("0xb6e160b1ff80d67bfe90a85ee06ce0a2613607d1");
pub const JAR_ADDRESS: Address = address!("0x5fbdb2315678afecb367f032d93f642f64180aa3");

/// Settings that point a workflow at the devnet.
pub fn runtime_settings() -> RuntimeSettings {
    RuntimeSettings {
        network: NetworkConfig {
            name: "devnet".into(),
            chain_id: DEVNET_CHAIN_ID,
            gateway_chain_id: DEVNET_GATEWAY_CHAIN_ID,
            relayer_url: "http://127.0.0.1:3000".into(),
            rpc_url: "http://127.0.0.1:8545".into(),
            ..NetworkConfig::default()
        },
        contracts: ContractsConfig {
            acl: format!("{ACL_ADDRESS:#x}"),
            kms_verifier: format!("{KMS_VERIFIER_ADDRESS:#x}"),
            input_verifier: format!("{INPUT_VERIFIER_ADDRESS:#x}"),
            decryption_oracle: format!("{DECRYPTION_ORACLE_ADDRESS:#x}"),
            app: format!("{JAR_ADDRESS:#x}"),
        },
    }
}

/// A chain, a runtime provider and a deployed jar, wired together.
#[derive(Clone)]
pub struct DevNetwork {
    pub chain: Arc<DevChain>,
    pub provider: Arc<DevRuntimeProvider>,
    pub jar: Arc<DevJar>,
}

impl DevNetwork {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_provider(clock, DevRuntimeProvider::new)
    }

    /// Lets the caller tune the provider, e.g. with a boot delay.
    pub fn with_provider(
        clock: Arc<dyn Clock>,
        provider: impl FnOnce(Arc<DevChain>) -> DevRuntimeProvider,
    ) -> Self {
        let chain = DevChain::new(DEVNET_CHAIN_ID, clock);
        let jar = DevJar::deploy(chain.clone(), JAR_ADDRESS);
        Self {
            provider: Arc::new(provider(chain.clone())),
            chain,
            jar,
        }
    }

    pub fn start() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    pub fn settings(&self) -> RuntimeSettings {
        runtime_settings()
    }

    pub fn ledger_for(&self, sender: Address) -> Arc<DevJarClient> {
        self.jar.connect(sender)
    }
}
