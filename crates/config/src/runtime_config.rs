// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::str::FromStr;

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::rpc::{parse_relayer_url, RpcAuth};

/// Network the runtime and ledger live on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    pub name: String,
    /// Chain hosting the confidential program
    pub chain_id: u64,
    /// Chain the decryption gateway verifies authorizations against
    pub gateway_chain_id: u64,
    pub relayer_url: String,
    pub rpc_url: String,
    pub rpc_auth: RpcAuth,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "base-sepolia".to_string(),
            chain_id: 84532,
            gateway_chain_id: 55815,
            relayer_url: "https://relayer.testnet.zama.cloud".to_string(),
            rpc_url: "https://sepolia.base.org".to_string(),
            rpc_auth: RpcAuth::None,
        }
    }
}

/// Verifying contracts plus the application program, as configured (unchecked strings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct ContractsConfig {
    pub acl: String,
    pub kms_verifier: String,
    pub input_verifier: String,
    pub decryption_oracle: String,
    pub app: String,
}

/// Unvalidated input for booting a runtime instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuntimeSettings {
    pub network: NetworkConfig,
    pub contracts: ContractsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifyingContracts {
    pub acl: Address,
    pub kms_verifier: Address,
    pub input_verifier: Address,
    pub decryption_oracle: Address,
}

/// Checked runtime configuration. Two instances are interchangeable iff their configs are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub network: String,
    pub chain_id: u64,
    pub gateway_chain_id: u64,
    pub relayer_url: Url,
    pub contracts: VerifyingContracts,
}

pub fn parse_address(field: &str, value: &str) -> Result<Address> {
    let value = value.trim();
    if value.is_empty() {
        bail!("contracts.{field} is not set");
    }
    Address::from_str(value).with_context(|| format!("contracts.{field} '{value}' is not a valid address"))
}

impl RuntimeSettings {
    pub fn validate(&self) -> Result<RuntimeConfig> {
        let network = &self.network;
        if network.chain_id == 0 {
            bail!("network.chain_id must be non-zero");
        }
        if network.gateway_chain_id == 0 {
            bail!("network.gateway_chain_id must be non-zero");
        }
        let relayer_url = parse_relayer_url(&network.relayer_url)?;
        let c = &self.contracts;
        Ok(RuntimeConfig {
            network: network.name.clone(),
            chain_id: network.chain_id,
            gateway_chain_id: network.gateway_chain_id,
            relayer_url,
            contracts: VerifyingContracts {
                acl: parse_address("acl", &c.acl)?,
                kms_verifier: parse_address("kms_verifier", &c.kms_verifier)?,
                input_verifier: parse_address("input_verifier", &c.input_verifier)?,
                decryption_oracle: parse_address("decryption_oracle", &c.decryption_oracle)?,
            },
        })
    }

    /// The application program the workflow talks to.
    pub fn app_address(&self) -> Result<Address> {
        parse_address("app", &self.contracts.app)
    }
}
