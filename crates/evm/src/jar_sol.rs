// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{
    network::ReceiptResponse,
    primitives::Address,
    providers::{DynProvider, Provider},
    rpc::types::TransactionReceipt,
    sol,
};
use anyhow::{bail, Context};
use async_trait::async_trait;
use cv_client::{ClientError, ConfidentialLedger, EncryptedInput, Handle, Result, TxReceipt};
use cv_config::ClientConfig;
use tracing::{debug, info};

use crate::{EthProvider, LocalWallet, RpcEndpoint};

sol!(
    #[sol(rpc)]
    interface IConfidentialJar {
        function addCookies(bytes32 encryptedAmount, bytes calldata inputProof) external;
        function revealTotal() external;
        function encryptedTotal() external view returns (bytes32);
    }
);

/// The jar program on an EVM chain, reached through a signing provider.
#[derive(Clone)]
pub struct ConfidentialJarSol<P> {
    provider: EthProvider<P>,
    contract_address: Address,
}

impl<P: Provider + Clone + 'static> ConfidentialJarSol<P> {
    pub fn new(provider: EthProvider<P>, contract_address: Address) -> Self {
        Self {
            provider,
            contract_address,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.provider.chain_id()
    }
}

fn jar_address(config: &ClientConfig) -> anyhow::Result<Address> {
    config
        .runtime_settings()
        .app_address()
        .context("contracts.app must name the jar program")
}

fn ensure_chain(config: &ClientConfig, reported: u64) -> anyhow::Result<()> {
    if reported != config.network.chain_id {
        bail!(
            "rpc serves chain {reported} but network.chain_id is {}",
            config.network.chain_id
        );
    }
    Ok(())
}

/// The configured jar program, read-only.
pub async fn connect_jar_reader(
    config: &ClientConfig,
) -> anyhow::Result<ConfidentialJarSol<DynProvider>> {
    let address = jar_address(config)?;
    let provider = RpcEndpoint::from_network(&config.network)?.reader().await?;
    ensure_chain(config, provider.chain_id())?;
    Ok(ConfidentialJarSol::new(provider, address))
}

/// The configured jar program, sending transactions as `wallet`.
pub async fn connect_jar(
    config: &ClientConfig,
    wallet: &LocalWallet,
) -> anyhow::Result<ConfidentialJarSol<DynProvider>> {
    let address = jar_address(config)?;
    let provider = RpcEndpoint::from_network(&config.network)?
        .writer(wallet)
        .await?;
    ensure_chain(config, provider.chain_id())?;
    Ok(ConfidentialJarSol::new(provider, address))
}

/// Only confirmed, successful transactions become receipts.
fn confirmed(receipt: TransactionReceipt) -> Result<TxReceipt> {
    if !receipt.status() {
        return Err(ClientError::ledger(format!(
            "transaction {} reverted",
            receipt.transaction_hash
        )));
    }
    Ok(TxReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
    })
}

#[async_trait]
impl<P: Provider + Clone + 'static> ConfidentialLedger for ConfidentialJarSol<P> {
    fn address(&self) -> Address {
        self.contract_address
    }

    async fn submit(&self, input: &EncryptedInput) -> Result<TxReceipt> {
        let contract = IConfidentialJar::new(self.contract_address, self.provider.provider());
        let receipt = contract
            .addCookies(input.handle.as_b256(), input.proof.clone())
            .send()
            .await
            .map_err(ClientError::ledger)?
            .get_receipt()
            .await
            .map_err(ClientError::ledger)?;
        let receipt = confirmed(receipt)?;
        info!(tx = %receipt.tx_hash, "addCookies confirmed");
        Ok(receipt)
    }

    async fn make_public(&self) -> Result<TxReceipt> {
        let contract = IConfidentialJar::new(self.contract_address, self.provider.provider());
        let receipt = contract
            .revealTotal()
            .send()
            .await
            .map_err(ClientError::ledger)?
            .get_receipt()
            .await
            .map_err(ClientError::ledger)?;
        let receipt = confirmed(receipt)?;
        info!(tx = %receipt.tx_hash, "revealTotal confirmed");
        Ok(receipt)
    }

    async fn current_encrypted_value(&self) -> Result<Handle> {
        let contract = IConfidentialJar::new(self.contract_address, self.provider.provider());
        let total = contract
            .encryptedTotal()
            .call()
            .await
            .map_err(ClientError::ledger)?;
        debug!(handle = %total, "read encrypted total");
        Ok(Handle::from(total))
    }
}
