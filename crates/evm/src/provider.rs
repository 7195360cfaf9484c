// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::{ClientBuilder, RpcClient},
    transports::{
        http::{
            reqwest::{
                header::{HeaderMap, HeaderValue, AUTHORIZATION},
                Client,
            },
            Http,
        },
        ws::{WebSocketConfig, WsConnect},
        Authorization,
    },
};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use cv_config::{NetworkConfig, RpcAuth, RPC};
use tracing::debug;

use crate::LocalWallet;

const WS_MAX_FRAME: usize = 32 * 1024 * 1024;

/// `Authorization` header for HTTP endpoints.
fn http_authorization(auth: &RpcAuth) -> Option<HeaderValue> {
    let value = match auth {
        RpcAuth::None => return None,
        RpcAuth::Basic { username, password } => {
            format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
        }
        RpcAuth::Bearer(token) => format!("Bearer {token}"),
    };
    HeaderValue::from_str(&value).ok()
}

fn ws_authorization(auth: &RpcAuth) -> Option<Authorization> {
    match auth {
        RpcAuth::None => None,
        RpcAuth::Basic { username, password } => Some(Authorization::basic(username, password)),
        RpcAuth::Bearer(token) => Some(Authorization::bearer(token)),
    }
}

/// A connected provider and the chain it reported.
#[derive(Clone)]
pub struct EthProvider<P> {
    provider: Arc<P>,
    chain_id: u64,
}

impl<P: Provider + Clone> EthProvider<P> {
    pub async fn new(provider: P) -> Result<Self> {
        let chain_id = provider
            .get_chain_id()
            .await
            .context("Could not read the chain id")?;
        Ok(Self {
            provider: Arc::new(provider),
            chain_id,
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

/// The JSON-RPC endpoint of the ledger chain and the credentials it wants.
#[derive(Clone, Debug)]
pub struct RpcEndpoint {
    rpc: RPC,
    auth: RpcAuth,
}

impl RpcEndpoint {
    pub fn new(rpc: RPC, auth: RpcAuth) -> Self {
        Self { rpc, auth }
    }

    pub fn from_network(network: &NetworkConfig) -> Result<Self> {
        let rpc = RPC::from_url(&network.rpc_url)
            .with_context(|| format!("network.rpc_url '{}' is not usable", network.rpc_url))?;
        Ok(Self::new(rpc, network.rpc_auth.clone()))
    }

    /// One RPC client for either transport, carrying the configured credentials.
    pub async fn client(&self) -> Result<RpcClient> {
        debug!(url = %self.rpc.url(), "connecting to rpc");
        if self.rpc.is_websocket() {
            let config = WebSocketConfig::default()
                .max_frame_size(Some(WS_MAX_FRAME))
                .max_message_size(Some(WS_MAX_FRAME));
            let connect = WsConnect::new(self.rpc.url().as_str())
                .with_config(config)
                .with_auth_opt(ws_authorization(&self.auth));
            return ClientBuilder::default()
                .ws(connect)
                .await
                .with_context(|| format!("Could not open a websocket to {}", self.rpc.url()));
        }

        let mut headers = HeaderMap::new();
        if let Some(value) = http_authorization(&self.auth) {
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(RpcClient::new(
            Http::with_client(client, self.rpc.url().clone()),
            false,
        ))
    }

    pub async fn reader(&self) -> Result<EthProvider<DynProvider>> {
        let provider = ProviderBuilder::new()
            .connect_client(self.client().await?)
            .erased();
        EthProvider::new(provider).await
    }

    /// A provider that signs and sends transactions as `wallet`.
    pub async fn writer(
        &self,
        wallet: &LocalWallet,
    ) -> Result<EthProvider<DynProvider>> {
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(wallet.signer().clone()))
            .connect_client(self.client().await?)
            .erased();
        EthProvider::new(provider).await
    }
}
