// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use anyhow::Result;
use cv_client::{
    AuthorizationCache, InstanceManager, RevealMode, SystemClock, WalletSigner, Workflow,
};
use cv_config::ClientConfig;
use cv_data::DataStore;
use cv_devnet::DevNetwork;
use cv_evm::LocalWallet;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::wallet_get::wallet_from;

pub async fn execute(
    config: &ClientConfig,
    private_key: Option<Zeroizing<String>>,
    add: Vec<u64>,
    public: bool,
) -> Result<()> {
    let wallet = match wallet_from(private_key) {
        Ok(wallet) => wallet,
        Err(e) => {
            warn!("{e:#}, using a throwaway wallet");
            LocalWallet::random()
        }
    };
    let user = wallet.address();

    let net = DevNetwork::start();
    let store = DataStore::open_or_ephemeral(&config.storage);
    let authorizations = AuthorizationCache::new(
        store,
        Arc::new(SystemClock),
        config.authorization_duration_days()?,
    );
    let workflow = Workflow::new(
        net.settings(),
        Arc::new(InstanceManager::new(net.provider.clone())),
        authorizations,
    );
    workflow.connect(Arc::new(wallet), net.ledger_for(user));
    info!(%user, jar = %net.jar.address(), "demo started");

    for value in add {
        let receipt = workflow.submit(value).await?;
        println!("added {value} in tx {}", receipt.tx_hash);
    }

    let revealed = if public {
        workflow.reveal_public().await?
    } else {
        workflow.reveal_private().await?
    };
    let mode = match revealed.mode {
        RevealMode::Private => "private",
        RevealMode::Public => "public",
    };
    println!("total ({mode}): {}", revealed.value);

    Ok(())
}
