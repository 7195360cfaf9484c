// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use cv_client::ConfidentialLedger;
use cv_config::ClientConfig;
use cv_evm::connect_jar;
use zeroize::Zeroizing;

use crate::wallet_get::wallet_from;

pub async fn execute(config: &ClientConfig, private_key: Option<Zeroizing<String>>) -> Result<()> {
    let wallet = wallet_from(private_key)?;
    let jar = connect_jar(config, &wallet).await?;
    let receipt = jar.make_public().await?;
    println!("total made public in tx {}", receipt.tx_hash);

    Ok(())
}
