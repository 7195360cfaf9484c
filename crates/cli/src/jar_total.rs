// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use cv_client::ConfidentialLedger;
use cv_config::ClientConfig;
use cv_evm::connect_jar_reader;

pub async fn execute(config: &ClientConfig) -> Result<()> {
    let jar = connect_jar_reader(config).await?;
    let total = jar.current_encrypted_value().await?;
    println!("{total}");

    Ok(())
}
