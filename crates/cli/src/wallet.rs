// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use clap::Subcommand;
use zeroize::Zeroizing;

use crate::{helpers::ensure_hex_zeroizing, wallet_get};

#[derive(Subcommand, Debug)]
pub enum WalletCommands {
    /// Print the address a private key signs for
    Get {
        /// The private key. Falls back to the PRIVATE_KEY environment variable
        #[arg(long = "private-key", value_parser = ensure_hex_zeroizing)]
        private_key: Option<Zeroizing<String>>,
    },
}

pub async fn execute(command: WalletCommands) -> Result<()> {
    match command {
        WalletCommands::Get { private_key } => wallet_get::execute(private_key).await?,
    };

    Ok(())
}
