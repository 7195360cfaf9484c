// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use clap::Subcommand;
use cv_config::ClientConfig;
use zeroize::Zeroizing;

use crate::{helpers::ensure_hex_zeroizing, jar_reveal, jar_total};

#[derive(Subcommand, Debug)]
pub enum JarCommands {
    /// Print the handle of the jar's current encrypted total
    Total,
    /// Mark the current total publicly decryptable
    Reveal {
        /// The sending wallet's private key. Falls back to the PRIVATE_KEY environment variable
        #[arg(long = "private-key", value_parser = ensure_hex_zeroizing)]
        private_key: Option<Zeroizing<String>>,
    },
}

pub async fn execute(command: JarCommands, config: &ClientConfig) -> Result<()> {
    match command {
        JarCommands::Total => jar_total::execute(config).await?,
        JarCommands::Reveal { private_key } => jar_reveal::execute(config, private_key).await?,
    };

    Ok(())
}
