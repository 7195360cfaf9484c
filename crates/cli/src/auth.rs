// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::Result;
use clap::Subcommand;
use cv_config::ClientConfig;

use crate::{auth_clear, auth_show};

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// List stored authorizations and whether they are still usable
    Show,
    /// Remove stored authorizations
    Clear {
        /// Only remove the authorizations of this user
        #[arg(long)]
        user: Option<Address>,
    },
}

pub async fn execute(command: AuthCommands, config: &ClientConfig) -> Result<()> {
    match command {
        AuthCommands::Show => auth_show::execute(config).await?,
        AuthCommands::Clear { user } => auth_clear::execute(config, user).await?,
    };

    Ok(())
}
