// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use cv_config::load_config;
use tracing::{info, instrument, Level};
use zeroize::Zeroizing;

use crate::auth::{self, AuthCommands};
use crate::helpers::{ensure_hex_zeroizing, telemetry::setup_simple_tracing};
use crate::jar::{self, JarCommands};
use crate::wallet::{self, WalletCommands};
use crate::demo;

#[derive(Parser, Debug)]
#[command(name = "cv")]
#[command(about = "Add to and reveal an encrypted on-chain value", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `cv -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());
        let config = load_config(self.config.as_deref())?;
        info!("Config loaded from: {:?}", config.found_config_file);

        match self.command {
            Commands::Demo {
                private_key,
                add,
                public,
            } => demo::execute(&config, private_key, add, public).await?,
            Commands::Auth { command } => auth::execute(command, &config).await?,
            Commands::Jar { command } => jar::execute(command, &config).await?,
            Commands::Wallet { command } => wallet::execute(command).await?,
        }

        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the add and reveal flow against an in-process devnet
    Demo {
        /// Wallet private key. Falls back to the PRIVATE_KEY environment variable, then to a
        /// throwaway key
        #[arg(long = "private-key", value_parser = ensure_hex_zeroizing)]
        private_key: Option<Zeroizing<String>>,

        /// Values to add, in order
        #[arg(long = "add", num_args = 1.., default_values_t = vec![1u64])]
        add: Vec<u64>,

        /// Publish the total and reveal it publicly instead of privately
        #[arg(long)]
        public: bool,
    },

    /// Inspect or clear persisted decryption authorizations
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Talk to the jar program on the configured chain
    Jar {
        #[command(subcommand)]
        command: JarCommands,
    },

    /// Wallet utilities
    Wallet {
        #[command(subcommand)]
        command: WalletCommands,
    },
}
