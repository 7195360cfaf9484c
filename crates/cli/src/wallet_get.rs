// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use cv_client::WalletSigner;
use cv_evm::LocalWallet;
use zeroize::Zeroizing;

pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";

/// The wallet named on the command line, or the one in `PRIVATE_KEY`.
pub fn wallet_from(private_key: Option<Zeroizing<String>>) -> Result<LocalWallet> {
    match private_key {
        Some(key) => LocalWallet::from_private_key(&key),
        None => LocalWallet::from_env(PRIVATE_KEY_VAR),
    }
}

pub async fn execute(private_key: Option<Zeroizing<String>>) -> Result<()> {
    let wallet = wallet_from(private_key)?;
    println!("{}", wallet.address());

    Ok(())
}
