// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::Result;
use cv_config::ClientConfig;
use std::collections::BTreeSet;

use crate::auth_show::open_cache;

pub async fn execute(config: &ClientConfig, user: Option<Address>) -> Result<()> {
    let cache = open_cache(config)?;
    let users: BTreeSet<Address> = match user {
        Some(user) => BTreeSet::from([user]),
        None => cache
            .stored()?
            .iter()
            .map(|a| a.user_address())
            .collect(),
    };
    let removed: usize = users.into_iter().map(|user| cache.logout(user)).sum();
    println!("removed {removed} authorization(s)");

    Ok(())
}
