// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use anyhow::{Context, Result};
use cv_client::{AuthorizationCache, Clock, SystemClock};
use cv_config::ClientConfig;
use cv_data::DataStore;

pub fn open_cache(config: &ClientConfig) -> Result<AuthorizationCache> {
    let store = DataStore::open(&config.storage).context("Could not open the store")?;
    Ok(AuthorizationCache::new(
        store,
        Arc::new(SystemClock),
        config.authorization_duration_days()?,
    ))
}

pub async fn execute(config: &ClientConfig) -> Result<()> {
    let cache = open_cache(config)?;
    let now = SystemClock.now();
    let stored = cache.stored()?;
    if stored.is_empty() {
        println!("no stored authorizations");
        return Ok(());
    }
    for authorization in stored {
        let contracts: Vec<String> = authorization
            .contract_addresses()
            .iter()
            .map(|c| c.to_string())
            .collect();
        println!(
            "{} [{}] expires_at={} {:?}",
            authorization.user_address(),
            contracts.join(","),
            authorization.expires_at(),
            authorization.state_at(now)
        );
    }

    Ok(())
}
