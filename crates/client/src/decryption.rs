// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use alloy_primitives::Address;
use tracing::debug;

use crate::{Authorization, Clock, Handle, Instance, Result};

/// A ciphertext and who is asking for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecryptionTarget {
    pub handle: Handle,
    /// Program that owns the handle
    pub contract: Address,
    /// Account the plaintext is revealed to
    pub user: Address,
}

/// Turns ciphertext handles into plaintext, privately or from a public handle.
#[derive(Clone)]
pub struct DecryptionPipeline {
    clock: Arc<dyn Clock>,
}

impl DecryptionPipeline {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Private reveal. The authorization is checked locally before the runtime is contacted so
    /// scope and expiry problems never look like outages.
    pub async fn decrypt(
        &self,
        instance: &Instance,
        target: &DecryptionTarget,
        authorization: &Authorization,
    ) -> Result<u64> {
        authorization.ensure_usable(target.user, target.contract, self.clock.now())?;
        let value = instance
            .user_decrypt(target.handle, target.contract, authorization)
            .await?;
        debug!(handle = %target.handle, user = %target.user, "private decryption complete");
        Ok(value)
    }

    /// Public reveal of a handle the program has marked decryptable by anyone.
    pub async fn decrypt_public(&self, instance: &Instance, handle: Handle) -> Result<u64> {
        let value = instance.public_decrypt(handle).await?;
        debug!(%handle, "public decryption complete");
        Ok(value)
    }
}
