// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::env;

use alloy::{
    primitives::{Address, Signature},
    signers::{local::PrivateKeySigner, Signer},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use cv_client::{AuthorizationPayload, ClientError, WalletSigner};
use tracing::debug;
use zeroize::Zeroizing;

/// A wallet backed by a private key held in memory. Signs without asking anyone.
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let signer = private_key
            .trim()
            .parse::<PrivateKeySigner>()
            .context("private key is not a valid secp256k1 key")?;
        Ok(Self { signer })
    }

    /// Reads the key from `var` and removes it from the environment.
    pub fn from_env(var: &str) -> Result<Self> {
        let private_key = Zeroizing::new(env::var(var).with_context(|| format!("{var} is not set"))?);
        env::remove_var(var);
        Self::from_private_key(&private_key)
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_typed_data(
        &self,
        payload: &AuthorizationPayload,
    ) -> cv_client::Result<Signature> {
        debug!(address = %self.signer.address(), "signing decryption authorization");
        self.signer
            .sign_hash(&payload.signing_hash())
            .await
            .map_err(|e| ClientError::SigningRejected(e.to_string()))
    }
}
