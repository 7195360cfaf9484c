// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use alloy_primitives::{Address, Signature};
use async_trait::async_trait;
use cv_config::RuntimeConfig;

use crate::{
    Authorization, AuthorizationPayload, EncryptedInput, EncryptedInputRequest, EncryptedInputs,
    Handle, Keypair, Result, TxReceipt,
};

/// Boots runtime sessions. Implementations talk to the relayer and gateway; booting is the
/// expensive step the instance manager de-duplicates.
#[async_trait]
pub trait RuntimeProvider: Send + Sync {
    async fn init(&self, config: &RuntimeConfig) -> Result<Arc<dyn FheRuntime>>;
}

/// A booted encryption/decryption runtime.
#[async_trait]
pub trait FheRuntime: Send + Sync {
    /// Encrypts every value in the request and returns one proof covering all handles.
    async fn encrypt(&self, request: &EncryptedInputRequest) -> Result<EncryptedInputs>;

    fn generate_keypair(&self) -> Keypair;

    /// Decrypts `handle`, owned by `contract`, for the holder of `authorization`.
    async fn user_decrypt(
        &self,
        handle: Handle,
        contract: Address,
        authorization: &Authorization,
    ) -> Result<u64>;

    /// Decrypts a handle that has been marked publicly decryptable.
    async fn public_decrypt(&self, handle: Handle) -> Result<u64>;
}

/// Wallet identity able to sign typed data. Signing may wait on a human indefinitely.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;
    async fn sign_typed_data(&self, payload: &AuthorizationPayload) -> Result<Signature>;
}

/// The ledger program that stores the confidential value. Receipts are returned only for
/// confirmed, successful transactions.
#[async_trait]
pub trait ConfidentialLedger: Send + Sync {
    /// Address of the program; handles it returns are owned by this contract.
    fn address(&self) -> Address;
    async fn submit(&self, input: &EncryptedInput) -> Result<TxReceipt>;
    async fn make_public(&self) -> Result<TxReceipt>;
    async fn current_encrypted_value(&self) -> Result<Handle>;
}
