// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::{Address, Bytes, Signature, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use cv_config::RuntimeConfig;

use crate::{ClientError, Result};

pub const DOMAIN_NAME: &str = "Decryption";
pub const DOMAIN_VERSION: &str = "1";

sol! {
    /// Typed message a user signs to let the gateway re-encrypt results to an ephemeral key.
    #[derive(Debug, PartialEq, Eq)]
    struct UserDecryptRequestVerification {
        bytes publicKey;
        address[] contractAddresses;
        uint256 startTimestamp;
        uint256 durationDays;
        bytes extraData;
    }
}

/// Domain and message of a decryption authorization, ready to be signed.
#[derive(Clone, Debug)]
pub struct AuthorizationPayload {
    pub domain: Eip712Domain,
    pub message: UserDecryptRequestVerification,
}

impl AuthorizationPayload {
    pub fn new(
        config: &RuntimeConfig,
        public_key: &[u8],
        contracts: &[Address],
        issued_at: u64,
        duration_days: u64,
    ) -> Self {
        let domain = Eip712Domain::new(
            Some(DOMAIN_NAME.into()),
            Some(DOMAIN_VERSION.into()),
            Some(U256::from(config.gateway_chain_id)),
            Some(config.contracts.decryption_oracle),
            None,
        );
        let message = UserDecryptRequestVerification {
            publicKey: Bytes::copy_from_slice(public_key),
            contractAddresses: contracts.to_vec(),
            startTimestamp: U256::from(issued_at),
            durationDays: U256::from(duration_days),
            extraData: Bytes::new(),
        };
        Self { domain, message }
    }

    /// The digest a wallet signs.
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.domain)
    }

    /// Address that produced `signature` over this payload.
    pub fn recover_signer(&self, signature: &[u8]) -> Result<Address> {
        let signature = Signature::try_from(signature)
            .map_err(|e| ClientError::AuthorizationMismatch(format!("malformed signature: {e}")))?;
        signature
            .recover_address_from_prehash(&self.signing_hash())
            .map_err(|e| ClientError::AuthorizationMismatch(format!("unrecoverable signature: {e}")))
    }
}
