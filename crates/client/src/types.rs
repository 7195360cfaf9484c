// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{fmt, str::FromStr};

use alloy_primitives::{Address, Bytes, B256};
use cv_utils::formatters::{hexf, redacted};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{ClientError, Result};

/// Opaque 32 byte reference to a ciphertext held by the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(B256);

impl Handle {
    pub const fn new(inner: B256) -> Self {
        Self(inner)
    }

    pub fn as_b256(&self) -> B256 {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<B256> for Handle {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<Handle> for B256 {
    fn from(value: Handle) -> Self {
        value.0
    }
}

/// Encrypted integer widths the runtime accepts as inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FheType {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
}

impl FheType {
    pub fn bits(self) -> u32 {
        match self {
            FheType::Bool => 1,
            FheType::Uint8 => 8,
            FheType::Uint16 => 16,
            FheType::Uint32 => 32,
            FheType::Uint64 => 64,
        }
    }

    pub fn max_value(self) -> u64 {
        match self {
            FheType::Uint64 => u64::MAX,
            other => (1u64 << other.bits()) - 1,
        }
    }

    /// Type discriminant embedded in handles.
    pub fn type_id(self) -> u8 {
        match self {
            FheType::Bool => 0,
            FheType::Uint8 => 2,
            FheType::Uint16 => 3,
            FheType::Uint32 => 4,
            FheType::Uint64 => 5,
        }
    }

    pub fn from_type_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => FheType::Bool,
            2 => FheType::Uint8,
            3 => FheType::Uint16,
            4 => FheType::Uint32,
            5 => FheType::Uint64,
            _ => return None,
        })
    }

    pub fn check(self, value: u64) -> Result<()> {
        if value > self.max_value() {
            return Err(ClientError::Validation(format!(
                "{value} does not fit {self} (max {})",
                self.max_value()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FheType::Bool => write!(f, "ebool"),
            other => write!(f, "euint{}", other.bits()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypedValue {
    pub fhe_type: FheType,
    pub value: u64,
}

/// A single ciphertext handle and the proof binding it to (contract, user).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handle: Handle,
    pub proof: Bytes,
}

/// Output of one encryption call. The proof covers every handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedInputs {
    pub handles: Vec<Handle>,
    pub proof: Bytes,
}

impl EncryptedInputs {
    pub fn into_single(self) -> Result<EncryptedInput> {
        match self.handles.as_slice() {
            [handle] => Ok(EncryptedInput {
                handle: *handle,
                proof: self.proof,
            }),
            other => Err(ClientError::runtime(format!(
                "expected exactly one handle, runtime returned {}",
                other.len()
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevealMode {
    /// Decrypted for the connected user only.
    Private,
    /// Decrypted from a ciphertext the program has marked public.
    Public,
}

/// Ephemeral keypair the runtime re-encrypts results to.
#[derive(Clone)]
pub struct Keypair {
    public_key: Vec<u8>,
    private_key: Zeroizing<Vec<u8>>,
}

impl Keypair {
    pub fn new(public_key: Vec<u8>, private_key: Vec<u8>) -> Self {
        Self {
            public_key,
            private_key: Zeroizing::new(private_key),
        }
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Public<'a>(&'a [u8]);
        impl fmt::Debug for Public<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                hexf(self.0, f)
            }
        }
        struct Secret<'a>(&'a [u8]);
        impl fmt::Debug for Secret<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                redacted(self.0, f)
            }
        }
        f.debug_struct("Keypair")
            .field("public_key", &Public(&self.public_key))
            .field("private_key", &Secret(&self.private_key))
            .finish()
    }
}

/// Parses a user supplied address, reporting failure as a configuration problem.
pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .map_err(|e| ClientError::Configuration(format!("'{value}' is not a valid address: {e}")))
}
