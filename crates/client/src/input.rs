// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use tracing::debug;

use crate::{EncryptedInput, FheType, Instance, Result, TypedValue};

/// Width of the values the workflow submits.
pub const DEFAULT_VALUE_TYPE: FheType = FheType::Uint32;

/// Values to encrypt for one (contract, user) pair. Mirrors the runtime's builder:
/// `request.add32(5).add8(1)` then hand it to [`Instance::encrypt`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedInputRequest {
    contract: Address,
    user: Address,
    values: Vec<TypedValue>,
}

impl EncryptedInputRequest {
    pub fn new(contract: Address, user: Address) -> Self {
        Self {
            contract,
            user,
            values: Vec::new(),
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn user(&self) -> Address {
        self.user
    }

    pub fn values(&self) -> &[TypedValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.push(FheType::Bool, value as u64)
    }

    pub fn add8(&mut self, value: u8) -> &mut Self {
        self.push(FheType::Uint8, value as u64)
    }

    pub fn add16(&mut self, value: u16) -> &mut Self {
        self.push(FheType::Uint16, value as u64)
    }

    pub fn add32(&mut self, value: u32) -> &mut Self {
        self.push(FheType::Uint32, value as u64)
    }

    pub fn add64(&mut self, value: u64) -> &mut Self {
        self.push(FheType::Uint64, value)
    }

    /// Adds a value whose width is only known at runtime.
    pub fn add(&mut self, fhe_type: FheType, value: u64) -> Result<&mut Self> {
        fhe_type.check(value)?;
        Ok(self.push(fhe_type, value))
    }

    fn push(&mut self, fhe_type: FheType, value: u64) -> &mut Self {
        self.values.push(TypedValue { fhe_type, value });
        self
    }
}

/// Encrypts one value of [`DEFAULT_VALUE_TYPE`] for `contract`, submitted by `user`.
pub async fn build_encrypted_input(
    instance: &Instance,
    contract: Address,
    user: Address,
    value: u64,
) -> Result<EncryptedInput> {
    build_typed_input(instance, contract, user, DEFAULT_VALUE_TYPE, value).await
}

pub async fn build_typed_input(
    instance: &Instance,
    contract: Address,
    user: Address,
    fhe_type: FheType,
    value: u64,
) -> Result<EncryptedInput> {
    let mut request = EncryptedInputRequest::new(contract, user);
    request.add(fhe_type, value)?;
    let input = instance.encrypt(&request).await?.into_single()?;
    debug!(handle = %input.handle, %contract, %user, "encrypted {fhe_type} input");
    Ok(input)
}
