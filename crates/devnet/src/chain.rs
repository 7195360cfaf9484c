// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use alloy_primitives::{keccak256, Address, Bytes, B256};
use cv_client::{ClientError, Clock, EncryptedInput, FheType, Handle, Result, TxReceipt};
use tracing::trace;

const PROOF_DOMAIN: &[u8] = b"cv-devnet/input-proof";

#[derive(Clone, Copy, Debug)]
struct Ciphertext {
    fhe_type: FheType,
    value: u64,
}

#[derive(Default)]
struct State {
    ciphertexts: HashMap<Handle, Ciphertext>,
    acl: HashSet<(Handle, Address)>,
    public: HashSet<Handle>,
    nonce: u64,
    block: u64,
}

/// Shared coprocessor state: ciphertexts, access lists and public flags.
///
/// The runtime and the ledger program both operate on one `DevChain`, the way a relayer and
/// a host chain share the coprocessor's view of every handle.
pub struct DevChain {
    chain_id: u64,
    salt: B256,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
    relayer_offline: AtomicBool,
    rpc_offline: AtomicBool,
}

impl DevChain {
    pub fn new(chain_id: u64, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            salt: B256::from(rand::random::<[u8; 32]>()),
            clock,
            state: Mutex::new(State::default()),
            relayer_offline: AtomicBool::new(false),
            rpc_offline: AtomicBool::new(false),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn set_relayer_offline(&self, offline: bool) {
        self.relayer_offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_rpc_offline(&self, offline: bool) {
        self.rpc_offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn ensure_relayer(&self) -> Result<()> {
        if self.relayer_offline.load(Ordering::SeqCst) {
            return Err(ClientError::runtime("relayer unreachable"));
        }
        Ok(())
    }

    pub(crate) fn ensure_rpc(&self) -> Result<()> {
        if self.rpc_offline.load(Ordering::SeqCst) {
            return Err(ClientError::ledger("rpc unreachable"));
        }
        Ok(())
    }

    /// Registers a fresh ciphertext. The type id sits in byte 30 of the handle.
    pub fn mint(&self, fhe_type: FheType, value: u64) -> Handle {
        let mut state = self.lock();
        state.nonce += 1;
        let mut preimage = self.salt.to_vec();
        preimage.extend_from_slice(&state.nonce.to_be_bytes());
        let mut bytes = keccak256(preimage);
        bytes[30] = fhe_type.type_id();
        let handle = Handle::new(bytes);
        state.ciphertexts.insert(handle, Ciphertext { fhe_type, value });
        trace!(%handle, %fhe_type, "minted ciphertext");
        handle
    }

    pub fn allow(&self, handle: Handle, account: Address) {
        self.lock().acl.insert((handle, account));
    }

    pub fn is_allowed(&self, handle: Handle, account: Address) -> bool {
        self.lock().acl.contains(&(handle, account))
    }

    pub fn make_public(&self, handle: Handle) {
        self.lock().public.insert(handle);
    }

    pub fn is_public(&self, handle: Handle) -> bool {
        self.lock().public.contains(&handle)
    }

    pub fn fhe_type_of(&self, handle: Handle) -> Option<FheType> {
        self.lock().ciphertexts.get(&handle).map(|c| c.fhe_type)
    }

    /// Proof binding `handles` to the program and account that may consume them.
    pub fn input_proof(&self, contract: Address, user: Address, handles: &[Handle]) -> Bytes {
        let mut preimage = PROOF_DOMAIN.to_vec();
        preimage.extend_from_slice(self.salt.as_slice());
        preimage.extend_from_slice(contract.as_slice());
        preimage.extend_from_slice(user.as_slice());
        for handle in handles {
            preimage.extend_from_slice(handle.as_slice());
        }
        Bytes::copy_from_slice(keccak256(preimage).as_slice())
    }

    /// Checks an input was encrypted for `contract` by `user`.
    pub(crate) fn verify_input(
        &self,
        contract: Address,
        user: Address,
        input: &EncryptedInput,
    ) -> Result<()> {
        if input.proof != self.input_proof(contract, user, &[input.handle]) {
            return Err(ClientError::ledger("execution reverted: invalid input proof"));
        }
        if !self.lock().ciphertexts.contains_key(&input.handle) {
            return Err(ClientError::ledger("execution reverted: unknown handle"));
        }
        Ok(())
    }

    /// Homomorphic addition, wrapping at the width of `lhs`.
    pub(crate) fn add(&self, lhs: Handle, rhs: Handle) -> Result<Handle> {
        let (fhe_type, sum) = {
            let state = self.lock();
            let (Some(a), Some(b)) = (state.ciphertexts.get(&lhs), state.ciphertexts.get(&rhs))
            else {
                return Err(ClientError::ledger("execution reverted: unknown handle"));
            };
            if a.fhe_type != b.fhe_type {
                return Err(ClientError::ledger(format!(
                    "execution reverted: cannot add {} to {}",
                    b.fhe_type, a.fhe_type
                )));
            }
            (a.fhe_type, a.value.wrapping_add(b.value) & a.fhe_type.max_value())
        };
        Ok(self.mint(fhe_type, sum))
    }

    /// Plaintext of `handle` for `user`, provided both the user and the owning program are on
    /// its access list.
    pub(crate) fn reveal_to(&self, handle: Handle, user: Address, contract: Address) -> Result<u64> {
        let state = self.lock();
        let denied = |reason: &str| ClientError::DecryptionDenied {
            handle,
            reason: reason.to_string(),
        };
        let ciphertext = state
            .ciphertexts
            .get(&handle)
            .ok_or_else(|| denied("unknown handle"))?;
        if !state.acl.contains(&(handle, contract)) {
            return Err(denied("contract is not allowed on handle"));
        }
        if !state.acl.contains(&(handle, user)) {
            return Err(denied("user is not allowed on handle"));
        }
        Ok(ciphertext.value)
    }

    pub(crate) fn reveal_public(&self, handle: Handle) -> Result<u64> {
        let state = self.lock();
        if !state.public.contains(&handle) {
            return Err(ClientError::DecryptionDenied {
                handle,
                reason: "handle is not publicly decryptable".into(),
            });
        }
        state
            .ciphertexts
            .get(&handle)
            .map(|c| c.value)
            .ok_or_else(|| ClientError::DecryptionDenied {
                handle,
                reason: "unknown handle".into(),
            })
    }

    /// Seals a block and returns its receipt.
    pub(crate) fn mine(&self) -> TxReceipt {
        let mut state = self.lock();
        state.block += 1;
        let mut preimage = self.salt.to_vec();
        preimage.extend_from_slice(b"tx");
        preimage.extend_from_slice(&state.block.to_be_bytes());
        TxReceipt {
            tx_hash: keccak256(preimage),
            block_number: Some(state.block),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
