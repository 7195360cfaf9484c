// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard,
};

use alloy_primitives::Address;
use async_trait::async_trait;
use cv_client::{
    ClientError, ConfidentialLedger, EncryptedInput, FheType, Handle, Result, TxReceipt,
    DEFAULT_VALUE_TYPE,
};
use tracing::info;

use crate::DevChain;

/// Accumulating ledger program. Every accepted input is added to an encrypted total, and the
/// new total is readable by the program and by the account that submitted the input.
pub struct DevJar {
    chain: Arc<DevChain>,
    address: Address,
    value_type: FheType,
    total: Mutex<Handle>,
    submissions: AtomicUsize,
    publications: AtomicUsize,
}

impl DevJar {
    pub fn deploy(chain: Arc<DevChain>, address: Address) -> Arc<Self> {
        let value_type = DEFAULT_VALUE_TYPE;
        let total = chain.mint(value_type, 0);
        chain.allow(total, address);
        info!(%address, "jar deployed");
        Arc::new(Self {
            chain,
            address,
            value_type,
            total: Mutex::new(total),
            submissions: AtomicUsize::new(0),
            publications: AtomicUsize::new(0),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// A ledger handle that sends transactions from `sender`.
    pub fn connect(self: &Arc<Self>, sender: Address) -> Arc<DevJarClient> {
        Arc::new(DevJarClient {
            jar: self.clone(),
            sender,
        })
    }

    pub fn encrypted_total(&self) -> Result<Handle> {
        self.chain.ensure_rpc()?;
        Ok(*self.lock())
    }

    pub fn add(&self, sender: Address, input: &EncryptedInput) -> Result<TxReceipt> {
        self.chain.ensure_rpc()?;
        self.chain.verify_input(self.address, sender, input)?;
        if self.chain.fhe_type_of(input.handle) != Some(self.value_type) {
            return Err(ClientError::ledger(format!(
                "execution reverted: expected an {} input",
                self.value_type
            )));
        }
        let mut total = self.lock();
        let next = self.chain.add(*total, input.handle)?;
        self.chain.allow(next, self.address);
        self.chain.allow(next, sender);
        *total = next;
        drop(total);

        self.submissions.fetch_add(1, Ordering::SeqCst);
        let receipt = self.chain.mine();
        info!(%sender, total = %next, tx = %receipt.tx_hash, "jar total updated");
        Ok(receipt)
    }

    /// Marks the current total decryptable by anyone.
    pub fn reveal_total(&self, sender: Address) -> Result<TxReceipt> {
        self.chain.ensure_rpc()?;
        let total = *self.lock();
        self.chain.make_public(total);
        self.publications.fetch_add(1, Ordering::SeqCst);
        let receipt = self.chain.mine();
        info!(%sender, %total, tx = %receipt.tx_hash, "jar total made public");
        Ok(receipt)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn publications(&self) -> usize {
        self.publications.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Handle> {
        self.total
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct DevJarClient {
    jar: Arc<DevJar>,
    sender: Address,
}

impl DevJarClient {
    pub fn sender(&self) -> Address {
        self.sender
    }
}

#[async_trait]
impl ConfidentialLedger for DevJarClient {
    fn address(&self) -> Address {
        self.jar.address()
    }

    async fn submit(&self, input: &EncryptedInput) -> Result<TxReceipt> {
        self.jar.add(self.sender, input)
    }

    async fn make_public(&self) -> Result<TxReceipt> {
        self.jar.reveal_total(self.sender)
    }

    async fn current_encrypted_value(&self) -> Result<Handle> {
        self.jar.encrypted_total()
    }
}
