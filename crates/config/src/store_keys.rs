// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;

pub struct StoreKeys;

fn lower(address: &Address) -> String {
    format!("0x{}", alloy_primitives::hex::encode(address.as_slice()))
}

impl StoreKeys {
    pub fn authorizations() -> String {
        "//authorizations".to_string()
    }

    pub fn authorizations_for(user: &Address) -> String {
        format!("//authorizations/{}", lower(user))
    }

    pub fn authorization(user: &Address, contract: &Address) -> String {
        format!("//authorizations/{}/{}", lower(user), lower(contract))
    }
}
