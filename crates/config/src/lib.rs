// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod client_config;
pub mod load_config;
pub mod rpc;
mod runtime_config;
mod store_keys;

pub use client_config::*;
pub use rpc::*;
pub use runtime_config::*;
pub use store_keys::*;
