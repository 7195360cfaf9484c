// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! In-process stand-in for the relayer, gateway and ledger program.

mod chain;
mod jar;
mod network;
mod runtime;

pub use chain::*;
pub use jar::*;
pub use network::*;
pub use runtime::*;
