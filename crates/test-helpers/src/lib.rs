// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod harness;
mod signer;
mod store;
mod utils;

pub use harness::*;
pub use signer::*;
pub use store::*;
pub use utils::*;
