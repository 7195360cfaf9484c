// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod jar_sol;
mod provider;
mod wallet;

pub use jar_sol::*;
pub use provider::*;
pub use wallet::*;
