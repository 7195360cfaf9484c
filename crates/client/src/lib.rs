// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Client side of a confidential value workflow: encrypt a value locally, submit it to a ledger
//! program, and reveal the result privately or publicly.

mod authorization;
mod clock;
mod decryption;
mod eip712;
mod error;
mod input;
mod instance;
mod plaintext;
#[cfg(test)]
mod testing;
mod traits;
mod types;
mod workflow;

pub use authorization::*;
pub use clock::*;
pub use cv_config::DEFAULT_AUTHORIZATION_DURATION_DAYS;
pub use cv_utils::CancelToken;
pub use decryption::*;
pub use eip712::*;
pub use error::*;
pub use input::*;
pub use instance::*;
pub use plaintext::*;
pub use traits::*;
pub use types::*;
pub use workflow::*;
