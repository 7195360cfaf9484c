// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

/// Writes bytes as `0x`-prefixed hex, eliding the middle of long values.
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", abbreviate(hex_string(data)))
}

/// Writes a placeholder that reveals only the length of secret material.
pub fn redacted(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "<redacted({})>", data.len())
}

fn hex_string(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

fn abbreviate(s: String) -> String {
    let threshold = 80;
    let keep = 16;
    if s.len() <= threshold {
        format!("0x{}", s)
    } else {
        format!("0x{}..{}", &s[..keep], &s[s.len() - keep..])
    }
}
