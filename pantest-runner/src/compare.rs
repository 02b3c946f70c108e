// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whitespace-tolerant comparison of program outputs.

use bstr::ByteSlice;

/// Returns true if two outputs are equivalent.
///
/// Both outputs are trimmed as a whole, then split on `\n`. They are equivalent if they have the
/// same number of lines and each pair of lines is equal after trimming surrounding whitespace.
/// Whitespace *inside* a line is significant.
pub fn compatible_outputs(a: &[u8], b: &[u8]) -> bool {
    let mut a_lines = a.trim().split_str("\n");
    let mut b_lines = b.trim().split_str("\n");

    loop {
        match (a_lines.next(), b_lines.next()) {
            (Some(a), Some(b)) => {
                if a.trim() != b.trim() {
                    return false;
                }
            }
            (None, None) => return true,
            // Different line counts.
            _ => return false,
        }
    }
}
