// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

/// Errors produced by [`crate::ConstraintSet`] operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A value-producing operation (`choose_value`, `only_value`, `lower_bound`,
    /// `upper_bound`) was called on a set with no elements.
    #[error("constraint set is empty")]
    EmptySet,
    /// The textual form (`"0x10-0x1f,0x20,…"`) could not be parsed.
    #[error("malformed constraint text at byte {offset}: {reason}")]
    ConstraintMalformed { offset: usize, reason: String },
    /// `lo > hi` in a caller-supplied range, or an interval would be empty.
    #[error("invalid range [{lo:#x}, {hi:#x}]")]
    InvalidRange { lo: u64, hi: u64 },
}
