// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::attributes::MemoryAttrs;
use crate::page::PageId;

/// Errors produced by [`crate::PhysicalPageManager`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `initialise` was never called, or was called twice.
    #[error("physical page manager used before initialise() or initialised twice")]
    NotInitialised,
    /// No free range satisfies the requested size/alignment.
    #[error("no free physical range satisfies the request ({size:#x} bytes, align {align:#x})")]
    PageAllocationFailed { size: u64, align: u64 },
    /// Aliasing was requested but no existing page overlaps the candidate,
    /// or memory-attribute compatibility failed.
    #[error("alias request refused: {reason}")]
    AliasRefused { reason: String },
    /// A page carries more than one memory attribute on the allocator side,
    /// which §4.2 calls a hard error (the alias side having more than one is
    /// a refusal, not a panic — see [`Error::AliasRefused`]).
    #[error("page {page:?} has conflicting memory attributes {attrs:?}, at most one is allowed")]
    ConflictingAttributes { page: PageId, attrs: MemoryAttrs },
    /// An internal invariant (sorted order, `allocated ∪ free == usable`,
    /// `attribute_ranges[a] ⊆ allocated`) was violated. Always fatal.
    #[error("physical page manager invariant violated: {0}")]
    InvariantViolation(String),
}
