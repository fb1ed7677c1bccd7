// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::Error;
use crate::page::PageId;

bitflags::bitflags! {
    /// Memory-type/caching attributes carried by a page. Spec.md §4.2's
    /// compatibility rule only ever reasons about "no attributes", "exactly
    /// one attribute", or "more than one attribute" — never about which
    /// attributes pair with which — so these stay a flat bitset rather than
    /// an enum hierarchy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemoryAttrs: u32 {
        const NORMAL_CACHEABLE = 1 << 0;
        const NORMAL_NON_CACHEABLE = 1 << 1;
        const DEVICE = 1 << 2;
        const DEVICE_SHARED = 1 << 3;
        const WRITE_THROUGH = 1 << 4;
        const WRITE_BACK = 1 << 5;
    }
}

impl MemoryAttrs {
    /// Returns the single set attribute, `None` if there are zero, or an
    /// error naming `page` if there is more than one (spec.md §4.2: "more
    /// than one attribute on the allocator side is a hard error").
    pub fn single(self, page: PageId) -> Result<Option<Self>, Error> {
        match self.bits().count_ones() {
            0 => Ok(None),
            1 => Ok(Some(self)),
            _ => Err(Error::ConflictingAttributes { page, attrs: self }),
        }
    }

    /// The aliasing compatibility rule from spec.md §4.2: aliasing is
    /// allowed iff either side has no attributes, or both sides carry
    /// exactly one attribute and it is the same one.
    #[must_use]
    pub fn compatible_for_alias(existing: Self, incoming: Self) -> bool {
        if existing.is_empty() || incoming.is_empty() {
            return true;
        }
        existing.bits().count_ones() == 1
            && incoming.bits().count_ones() == 1
            && existing == incoming
    }
}
