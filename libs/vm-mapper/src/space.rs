// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::collections::BTreeMap;

use constraint_set::ConstraintSet;

use crate::error::Error;
use crate::page::Page;

/// One paging context: its page-table root, the VA ranges still free on the
/// instruction and data sides, the set of currently-mapped VA, and the
/// ordered index of committed [`Page`]s (spec.md §3 `VmAddressSpace`).
///
/// Created on first use of a context and retained for the life of the run —
/// callers never remove an entry from [`crate::VmMapper`]'s context table.
#[derive(Debug)]
pub struct VmAddressSpace {
    pub context_id: u64,
    pub page_table_root: u64,
    free_instr: ConstraintSet,
    free_data: ConstraintSet,
    mapped: ConstraintSet,
    privileged: ConstraintSet,
    user_accessible: ConstraintSet,
    pages: BTreeMap<u64, Page>,
}

impl VmAddressSpace {
    #[must_use]
    pub fn new(
        context_id: u64,
        page_table_root: u64,
        usable_instr: ConstraintSet,
        usable_data: ConstraintSet,
    ) -> Self {
        Self {
            context_id,
            page_table_root,
            free_instr: usable_instr,
            free_data: usable_data,
            mapped: ConstraintSet::new(),
            privileged: ConstraintSet::new(),
            user_accessible: ConstraintSet::new(),
            pages: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn free(&self, is_instr: bool) -> &ConstraintSet {
        if is_instr {
            &self.free_instr
        } else {
            &self.free_data
        }
    }

    #[must_use]
    pub fn mapped(&self) -> &ConstraintSet {
        &self.mapped
    }

    #[must_use]
    pub fn privileged(&self) -> &ConstraintSet {
        &self.privileged
    }

    #[must_use]
    pub fn user_accessible(&self) -> &ConstraintSet {
        &self.user_accessible
    }

    pub fn mark_privileged(&mut self, lo: u64, hi: u64) -> Result<(), Error> {
        self.privileged
            .add_range(lo, hi)
            .map_err(|_| Error::InvariantViolation("invalid privileged range".into()))
    }

    pub fn mark_user_accessible(&mut self, lo: u64, hi: u64) -> Result<(), Error> {
        self.user_accessible
            .add_range(lo, hi)
            .map_err(|_| Error::InvariantViolation("invalid user-accessible range".into()))
    }

    #[must_use]
    pub fn page_at(&self, va: u64) -> Option<&Page> {
        self.pages
            .range(..=va)
            .next_back()
            .map(|(_, p)| p)
            .filter(|p| p.contains(va))
    }

    #[must_use]
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    /// Registers a newly committed page, removing its VA span from both free
    /// pools (a page can back either instruction or data fetches once
    /// mapped, so both usable sets shrink) and growing `mapped`.
    pub fn insert_page(&mut self, page: Page) -> Result<(), Error> {
        if self.page_at(page.va_lo).is_some() || self.page_at(page.va_hi).is_some() {
            return Err(Error::InvariantViolation(format!(
                "page [{:#x}, {:#x}] overlaps an already-mapped page",
                page.va_lo, page.va_hi
            )));
        }
        self.free_instr.sub_range(page.va_lo, page.va_hi).ok();
        self.free_data.sub_range(page.va_lo, page.va_hi).ok();
        self.mapped
            .add_range(page.va_lo, page.va_hi)
            .map_err(|_| Error::InvariantViolation("invalid page VA range".into()))?;
        self.pages.insert(page.va_lo, page);
        Ok(())
    }
}
