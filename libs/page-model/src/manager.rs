// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::collections::HashMap;

use constraint_set::ConstraintSet;
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::attributes::MemoryAttrs;
use crate::error::Error;
use crate::page::{PageId, PhysicalPage, VirtualAliasRef};
use crate::request::{GenPageRequest, SizeInfo};

/// Owns the physical page index for one memory bank: allocates ranges,
/// tracks per-attribute constraints, and implements aliasing (spec.md
/// §4.2). Not `Sync`/shareable — one instance per generator, per bank, as
/// spec.md §5 requires.
#[derive(Debug)]
pub struct PhysicalPageManager {
    usable: ConstraintSet,
    free: ConstraintSet,
    allocated: ConstraintSet,
    alias_exclude: ConstraintSet,
    attribute_ranges: HashMap<MemoryAttrs, ConstraintSet>,
    pages: HashMap<PageId, PhysicalPage>,
    next_id: PageId,
    initialised: bool,
}

impl Default for PhysicalPageManager {
    fn default() -> Self {
        Self {
            usable: ConstraintSet::new(),
            free: ConstraintSet::new(),
            allocated: ConstraintSet::new(),
            alias_exclude: ConstraintSet::new(),
            attribute_ranges: HashMap::new(),
            pages: HashMap::new(),
            next_id: PageId::first(),
            initialised: false,
        }
    }
}

impl PhysicalPageManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called before any other method. `usable` is the full
    /// addressable range for this bank; `boundary` is carved out of it
    /// immediately (reserved regions the caller never wants touched, e.g.
    /// MMIO windows already claimed by the platform).
    pub fn initialise(&mut self, usable: ConstraintSet, boundary: &ConstraintSet) {
        let mut free = usable.clone();
        free.subtract(boundary);
        self.usable = usable;
        self.free = free;
        self.allocated = ConstraintSet::new();
        self.alias_exclude = ConstraintSet::new();
        self.attribute_ranges.clear();
        self.pages.clear();
        self.next_id = PageId::first();
        self.initialised = true;
        self.debug_assert_invariants();
    }

    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    #[must_use]
    pub fn page(&self, id: PageId) -> Option<&PhysicalPage> {
        self.pages.get(&id)
    }

    #[must_use]
    pub fn free_constraint(&self) -> &ConstraintSet {
        &self.free
    }

    #[must_use]
    pub fn allocated_constraint(&self) -> &ConstraintSet {
        &self.allocated
    }

    /// Chooses a PA range inside free memory, constructs a new
    /// `PhysicalPage` with a fresh ID, records attributes, and returns its
    /// id on success.
    pub fn new_allocation(
        &mut self,
        size_info: SizeInfo,
        page_req: &GenPageRequest,
        rng: &mut impl Rng,
    ) -> Result<PageId, Error> {
        if !self.initialised {
            return Err(Error::NotInitialised);
        }
        let pa_lo = self
            .free
            .choose_aligned_start(size_info.align_mask, size_info.size, rng)
            .map_err(|_| Error::PageAllocationFailed {
                size: size_info.size,
                align: size_info.align_mask + 1,
            })?;
        let pa_hi = pa_lo + size_info.size - 1;

        let attrs = self.requested_attrs(page_req);
        let id = self.insert_page(pa_lo, pa_hi, attrs, page_req.can_alias)?;
        trace!(page = ?id, pa_lo, pa_hi, "allocated new physical page");
        Ok(id)
    }

    /// Constructs a new page at an exact PA rather than letting
    /// [`Self::new_allocation`] pick one — the fallback `alias_allocation`
    /// needs for its `FlatMap`/explicit-`PA` schemes the first time nothing
    /// yet overlaps the requested PA (spec.md §4.2 only defines aliasing
    /// against an *existing* page; establishing the first page at a caller-
    /// chosen PA is the same carve-and-record operation as
    /// [`Self::new_allocation`], just with the placement fixed instead of
    /// searched for).
    pub fn new_allocation_at(
        &mut self,
        pa_lo: u64,
        size_info: SizeInfo,
        page_req: &GenPageRequest,
    ) -> Result<PageId, Error> {
        if !self.initialised {
            return Err(Error::NotInitialised);
        }
        let pa_hi = pa_lo
            .checked_add(size_info.size.saturating_sub(1))
            .ok_or(Error::PageAllocationFailed {
                size: size_info.size,
                align: size_info.align_mask + 1,
            })?;
        if !self.free.contains_range(pa_lo, pa_hi) {
            return Err(Error::PageAllocationFailed {
                size: size_info.size,
                align: size_info.align_mask + 1,
            });
        }
        let attrs = self.requested_attrs(page_req);
        let id = self.insert_page(pa_lo, pa_hi, attrs, page_req.can_alias)?;
        trace!(page = ?id, pa_lo, pa_hi, "allocated new physical page at fixed PA");
        Ok(id)
    }

    /// Finds an existing PA target by one of four schemes (`FlatMap`, the
    /// `PA` field, the `AliasPageId` field, else constraint solving), then
    /// resolves overlap against existing pages per spec.md §4.2.
    pub fn alias_allocation(
        &mut self,
        va: u64,
        size_info: SizeInfo,
        page_req: &GenPageRequest,
        rng: &mut impl Rng,
    ) -> Result<PageId, Error> {
        if !self.initialised {
            return Err(Error::NotInitialised);
        }
        let pa_lo = if page_req.flat_map {
            va
        } else if let Some(pa) = page_req.pa {
            pa
        } else if let Some(alias_id) = page_req.alias_page_id {
            self.pages
                .get(&alias_id)
                .ok_or_else(|| Error::AliasRefused {
                    reason: format!("alias target {alias_id:?} does not exist"),
                })?
                .pa_lo
        } else {
            self.solve_alias_constraints(size_info, page_req, rng)?
        };
        let pa_hi = pa_lo + size_info.size - 1;

        let overlapped: Vec<PageId> = self
            .pages
            .values()
            .filter(|p| p.overlaps_range(pa_lo, pa_hi))
            .map(|p| p.id)
            .collect();

        if overlapped.is_empty() {
            return Err(Error::AliasRefused {
                reason: format!("no existing page overlaps [{pa_lo:#x}, {pa_hi:#x}]"),
            });
        }

        if !page_req.force_mem_attrs {
            let incoming = self.requested_attrs(page_req);
            for id in &overlapped {
                let existing = self.pages[id].memory_attrs;
                if !MemoryAttrs::compatible_for_alias(existing, incoming) {
                    warn!(page = ?id, ?existing, ?incoming, "alias refused: incompatible attributes");
                    return Err(Error::AliasRefused {
                        reason: format!(
                            "page {id:?} has attributes {existing:?} incompatible with requested {incoming:?}"
                        ),
                    });
                }
                if !self.pages[id].can_alias {
                    return Err(Error::AliasRefused {
                        reason: format!("page {id:?} is marked non-aliasable"),
                    });
                }
            }
        }

        let merged_id = self.merge_overlapped(pa_lo, pa_hi, &overlapped, page_req)?;
        debug!(page = ?merged_id, pa_lo, pa_hi, overlapped = overlapped.len(), "aliased physical page");
        Ok(merged_id)
    }

    /// The entry point: if `ForceAlias`, alias only; otherwise try the order
    /// the page manager's aliasing choice prefers (new-allocation first by
    /// default) and fall back to the other on failure.
    pub fn allocate_page(
        &mut self,
        va: u64,
        size_info: SizeInfo,
        page_req: &GenPageRequest,
        prefer_alias_first: bool,
        rng: &mut impl Rng,
    ) -> Result<PageId, Error> {
        if page_req.force_alias {
            return self.alias_allocation(va, size_info, page_req, rng);
        }
        let (first, second): (
            fn(&mut Self, u64, SizeInfo, &GenPageRequest, &mut dyn rand::RngCore) -> Result<PageId, Error>,
            fn(&mut Self, u64, SizeInfo, &GenPageRequest, &mut dyn rand::RngCore) -> Result<PageId, Error>,
        ) = if prefer_alias_first {
            (Self::alias_allocation_dyn, Self::new_allocation_dyn)
        } else {
            (Self::new_allocation_dyn, Self::alias_allocation_dyn)
        };
        match first(self, va, size_info, page_req, rng) {
            Ok(id) => Ok(id),
            Err(first_err) => {
                trace!(error = %first_err, "first allocation strategy failed, trying the other");
                second(self, va, size_info, page_req, rng)
            }
        }
    }

    fn new_allocation_dyn(
        &mut self,
        _va: u64,
        size_info: SizeInfo,
        page_req: &GenPageRequest,
        rng: &mut dyn rand::RngCore,
    ) -> Result<PageId, Error> {
        self.new_allocation(size_info, page_req, rng)
    }

    fn alias_allocation_dyn(
        &mut self,
        va: u64,
        size_info: SizeInfo,
        page_req: &GenPageRequest,
        rng: &mut dyn rand::RngCore,
    ) -> Result<PageId, Error> {
        self.alias_allocation(va, size_info, page_req, rng)
    }

    /// Links a virtual page to its physical page; on first commit, publishes
    /// its memory-attribute ranges into the per-attribute constraint index.
    pub fn commit_page(&mut self, id: PageId, alias: VirtualAliasRef) -> Result<(), Error> {
        let page = self
            .pages
            .get_mut(&id)
            .ok_or_else(|| Error::InvariantViolation(format!("commit on unknown page {id:?}")))?;
        let first_commit = page.virtual_aliases.is_empty();
        page.virtual_aliases.insert(alias);
        let (pa_lo, pa_hi, memory_attrs) = (page.pa_lo, page.pa_hi, page.memory_attrs);
        if first_commit {
            // A page can carry more than one attribute bit here: `merge_overlapped`
            // unions attribute sets under `ForceMemAttrs` rather than discarding the
            // conflict, so every set bit is published to its own range rather than
            // rejecting the page outright.
            for attrs in memory_attrs.iter() {
                self.attribute_ranges
                    .entry(attrs)
                    .or_default()
                    .add_range(pa_lo, pa_hi)
                    .map_err(|_| {
                        Error::InvariantViolation("attribute range insert failed".into())
                    })?;
            }
        }
        Ok(())
    }

    fn requested_attrs(&self, page_req: &GenPageRequest) -> MemoryAttrs {
        page_req
            .mem_attr_arch_constraint
            .or(page_req.mem_attr_impl_constraint)
            .or(page_req.target_alias_attrs_constraint)
            .unwrap_or_default()
    }

    /// `solve_alias_constraints`: form `allocated − alias_exclude − (∪
    /// incompatible_attr_ranges)`, project to page-aligned, and choose a
    /// page-aligned value.
    fn solve_alias_constraints(
        &self,
        size_info: SizeInfo,
        page_req: &GenPageRequest,
        rng: &mut impl Rng,
    ) -> Result<u64, Error> {
        let mut candidates = self.allocated.clone();
        candidates.subtract(&self.alias_exclude);

        if !page_req.force_mem_attrs {
            let incoming = self.requested_attrs(page_req);
            for (attrs, range) in &self.attribute_ranges {
                if !MemoryAttrs::compatible_for_alias(*attrs, incoming) {
                    candidates.subtract(range);
                }
            }
        }

        candidates
            .choose_aligned_start(size_info.align_mask, size_info.size, rng)
            .map_err(|_| Error::PageAllocationFailed {
                size: size_info.size,
                align: size_info.align_mask + 1,
            })
    }

    fn insert_page(
        &mut self,
        pa_lo: u64,
        pa_hi: u64,
        attrs: MemoryAttrs,
        can_alias: bool,
    ) -> Result<PageId, Error> {
        let id = self.next_id;
        self.next_id = self.next_id.next();
        self.pages.insert(
            id,
            PhysicalPage {
                id,
                pa_lo,
                pa_hi,
                can_alias,
                memory_attrs: attrs,
                virtual_aliases: Default::default(),
            },
        );
        self.free.sub_range(pa_lo, pa_hi).map_err(|_| {
            Error::InvariantViolation("allocation range outside free set".into())
        })?;
        self.allocated
            .add_range(pa_lo, pa_hi)
            .map_err(|_| Error::InvariantViolation("invalid allocation range".into()))?;
        if !can_alias {
            self.alias_exclude.add_range(pa_lo, pa_hi).map_err(|_| {
                Error::InvariantViolation("invalid alias-exclude range".into())
            })?;
        }
        self.debug_assert_invariants();
        Ok(id)
    }

    /// If zero pages overlap, the caller already bailed. If one, merge the
    /// new range into it (or vice versa, whichever is larger survives as the
    /// addressable record). If many, merge all into one.
    fn merge_overlapped(
        &mut self,
        pa_lo: u64,
        pa_hi: u64,
        overlapped: &[PageId],
        page_req: &GenPageRequest,
    ) -> Result<PageId, Error> {
        debug_assert!(!overlapped.is_empty());

        let survivor = *overlapped
            .iter()
            .max_by_key(|id| self.pages[id].size())
            .expect("non-empty by construction");

        let new_attrs = self.requested_attrs(page_req);
        let mut union_lo = pa_lo;
        let mut union_hi = pa_hi;
        let mut union_aliases: std::collections::BTreeSet<VirtualAliasRef> =
            std::collections::BTreeSet::new();
        let mut union_attrs = new_attrs;

        for id in overlapped {
            let page = self.pages.remove(id).expect("listed by overlap scan above");
            union_lo = union_lo.min(page.pa_lo);
            union_hi = union_hi.max(page.pa_hi);
            union_aliases.extend(page.virtual_aliases);
            // `ForceMemAttrs` resolution: keep the union of attribute sets
            // rather than silently forgetting the conflict (spec.md §9 open
            // question, resolved in DESIGN.md).
            union_attrs |= page.memory_attrs;
        }

        self.pages.insert(
            survivor,
            PhysicalPage {
                id: survivor,
                pa_lo: union_lo,
                pa_hi: union_hi,
                can_alias: true,
                memory_attrs: union_attrs,
                virtual_aliases: union_aliases,
            },
        );

        self.allocated.add_range(union_lo, union_hi).map_err(|_| {
            Error::InvariantViolation("merged alias range invalid".into())
        })?;
        self.free.sub_range(union_lo, union_hi).ok();
        self.debug_assert_invariants();
        Ok(survivor)
    }

    #[cfg(debug_assertions)]
    fn debug_assert_invariants(&self) {
        if !self.initialised {
            return;
        }
        let mut union = self.free.clone();
        union.merge(&self.allocated);
        debug_assert!(
            self.usable.contains_set(&union) && union.contains_set(&self.usable),
            "allocated ∪ free must equal usable"
        );
        debug_assert!(
            self.allocated.contains_set(&self.alias_exclude),
            "alias_exclude must be a subset of allocated"
        );
    }

    #[cfg(not(debug_assertions))]
    fn debug_assert_invariants(&self) {}
}
