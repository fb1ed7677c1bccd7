// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::collections::HashMap;
use std::sync::OnceLock;

use constraint_set::ConstraintSet;
use page_model::{BankType, GenPageRequest, PhysicalPageManager, SizeInfo};
use rand::Rng;
use tracing::{debug, trace};

use crate::error::Error;
use crate::page::Page;
use crate::space::VmAddressSpace;

bitflags::bitflags! {
    /// Independent reuse choices gated off per-access-kind (spec.md §4.5):
    /// whether a newly solved address may land on a VA already touched by a
    /// prior read or write.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AddressReuseMode: u8 {
        const READ_AFTER_READ = 1 << 0;
        const READ_AFTER_WRITE = 1 << 1;
        const WRITE_AFTER_READ = 1 << 2;
        const WRITE_AFTER_WRITE = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateResult {
    Mapped,
    AddressError,
    NotMapped,
}

/// The register values needed to activate a [`VmAddressSpace`] — handed to
/// the ISS adapter's register-write calls by the caller, not written here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterReloadPlan {
    pub satp: u64,
    pub context_id: u64,
}

/// One of two shapes (spec.md §4.3): `Direct` has a single implicit address
/// space and forces every mapping to be a flat VA=PA identity map; `Paged`
/// holds one [`VmAddressSpace`] per distinct paging context, switching
/// between them as the generator changes `satp` and friends.
#[derive(Debug)]
pub enum VmMapper {
    Direct {
        space: VmAddressSpace,
        banks: HashMap<BankType, PhysicalPageManager>,
        vm_timestamp: u64,
    },
    Paged {
        spaces: HashMap<u64, VmAddressSpace>,
        current: u64,
        banks: HashMap<BankType, PhysicalPageManager>,
        vm_timestamp: u64,
    },
}

impl VmMapper {
    /// Builds a direct (unpaged) mapper: VA and PA coincide, `page_req.flat_map`
    /// is implied for every mapping regardless of what the caller set. Named
    /// explicitly since spec.md §4.3 describes the shape without giving it a
    /// constructor.
    #[must_use]
    pub fn direct(
        usable_instr: ConstraintSet,
        usable_data: ConstraintSet,
        banks: HashMap<BankType, PhysicalPageManager>,
    ) -> Self {
        Self::Direct {
            space: VmAddressSpace::new(0, 0, usable_instr, usable_data),
            banks,
            vm_timestamp: 0,
        }
    }

    /// Builds a paged mapper with no contexts yet; the first
    /// [`Self::switch_context`] call creates one.
    #[must_use]
    pub fn paged(banks: HashMap<BankType, PhysicalPageManager>) -> Self {
        Self::Paged {
            spaces: HashMap::new(),
            current: 0,
            banks,
            vm_timestamp: 0,
        }
    }

    #[must_use]
    pub fn vm_timestamp(&self) -> u64 {
        match self {
            Self::Direct { vm_timestamp, .. } | Self::Paged { vm_timestamp, .. } => *vm_timestamp,
        }
    }

    fn bump_timestamp(&mut self) {
        match self {
            Self::Direct { vm_timestamp, .. } | Self::Paged { vm_timestamp, .. } => {
                *vm_timestamp += 1;
            }
        }
    }

    /// Locates the address space for `context_id`, creating one from
    /// `usable_instr`/`usable_data` if it doesn't exist yet, and makes it
    /// current. A no-op shape mismatch (`Direct`) is an error: direct mode
    /// has no contexts to switch between.
    pub fn switch_context(
        &mut self,
        context_id: u64,
        page_table_root: u64,
        usable_instr: impl FnOnce() -> ConstraintSet,
        usable_data: impl FnOnce() -> ConstraintSet,
    ) -> Result<(), Error> {
        match self {
            Self::Direct { .. } => Err(Error::NotPaged("switch_context")),
            Self::Paged { spaces, current, .. } => {
                spaces.entry(context_id).or_insert_with(|| {
                    debug!(context_id, "creating new virtual address space");
                    VmAddressSpace::new(context_id, page_table_root, usable_instr(), usable_data())
                });
                *current = context_id;
                Ok(())
            }
        }
    }

    fn current_space(&self) -> Result<&VmAddressSpace, Error> {
        match self {
            Self::Direct { space, .. } => Ok(space),
            Self::Paged { spaces, current, .. } => {
                spaces.get(current).ok_or(Error::NoMatchingContext)
            }
        }
    }

    fn current_space_mut(&mut self) -> Result<&mut VmAddressSpace, Error> {
        match self {
            Self::Direct { space, .. } => Ok(space),
            Self::Paged { spaces, current, .. } => {
                spaces.get_mut(current).ok_or(Error::NoMatchingContext)
            }
        }
    }

    fn banks(&self) -> &HashMap<BankType, PhysicalPageManager> {
        match self {
            Self::Direct { banks, .. } | Self::Paged { banks, .. } => banks,
        }
    }

    fn banks_mut(&mut self) -> &mut HashMap<BankType, PhysicalPageManager> {
        match self {
            Self::Direct { banks, .. } | Self::Paged { banks, .. } => banks,
        }
    }

    #[must_use]
    pub fn translate_va_to_pa(&self, va: u64, is_instr: bool) -> (Option<u64>, BankType, TranslateResult) {
        let Ok(space) = self.current_space() else {
            return (None, BankType::Normal, TranslateResult::AddressError);
        };
        match space.page_at(va) {
            Some(page) => (Some(page.translate(va)), page.bank, TranslateResult::Mapped),
            None if space.free(is_instr).contains_value(va) => {
                (None, BankType::Normal, TranslateResult::NotMapped)
            }
            None => (None, BankType::Normal, TranslateResult::AddressError),
        }
    }

    /// Allocates pages covering `[va, va + size)`, creating new physical
    /// pages as needed. Bumps `vm_timestamp` since the usable-VA set shrinks.
    pub fn map_address_range(
        &mut self,
        va: u64,
        size: u64,
        is_instr: bool,
        page_req: &GenPageRequest,
        prefer_alias_first: bool,
        rng: &mut impl Rng,
    ) -> Result<(), Error> {
        let bank = page_req.bank_type.unwrap_or(BankType::Normal);
        let size_info = SizeInfo::new(size, 0xfff);
        let flat = matches!(self, Self::Direct { .. }) || page_req.flat_map;

        let mut effective_req = page_req.clone();
        effective_req.flat_map = flat;

        let fixed_pa = if flat { Some(va) } else { effective_req.pa };

        let phys_id = {
            let mgr = self
                .banks_mut()
                .get_mut(&bank)
                .ok_or(Error::InvariantViolation(format!(
                    "bank {bank:?} has no physical page manager; caller must initialise one before mapping"
                )))?;
            if effective_req.force_alias || fixed_pa.is_some() {
                match mgr.alias_allocation(va, size_info, &effective_req, rng) {
                    Ok(id) => id,
                    // Nothing overlaps yet: this is the first mapping at this
                    // PA, not a true alias, so establish it directly.
                    Err(page_model::Error::AliasRefused { .. }) if !effective_req.force_alias => {
                        let pa_lo = fixed_pa
                            .expect("fixed_pa is Some whenever this branch triggers for non-force_alias requests");
                        mgr.new_allocation_at(pa_lo, size_info, &effective_req)?
                    }
                    Err(e) => return Err(e.into()),
                }
            } else {
                mgr.allocate_page(va, size_info, &effective_req, prefer_alias_first, rng)?
            }
        };

        let pa_lo = {
            let mgr = &self.banks()[&bank];
            mgr.page(phys_id)
                .ok_or_else(|| Error::InvariantViolation("allocated page vanished".into()))?
                .pa_lo
        };

        let attrs = {
            let mgr = &self.banks()[&bank];
            mgr.page(phys_id)
                .ok_or_else(|| Error::InvariantViolation("allocated page vanished".into()))?
                .memory_attrs
        };

        self.banks_mut()
            .get_mut(&bank)
            .expect("just inserted above")
            .commit_page(phys_id, (0, va))?;

        let page = Page {
            va_lo: va,
            va_hi: va + size - 1,
            pa_lo,
            bank,
            attrs,
            pte_level: 0,
            phys: phys_id,
        };
        self.current_space_mut()?.insert_page(page)?;
        self.bump_timestamp();
        trace!(va, pa = pa_lo, size, "mapped virtual address range");
        Ok(())
    }

    /// Inverse of [`Self::map_address_range`]: the caller demands a specific
    /// PA, the mapper must find or allocate a VA to expose it at.
    pub fn map_address_range_for_pa(
        &mut self,
        pa: u64,
        bank: BankType,
        size: u64,
        is_instr: bool,
        page_req: &GenPageRequest,
        rng: &mut impl Rng,
    ) -> Result<u64, Error> {
        let space = self.current_space()?;
        let align_mask = 0xfff;
        let va = space
            .free(is_instr)
            .choose_aligned_start(align_mask, size, rng)
            .map_err(|_| Error::NoFreeRange {
                size,
                align: align_mask + 1,
            })?;

        let mut effective_req = page_req.clone();
        effective_req.pa = Some(pa);
        effective_req.bank_type = Some(bank);
        self.map_address_range(va, size, is_instr, &effective_req, true, rng)?;
        Ok(va)
    }

    #[must_use]
    pub fn virtual_usable_constraint(&self, is_instr: bool) -> &ConstraintSet {
        static EMPTY: OnceLock<ConstraintSet> = OnceLock::new();
        self.current_space()
            .map(|s| s.free(is_instr))
            .unwrap_or_else(|_| EMPTY.get_or_init(ConstraintSet::new))
    }

    /// The current context's already-mapped VA set, feeding
    /// [`crate::AddressFilteringRegulator::build`]. Empty (rather than an
    /// error) if no context is active yet, matching
    /// [`Self::virtual_usable_constraint`]'s fallback.
    #[must_use]
    pub fn mapped_constraint(&self) -> &ConstraintSet {
        static EMPTY: OnceLock<ConstraintSet> = OnceLock::new();
        self.current_space()
            .map(VmAddressSpace::mapped)
            .unwrap_or_else(|_| EMPTY.get_or_init(ConstraintSet::new))
    }

    #[must_use]
    pub fn privileged_constraint(&self) -> &ConstraintSet {
        static EMPTY: OnceLock<ConstraintSet> = OnceLock::new();
        self.current_space()
            .map(VmAddressSpace::privileged)
            .unwrap_or_else(|_| EMPTY.get_or_init(ConstraintSet::new))
    }

    #[must_use]
    pub fn user_accessible_constraint(&self) -> &ConstraintSet {
        static EMPTY: OnceLock<ConstraintSet> = OnceLock::new();
        self.current_space()
            .map(VmAddressSpace::user_accessible)
            .unwrap_or_else(|_| EMPTY.get_or_init(ConstraintSet::new))
    }

    /// Intersects `constr_out` with the current free VA set; when any reuse
    /// bit is set, already-mapped VA is folded back in as a candidate pool
    /// too (the solver layer is responsible for picking a specific reusable
    /// page that matches the requested access direction against the
    /// resource-dependency history — this call only establishes which VA are
    /// geometrically eligible).
    pub fn apply_virtual_usable_constraint(
        &self,
        is_instr: bool,
        reuse_mode: AddressReuseMode,
        constr_out: &mut ConstraintSet,
    ) -> Result<(), Error> {
        let space = self.current_space()?;
        if reuse_mode.is_empty() {
            constr_out.apply(space.free(is_instr));
        } else {
            let mut allowed = space.free(is_instr).clone();
            allowed.merge(space.mapped());
            constr_out.apply(&allowed);
        }
        Ok(())
    }

    /// Enforces mapped/permission VM constraints for `[va, va + size)`
    /// against the request's flags.
    #[must_use]
    pub fn verify_virtual_address(
        &self,
        va: u64,
        size: u64,
        _is_instr: bool,
        page_req: &GenPageRequest,
    ) -> bool {
        let Ok(space) = self.current_space() else {
            return false;
        };
        let Some(hi) = va.checked_add(size.saturating_sub(1)) else {
            return false;
        };
        let Some(page) = space.page_at(va) else {
            return !(page_req.no_data_abort || page_req.no_instr_page_fault || page_req.no_data_page_fault);
        };
        if !page.contains(hi) {
            return false;
        }
        if matches!(page_req.privilege_level, Some(page_model::PrivilegeLevel::User))
            && space.privileged().contains_value(va)
        {
            return false;
        }
        if page_req.flat_map && page.pa_lo != va {
            return false;
        }
        true
    }

    #[must_use]
    pub fn get_register_reload(&self) -> RegisterReloadPlan {
        match self.current_space() {
            Ok(space) => RegisterReloadPlan {
                satp: space.page_table_root,
                context_id: space.context_id,
            },
            Err(_) => RegisterReloadPlan { satp: 0, context_id: 0 },
        }
    }
}
