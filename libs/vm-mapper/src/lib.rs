// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Virtual-memory model: [`VmAddressSpace`] per paging context, the
//! [`VmMapper`] that switches between them, and [`AddressFilteringRegulator`]
//! which turns a page request into the VM-level constraints a solver must
//! honor.

mod error;
mod mapper;
mod page;
mod regulator;
mod space;

pub use error::Error;
pub use mapper::{AddressReuseMode, RegisterReloadPlan, TranslateResult, VmMapper};
pub use page::Page;
pub use regulator::{AddressFilteringRegulator, ConstraintKind, Polarity, VmConstraint};
pub use space::VmAddressSpace;

#[cfg(test)]
mod tests {
    use super::*;
    use constraint_set::ConstraintSet;
    use page_model::{BankType, GenPageRequest, PhysicalPageManager};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashMap;

    fn normal_bank(lo: u64, hi: u64) -> HashMap<BankType, PhysicalPageManager> {
        let mut mgr = PhysicalPageManager::new();
        mgr.initialise(ConstraintSet::from_range(lo, hi), &ConstraintSet::new());
        let mut banks = HashMap::new();
        banks.insert(BankType::Normal, mgr);
        banks
    }

    fn direct_mapper() -> VmMapper {
        VmMapper::direct(
            ConstraintSet::from_range(0, 0xf_ffff),
            ConstraintSet::from_range(0, 0xf_ffff),
            normal_bank(0, 0xf_ffff),
        )
    }

    #[test]
    fn direct_mapper_maps_identity() {
        let mut mapper = direct_mapper();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let req = GenPageRequest::new();
        mapper
            .map_address_range(0x1000, 0x1000, false, &req, true, &mut rng)
            .unwrap();
        let (pa, _, result) = mapper.translate_va_to_pa(0x1000, false);
        assert_eq!(result, TranslateResult::Mapped);
        assert_eq!(pa, Some(0x1000));
    }

    #[test]
    fn unmapped_address_within_free_reports_not_mapped() {
        let mapper = direct_mapper();
        let (_, _, result) = mapper.translate_va_to_pa(0x2000, false);
        assert_eq!(result, TranslateResult::NotMapped);
    }

    #[test]
    fn address_outside_usable_is_address_error() {
        let mapper = VmMapper::direct(
            ConstraintSet::from_range(0, 0xfff),
            ConstraintSet::from_range(0, 0xfff),
            HashMap::new(),
        );
        let (_, _, result) = mapper.translate_va_to_pa(0x1_0000, false);
        assert_eq!(result, TranslateResult::AddressError);
    }

    #[test]
    fn paged_mapper_switches_context_on_demand() {
        let mut mapper = VmMapper::paged(HashMap::new());
        mapper
            .switch_context(
                7,
                0xdead_beef,
                || ConstraintSet::from_range(0, 0xffff),
                || ConstraintSet::from_range(0, 0xffff),
            )
            .unwrap();
        assert_eq!(mapper.get_register_reload().context_id, 7);
        assert_eq!(mapper.get_register_reload().satp, 0xdead_beef);
    }

    #[test]
    fn map_address_range_bumps_timestamp() {
        let mut mapper = direct_mapper();
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let req = GenPageRequest::new();
        assert_eq!(mapper.vm_timestamp(), 0);
        mapper
            .map_address_range(0x4000, 0x1000, false, &req, true, &mut rng)
            .unwrap();
        assert_eq!(mapper.vm_timestamp(), 1);
    }

    #[test]
    fn verify_virtual_address_rejects_partial_page_span() {
        let mut mapper = direct_mapper();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let req = GenPageRequest::new();
        mapper
            .map_address_range(0x6000, 0x1000, false, &req, true, &mut rng)
            .unwrap();
        assert!(mapper.verify_virtual_address(0x6000, 0x1000, false, &req));
        assert!(!mapper.verify_virtual_address(0x6000, 0x2000, false, &req));
    }

    #[test]
    fn regulator_builds_user_access_constraints() {
        let regulator = AddressFilteringRegulator::new();
        let mut req = GenPageRequest::new();
        req.privilege_level = Some(page_model::PrivilegeLevel::User);
        let mapped = ConstraintSet::new();
        let privileged = ConstraintSet::from_range(0x1000, 0x1fff);
        let user_accessible = ConstraintSet::from_range(0x2000, 0x2fff);
        let constraints = regulator.build(&req, &mapped, &privileged, &user_accessible);
        assert!(constraints
            .iter()
            .any(|c| matches!(c.kind, ConstraintKind::UserAccess) && c.allows(0x2500)));
        assert!(constraints
            .iter()
            .any(|c| matches!(c.kind, ConstraintKind::PrivilegedPage) && !c.allows(0x1500)));
    }

    #[test]
    fn apply_virtual_usable_constraint_without_reuse_excludes_mapped() {
        let mut mapper = direct_mapper();
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let req = GenPageRequest::new();
        mapper
            .map_address_range(0x8000, 0x1000, false, &req, true, &mut rng)
            .unwrap();
        let mut out = ConstraintSet::from_range(0, 0xf_ffff);
        mapper
            .apply_virtual_usable_constraint(false, AddressReuseMode::empty(), &mut out)
            .unwrap();
        assert!(!out.contains_value(0x8000));
    }

    #[test]
    fn apply_virtual_usable_constraint_with_reuse_allows_mapped() {
        let mut mapper = direct_mapper();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let req = GenPageRequest::new();
        mapper
            .map_address_range(0x8000, 0x1000, false, &req, true, &mut rng)
            .unwrap();
        let mut out = ConstraintSet::from_range(0, 0xf_ffff);
        mapper
            .apply_virtual_usable_constraint(false, AddressReuseMode::READ_AFTER_READ, &mut out)
            .unwrap();
        assert!(out.contains_value(0x8000));
    }

    #[test]
    fn map_address_range_for_pa_returns_matching_translation() {
        let mut mapper = VmMapper::paged(normal_bank(0, 0xf_ffff));
        mapper
            .switch_context(
                1,
                0,
                || ConstraintSet::from_range(0, 0xf_ffff),
                || ConstraintSet::from_range(0, 0xf_ffff),
            )
            .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let req = GenPageRequest::new();
        let va = mapper
            .map_address_range_for_pa(0x1000, BankType::Normal, 0x1000, false, &req, &mut rng)
            .unwrap();
        let (pa, _, result) = mapper.translate_va_to_pa(va, false);
        assert_eq!(result, TranslateResult::Mapped);
        assert_eq!(pa, Some(0x1000));
    }
}
