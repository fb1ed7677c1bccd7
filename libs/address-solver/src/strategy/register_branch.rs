// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use rand::Rng;
use vm_mapper::VmMapper;

use crate::error::SolverError;
use crate::shared::AddressSolvingShared;
use crate::strategy::SolvedOperand;

/// `RegisterBranchSolvingShared` (spec.md §4.5): a branch target held in a
/// register. The only thing that distinguishes it from a plain free solve is
/// that a branch's own keep-out zone around `pc` must cover the branch
/// instruction itself *and* its delay/fetch window, so `pc_spacing_instrs`
/// is doubled relative to every other instruction-fetch request before the
/// workspace is built.
#[must_use]
pub fn doubled_pc_spacing(base_spacing_instrs: u64) -> u64 {
    base_spacing_instrs.saturating_mul(2)
}

pub fn solve(
    shared: &mut AddressSolvingShared,
    mapper: &mut VmMapper,
    rng: &mut impl Rng,
) -> Result<SolvedOperand, SolverError> {
    let va = shared.solve_free(mapper, rng)?;
    Ok(SolvedOperand::new(va))
}

#[cfg(test)]
mod tests {
    use super::*;
    use constraint_set::ConstraintSet;
    use page_model::{BankType, GenPageRequest, PhysicalPageManager};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashMap;
    use vm_mapper::AddressFilteringRegulator;

    use crate::config::SolveConfig;

    fn direct_mapper() -> VmMapper {
        let mut mgr = PhysicalPageManager::new();
        mgr.initialise(ConstraintSet::from_range(0, 0xffff), &ConstraintSet::new());
        let mut banks = HashMap::new();
        banks.insert(BankType::Normal, mgr);
        VmMapper::direct(ConstraintSet::from_range(0, 0xffff), ConstraintSet::from_range(0, 0xffff), banks)
    }

    #[test]
    fn doubled_spacing_is_twice_the_base() {
        assert_eq!(doubled_pc_spacing(1), 2);
        assert_eq!(doubled_pc_spacing(4), 8);
    }

    #[test]
    fn solved_branch_target_avoids_the_doubled_keepout() {
        let mut mapper = direct_mapper();
        let regulator = AddressFilteringRegulator::new();
        let mut config = SolveConfig::new(GenPageRequest::new(), true, 4, 0x3);
        config.pc = 0x1000;
        config.instr_width = 4;
        config.pc_spacing_instrs = doubled_pc_spacing(1);
        let mut shared = AddressSolvingShared::setup(&mapper, &regulator, config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let solved = solve(&mut shared, &mut mapper, &mut rng).unwrap();
        assert!(!(0x1000 - 8..=0x1000 + 8).contains(&solved.address));
    }
}
