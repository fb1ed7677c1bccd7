// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Address-equation solving (spec.md §4.5): given a page request, a VM
//! context, an optional hard target and a handful of operand-shape-specific
//! constraints, produces a concrete virtual address (and, for strategies
//! that compute it from registers, the operand values that produce it) that
//! is guaranteed mapped and reachable under the rules the rest of this
//! workspace enforces.
//!
//! [`AddressSolvingShared`] is the common workspace every strategy in
//! [`strategy`] builds on: it owns the working [`constraint_set::ConstraintSet`],
//! re-verifies it against [`vm_mapper::VmMapper`]'s `vm_timestamp` whenever a
//! mapping changes the picture, and is the only thing in this crate that
//! talks to the page manager. A strategy's job is only to narrow candidates
//! down to something `AddressSolvingShared` can drive to a final answer.

mod config;
mod error;
mod shared;
mod state;
pub mod strategy;
mod tag;
mod util;

pub use config::SolveConfig;
pub use error::SolverError;
pub use shared::AddressSolvingShared;
pub use state::SolveState;
pub use tag::{apply as apply_tag, strip as strip_tag};
pub use util::{sign_extend_32, zero_extend_32};

pub use strategy::base_index::{self, BaseIndexParams, IndexCandidate, IndexExtension};
pub use strategy::base_index_amount_bit::{self, BaseIndexAmountBitParams};
pub use strategy::base_offset::{self, BaseOffsetParams};
pub use strategy::base_offset_shift::{self, BaseOffsetShiftParams};
pub use strategy::data_processing::{self, DataProcessingParams, DataProcessingUop, SolveFor};
pub use strategy::register_branch::{self, doubled_pc_spacing};
pub use strategy::vector_indexed::{self, VectorIndexedParams, VectorIndexedSolution};
pub use strategy::vector_strided::{self, VectorStridedParams};
pub use strategy::SolvedOperand;

#[cfg(test)]
mod tests {
    use super::*;
    use constraint_set::ConstraintSet;
    use iss_adapter::test_support::FakeIss;
    use iss_adapter::{IssBridge, IssOptions};
    use page_model::{BankType, GenPageRequest, PhysicalPageManager};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashMap;
    use vm_mapper::AddressFilteringRegulator;

    fn direct_mapper() -> VmMapper {
        let mut mgr = PhysicalPageManager::new();
        mgr.initialise(ConstraintSet::from_range(0, 0xffff), &ConstraintSet::new());
        let mut banks = HashMap::new();
        banks.insert(BankType::Normal, mgr);
        VmMapper::direct(ConstraintSet::from_range(0, 0xffff), ConstraintSet::from_range(0, 0xffff), banks)
    }

    use vm_mapper::VmMapper;

    /// End-to-end smoke test exercising a handful of strategies against one
    /// shared mapper, the way a caller solving several operands of the same
    /// instruction would.
    #[test]
    fn several_strategies_compose_against_one_mapper() {
        let mut mapper = direct_mapper();
        let regulator = AddressFilteringRegulator::new();
        let mut rng = ChaCha20Rng::seed_from_u64(99);

        let mut offset_config = SolveConfig::new(GenPageRequest::new(), false, 1, 0);
        offset_config.target_value = Some(ConstraintSet::from_range(0x2000, 0x20ff));
        let mut offset_shared = AddressSolvingShared::setup(&mapper, &regulator, offset_config).unwrap();
        let offset_params = BaseOffsetParams { base_value: 0x2000, offset_bits: 12 };
        let offset_solved = base_offset::solve(&mut offset_shared, &mut mapper, &mut rng, &offset_params).unwrap();
        assert!((0x2000..=0x20ff).contains(&offset_solved.address));

        let mut branch_config = SolveConfig::new(GenPageRequest::new(), true, 4, 0x3);
        branch_config.pc = 0x3000;
        branch_config.pc_spacing_instrs = doubled_pc_spacing(1);
        let mut branch_shared = AddressSolvingShared::setup(&mapper, &regulator, branch_config).unwrap();
        let branch_solved = register_branch::solve(&mut branch_shared, &mut mapper, &mut rng).unwrap();
        assert!(!(0x3000 - 8..=0x3000 + 8).contains(&branch_solved.address));
    }

    #[test]
    fn data_processing_strategy_is_reachable_from_the_crate_root() {
        let mut mapper = direct_mapper();
        let regulator = AddressFilteringRegulator::new();
        let mut rng = ChaCha20Rng::seed_from_u64(100);
        let mut config = SolveConfig::new(GenPageRequest::new(), false, 1, 0);
        config.target_value = Some(ConstraintSet::from_range(0x4000, 0x4000));
        let mut shared = AddressSolvingShared::setup(&mapper, &regulator, config).unwrap();
        let mut iss = FakeIss::new();
        iss.initialise(&IssOptions::new("rv64gc", 1)).unwrap();
        let params = DataProcessingParams {
            uop: DataProcessingUop::AddWithCarry,
            reg_names: [None, Some("x2".into())],
            known: [0, 0x1000, 0],
            solve_for: SolveFor::First,
            cpu: 0,
        };
        let solved = data_processing::solve(&mut shared, &mut mapper, &mut rng, &mut iss, &params).unwrap();
        assert_eq!(solved.address, 0x4000);
    }
}
