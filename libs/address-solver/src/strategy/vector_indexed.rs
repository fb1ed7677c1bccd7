// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use constraint_set::ConstraintSet;
use rand::Rng;
use tracing::trace;
use vm_mapper::VmMapper;

use crate::error::SolverError;
use crate::shared::AddressSolvingShared;

/// `VectorIndexedSolvingShared` (spec.md §4.5): a gather/scatter access where
/// each element carries its own, independently constrained offset from
/// `base` (as opposed to [`crate::strategy::vector_strided`]'s single shared
/// stride) — so each element's address is solved on its own, and the whole
/// access only succeeds once every element does.
///
/// `SolvedOperand`'s fixed `(&'static str, u64)` field list doesn't fit a
/// variable-length per-element result, so this strategy returns its own
/// result shape instead of reusing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorIndexedSolution {
    pub base: u64,
    /// One offset per element, in the same order as
    /// [`VectorIndexedParams::element_offsets`].
    pub offsets: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct VectorIndexedParams {
    pub base_value: u64,
    /// Per-element legal offset domains; independent of one another.
    pub element_offsets: Vec<ConstraintSet>,
}

const MAX_SAMPLES_PER_ELEMENT: u32 = 64;

pub fn solve(
    shared: &mut AddressSolvingShared,
    mapper: &mut VmMapper,
    rng: &mut impl Rng,
    params: &VectorIndexedParams,
) -> Result<VectorIndexedSolution, SolverError> {
    if params.element_offsets.is_empty() {
        return Err(SolverError::ConstraintMalformed("vector-indexed access must have at least one element".into()));
    }

    let mut offsets = Vec::with_capacity(params.element_offsets.len());
    for (idx, domain) in params.element_offsets.iter().enumerate() {
        let mut remaining = domain.clone();
        let attempts = MAX_SAMPLES_PER_ELEMENT.min(u32::try_from(remaining.size().min(u64::from(u32::MAX))).unwrap_or(1));
        let mut solved = None;
        for _ in 0..attempts {
            if remaining.is_empty() {
                break;
            }
            let offset = remaining.choose_value(rng)?;
            let address = params.base_value.wrapping_add(offset);
            match shared.map_target_address_range(mapper, rng, address) {
                Ok(()) => {
                    solved = Some(offset);
                    break;
                }
                Err(SolverError::NoAddressSolution) => {
                    remaining.sub_value(offset);
                }
                Err(e) => return Err(e),
            }
        }
        match solved {
            Some(offset) => offsets.push(offset),
            None => {
                trace!(element = idx, "vector-indexed element exhausted its offset domain");
                return Err(SolverError::NoAddressSolution);
            }
        }
    }

    Ok(VectorIndexedSolution { base: shared.tag_value(params.base_value), offsets })
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn empty_element_list_is_rejected() {
        let mut mapper = direct_mapper();
        let regulator = AddressFilteringRegulator::new();
        let config = SolveConfig::new(GenPageRequest::new(), false, 4, 0);
        let mut shared = AddressSolvingShared::setup(&mapper, &regulator, config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let params = VectorIndexedParams { base_value: 0x1000, element_offsets: vec![] };
        let err = solve(&mut shared, &mut mapper, &mut rng, &params).unwrap_err();
        assert!(matches!(err, SolverError::ConstraintMalformed(_)));
    }

    #[test]
    fn each_element_gets_an_independent_offset_inside_target() {
        let mut mapper = direct_mapper();
        let regulator = AddressFilteringRegulator::new();
        let mut config = SolveConfig::new(GenPageRequest::new(), false, 4, 0);
        config.target_value = Some(ConstraintSet::from_range(0x1000, 0x10ff));
        let mut shared = AddressSolvingShared::setup(&mapper, &regulator, config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let params = VectorIndexedParams {
            base_value: 0x1000,
            element_offsets: vec![ConstraintSet::from_range(0, 0xff), ConstraintSet::from_range(0, 0xff)],
        };
        let solved = solve(&mut shared, &mut mapper, &mut rng, &params).unwrap();
        assert_eq!(solved.offsets.len(), 2);
        for offset in solved.offsets {
            let addr = params.base_value + offset;
            assert!((0x1000..=0x10ff).contains(&addr));
        }
    }
}
