// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use rand::Rng;
use tracing::trace;
use vm_mapper::VmMapper;

use crate::error::SolverError;
use crate::shared::AddressSolvingShared;
use crate::strategy::SolvedOperand;
use crate::util::{sign_extend_32, zero_extend_32};

/// How the index register's value is widened before the shift
/// (`BaseIndexSolvingShared`, spec.md §4.5: "`UXTW`, `SXTW`, `LSL`, …").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexExtension {
    Uxtw,
    Sxtw,
    Lsl,
}

/// One candidate index register and the values it is legally known to hold
/// — either because the ISS reports it fully initialised, or because a
/// free (uninitialised, ISS co-simulated) register may be driven to any
/// value the caller is willing to pick.
#[derive(Debug, Clone)]
pub struct IndexCandidate {
    pub name: String,
    pub domain: constraint_set::ConstraintSet,
}

#[derive(Debug, Clone)]
pub struct BaseIndexParams {
    pub base_value: u64,
    pub base_name: String,
    pub candidates: Vec<IndexCandidate>,
    pub extension: IndexExtension,
    pub shift: u32,
}

fn extend(raw: u64, extension: IndexExtension, shift: u32) -> u64 {
    let widened = match extension {
        IndexExtension::Lsl => raw,
        IndexExtension::Uxtw => zero_extend_32(raw),
        IndexExtension::Sxtw => sign_extend_32(raw),
    };
    widened.wrapping_shl(shift)
}

/// Enumerates candidate index registers, rejecting the base register
/// itself (step 1 of the data-processing skeleton generalises here too:
/// repeated registers would create a false aliasing constraint), and for
/// each candidate samples values from its domain until one produces an
/// address inside `shared`'s working constraint.
///
/// Per-candidate sampling is bounded (`MAX_SAMPLES_PER_CANDIDATE`) rather
/// than exhaustive: index domains can be the full 32-bit range for a free
/// register, and `map_target_address_range` is the expensive step.
const MAX_SAMPLES_PER_CANDIDATE: u32 = 64;

pub fn solve(
    shared: &mut AddressSolvingShared,
    mapper: &mut VmMapper,
    rng: &mut impl Rng,
    params: &BaseIndexParams,
) -> Result<SolvedOperand, SolverError> {
    let eligible: Vec<&IndexCandidate> =
        params.candidates.iter().filter(|c| c.name != params.base_name && !c.domain.is_empty()).collect();
    if eligible.is_empty() {
        return Err(SolverError::NoAddressSolution);
    }

    for candidate in eligible {
        for _ in 0..MAX_SAMPLES_PER_CANDIDATE.min(u32::try_from(candidate.domain.size().min(u64::from(u32::MAX))).unwrap_or(1))
        {
            let idx_value = candidate.domain.choose_value(rng)?;
            let delta = extend(idx_value, params.extension, params.shift);
            let address = params.base_value.wrapping_add(delta);
            match shared.map_target_address_range(mapper, rng, address) {
                Ok(()) => {
                    return Ok(SolvedOperand::new(shared.tag_value(address))
                        .with_field("index_value", idx_value)
                        .with_field("shift", u64::from(params.shift)));
                }
                Err(SolverError::NoAddressSolution) => continue,
                Err(e) => return Err(e),
            }
        }
        trace!(register = %candidate.name, "base+index candidate exhausted");
    }
    Err(SolverError::NoAddressSolution)
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
    fn repeated_register_is_rejected() {
        let mut mapper = direct_mapper();
        let regulator = AddressFilteringRegulator::new();
        let config = SolveConfig::new(GenPageRequest::new(), false, 1, 0);
        let mut shared = AddressSolvingShared::setup(&mapper, &regulator, config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let params = BaseIndexParams {
            base_value: 0x1000,
            base_name: "x1".into(),
            candidates: vec![IndexCandidate { name: "x1".into(), domain: ConstraintSet::from_range(0, 0xff) }],
            extension: IndexExtension::Lsl,
            shift: 0,
        };
        let err = solve(&mut shared, &mut mapper, &mut rng, &params).unwrap_err();
        assert!(matches!(err, SolverError::NoAddressSolution));
    }

    #[test]
    fn lsl_index_lands_inside_target() {
        let mut mapper = direct_mapper();
        let regulator = AddressFilteringRegulator::new();
        let mut config = SolveConfig::new(GenPageRequest::new(), false, 1, 0);
        config.target_value = Some(ConstraintSet::from_range(0x1000, 0x10ff));
        let mut shared = AddressSolvingShared::setup(&mapper, &regulator, config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let params = BaseIndexParams {
            base_value: 0x1000,
            base_name: "x1".into(),
            candidates: vec![IndexCandidate { name: "x2".into(), domain: ConstraintSet::from_range(0, 0xff) }],
            extension: IndexExtension::Lsl,
            shift: 0,
        };
        let solved = solve(&mut shared, &mut mapper, &mut rng, &params).unwrap();
        assert!((0x1000..=0x10ff).contains(&solved.address));
    }
}
