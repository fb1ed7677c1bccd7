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

/// One operand solve's progress (spec.md §4.5's state machine), kept here
/// only as a label for what [`drive`] is doing at each step — the loop
/// itself is one function rather than a literal state object, since every
/// transition is driven by a single `map_target_address_range` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    Init,
    Setup,
    SolveFree,
    SolveConstrained,
    Accept,
    Reject,
}

/// Repeatedly samples a candidate from `shared`'s working constraint and
/// tries to commit it via `map_target_address_range`, removing rejected
/// candidates so they are never retried. Bounded by the constraint's own
/// cardinality (spec.md: "retries are bounded by the sizes of the
/// intersected constraints").
pub fn drive(shared: &mut AddressSolvingShared, mapper: &mut VmMapper, rng: &mut impl Rng) -> Result<u64, SolverError> {
    let candidates = shared.constraint().clone();
    drive_within(shared, mapper, rng, candidates)
}

/// Same loop as [`drive`], but over a caller-supplied candidate set rather
/// than `shared`'s whole working constraint — used by strategies that have
/// already narrowed candidates down to e.g. one base-register's reachable
/// offsets before handing off to the shared commit/retry machinery.
pub fn drive_within(
    shared: &mut AddressSolvingShared,
    mapper: &mut VmMapper,
    rng: &mut impl Rng,
    mut remaining: ConstraintSet,
) -> Result<u64, SolverError> {
    let budget = remaining.size();
    let mut state = SolveState::SolveConstrained;
    for _ in 0..budget {
        let candidate = remaining.choose_value(rng)?;
        match shared.map_target_address_range(mapper, rng, candidate) {
            Ok(()) => {
                state = SolveState::Accept;
                trace!(candidate, ?state, "operand solve accepted");
                return Ok(shared.tag_value(candidate));
            }
            Err(SolverError::NoAddressSolution) => {
                remaining.sub_value(candidate);
                state = SolveState::SolveConstrained;
            }
            Err(e) => return Err(e),
        }
    }
    trace!(?state, "operand solve exhausted candidates");
    Err(SolverError::NoAddressSolution)
}
