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

/// `VectorStridedSolvingShared` (spec.md §4.5): a vector load/store whose
/// elements sit `stride` bytes apart. Unlike the scalar strategies, a
/// candidate base address is only accepted once every element in the access
/// — `base, base + stride, .., base + (count-1)*stride` — independently
/// clears `map_target_address_range`; a base that only works for element 0
/// is not a solution.
#[derive(Debug, Clone, Copy)]
pub struct VectorStridedParams {
    /// Size in bytes of a single element; used only for documentation of
    /// intent here, the actual per-element mapping size comes from
    /// `shared.config.size`, which callers set to `element_size`.
    pub element_size: u64,
    pub count: u64,
    /// Two's-complement bit pattern of the (possibly negative) per-element
    /// byte stride, in the same encoding `base_offset`'s `offset` field uses.
    pub stride: u64,
}

const MAX_BASE_ATTEMPTS: u64 = 256;

fn element_addresses(base: u64, params: &VectorStridedParams) -> impl Iterator<Item = u64> + '_ {
    (0..params.count).map(move |k| base.wrapping_add(params.stride.wrapping_mul(k)))
}

pub fn solve(
    shared: &mut AddressSolvingShared,
    mapper: &mut VmMapper,
    rng: &mut impl Rng,
    params: &VectorStridedParams,
) -> Result<SolvedOperand, SolverError> {
    if params.count == 0 {
        return Err(SolverError::ConstraintMalformed("vector access must have at least one element".into()));
    }
    let mut remaining = shared.constraint().clone();
    let attempts = MAX_BASE_ATTEMPTS.min(remaining.size().max(1));

    for _ in 0..attempts {
        if remaining.is_empty() {
            break;
        }
        let base = remaining.choose_value(rng)?;
        let addresses: Vec<u64> = element_addresses(base, params).collect();
        let mut all_ok = true;
        for addr in &addresses {
            match shared.map_target_address_range(mapper, rng, *addr) {
                Ok(()) => {}
                Err(SolverError::NoAddressSolution) => {
                    all_ok = false;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        if all_ok {
            return Ok(SolvedOperand::new(shared.tag_value(base))
                .with_field("stride", params.stride)
                .with_field("count", params.count));
        }
        remaining.sub_value(base);
        trace!(base, "vector-strided base rejected, some element missed the working constraint");
    }
    Err(SolverError::NoAddressSolution)
}
