// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use constraint_set::ConstraintSet;
use rand::Rng;
use vm_mapper::VmMapper;

use crate::error::SolverError;
use crate::shared::AddressSolvingShared;
use crate::state::drive_within;
use crate::strategy::base_offset::BaseOffsetParams;
use crate::strategy::SolvedOperand;

/// Offset scaled by a constant factor (`BaseOffsetShiftSolvingShared`,
/// spec.md §4.5). Effective alignment becomes `max(arch_align, scale_align)`:
/// a scale-16 offset register already forces 16-byte alignment regardless
/// of what the addressing mode itself demands.
#[derive(Debug, Clone, Copy)]
pub struct BaseOffsetShiftParams {
    pub base: BaseOffsetParams,
    /// The scale the encoded offset is multiplied by; must be a power of
    /// two (shift amounts are the only scale `LSL #n`-style addressing uses).
    pub scale: u64,
}

impl BaseOffsetShiftParams {
    #[must_use]
    pub fn effective_align_mask(&self, arch_align_mask: u64) -> u64 {
        arch_align_mask.max(self.scale.saturating_sub(1))
    }
}

pub fn solve(
    shared: &mut AddressSolvingShared,
    mapper: &mut VmMapper,
    rng: &mut impl Rng,
    params: &BaseOffsetShiftParams,
) -> Result<SolvedOperand, SolverError> {
    if params.scale == 0 {
        return Err(SolverError::ConstraintMalformed("base-offset-shift scale must be non-zero".into()));
    }
    let (off_lo, off_hi) = params.base.offset_bounds();
    let window_lo = if off_lo < 0 {
        params
            .base
            .base_value
            .checked_sub(u64::try_from(-off_lo).unwrap_or(u64::MAX).saturating_mul(params.scale))
            .unwrap_or(0)
    } else {
        params.base.base_value.saturating_add(u64::try_from(off_lo).unwrap_or(0).saturating_mul(params.scale))
    };
    let window_hi =
        params.base.base_value.saturating_add(u64::try_from(off_hi).unwrap_or(0).saturating_mul(params.scale));
    if window_lo > window_hi {
        return Err(SolverError::NoAddressSolution);
    }

    // Keep only points that are `base + k*scale` for integer `k`, i.e.
    // congruent to `base` modulo `scale`.
    let strided = ConstraintSet::from_range(window_lo, window_hi)
        .align_mul_data_with_size(params.scale, params.base.base_value, 1);

    let mut candidates = shared.constraint().clone();
    candidates.apply(&strided);

    let address = drive_within(shared, mapper, rng, candidates)?;
    let delta = address.wrapping_sub(params.base.base_value);
    let encoded_offset = delta / params.scale;
    Ok(SolvedOperand::new(address).with_field("offset", encoded_offset))
}
