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
use crate::strategy::SolvedOperand;

/// Single base register plus a signed immediate offset
/// (`BaseOffsetSolvingShared`, spec.md §4.5). `free_offset` is generated
/// lazily — the candidate address set is only ever materialised once, here.
#[derive(Debug, Clone, Copy)]
pub struct BaseOffsetParams {
    pub base_value: u64,
    pub offset_bits: u32,
}

impl BaseOffsetParams {
    /// `[min, max]` of the signed, `offset_bits`-wide immediate.
    #[must_use]
    pub fn offset_bounds(&self) -> (i64, i64) {
        if self.offset_bits == 0 {
            return (0, 0);
        }
        let half = 1i64 << (self.offset_bits - 1);
        (-half, half - 1)
    }
}

/// `target = base + offset`: narrows `shared`'s working constraint to the
/// window the offset can reach, solves within it, then recovers the
/// concrete offset that was used.
pub fn solve(
    shared: &mut AddressSolvingShared,
    mapper: &mut VmMapper,
    rng: &mut impl Rng,
    params: &BaseOffsetParams,
) -> Result<SolvedOperand, SolverError> {
    let (off_lo, off_hi) = params.offset_bounds();
    // The reachable window is `[base + off_lo, base + off_hi]`, clamped
    // rather than wrapped so an out-of-range offset bound simply shrinks
    // the window instead of aliasing to the other end of the address space.
    let window_lo = if off_lo < 0 {
        params.base_value.checked_sub(u64::try_from(-off_lo).unwrap_or(u64::MAX)).unwrap_or(0)
    } else {
        params.base_value.saturating_add(u64::try_from(off_lo).unwrap_or(0))
    };
    let window_hi = params.base_value.saturating_add(u64::try_from(off_hi).unwrap_or(0));
    if window_lo > window_hi {
        return Err(SolverError::NoAddressSolution);
    }
    let reachable = ConstraintSet::from_range(window_lo, window_hi);

    let mut candidates = shared.constraint().clone();
    candidates.apply(&reachable);

    let address = drive_within(shared, mapper, rng, candidates)?;
    // `wrapping_sub` already produces the two's-complement bit pattern of
    // the signed offset, which is exactly the encoding the immediate field
    // wants — no further sign handling needed.
    let offset_bits = address.wrapping_sub(params.base_value);
    Ok(SolvedOperand::new(address).with_field("offset", offset_bits))
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

    /// spec.md §8's worked scenario: target `{0x1000..=0x10FF}`, base held
    /// at `0x1000`, 12-bit signed offset — solver must return an offset in
    /// `{0..=0xFF}`.
    #[test]
    fn base_offset_worked_example() {
        let mut mapper = direct_mapper();
        let regulator = AddressFilteringRegulator::new();
        let mut config = SolveConfig::new(GenPageRequest::new(), false, 1, 0);
        config.target_value = Some(ConstraintSet::from_range(0x1000, 0x10ff));
        let mut shared = AddressSolvingShared::setup(&mapper, &regulator, config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let params = BaseOffsetParams { base_value: 0x1000, offset_bits: 12 };
        let solved = solve(&mut shared, &mut mapper, &mut rng, &params).unwrap();
        let offset = solved.field("offset").unwrap();
        assert!(offset <= 0xff);
        assert_eq!(solved.address, 0x1000 + offset);
    }
}
