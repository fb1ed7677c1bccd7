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
use crate::strategy::base_index::{self, BaseIndexParams, IndexExtension};
use crate::strategy::SolvedOperand;

/// `BaseIndexAmountBitSolvingShared` (spec.md §4.5): identical to
/// `BaseIndexSolvingShared`, except the extension's shift amount is itself
/// chosen between `0` and `1` from a bit-valued operand constraint rather
/// than fixed by the encoding.
#[derive(Debug, Clone)]
pub struct BaseIndexAmountBitParams {
    pub base_value: u64,
    pub base_name: String,
    pub candidates: Vec<base_index::IndexCandidate>,
    pub extension: IndexExtension,
    /// Legal values for the amount bit; must be a subset of `{0, 1}`.
    pub amount_bit_domain: ConstraintSet,
}

pub fn solve(
    shared: &mut AddressSolvingShared,
    mapper: &mut VmMapper,
    rng: &mut impl Rng,
    params: &BaseIndexAmountBitParams,
) -> Result<SolvedOperand, SolverError> {
    let mut bits = ConstraintSet::new();
    bits.merge(&params.amount_bit_domain);
    bits.apply(&ConstraintSet::from_range(0, 1));
    if bits.is_empty() {
        return Err(SolverError::ConstraintMalformed("amount-bit domain has no value in {0,1}".into()));
    }
    let bit = bits.choose_value(rng)?;
    let shift = u32::try_from(bit).expect("bit is 0 or 1");

    let inner = BaseIndexParams {
        base_value: params.base_value,
        base_name: params.base_name.clone(),
        candidates: params.candidates.clone(),
        extension: params.extension,
        shift,
    };
    let mut solved = base_index::solve(shared, mapper, rng, &inner)?;
    solved.fields.retain(|(name, _)| *name != "shift");
    Ok(solved.with_field("amount_bit", bit))
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
    fn amount_bit_is_chosen_from_zero_or_one() {
        let mut mapper = direct_mapper();
        let regulator = AddressFilteringRegulator::new();
        let mut config = SolveConfig::new(GenPageRequest::new(), false, 1, 0);
        config.target_value = Some(ConstraintSet::from_range(0x1000, 0x20ff));
        let mut shared = AddressSolvingShared::setup(&mapper, &regulator, config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let params = BaseIndexAmountBitParams {
            base_value: 0x1000,
            base_name: "x1".into(),
            candidates: vec![base_index::IndexCandidate {
                name: "x2".into(),
                domain: ConstraintSet::from_range(0, 0xff),
            }],
            extension: IndexExtension::Lsl,
            amount_bit_domain: ConstraintSet::from_range(0, 1),
        };
        let solved = solve(&mut shared, &mut mapper, &mut rng, &params).unwrap();
        assert!(solved.field("amount_bit").unwrap() <= 1);
    }
}
