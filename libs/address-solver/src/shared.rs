// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use constraint_set::ConstraintSet;
use rand::Rng;
use tracing::debug;
use vm_mapper::{AddressFilteringRegulator, AddressReuseMode, TranslateResult, VmMapper};

use crate::config::SolveConfig;
use crate::error::SolverError;
use crate::state;
use crate::tag;

/// The solver's workspace for one addressing operand (spec.md §4.5). Built
/// once by [`Self::setup`], then driven through [`Self::solve_free`] or the
/// candidate-narrowing strategies in [`crate::strategy`], which both end up
/// calling [`Self::map_target_address_range`] to commit and re-verify a
/// chosen VA.
#[derive(Debug)]
pub struct AddressSolvingShared {
    pub config: SolveConfig,
    constraint: ConstraintSet,
    vm_timestamp: u64,
    reuse_mode: AddressReuseMode,
}

impl AddressSolvingShared {
    /// Fixes the active constraint: usable VA (plus reuse-widened VA when
    /// any reuse bit survives gating), VM constraints from `regulator`, the
    /// PC keep-out zone, the optional hard target, and the alignment
    /// projection for `config.size`.
    pub fn setup(
        mapper: &VmMapper,
        regulator: &AddressFilteringRegulator,
        config: SolveConfig,
    ) -> Result<Self, SolverError> {
        let reuse_mode = config.effective_reuse_mode();
        let constraint = Self::build_constraint(mapper, regulator, &config, reuse_mode)?;
        debug!(
            is_instr = config.is_instr,
            size = config.size,
            reuse = ?reuse_mode,
            candidates = constraint.size(),
            "address-solving workspace set up"
        );
        Ok(Self {
            config,
            constraint,
            vm_timestamp: mapper.vm_timestamp(),
            reuse_mode,
        })
    }

    fn build_constraint(
        mapper: &VmMapper,
        regulator: &AddressFilteringRegulator,
        config: &SolveConfig,
        reuse_mode: AddressReuseMode,
    ) -> Result<ConstraintSet, SolverError> {
        let mut constraint = mapper.virtual_usable_constraint(config.is_instr).clone();
        if !reuse_mode.is_empty() {
            mapper.apply_virtual_usable_constraint(config.is_instr, reuse_mode, &mut constraint)?;
        }
        let vm_constraints = regulator.build(
            &config.page_req,
            mapper.mapped_constraint(),
            mapper.privileged_constraint(),
            mapper.user_accessible_constraint(),
        );
        regulator.apply_all(&vm_constraints, &mut constraint);
        constraint.subtract(&config.pc_keepout());
        if let Some(target) = &config.target_value {
            constraint.apply(target);
        }
        Ok(constraint.align_with_size(config.align_mask, config.size))
    }

    #[must_use]
    pub fn constraint(&self) -> &ConstraintSet {
        &self.constraint
    }

    #[must_use]
    pub fn reuse_mode(&self) -> AddressReuseMode {
        self.reuse_mode
    }

    /// Re-derives the working constraint against the mapper's current
    /// state; called whenever `vm_timestamp` has moved since `setup`.
    fn refresh(&mut self, mapper: &VmMapper, regulator: &AddressFilteringRegulator) -> Result<(), SolverError> {
        self.constraint = Self::build_constraint(mapper, regulator, &self.config, self.reuse_mode)?;
        self.vm_timestamp = mapper.vm_timestamp();
        Ok(())
    }

    /// The simplest solve path (spec.md §4.5): any VA inside all constraints.
    pub fn solve_free(&mut self, mapper: &mut VmMapper, rng: &mut impl Rng) -> Result<u64, SolverError> {
        state::drive(self, mapper, rng)
    }

    /// Must be re-run every time a candidate is accepted (spec.md §4.5):
    /// maps `[va, va+size)` if it isn't mapped yet, refreshes the working
    /// constraint if that mapping bumped `vm_timestamp`, then verifies `va`
    /// against both the mapper's own VM rules and the (possibly refreshed)
    /// working constraint.
    pub fn map_target_address_range(
        &mut self,
        mapper: &mut VmMapper,
        rng: &mut impl Rng,
        va: u64,
    ) -> Result<(), SolverError> {
        self.commit_mapping(mapper, rng, va)
    }

    fn commit_mapping(&mut self, mapper: &mut VmMapper, rng: &mut impl Rng, va: u64) -> Result<(), SolverError> {
        let (_, _, translated) = mapper.translate_va_to_pa(tag::strip(va), self.config.is_instr);
        if translated != TranslateResult::Mapped {
            mapper.map_address_range(
                tag::strip(va),
                self.config.size,
                self.config.is_instr,
                &self.config.page_req,
                false,
                rng,
            )?;
        }

        let new_timestamp = mapper.vm_timestamp();
        if new_timestamp != self.vm_timestamp {
            let regulator = AddressFilteringRegulator::new();
            self.refresh(mapper, &regulator)?;
        }

        if !mapper.verify_virtual_address(tag::strip(va), self.config.size, self.config.is_instr, &self.config.page_req)
        {
            return Err(SolverError::NoAddressSolution);
        }
        if !self.constraint.contains_value(tag::strip(va)) {
            return Err(SolverError::NoAddressSolution);
        }
        Ok(())
    }

    #[must_use]
    pub fn tag_value(&self, va: u64) -> u64 {
        match self.config.tag {
            Some(t) => tag::apply(va, t),
            None => va,
        }
    }
}
