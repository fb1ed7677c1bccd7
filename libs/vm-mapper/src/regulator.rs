// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use constraint_set::ConstraintSet;
use page_model::GenPageRequest;

/// Which hazard a [`VmConstraint`] guards against (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Unmapped,
    AddressError,
    PrivilegedPage,
    FlatMap,
    UserAccess,
    NoDataAbort,
    NoInstrPageFault,
    NoDataPageFault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// The candidate value must lie inside the set.
    In,
    /// The candidate value must lie outside the set.
    NotIn,
}

/// One named VM-level constraint: a set plus the polarity it is applied with.
#[derive(Debug, Clone)]
pub struct VmConstraint {
    pub kind: ConstraintKind,
    pub polarity: Polarity,
    pub set: ConstraintSet,
}

impl VmConstraint {
    #[must_use]
    pub fn new(kind: ConstraintKind, polarity: Polarity, set: ConstraintSet) -> Self {
        Self { kind, polarity, set }
    }

    /// Shrinks `constr` in place to satisfy this single constraint.
    pub fn apply_on(&self, constr: &mut ConstraintSet) {
        match self.polarity {
            Polarity::In => constr.apply(&self.set),
            Polarity::NotIn => constr.subtract(&self.set),
        }
    }

    /// Pointwise form of [`Self::apply_on`].
    #[must_use]
    pub fn allows(&self, value: u64) -> bool {
        match self.polarity {
            Polarity::In => self.set.contains_value(value),
            Polarity::NotIn => !self.set.contains_value(value),
        }
    }
}

/// Builds the vector of [`VmConstraint`]s implied by one [`GenPageRequest`],
/// and the current virtual address space's mapped/permission state.
#[derive(Debug, Default)]
pub struct AddressFilteringRegulator;

impl AddressFilteringRegulator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds the constraint vector for one request against the space's
    /// current mapped and privileged ranges.
    #[must_use]
    pub fn build(
        &self,
        page_req: &GenPageRequest,
        mapped: &ConstraintSet,
        privileged: &ConstraintSet,
        user_accessible: &ConstraintSet,
    ) -> Vec<VmConstraint> {
        let mut out = Vec::new();

        if page_req.no_data_abort || page_req.no_instr_page_fault || page_req.no_data_page_fault {
            // Avoiding a fault means the candidate must already be mapped.
            out.push(VmConstraint::new(
                ConstraintKind::Unmapped,
                Polarity::In,
                mapped.clone(),
            ));
        }

        if page_req.force_new_addr {
            out.push(VmConstraint::new(
                ConstraintKind::AddressError,
                Polarity::NotIn,
                mapped.clone(),
            ));
        }

        if matches!(
            page_req.privilege_level,
            Some(page_model::PrivilegeLevel::User)
        ) {
            out.push(VmConstraint::new(
                ConstraintKind::UserAccess,
                Polarity::In,
                user_accessible.clone(),
            ));
            out.push(VmConstraint::new(
                ConstraintKind::PrivilegedPage,
                Polarity::NotIn,
                privileged.clone(),
            ));
        }

        if page_req.flat_map {
            out.push(VmConstraint::new(
                ConstraintKind::FlatMap,
                Polarity::In,
                mapped.clone(),
            ));
        }

        out
    }

    /// Applies every constraint in order to `constr`.
    pub fn apply_all(&self, constraints: &[VmConstraint], constr: &mut ConstraintSet) {
        for c in constraints {
            c.apply_on(constr);
        }
    }
}
