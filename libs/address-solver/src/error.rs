// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

/// The error kinds named in spec.md §7, one variant each, plus the
/// recoverable/fatal split the propagation policy describes.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("operation required a value from an empty constraint set")]
    EmptyConstraint,

    #[error("constraint malformed: {0}")]
    ConstraintMalformed(String),

    #[error("no address satisfies the current constraints after exhausting all candidates")]
    NoAddressSolution,

    #[error("physical or virtual page allocation failed: {0}")]
    PageAllocationFailed(String),

    #[error("paging registers cannot be interpreted: {0}")]
    VmContextInvalid(String),

    #[error("ISS disagreed with the solved value: {0}")]
    IssMismatch(String),

    #[error("unknown register, operand, or variable name: {0}")]
    UnknownName(String),

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl SolverError {
    /// Per spec.md §7's propagation policy: `NoAddressSolution` and
    /// `PageAllocationFailed` are expected outcomes a caller may retry after
    /// relaxing the request. Everything else either bubbles to the template
    /// executor (`EmptyConstraint`, `ConstraintMalformed`, `UnknownName`) or
    /// is fatal (`VmContextInvalid`, `IssMismatch`, `InvariantViolation`);
    /// this crate does not distinguish those two further since both are
    /// non-recoverable from the solver's point of view.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoAddressSolution | Self::PageAllocationFailed(_))
    }
}

impl From<constraint_set::Error> for SolverError {
    fn from(e: constraint_set::Error) -> Self {
        match e {
            constraint_set::Error::EmptySet => Self::EmptyConstraint,
            constraint_set::Error::InvalidRange { .. } | constraint_set::Error::ConstraintMalformed { .. } => {
                Self::ConstraintMalformed(e.to_string())
            }
        }
    }
}

impl From<page_model::Error> for SolverError {
    fn from(e: page_model::Error) -> Self {
        match e {
            page_model::Error::NotInitialised
            | page_model::Error::PageAllocationFailed { .. }
            | page_model::Error::AliasRefused { .. } => Self::PageAllocationFailed(e.to_string()),
            page_model::Error::ConflictingAttributes { .. } | page_model::Error::InvariantViolation(_) => {
                Self::InvariantViolation(e.to_string())
            }
        }
    }
}

impl From<vm_mapper::Error> for SolverError {
    fn from(e: vm_mapper::Error) -> Self {
        match e {
            vm_mapper::Error::NoMatchingContext
            | vm_mapper::Error::NotPaged(_)
            | vm_mapper::Error::NotDirect(_) => Self::VmContextInvalid(e.to_string()),
            vm_mapper::Error::NoFreeRange { .. } => Self::PageAllocationFailed(e.to_string()),
            vm_mapper::Error::PageModel(inner) => inner.into(),
            vm_mapper::Error::InvariantViolation(_) => Self::InvariantViolation(e.to_string()),
        }
    }
}

impl From<resource_queue::Error> for SolverError {
    fn from(e: resource_queue::Error) -> Self {
        Self::InvariantViolation(e.to_string())
    }
}

impl From<iss_adapter::Error> for SolverError {
    fn from(e: iss_adapter::Error) -> Self {
        Self::IssMismatch(e.to_string())
    }
}

impl From<register_file::Error> for SolverError {
    fn from(e: register_file::Error) -> Self {
        Self::UnknownName(e.to_string())
    }
}
