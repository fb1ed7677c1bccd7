// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

/// Errors crossing the ISS wire boundary (spec.md §7's `IssMismatch` and
/// `UnknownName` kinds, scoped to this crate).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("register {0:?} is not in the ISS register catalog")]
    UnknownRegister(String),
    #[error("ISS returned an error or a value disagreeing with the solver's prediction: {0}")]
    IssMismatch(String),
    #[error("{operand} is not a {expected} uop parameter")]
    WrongParamType { operand: &'static str, expected: &'static str },
    #[error("uop {uop:?} expects {expected} inputs, got {got}")]
    WrongInputCount { uop: crate::uop::UopCode, expected: usize, got: usize },
    #[error("uop {uop:?} expects {expected} outputs, got {got}")]
    WrongOutputCount { uop: crate::uop::UopCode, expected: usize, got: usize },
    #[error("ISS adapter used before initialise() or after terminate()")]
    NotInitialised,
}
