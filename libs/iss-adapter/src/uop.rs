// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::Error;

/// A defined micro-operation the ISS can forward-execute on the solver's
/// behalf (spec.md §6). `Div` carries no separate signed/unsigned variant on
/// the wire; signedness is the trailing `Bool` input, exactly as spec.md §6
/// describes ("Div (signed/unsigned selected by a boolean input)"). The
/// `address-solver` strategies that speak of `UDiv`/`SDiv` are a solver-side
/// naming convenience over this one wire-level op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UopCode {
    AddWithCarry,
    SubWithCarry,
    MulAdd,
    Mul,
    Div,
}

impl UopCode {
    #[must_use]
    pub fn input_count(self) -> usize {
        match self {
            UopCode::AddWithCarry | UopCode::SubWithCarry => 3,
            UopCode::MulAdd => 3,
            UopCode::Mul => 2,
            UopCode::Div => 3,
        }
    }

    #[must_use]
    pub fn output_count(self) -> usize {
        1
    }
}

/// Fixed parameter typing for uop operands (spec.md §6: "fixed parameter
/// typing (`Bool`, `UInt64`)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UopValue {
    Bool(bool),
    UInt64(u64),
}

impl UopValue {
    pub fn as_u64(self, operand: &'static str) -> Result<u64, Error> {
        match self {
            UopValue::UInt64(v) => Ok(v),
            UopValue::Bool(_) => Err(Error::WrongParamType { operand, expected: "UInt64" }),
        }
    }

    pub fn as_bool(self, operand: &'static str) -> Result<bool, Error> {
        match self {
            UopValue::Bool(v) => Ok(v),
            UopValue::UInt64(_) => Err(Error::WrongParamType { operand, expected: "Bool" }),
        }
    }
}

pub(crate) fn check_arity(
    uop: UopCode,
    n_in: usize,
    n_out: usize,
) -> Result<(), Error> {
    if n_in != uop.input_count() {
        return Err(Error::WrongInputCount { uop, expected: uop.input_count(), got: n_in });
    }
    if n_out != uop.output_count() {
        return Err(Error::WrongOutputCount { uop, expected: uop.output_count(), got: n_out });
    }
    Ok(())
}
