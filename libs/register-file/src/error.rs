// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::physical::PhysicalRegisterId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown register {0:?}")]
    UnknownRegister(String),
    #[error("register {register:?} has no field {field:?}")]
    UnknownField { register: String, field: String },
    #[error("bit-slice references unknown physical register {0:?}")]
    UnknownPhysicalRegister(PhysicalRegisterId),
    #[error("bit-slice [{lo}, {hi}] is out of range for a {width}-bit physical register")]
    SliceOutOfRange { lo: u32, hi: u32, width: u32 },
    #[error("bit-slice [{lo}, {hi}] is empty (hi < lo)")]
    EmptySlice { lo: u32, hi: u32 },
    #[error("field {0:?} has no bit-slices")]
    EmptyField(String),
    #[error("value {value:#x} does not fit in a {width}-bit field")]
    ValueTooWide { value: u64, width: u32 },
    #[error("read of field {register:?}.{field:?} trapped: bits [{lo}, {hi}] of physical register {physical:?} were never written")]
    UninitializedRead {
        register: String,
        field: String,
        physical: PhysicalRegisterId,
        lo: u32,
        hi: u32,
    },
}
