// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::collections::HashMap;

use page_model::BankType;

use crate::callbacks::IssCallbacks;
use crate::error::Error;
use crate::step::StepResult;
use crate::uop::{UopCode, UopValue};
use crate::value::RegisterValue;

/// Configuration-as-data for [`IssBridge::initialise`], the same plain-struct
/// shape as `page_model::GenPageRequest` — one instance built once per run,
/// carrying no behavior of its own.
#[derive(Debug, Clone, Default)]
pub struct IssOptions {
    pub isa: String,
    pub num_harts: u32,
    pub extra: HashMap<String, String>,
}

impl IssOptions {
    #[must_use]
    pub fn new(isa: impl Into<String>, num_harts: u32) -> Self {
        Self { isa: isa.into(), num_harts, extra: HashMap::new() }
    }
}

/// The wire contract with the functional simulator (spec.md §6). Every
/// method maps to one call across the ISS shared-object boundary; this crate
/// models only the Rust-side trait boundary, not the FFI marshalling itself
/// (SPEC_FULL.md's Non-goals exclude the `.so` implementation).
pub trait IssBridge {
    fn initialise(&mut self, options: &IssOptions) -> Result<(), Error>;
    fn terminate(&mut self) -> Result<(), Error>;

    /// Registers the callback sink the bridge invokes as the ISS reports
    /// live updates (spec.md §6's "Callbacks back into the generator
    /// (registered at startup)").
    fn register_callbacks(&mut self, callbacks: Box<dyn IssCallbacks>);

    fn read_register(&mut self, cpu: u32, name: &str) -> Result<RegisterValue, Error>;
    fn write_register(&mut self, cpu: u32, name: &str, value: RegisterValue) -> Result<(), Error>;

    /// Reads `len` bytes of a register wider than 64 bits, starting at bit
    /// offset `offset`.
    fn partial_read_large_register(
        &mut self,
        cpu: u32,
        name: &str,
        len: u32,
        offset: u32,
    ) -> Result<Vec<u8>, Error>;

    fn partial_write_large_register(
        &mut self,
        cpu: u32,
        name: &str,
        bytes: &[u8],
        offset: u32,
    ) -> Result<(), Error>;

    fn read_physical_memory(&mut self, bank: BankType, addr: u64, len: u32) -> Result<Vec<u8>, Error>;
    fn write_physical_memory(&mut self, bank: BankType, addr: u64, bytes: &[u8]) -> Result<(), Error>;

    fn step(&mut self, cpu: u32) -> Result<StepResult, Error>;

    /// Forward-executes `uop` on `inputs`, writing results into `outputs`.
    /// Callers always go through this rather than encoding the arithmetic
    /// themselves, so the reference ISS semantics are authoritative
    /// (spec.md §4.5's "the solver never encodes its own arithmetic beyond
    /// the algebra above").
    fn execute_uop(
        &mut self,
        cpu: u32,
        uop: UopCode,
        inputs: &[UopValue],
        outputs: &mut [UopValue],
    ) -> Result<(), Error>;
}
