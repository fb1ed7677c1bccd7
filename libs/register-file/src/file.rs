// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::collections::HashMap;

use tracing::debug;

use crate::bank::PhysicalBank;
use crate::error::Error;
use crate::physical::{PhysicalRegister, PhysicalRegisterId};
use crate::register::Register;

/// The full in-memory register catalog plus its backing physical storage
/// (spec.md §6's `RegisterFile` — "already-built in-memory structures" the
/// core consumes once the register XML catalog has been parsed).
#[derive(Debug, Default)]
pub struct RegisterFile {
    bank: PhysicalBank,
    registers: HashMap<String, Register>,
}

impl RegisterFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new physical register of `width_bits`, starting fully
    /// uninitialized.
    pub fn allocate_physical(&mut self, width_bits: u32) -> PhysicalRegisterId {
        self.bank.allocate(width_bits)
    }

    #[must_use]
    pub fn physical_width(&self, id: PhysicalRegisterId) -> Option<u32> {
        self.bank.get(id).map(|r| r.width_bits)
    }

    #[must_use]
    pub fn physical(&self, id: PhysicalRegisterId) -> Option<&PhysicalRegister> {
        self.bank.get(id)
    }

    pub fn define_register(&mut self, register: Register) {
        debug!(register = register.name.as_str(), "defined register in catalog");
        self.registers.insert(register.name.clone(), register);
    }

    #[must_use]
    pub fn register(&self, name: &str) -> Option<&Register> {
        self.registers.get(name)
    }

    fn try_register(&self, name: &str) -> Result<&Register, Error> {
        self.register(name).ok_or_else(|| Error::UnknownRegister(name.to_string()))
    }

    pub fn read_field(&self, register: &str, field: &str) -> Result<u64, Error> {
        self.try_register(register)?.try_field(field)?.read(register, &self.bank)
    }

    pub fn write_field(&mut self, register: &str, field: &str, value: u64) -> Result<(), Error> {
        let field = self.try_register(register)?.try_field(field)?.clone();
        field.write(value, &mut self.bank)
    }

    /// Whole-register raw read, bypassing the field catalog: `None` if any
    /// bit of the physical register is uninitialized.
    #[must_use]
    pub fn read_physical_raw(&self, id: PhysicalRegisterId) -> Option<u64> {
        self.bank.get(id).and_then(PhysicalRegister::read_raw)
    }

    pub fn write_physical_raw(&mut self, id: PhysicalRegisterId, value: u64) -> Result<(), Error> {
        self.bank
            .get_mut(id)
            .ok_or(Error::UnknownPhysicalRegister(id))?
            .write_raw(value);
        Ok(())
    }
}
