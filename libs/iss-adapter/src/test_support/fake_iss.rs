// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::collections::HashMap;

use page_model::BankType;
use tracing::trace;

use crate::bridge::{IssBridge, IssOptions};
use crate::callbacks::IssCallbacks;
use crate::error::Error;
use crate::step::StepResult;
use crate::uop::{check_arity, UopCode, UopValue};
use crate::value::RegisterValue;

/// A fake, fully in-process ISS: registers and physical memory are plain
/// maps, `step()` never produces events on its own (tests call
/// `write_register`/`write_physical_memory` directly to set up state and
/// inspect it afterward), and `execute_uop` is the one place this type does
/// real work — it forward-computes each defined uop exactly so solver tests
/// can check their inverse-solving math against a trustworthy oracle.
#[derive(Default)]
pub struct FakeIss {
    initialised: bool,
    registers: HashMap<(u32, String), RegisterValue>,
    memory: HashMap<(BankType, u64), u8>,
    callbacks: Option<Box<dyn IssCallbacks>>,
}

impl FakeIss {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn require_initialised(&self) -> Result<(), Error> {
        if self.initialised {
            Ok(())
        } else {
            Err(Error::NotInitialised)
        }
    }
}

impl IssBridge for FakeIss {
    fn initialise(&mut self, _options: &IssOptions) -> Result<(), Error> {
        self.initialised = true;
        Ok(())
    }

    fn terminate(&mut self) -> Result<(), Error> {
        self.initialised = false;
        Ok(())
    }

    fn register_callbacks(&mut self, callbacks: Box<dyn IssCallbacks>) {
        self.callbacks = Some(callbacks);
    }

    fn read_register(&mut self, cpu: u32, name: &str) -> Result<RegisterValue, Error> {
        self.require_initialised()?;
        Ok(self.registers.get(&(cpu, name.to_string())).copied().unwrap_or_default())
    }

    fn write_register(&mut self, cpu: u32, name: &str, value: RegisterValue) -> Result<(), Error> {
        self.require_initialised()?;
        self.registers.insert((cpu, name.to_string()), value);
        if let Some(cb) = &mut self.callbacks {
            cb.update_register(cpu, name, value);
        }
        Ok(())
    }

    fn partial_read_large_register(
        &mut self,
        cpu: u32,
        name: &str,
        len: u32,
        offset: u32,
    ) -> Result<Vec<u8>, Error> {
        self.require_initialised()?;
        let reg = self.read_register(cpu, name)?;
        let bytes = reg.value.to_le_bytes();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(bytes.len());
        let end = start.saturating_add(usize::try_from(len).unwrap_or(usize::MAX)).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    fn partial_write_large_register(
        &mut self,
        cpu: u32,
        name: &str,
        bytes: &[u8],
        offset: u32,
    ) -> Result<(), Error> {
        self.require_initialised()?;
        let mut current = self.read_register(cpu, name)?;
        let mut raw = current.value.to_le_bytes();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(raw.len());
        for (i, &b) in bytes.iter().enumerate() {
            if let Some(slot) = raw.get_mut(start + i) {
                *slot = b;
            }
        }
        current.value = u64::from_le_bytes(raw);
        self.write_register(cpu, name, current)
    }

    fn read_physical_memory(&mut self, bank: BankType, addr: u64, len: u32) -> Result<Vec<u8>, Error> {
        self.require_initialised()?;
        Ok((0..u64::from(len))
            .map(|i| *self.memory.get(&(bank, addr.wrapping_add(i))).unwrap_or(&0))
            .collect())
    }

    fn write_physical_memory(&mut self, bank: BankType, addr: u64, bytes: &[u8]) -> Result<(), Error> {
        self.require_initialised()?;
        for (i, &b) in bytes.iter().enumerate() {
            let offset = u64::try_from(i).unwrap_or(u64::MAX);
            self.memory.insert((bank, addr.wrapping_add(offset)), b);
        }
        if let Some(cb) = &mut self.callbacks {
            cb.update_memory(bank, addr, bytes);
        }
        Ok(())
    }

    fn step(&mut self, _cpu: u32) -> Result<StepResult, Error> {
        self.require_initialised()?;
        Ok(StepResult::default())
    }

    fn execute_uop(
        &mut self,
        _cpu: u32,
        uop: UopCode,
        inputs: &[UopValue],
        outputs: &mut [UopValue],
    ) -> Result<(), Error> {
        self.require_initialised()?;
        check_arity(uop, inputs.len(), outputs.len())?;
        trace!(?uop, "forward-executing uop on fake ISS");
        let result = match uop {
            UopCode::Mul => {
                let m = inputs[0].as_u64("m")?;
                let n = inputs[1].as_u64("n")?;
                m.wrapping_mul(n)
            }
            UopCode::MulAdd => {
                let m = inputs[0].as_u64("m")?;
                let n = inputs[1].as_u64("n")?;
                let a = inputs[2].as_u64("a")?;
                m.wrapping_mul(n).wrapping_add(a)
            }
            UopCode::AddWithCarry => {
                let a = inputs[0].as_u64("a")?;
                let b = inputs[1].as_u64("b")?;
                let carry = inputs[2].as_bool("carry")?;
                a.wrapping_add(b).wrapping_add(u64::from(carry))
            }
            UopCode::SubWithCarry => {
                // Two's-complement style per spec.md §9: minuend + ~subtrahend + carry.
                let minuend = inputs[0].as_u64("minuend")?;
                let subtrahend = inputs[1].as_u64("subtrahend")?;
                let carry = inputs[2].as_bool("carry")?;
                minuend.wrapping_add(!subtrahend).wrapping_add(u64::from(carry))
            }
            UopCode::Div => {
                let dividend = inputs[0].as_u64("dividend")?;
                let divisor = inputs[1].as_u64("divisor")?;
                let signed = inputs[2].as_bool("signed")?;
                if divisor == 0 {
                    return Err(Error::IssMismatch("division by zero".to_string()));
                }
                if signed {
                    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
                    {
                        (dividend as i64).wrapping_div(divisor as i64) as u64
                    }
                } else {
                    dividend.wrapping_div(divisor)
                }
            }
        };
        outputs[0] = UopValue::UInt64(result);
        Ok(())
    }
}
