// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use tracing::warn;

use crate::bank::PhysicalBank;
use crate::error::Error;
use crate::slice::BitSlice;

/// A named field of a logical [`crate::Register`]: an ordered list of
/// [`BitSlice`]s whose LSB-first concatenation forms the field's own value,
/// regardless of how the underlying bits are scattered across physical
/// registers (spec.md §3). `slices[0]` occupies the field's bits
/// `[0, w0 - 1]`, `slices[1]` the next `w1` bits, and so on.
#[derive(Debug, Clone)]
pub struct RegisterField {
    pub name: String,
    slices: Vec<BitSlice>,
    width_bits: u32,
}

impl RegisterField {
    /// Builds a field from its slices, validating that each slice is
    /// well-formed against `physical_width(physical)` (the declared width of
    /// the physical register it targets).
    pub fn new(
        name: impl Into<String>,
        slices: Vec<BitSlice>,
        physical_width: impl Fn(crate::physical::PhysicalRegisterId) -> Option<u32>,
    ) -> Result<Self, Error> {
        let name = name.into();
        if slices.is_empty() {
            return Err(Error::EmptyField(name));
        }
        let mut width_bits = 0u32;
        for slice in &slices {
            let width = physical_width(slice.physical)
                .ok_or(Error::UnknownPhysicalRegister(slice.physical))?;
            crate::physical::validate_slice(slice.lo, slice.hi, width)?;
            width_bits += slice.width();
        }
        Ok(Self { name, slices, width_bits })
    }

    #[must_use]
    pub fn width_bits(&self) -> u32 {
        self.width_bits
    }

    #[must_use]
    pub fn slices(&self) -> &[BitSlice] {
        &self.slices
    }

    /// Reads the field's value by gathering each slice in order, shifting
    /// each into its place in the LSB-first concatenation. Traps with
    /// [`Error::UninitializedRead`] the moment any underlying slice has a
    /// bit that was never written — per spec.md §3, a field's
    /// initialized-mask is derived from its physical storage, not tracked
    /// independently.
    pub fn read(&self, register_name: &str, bank: &PhysicalBank) -> Result<u64, Error> {
        let mut out = 0u64;
        let mut shift = 0u32;
        for slice in &self.slices {
            let reg = bank
                .get(slice.physical)
                .ok_or(Error::UnknownPhysicalRegister(slice.physical))?;
            let bits = reg.read_bits(slice.lo, slice.hi).map_err(|(lo, hi)| {
                warn!(
                    register = register_name,
                    field = self.name.as_str(),
                    physical = slice.physical.get(),
                    lo,
                    hi,
                    "trapped reading uninitialized register field"
                );
                Error::UninitializedRead {
                    register: register_name.to_string(),
                    field: self.name.clone(),
                    physical: slice.physical,
                    lo,
                    hi,
                }
            })?;
            out |= bits << shift;
            shift += slice.width();
        }
        Ok(out)
    }

    /// Writes `value` by splitting it into each slice's width (LSB-first)
    /// and scattering the pieces back into physical storage.
    pub fn write(&self, value: u64, bank: &mut PhysicalBank) -> Result<(), Error> {
        let max = if self.width_bits >= 64 { u64::MAX } else { (1u64 << self.width_bits) - 1 };
        if value & !max != 0 {
            return Err(Error::ValueTooWide { value, width: self.width_bits });
        }
        let mut shift = 0u32;
        for slice in &self.slices {
            let width = slice.width();
            let piece_mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
            let piece = (value >> shift) & piece_mask;
            let reg = bank
                .get_mut(slice.physical)
                .ok_or(Error::UnknownPhysicalRegister(slice.physical))?;
            reg.write_bits(slice.lo, slice.hi, piece);
            shift += width;
        }
        Ok(())
    }
}
