// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Logical registers composed of bit-slices over physical storage, with
//! per-bit initialized tracking (spec.md §3).

mod bank;
mod error;
mod field;
mod file;
mod physical;
mod register;
mod slice;

pub use bank::PhysicalBank;
pub use error::Error;
pub use field::RegisterField;
pub use file::RegisterFile;
pub use physical::{PhysicalRegister, PhysicalRegisterId};
pub use register::Register;
pub use slice::BitSlice;

#[cfg(test)]
mod tests {
    use super::*;

    fn gpr_register(file: &mut RegisterFile, name: &str, width: u32) -> PhysicalRegisterId {
        let phys = file.allocate_physical(width);
        let mut reg = Register::new(name);
        let field = RegisterField::new(
            "value",
            vec![BitSlice::new(phys, 0, width - 1)],
            |id| file.physical_width(id),
        )
        .unwrap();
        reg.add_field(field);
        file.define_register(reg);
        phys
    }

    #[test]
    fn unwritten_field_traps_on_read() {
        let mut file = RegisterFile::new();
        gpr_register(&mut file, "x1", 64);
        let err = file.read_field("x1", "value").unwrap_err();
        assert!(matches!(err, Error::UninitializedRead { .. }));
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut file = RegisterFile::new();
        gpr_register(&mut file, "x1", 64);
        file.write_field("x1", "value", 0xdead_beef).unwrap();
        assert_eq!(file.read_field("x1", "value").unwrap(), 0xdead_beef);
    }

    #[test]
    fn partial_write_leaves_rest_uninitialized() {
        let mut file = RegisterFile::new();
        let phys = file.allocate_physical(32);
        let mut reg = Register::new("csr");
        let lo_field = RegisterField::new("lo", vec![BitSlice::new(phys, 0, 15)], |id| {
            file.physical_width(id)
        })
        .unwrap();
        let hi_field = RegisterField::new("hi", vec![BitSlice::new(phys, 16, 31)], |id| {
            file.physical_width(id)
        })
        .unwrap();
        reg.add_field(lo_field);
        reg.add_field(hi_field);
        file.define_register(reg);

        file.write_field("csr", "lo", 0x1234).unwrap();
        assert_eq!(file.read_field("csr", "lo").unwrap(), 0x1234);
        assert!(matches!(
            file.read_field("csr", "hi").unwrap_err(),
            Error::UninitializedRead { .. }
        ));
    }

    #[test]
    fn field_scattered_across_two_physical_registers_concatenates_lsb_first() {
        let mut file = RegisterFile::new();
        let lo_phys = file.allocate_physical(16);
        let hi_phys = file.allocate_physical(16);
        let mut reg = Register::new("vtype");
        let field = RegisterField::new(
            "packed",
            vec![
                BitSlice::new(lo_phys, 0, 15),
                BitSlice::new(hi_phys, 0, 15),
            ],
            |id| file.physical_width(id),
        )
        .unwrap();
        reg.add_field(field);
        file.define_register(reg);

        file.write_field("vtype", "packed", 0x0000_beef_dead).unwrap();
        assert_eq!(file.read_physical_raw(lo_phys).unwrap(), 0xdead);
        assert_eq!(file.read_physical_raw(hi_phys).unwrap(), 0xbeef);
        assert_eq!(file.read_field("vtype", "packed").unwrap(), 0xbeef_dead);
    }

    #[test]
    fn value_wider_than_field_is_rejected() {
        let mut file = RegisterFile::new();
        gpr_register(&mut file, "x2", 8);
        let err = file.write_field("x2", "value", 0x1ff).unwrap_err();
        assert!(matches!(err, Error::ValueTooWide { .. }));
    }

    #[test]
    fn unknown_register_and_field_are_reported() {
        let file = RegisterFile::new();
        assert!(matches!(
            file.read_field("nope", "value").unwrap_err(),
            Error::UnknownRegister(_)
        ));
    }

    #[test]
    fn unknown_field_on_known_register_is_reported() {
        let mut file = RegisterFile::new();
        gpr_register(&mut file, "x3", 64);
        assert!(matches!(
            file.read_field("x3", "missing").unwrap_err(),
            Error::UnknownField { .. }
        ));
    }

    #[test]
    fn whole_register_raw_read_traps_until_fully_written() {
        let mut file = RegisterFile::new();
        let phys = file.allocate_physical(32);
        assert!(file.read_physical_raw(phys).is_none());
        file.write_physical_raw(phys, 0x1234).unwrap();
        assert_eq!(file.read_physical_raw(phys).unwrap(), 0x1234);
    }

    #[test]
    fn field_construction_rejects_out_of_range_slice() {
        let mut file = RegisterFile::new();
        let phys = file.allocate_physical(8);
        let err = RegisterField::new("overflow", vec![BitSlice::new(phys, 4, 9)], |id| {
            file.physical_width(id)
        })
        .unwrap_err();
        assert!(matches!(err, Error::SliceOutOfRange { .. }));
    }
}
