// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The wire contract between the solver core and the functional simulator
//! (spec.md §6): a callback-driven bridge trait plus a test double.

mod bridge;
mod callbacks;
mod error;
mod step;
mod uop;
mod value;
mod vector;

pub mod test_support;

pub use bridge::{IssBridge, IssOptions};
pub use callbacks::IssCallbacks;
pub use error::Error;
pub use step::{ExceptionEvent, MemoryUpdate, MmuEvent, MmuEventKind, StepResult};
pub use uop::{UopCode, UopValue};
pub use value::RegisterValue;
pub use vector::{VectorElementAggregator, VectorElementUpdate};

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::FakeIss;

    #[test]
    fn register_round_trips_through_fake_iss() {
        let mut iss = FakeIss::new();
        iss.initialise(&IssOptions::new("rv64gc", 1)).unwrap();
        iss.write_register(0, "x1", RegisterValue::new(42, u64::MAX)).unwrap();
        assert_eq!(iss.read_register(0, "x1").unwrap(), RegisterValue::new(42, u64::MAX));
    }

    #[test]
    fn uninitialised_bridge_refuses_calls() {
        let mut iss = FakeIss::new();
        assert_eq!(iss.read_register(0, "x1").unwrap_err(), Error::NotInitialised);
    }

    #[test]
    fn mul_add_forward_executes_exactly() {
        let mut iss = FakeIss::new();
        iss.initialise(&IssOptions::new("rv64gc", 1)).unwrap();
        let mut out = [UopValue::UInt64(0)];
        iss.execute_uop(
            0,
            UopCode::MulAdd,
            &[UopValue::UInt64(6), UopValue::UInt64(7), UopValue::UInt64(1)],
            &mut out,
        )
        .unwrap();
        assert_eq!(out[0], UopValue::UInt64(43));
    }

    #[test]
    fn signed_div_by_zero_is_reported_as_mismatch() {
        let mut iss = FakeIss::new();
        iss.initialise(&IssOptions::new("rv64gc", 1)).unwrap();
        let mut out = [UopValue::UInt64(0)];
        let err = iss
            .execute_uop(
                0,
                UopCode::Div,
                &[UopValue::UInt64(10), UopValue::UInt64(0), UopValue::Bool(true)],
                &mut out,
            )
            .unwrap_err();
        assert!(matches!(err, Error::IssMismatch(_)));
    }

    #[test]
    fn add_with_carry_propagates_carry_in() {
        let mut iss = FakeIss::new();
        iss.initialise(&IssOptions::new("rv64gc", 1)).unwrap();
        let mut out = [UopValue::UInt64(0)];
        iss.execute_uop(
            0,
            UopCode::AddWithCarry,
            &[UopValue::UInt64(u64::MAX), UopValue::UInt64(0), UopValue::Bool(true)],
            &mut out,
        )
        .unwrap();
        assert_eq!(out[0], UopValue::UInt64(0));
    }

    #[test]
    fn execute_uop_rejects_wrong_arity() {
        let mut iss = FakeIss::new();
        iss.initialise(&IssOptions::new("rv64gc", 1)).unwrap();
        let mut out = [UopValue::UInt64(0)];
        let err = iss.execute_uop(0, UopCode::Mul, &[UopValue::UInt64(1)], &mut out).unwrap_err();
        assert!(matches!(err, Error::WrongInputCount { .. }));
    }

    #[test]
    fn vector_element_updates_aggregate_into_one_register() {
        let mut agg = VectorElementAggregator::new();
        agg.record(
            0,
            "v1",
            VectorElementUpdate { vreg_index: 0, elt_index: 0, elt_byte_width: 4, value: 0xaaaa, byte_len: 4 },
        );
        agg.record(
            0,
            "v1",
            VectorElementUpdate { vreg_index: 0, elt_index: 1, elt_byte_width: 4, value: 0xbbbb, byte_len: 4 },
        );
        let drained = agg.drain();
        assert_eq!(drained.len(), 1);
        let (cpu, name, value) = &drained[0];
        assert_eq!(*cpu, 0);
        assert_eq!(name, "v1");
        assert_eq!(value.value, 0x0000_bbbb_0000_aaaa);
        assert_eq!(value.mask, 0xffff_ffff_ffff_ffff);
    }

    #[test]
    fn partial_large_register_write_patches_one_byte() {
        let mut iss = FakeIss::new();
        iss.initialise(&IssOptions::new("rv64gc", 1)).unwrap();
        iss.write_register(0, "v0", RegisterValue::fully_known(0x1122_3344_5566_7788)).unwrap();
        iss.partial_write_large_register(0, "v0", &[0xff], 0).unwrap();
        let patched = iss.read_register(0, "v0").unwrap();
        assert_eq!(patched.value & 0xff, 0xff);
        assert_eq!(patched.value & !0xffu64, 0x1122_3344_5566_7700);
    }
}
