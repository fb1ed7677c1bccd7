// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A lightweight in-memory [`crate::IssBridge`] implementation, so the rest
//! of the workspace (chiefly `address-solver`'s forward-µop validation)
//! doesn't need a real simulator shared object to run against (SPEC_FULL.md
//! ambient test-tooling section).

mod fake_iss;

pub use fake_iss::FakeIss;
