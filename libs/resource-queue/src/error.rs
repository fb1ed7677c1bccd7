// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("resource access queue is empty")]
    EmptyQueue,
    #[error("invalid lookup window [{lo}, {hi}]")]
    InvalidWindow { lo: usize, hi: usize },
}
