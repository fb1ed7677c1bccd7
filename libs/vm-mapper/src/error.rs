// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no virtual address space matches the current paging context")]
    NoMatchingContext,
    #[error("mapper is in direct mode, paged-mapper operation {0} is unavailable")]
    NotPaged(&'static str),
    #[error("mapper is in paged mode, direct-mapper operation {0} is unavailable")]
    NotDirect(&'static str),
    #[error("no free virtual range satisfies the request ({size:#x} bytes, align {align:#x})")]
    NoFreeRange { size: u64, align: u64 },
    #[error(transparent)]
    PageModel(#[from] page_model::Error),
    #[error("vm-mapper invariant violated: {0}")]
    InvariantViolation(String),
}
