// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The physical memory model: pages, their memory-type attributes, and the
//! manager that allocates and aliases them out of a bank's usable
//! [`constraint_set::ConstraintSet`].

mod attributes;
mod error;
mod manager;
mod page;
mod request;

pub use attributes::MemoryAttrs;
pub use error::Error;
pub use manager::PhysicalPageManager;
pub use page::{PageId, PhysicalPage, VirtualAliasRef};
pub use request::{BankType, GenPageRequest, MemAccessType, PrivilegeLevel, SizeInfo};
