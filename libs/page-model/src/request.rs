// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::attributes::MemoryAttrs;
use crate::page::PageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivilegeLevel {
    User,
    Supervisor,
    Machine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemAccessType {
    Read,
    Write,
    ReadWrite,
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankType {
    Normal,
    Io,
    Shared,
}

/// The size and natural alignment of the access being mapped, e.g. 8 bytes
/// for a double-word load or 0x1000 for a whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeInfo {
    pub size: u64,
    pub align_mask: u64,
}

impl SizeInfo {
    #[must_use]
    pub const fn new(size: u64, align_mask: u64) -> Self {
        Self { size, align_mask }
    }
}

/// Configuration-as-data for one requested mapping (spec.md §3). One
/// instance is built per generation act and consumed by the solver and the
/// page manager; it carries no behavior of its own.
#[derive(Debug, Clone, Default)]
pub struct GenPageRequest {
    pub instr_addr: bool,
    pub flat_map: bool,
    pub force_alias: bool,
    pub force_mem_attrs: bool,
    pub can_alias: bool,
    pub force_new_addr: bool,
    pub no_instr_page_fault: bool,
    pub no_data_page_fault: bool,
    pub no_data_abort: bool,
    pub shared_memory: bool,

    pub privilege_level: Option<PrivilegeLevel>,
    pub mem_access_type: Option<MemAccessType>,
    pub bank_type: Option<BankType>,

    pub pa: Option<u64>,
    pub alias_page_id: Option<PageId>,
    pub mem_attr_impl_constraint: Option<MemoryAttrs>,
    pub mem_attr_arch_constraint: Option<MemoryAttrs>,
    pub target_alias_attrs_constraint: Option<MemoryAttrs>,
}

impl GenPageRequest {
    /// `can_alias` defaults to `true` — a page is aliasable unless a caller
    /// opts out, not the other way around.
    #[must_use]
    pub fn new() -> Self {
        Self {
            can_alias: true,
            ..Self::default()
        }
    }
}
