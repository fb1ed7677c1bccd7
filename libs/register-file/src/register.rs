// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::collections::HashMap;

use crate::error::Error;
use crate::field::RegisterField;

/// A logical register: a named composition of [`RegisterField`]s (spec.md
/// §3). Built once per register catalog entry (typically while parsing the
/// register XML catalog, see SPEC_FULL.md) and then shared read-only across
/// every generated instruction that references it.
#[derive(Debug, Clone)]
pub struct Register {
    pub name: String,
    fields: HashMap<String, RegisterField>,
    field_order: Vec<String>,
}

impl Register {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: HashMap::new(), field_order: Vec::new() }
    }

    pub fn add_field(&mut self, field: RegisterField) {
        if !self.fields.contains_key(&field.name) {
            self.field_order.push(field.name.clone());
        }
        self.fields.insert(field.name.clone(), field);
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&RegisterField> {
        self.fields.get(name)
    }

    pub fn try_field(&self, name: &str) -> Result<&RegisterField, Error> {
        self.field(name).ok_or_else(|| Error::UnknownField {
            register: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Fields in catalog-declaration order, not hash order.
    pub fn fields(&self) -> impl Iterator<Item = &RegisterField> {
        self.field_order.iter().map(move |name| &self.fields[name])
    }
}
