// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use rand::Rng;

use crate::error::Error;
use crate::set::ConstraintSet;

impl ConstraintSet {
    /// Returns the `k`-th element counting from the front (`k == 0` is the
    /// lower bound). This anchor is stable: it does not depend on the RNG.
    pub fn choose_value_from_front(&self, mut k: u64) -> Result<u64, Error> {
        if k >= self.size() {
            return Err(Error::EmptySet);
        }
        for (lo, hi) in self.iter() {
            let width = hi - lo + 1;
            if k < width {
                return Ok(lo + k);
            }
            k -= width;
        }
        Err(Error::EmptySet)
    }

    /// Returns the `k`-th element counting from the back (`k == 0` is the
    /// upper bound). `size` must equal `self.size()`; it is taken as a
    /// parameter to mirror the source contract, which reuses an
    /// already-known cardinality instead of re-reading the cache.
    pub fn choose_value_from_back(&self, k: u64, size: u64) -> Result<u64, Error> {
        if k >= size {
            return Err(Error::EmptySet);
        }
        self.choose_value_from_front(size - 1 - k)
    }

    /// Samples one element uniformly at random, weighted by cardinality: an
    /// interval contributes elements in proportion to its size, so a size-1
    /// interval is exactly as likely to be picked as any single element of a
    /// size-1000 interval, never more and never less.
    pub fn choose_value(&self, rng: &mut impl Rng) -> Result<u64, Error> {
        let size = self.size();
        if size == 0 {
            return Err(Error::EmptySet);
        }
        let k = rng.gen_range(0..size);
        self.choose_value_from_front(k)
    }
}
