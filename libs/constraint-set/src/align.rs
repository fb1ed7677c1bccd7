// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use rand::Rng;

use crate::error::Error;
use crate::interval::Interval;
use crate::set::ConstraintSet;

impl ConstraintSet {
    /// Projects every interval onto the indices of the pages it touches:
    /// `[lo, hi]` becomes `[lo >> shift, hi >> shift]` where `shift` is the
    /// page size's bit width (`page_mask` is the contiguous in-page offset
    /// mask, so `shift == page_mask.count_ones()`). Applying this twice is a
    /// no-op (spec.md §8 property 5): a set that already holds page indices
    /// is unaffected by masking with the same `page_mask` again as long as
    /// every index is itself `<= page_mask` in magnitude, which holds for
    /// any address space whose page count does not exceed its page size.
    #[must_use]
    pub fn align_with_page(&self, page_mask: u64) -> Self {
        let shift = page_mask.count_ones();
        let mut out = Vec::with_capacity(self.intervals().len());
        for iv in self.intervals() {
            out.push(Interval {
                lo: iv.lo >> shift,
                hi: iv.hi >> shift,
            });
        }
        Self::from_intervals(Self::coalesce_sorted(out))
    }

    /// Shrinks every interval to its alignment-respecting bounds — `lo`
    /// rounded up and `hi` rounded down to a multiple of `align_mask + 1` —
    /// and drops any interval too short to hold a `size`-byte, aligned
    /// placement at all. The result is the set of aligned candidate
    /// addresses an access of `size` bytes could start at; callers that need
    /// the exact trailing bound (placements may not start in the last
    /// `size - 1` bytes) additionally check `x + size - 1 <= hi` when
    /// consuming a chosen value, the same two-step shape
    /// `kmem-aslr::find_spot_for` uses (align the gap, then separately count
    /// valid spots) rather than baking the size fit into the interval
    /// itself. Applying this twice is a no-op (spec.md §8 property 5): both
    /// rounding and the length gate are stable once bounds are aligned.
    #[must_use]
    pub fn align_with_size(&self, align_mask: u64, size: u64) -> Self {
        let mut out = Vec::with_capacity(self.intervals().len());
        for iv in self.intervals() {
            let lo = iv.lo.wrapping_add(align_mask) & !align_mask;
            let hi = iv.hi & !align_mask;
            if lo > hi {
                continue;
            }
            if size > 0 && hi - lo + 1 < size {
                continue;
            }
            out.push(Interval { lo, hi });
        }
        Self::from_intervals(Self::coalesce_sorted(out))
    }

    /// Like [`Self::align_with_size`]'s per-element trailing check: is there
    /// room for a `size`-byte access starting at `x` within `[lo, hi]`?
    #[must_use]
    pub fn fits_size_at(lo: u64, hi: u64, x: u64, size: u64) -> bool {
        size == 0 || x.checked_add(size - 1).is_some_and(|end| end <= hi && x >= lo)
    }

    /// Keeps only points `x` such that `x % mul == data % mul` and
    /// `[x, x + size - 1]` fits inside the original interval.
    #[must_use]
    pub fn align_mul_data_with_size(&self, mul: u64, data: u64, size: u64) -> Self {
        if mul == 0 || size == 0 {
            return Self::new();
        }
        let target = data % mul;
        let mut out = Vec::new();
        for iv in self.intervals() {
            let Some(usable_hi) = iv.hi.checked_sub(size - 1) else {
                continue;
            };
            if iv.lo > usable_hi {
                continue;
            }
            let rem = iv.lo % mul;
            let first = if rem <= target {
                iv.lo + (target - rem)
            } else {
                iv.lo + (mul - rem) + target
            };
            let mut x = first;
            while x <= usable_hi {
                out.push(Interval { lo: x, hi: x });
                // This walks every aligned point individually; callers
                // operating on large ranges should prefer
                // `align_with_size` when `mul == 1 << k` covers the whole
                // alignment requirement.
                let Some(next) = x.checked_add(mul) else {
                    break;
                };
                x = next;
            }
        }
        Self::from_intervals(Self::coalesce_sorted(out))
    }

    /// Maps each element `x` to `(x & page_mask) | (page_frame & !page_mask)`:
    /// the in-page offset bits of `x` pass through unchanged, the frame bits
    /// come from `page_frame`. Preserves interval structure because
    /// translation only ever rewrites the high bits outside `page_mask`,
    /// leaving relative ordering within a page-aligned interval unchanged.
    /// Callers must only pass intervals that lie within a single page (the
    /// usual case: a free-offset constraint local to one mapping); an
    /// interval spanning a page boundary would wrap when masked.
    #[must_use]
    pub fn translate(&self, page_mask: u64, page_frame: u64) -> Self {
        let frame = page_frame & !page_mask;
        let mut out = Vec::with_capacity(self.intervals().len());
        for iv in self.intervals() {
            out.push(Interval {
                lo: (iv.lo & page_mask) | frame,
                hi: (iv.hi & page_mask) | frame,
            });
        }
        Self::from_intervals(Self::coalesce_sorted(out))
    }

    /// Pointwise `c - x` for every element `x` (elements that would
    /// underflow are dropped).
    #[must_use]
    pub fn subtract_from_elements(&self, c: u64) -> Self {
        let mut out = Vec::with_capacity(self.intervals().len());
        for iv in self.intervals() {
            let Some(new_hi) = c.checked_sub(iv.lo) else {
                continue;
            };
            let new_lo = c.checked_sub(iv.hi).unwrap_or(0);
            out.push(Interval {
                lo: new_lo,
                hi: new_hi,
            });
        }
        Self::from_intervals(Self::coalesce_sorted(out))
    }

    /// Pointwise `x >> s`.
    #[must_use]
    pub fn shift_right(&self, s: u32) -> Self {
        let mut out = Vec::with_capacity(self.intervals().len());
        for iv in self.intervals() {
            out.push(Interval {
                lo: iv.lo >> s,
                hi: iv.hi >> s,
            });
        }
        Self::from_intervals(Self::coalesce_sorted(out))
    }

    /// Pointwise bitwise NOT (`!x`) of every element.
    #[must_use]
    pub fn not_elements(&self) -> Self {
        let mut out = Vec::with_capacity(self.intervals().len());
        for iv in self.intervals() {
            // NOT reverses ordering, so hi maps to the new lo.
            out.push(Interval {
                lo: !iv.hi,
                hi: !iv.lo,
            });
        }
        Self::from_intervals(Self::coalesce_sorted(out))
    }

    /// Keeps points of the form `x / d` for `x` in the set whose quotient
    /// falls in `[lo, hi]`, unioned with `{0}` (division truncates towards
    /// zero, so every interval containing values `< d` contributes a zero).
    #[must_use]
    pub fn divide_elements_with_factor_range_unioned_with_zero(
        &self,
        d: u64,
        lo: u64,
        hi: u64,
    ) -> Self {
        if d == 0 {
            return Self::new();
        }
        let mut out = Vec::new();
        for iv in self.intervals() {
            let q_lo = iv.lo / d;
            let q_hi = iv.hi / d;
            if let Some(clamped) = Interval::new(q_lo.max(lo), q_hi.min(hi)) {
                out.push(clamped);
            }
        }
        let mut set = Self::from_intervals(Self::coalesce_sorted(out));
        if lo == 0 {
            set.add_value(0);
        }
        set
    }

    /// Picks a uniformly random aligned address `x` such that `x & align_mask
    /// == 0` and `[x, x + size - 1]` fits inside this set, weighted by how
    /// many such starting points each interval offers (the same weighting
    /// discipline as [`Self::choose_value`], just over a strided subset
    /// instead of every element). This is the primitive both
    /// `page-model`'s physical allocator and `vm-mapper`'s free-VA search
    /// build on, avoiding the need to materialise every individual valid
    /// start as its own interval the way [`Self::align_with_size`] would if
    /// it baked the size fit into its output.
    pub fn choose_aligned_start(
        &self,
        align_mask: u64,
        size: u64,
        rng: &mut impl Rng,
    ) -> Result<u64, Error> {
        let size = size.max(1);
        let step = align_mask + 1;
        let mut spots: Vec<(u64, u64)> = Vec::new();
        let mut total: u64 = 0;
        for iv in self.intervals() {
            let lo = iv.lo.wrapping_add(align_mask) & !align_mask;
            let hi = iv.hi & !align_mask;
            if lo > hi {
                continue;
            }
            let Some(usable_hi) = hi.checked_sub(size - 1) else {
                continue;
            };
            if usable_hi < lo {
                continue;
            }
            let count = (usable_hi - lo) / step + 1;
            spots.push((lo, count));
            total += count;
        }
        if total == 0 {
            return Err(Error::EmptySet);
        }
        let mut target = rng.gen_range(0..total);
        for (lo, count) in spots {
            if target < count {
                return Ok(lo + target * step);
            }
            target -= count;
        }
        unreachable!("target index must fall inside one of the counted intervals")
    }

    pub(crate) fn coalesce_sorted(mut intervals: Vec<Interval>) -> Vec<Interval> {
        intervals.sort_unstable_by_key(|iv| iv.lo);
        let mut out: Vec<Interval> = Vec::with_capacity(intervals.len());
        for iv in intervals {
            match out.last_mut() {
                Some(last) if last.adjacent_or_overlapping(&iv) => *last = last.union(&iv),
                _ => out.push(iv),
            }
        }
        out
    }
}
