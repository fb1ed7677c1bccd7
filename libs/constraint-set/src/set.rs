// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::Error;
use crate::interval::Interval;

/// An ordered, disjoint union of integer intervals over `[0, 2^64)`.
///
/// Invariants (checked by [`ConstraintSet::debug_assert_valid`] in debug
/// builds): intervals are strictly ascending by `lo`, pairwise disjoint, and
/// never adjacent (touching intervals are always merged). The total size is
/// cached and kept in sync by every mutating operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    intervals: Vec<Interval>,
    cached_size: u64,
}

impl ConstraintSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_range(lo: u64, hi: u64) -> Self {
        let mut set = Self::new();
        set.add_range(lo, hi).expect("lo <= hi checked by caller");
        set
    }

    #[must_use]
    pub fn from_value(v: u64) -> Self {
        Self::from_range(v, v)
    }

    pub(crate) fn from_intervals(intervals: Vec<Interval>) -> Self {
        let cached_size = intervals.iter().map(Interval::size).sum();
        let set = Self {
            intervals,
            cached_size,
        };
        set.debug_assert_valid();
        set
    }

    pub(crate) fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    // ---- basic predicates -------------------------------------------------

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// O(1): reads the cached total cardinality.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.cached_size
    }

    /// Recomputes the total cardinality from scratch. Only ever used in
    /// debug-mode equality checks (spec.md §8 property 2); production code
    /// should call [`Self::size`].
    #[must_use]
    pub fn calculate_size(&self) -> u64 {
        self.intervals.iter().map(Interval::size).sum()
    }

    #[must_use]
    pub fn contains_value(&self, v: u64) -> bool {
        self.locate(v)
            .map(|iv| iv.contains(v))
            .unwrap_or(false)
    }

    #[must_use]
    pub fn contains_range(&self, lo: u64, hi: u64) -> bool {
        if lo > hi {
            return false;
        }
        self.locate(lo)
            .map(|iv| iv.contains_range(lo, hi))
            .unwrap_or(false)
    }

    #[must_use]
    pub fn contains_set(&self, other: &Self) -> bool {
        other
            .intervals
            .iter()
            .all(|iv| self.contains_range(iv.lo, iv.hi))
    }

    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !Self::intersect_raw(&self.intervals, &other.intervals).is_empty()
    }

    fn locate(&self, v: u64) -> Option<&Interval> {
        let idx = self.intervals.partition_point(|iv| iv.hi < v);
        self.intervals.get(idx).filter(|iv| iv.lo <= v)
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.intervals.iter().map(|iv| (iv.lo, iv.hi))
    }

    #[must_use]
    pub fn lower_bound(&self) -> Result<u64, Error> {
        self.intervals.first().map(|iv| iv.lo).ok_or(Error::EmptySet)
    }

    #[must_use]
    pub fn upper_bound(&self) -> Result<u64, Error> {
        self.intervals.last().map(|iv| iv.hi).ok_or(Error::EmptySet)
    }

    /// The single value held by this set, if it contains exactly one.
    pub fn only_value(&self) -> Result<u64, Error> {
        if self.cached_size == 1 {
            Ok(self.intervals[0].lo)
        } else {
            Err(Error::EmptySet)
        }
    }

    // ---- single-element mutation ------------------------------------------

    pub fn add_value(&mut self, v: u64) {
        self.add_range(v, v).expect("point range is always valid");
    }

    /// Unions `[lo, hi]` into the set. O(log N) locate, amortised O(1) merge;
    /// adjacent intervals are coalesced into one.
    pub fn add_range(&mut self, lo: u64, hi: u64) -> Result<(), Error> {
        if lo > hi {
            return Err(Error::InvalidRange { lo, hi });
        }
        let mut merged = Interval { lo, hi };
        let start = self
            .intervals
            .partition_point(|iv| iv.hi.saturating_add(1) < merged.lo);
        let end = start
            + self.intervals[start..]
                .partition_point(|iv| iv.lo <= merged.hi.saturating_add(1));

        let mut removed_size = 0u64;
        for iv in &self.intervals[start..end] {
            removed_size += iv.size();
            merged = merged.union(iv);
        }
        self.cached_size = self.cached_size - removed_size + merged.size();
        self.intervals.splice(start..end, std::iter::once(merged));
        self.debug_assert_valid();
        Ok(())
    }

    pub fn sub_value(&mut self, v: u64) {
        self.sub_range(v, v).expect("point range is always valid");
    }

    /// Subtracts `[lo, hi]`, possibly splitting one stored interval into two.
    pub fn sub_range(&mut self, lo: u64, hi: u64) -> Result<(), Error> {
        if lo > hi {
            return Err(Error::InvalidRange { lo, hi });
        }
        let start = self.intervals.partition_point(|iv| iv.hi < lo);
        let end = start + self.intervals[start..].partition_point(|iv| iv.lo <= hi);

        let mut replacement = Vec::with_capacity(2);
        let mut removed_size = 0u64;
        for iv in &self.intervals[start..end] {
            removed_size += iv.size();
            if iv.lo < lo {
                replacement.push(Interval {
                    lo: iv.lo,
                    hi: lo - 1,
                });
            }
            if iv.hi > hi {
                replacement.push(Interval {
                    lo: hi + 1,
                    hi: iv.hi,
                });
            }
        }
        let added_size: u64 = replacement.iter().map(Interval::size).sum();
        self.cached_size = self.cached_size - removed_size + added_size;
        self.intervals.splice(start..end, replacement);
        self.debug_assert_valid();
        Ok(())
    }

    // ---- whole-set algebra, O(N+M) -----------------------------------------

    /// In-place union with `other`.
    pub fn merge(&mut self, other: &Self) {
        self.intervals = Self::union_raw(&self.intervals, &other.intervals);
        self.cached_size = self.intervals.iter().map(Interval::size).sum();
        self.debug_assert_valid();
    }

    /// In-place intersection with `other` (the spec's `apply`).
    pub fn apply(&mut self, other: &Self) {
        self.intervals = Self::intersect_raw(&self.intervals, &other.intervals);
        self.cached_size = self.intervals.iter().map(Interval::size).sum();
        self.debug_assert_valid();
    }

    /// In-place set subtraction: `self = self \ other`.
    pub fn subtract(&mut self, other: &Self) {
        self.intervals = Self::subtract_raw(&self.intervals, &other.intervals);
        self.cached_size = self.intervals.iter().map(Interval::size).sum();
        self.debug_assert_valid();
    }

    /// `sub_range(lo, hi); merge(other)`, offered as one atomic call so
    /// implementers (here: the page manager re-publishing an attribute range)
    /// can batch the two splices.
    pub fn replace_in_range(&mut self, lo: u64, hi: u64, other: &Self) -> Result<(), Error> {
        self.sub_range(lo, hi)?;
        self.merge(other);
        Ok(())
    }

    /// Extracts the intersection with `[lo, hi]` into `out` (which is
    /// overwritten).
    pub fn copy_in_range(&self, lo: u64, hi: u64, out: &mut Self) -> Result<(), Error> {
        if lo > hi {
            return Err(Error::InvalidRange { lo, hi });
        }
        let window = [Interval { lo, hi }];
        out.intervals = Self::intersect_raw(&self.intervals, &window);
        out.cached_size = out.intervals.iter().map(Interval::size).sum();
        Ok(())
    }

    pub(crate) fn union_raw(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut ai, mut bi) = (0, 0);
        while ai < a.len() && bi < b.len() {
            if a[ai].lo <= b[bi].lo {
                merged.push(a[ai]);
                ai += 1;
            } else {
                merged.push(b[bi]);
                bi += 1;
            }
        }
        merged.extend_from_slice(&a[ai..]);
        merged.extend_from_slice(&b[bi..]);
        Self::coalesce(merged)
    }

    fn coalesce(sorted: Vec<Interval>) -> Vec<Interval> {
        let mut out: Vec<Interval> = Vec::with_capacity(sorted.len());
        for iv in sorted {
            match out.last_mut() {
                Some(last) if last.adjacent_or_overlapping(&iv) => *last = last.union(&iv),
                _ => out.push(iv),
            }
        }
        out
    }

    pub(crate) fn intersect_raw(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
        let mut out = Vec::new();
        let (mut ai, mut bi) = (0, 0);
        while ai < a.len() && bi < b.len() {
            if let Some(iv) = a[ai].intersect(&b[bi]) {
                out.push(iv);
            }
            if a[ai].hi < b[bi].hi {
                ai += 1;
            } else {
                bi += 1;
            }
        }
        out
    }

    pub(crate) fn subtract_raw(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
        let mut out = Vec::new();
        let mut bi = 0usize;
        for &iv in a {
            while bi < b.len() && b[bi].hi < iv.lo {
                bi += 1;
            }
            let mut cur_lo = iv.lo;
            let mut j = bi;
            while j < b.len() && b[j].lo <= iv.hi && cur_lo <= iv.hi {
                let sub = b[j];
                if sub.lo > cur_lo {
                    out.push(Interval {
                        lo: cur_lo,
                        hi: sub.lo - 1,
                    });
                }
                if sub.hi >= iv.hi {
                    cur_lo = iv.hi.saturating_add(1);
                    break;
                }
                cur_lo = sub.hi + 1;
                j += 1;
            }
            if cur_lo <= iv.hi {
                out.push(Interval { lo: cur_lo, hi: iv.hi });
            }
        }
        out
    }

    #[cfg(debug_assertions)]
    pub(crate) fn debug_assert_valid(&self) {
        for w in self.intervals.windows(2) {
            debug_assert!(w[0].hi < w[1].lo, "intervals must be strictly ordered");
            debug_assert!(
                w[1].lo - w[0].hi > 1,
                "adjacent intervals {:?}/{:?} must have been merged",
                w[0],
                w[1]
            );
        }
        debug_assert_eq!(
            self.cached_size,
            self.calculate_size(),
            "size cache drifted from recomputed size"
        );
    }

    #[cfg(not(debug_assertions))]
    pub(crate) fn debug_assert_valid(&self) {}
}
