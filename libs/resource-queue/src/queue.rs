// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::collections::{HashMap, VecDeque};

use constraint_set::ConstraintSet;
use tracing::trace;

use crate::access_age::AccessAge;
use crate::error::Error;
use crate::stage::{AccessKind, ResourceAccessStage, ResourceType, RESOURCE_TYPES};

/// Default entropy thresholds; callers with domain-specific tuning build
/// their own via [`ResourceAccessQueue::with_thresholds`].
const DEFAULT_ON_THRESHOLD: u32 = 4;
const DEFAULT_OFF_THRESHOLD: u32 = 1;

/// A fixed-capacity ring of [`ResourceAccessStage`]s (spec.md §4.4): slot `0`
/// is the oldest retained stage, slot `len - 1` the most recently committed.
pub struct ResourceAccessQueue {
    capacity: usize,
    ring: VecDeque<ResourceAccessStage>,
    ages: HashMap<ResourceType, HashMap<u32, AccessAge>>,
    entropy: HashMap<(ResourceType, AccessKind), crate::entropy::EntropyCounter>,
}

impl ResourceAccessQueue {
    #[must_use]
    pub fn new(history_limit: usize) -> Self {
        Self::with_thresholds(history_limit, DEFAULT_ON_THRESHOLD, DEFAULT_OFF_THRESHOLD)
    }

    #[must_use]
    pub fn with_thresholds(history_limit: usize, on_threshold: u32, off_threshold: u32) -> Self {
        let mut entropy = HashMap::new();
        for &rt in &RESOURCE_TYPES {
            for kind in [AccessKind::Read, AccessKind::Write] {
                entropy.insert(
                    (rt, kind),
                    crate::entropy::EntropyCounter::new(on_threshold, off_threshold),
                );
            }
        }
        Self {
            capacity: history_limit.max(1),
            ring: VecDeque::with_capacity(history_limit.max(1)),
            ages: HashMap::new(),
            entropy,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retires the oldest stage if the ring is at capacity (entropies bumped
    /// down), then appends `stage` (entropies bumped up), and rebuilds the
    /// per-index access-age table. Returns the retired stage, if any.
    pub fn commit(&mut self, stage: ResourceAccessStage) -> Option<ResourceAccessStage> {
        let retired = if self.ring.len() >= self.capacity {
            self.ring.pop_front()
        } else {
            None
        };

        if let Some(old) = &retired {
            for &rt in &RESOURCE_TYPES {
                for kind in [AccessKind::Read, AccessKind::Write] {
                    if let Some(set) = old.set_for(rt, kind) {
                        self.entropy
                            .get_mut(&(rt, kind))
                            .expect("every (rt, kind) pair is pre-populated")
                            .bump_down(u32::try_from(set.size()).unwrap_or(u32::MAX));
                    }
                }
            }
        }

        for &rt in &RESOURCE_TYPES {
            for kind in [AccessKind::Read, AccessKind::Write] {
                if let Some(set) = stage.set_for(rt, kind) {
                    self.entropy
                        .get_mut(&(rt, kind))
                        .expect("every (rt, kind) pair is pre-populated")
                        .bump_up(u32::try_from(set.size()).unwrap_or(u32::MAX));
                }
            }
        }

        self.ring.push_back(stage);
        self.rebuild_ages();
        trace!(len = self.ring.len(), "committed resource access stage");
        retired
    }

    /// Newest-to-oldest scan: the first (i.e. most recent) stage touching an
    /// index sets that index's [`AccessAge`]; older touches of the same
    /// index are shadowed, exactly mirroring "a later stage overwrites an
    /// index, the old record is erased".
    fn rebuild_ages(&mut self) {
        self.ages.clear();
        for &rt in &RESOURCE_TYPES {
            let mut table: HashMap<u32, AccessAge> = HashMap::new();
            for (age, stage) in self.ring.iter().rev().enumerate() {
                let age = u32::try_from(age).unwrap_or(u32::MAX);
                // Sources are folded in before destinations so that a stage
                // touching the same index both ways resolves to "last
                // touched by a write" for that one stage; the outer
                // `or_insert` below then guarantees a newer stage (lower
                // `age`, visited earlier in this reverse scan) is never
                // overwritten by an older one.
                let mut this_stage: HashMap<u32, AccessKind> = HashMap::new();
                if let Some(sources) = stage.set_for(rt, AccessKind::Read) {
                    for (lo, hi) in sources.iter() {
                        for idx in lo..=hi {
                            this_stage.insert(u32::try_from(idx).unwrap_or(u32::MAX), AccessKind::Read);
                        }
                    }
                }
                if let Some(destinations) = stage.set_for(rt, AccessKind::Write) {
                    for (lo, hi) in destinations.iter() {
                        for idx in lo..=hi {
                            this_stage.insert(u32::try_from(idx).unwrap_or(u32::MAX), AccessKind::Write);
                        }
                    }
                }
                for (idx, kind) in this_stage {
                    table.entry(idx).or_insert(AccessAge { age, kind });
                }
            }
            self.ages.insert(rt, table);
        }
    }

    #[must_use]
    pub fn access_age(&self, rt: ResourceType, index: u32) -> Option<AccessAge> {
        self.ages.get(&rt).and_then(|t| t.get(&index)).copied()
    }

    #[must_use]
    pub fn entropy_band(&self, rt: ResourceType, kind: AccessKind) -> crate::entropy::EntropyBand {
        self.entropy[&(rt, kind)].band()
    }

    #[must_use]
    pub fn entropy_stable(&self, rt: ResourceType, kind: AccessKind) -> bool {
        self.entropy[&(rt, kind)].is_stable()
    }

    fn slot(&self, i: usize) -> Option<&ResourceAccessStage> {
        self.ring.get(i)
    }

    /// Searches `[0, start]` oldest-to-newest, returning the first (i.e.
    /// most distant from `start`) stage whose `(rt, kind)` set is non-empty —
    /// deliberately favoring a far dependency over a near one.
    #[must_use]
    pub fn look_up_far(&self, start: usize, rt: ResourceType, kind: AccessKind) -> Option<&ConstraintSet> {
        let end = start.min(self.ring.len().saturating_sub(1));
        (0..=end).find_map(|i| self.slot(i).and_then(|s| s.set_for(rt, kind)).filter(|s| !s.is_empty()))
    }

    /// Searches `[0, start]` newest-to-oldest (i.e. starting at `start` and
    /// walking backward), returning the first stage whose `(rt, kind)` set is
    /// non-empty — favoring a near dependency over a far one.
    #[must_use]
    pub fn look_up_near(&self, start: usize, rt: ResourceType, kind: AccessKind) -> Option<&ConstraintSet> {
        let end = start.min(self.ring.len().saturating_sub(1));
        (0..=end)
            .rev()
            .find_map(|i| self.slot(i).and_then(|s| s.set_for(rt, kind)).filter(|s| !s.is_empty()))
    }

    /// Unions every matching `(rt, kind)` set across slots `[lo, hi]`.
    pub fn get_random_resource_constraint(
        &self,
        lo: usize,
        hi: usize,
        rt: ResourceType,
        kind: AccessKind,
    ) -> Result<ConstraintSet, Error> {
        if lo > hi || hi >= self.ring.len().max(1) {
            return Err(Error::InvalidWindow { lo, hi });
        }
        let mut out = ConstraintSet::new();
        for i in lo..=hi {
            if let Some(set) = self.slot(i).and_then(|s| s.set_for(rt, kind)) {
                out.merge(set);
            }
        }
        Ok(out)
    }
}
