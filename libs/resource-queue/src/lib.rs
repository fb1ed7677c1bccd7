// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Ring history of source/destination register accesses (spec.md §4.4),
//! used by the solver to drive register-reuse dependency decisions.

mod access_age;
mod entropy;
mod error;
mod queue;
mod stage;

pub use access_age::AccessAge;
pub use entropy::{EntropyBand, EntropyCounter};
pub use error::Error;
pub use queue::ResourceAccessQueue;
pub use stage::{AccessKind, ResourceAccessStage, ResourceType, RESOURCE_TYPES};

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_with(rt: ResourceType, reads: &[u32], writes: &[u32]) -> ResourceAccessStage {
        let mut stage = ResourceAccessStage::new();
        for &idx in reads {
            stage.record(rt, AccessKind::Read, idx);
        }
        for &idx in writes {
            stage.record(rt, AccessKind::Write, idx);
        }
        stage
    }

    #[test]
    fn commit_retires_oldest_once_at_capacity() {
        let mut q = ResourceAccessQueue::new(2);
        assert!(q.commit(stage_with(ResourceType::Gpr, &[1], &[])).is_none());
        assert!(q.commit(stage_with(ResourceType::Gpr, &[2], &[])).is_none());
        let retired = q.commit(stage_with(ResourceType::Gpr, &[3], &[]));
        assert!(retired.is_some());
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn access_age_tracks_most_recent_touch() {
        let mut q = ResourceAccessQueue::new(4);
        q.commit(stage_with(ResourceType::Gpr, &[5], &[]));
        q.commit(stage_with(ResourceType::Gpr, &[], &[5]));
        let age = q.access_age(ResourceType::Gpr, 5).unwrap();
        assert_eq!(age.age, 0);
        assert_eq!(age.kind, AccessKind::Write);
    }

    #[test]
    fn access_age_erased_when_overwritten_out_of_window() {
        let mut q = ResourceAccessQueue::new(1);
        q.commit(stage_with(ResourceType::Gpr, &[9], &[]));
        q.commit(stage_with(ResourceType::Gpr, &[], &[]));
        assert!(q.access_age(ResourceType::Gpr, 9).is_none());
    }

    #[test]
    fn same_stage_write_wins_over_read() {
        let mut q = ResourceAccessQueue::new(2);
        q.commit(stage_with(ResourceType::Gpr, &[1], &[1]));
        let age = q.access_age(ResourceType::Gpr, 1).unwrap();
        assert_eq!(age.kind, AccessKind::Write);
    }

    #[test]
    fn look_up_far_prefers_oldest_match_in_window() {
        let mut q = ResourceAccessQueue::new(4);
        q.commit(stage_with(ResourceType::Gpr, &[1], &[])); // slot 0
        q.commit(stage_with(ResourceType::Gpr, &[], &[])); // slot 1
        q.commit(stage_with(ResourceType::Gpr, &[2], &[])); // slot 2
        let found = q.look_up_far(2, ResourceType::Gpr, AccessKind::Read).unwrap();
        assert!(found.contains_value(1));
    }

    #[test]
    fn look_up_near_prefers_newest_match_in_window() {
        let mut q = ResourceAccessQueue::new(4);
        q.commit(stage_with(ResourceType::Gpr, &[1], &[])); // slot 0
        q.commit(stage_with(ResourceType::Gpr, &[], &[])); // slot 1
        q.commit(stage_with(ResourceType::Gpr, &[2], &[])); // slot 2
        let found = q.look_up_near(2, ResourceType::Gpr, AccessKind::Read).unwrap();
        assert!(found.contains_value(2));
    }

    #[test]
    fn get_random_resource_constraint_unions_window() {
        let mut q = ResourceAccessQueue::new(4);
        q.commit(stage_with(ResourceType::Gpr, &[1], &[]));
        q.commit(stage_with(ResourceType::Gpr, &[2], &[]));
        let union = q
            .get_random_resource_constraint(0, 1, ResourceType::Gpr, AccessKind::Read)
            .unwrap();
        assert!(union.contains_value(1) && union.contains_value(2));
    }

    #[test]
    fn entropy_climbs_to_stable_and_falls_back_on_retirement() {
        let mut q = ResourceAccessQueue::with_thresholds(2, 3, 1);
        q.commit(stage_with(ResourceType::Gpr, &[1, 2], &[]));
        assert!(!q.entropy_stable(ResourceType::Gpr, AccessKind::Read));
        q.commit(stage_with(ResourceType::Gpr, &[3], &[]));
        assert!(q.entropy_stable(ResourceType::Gpr, AccessKind::Read));
        // Retiring the first two-index stage drops the count to 1, at the
        // off-threshold boundary, which should leave Stable (cooldown kicks
        // in only once the count falls *below* the threshold).
        q.commit(stage_with(ResourceType::Gpr, &[], &[]));
        assert!(q.entropy_stable(ResourceType::Gpr, AccessKind::Read));
    }

    #[test]
    fn empty_queue_has_no_lookups() {
        let q = ResourceAccessQueue::new(4);
        assert!(q.look_up_far(0, ResourceType::Gpr, AccessKind::Read).is_none());
        assert!(q.look_up_near(0, ResourceType::Gpr, AccessKind::Read).is_none());
    }
}
