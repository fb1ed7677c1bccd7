// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Property tests for the semilattice laws in spec.md §8 property 1-3.

use constraint_set::ConstraintSet;
use proptest::prelude::*;

fn arb_set(max_value: u64, max_ranges: usize) -> impl Strategy<Value = ConstraintSet> {
    proptest::collection::vec((0..max_value, 0..max_value), 0..max_ranges).prop_map(|pairs| {
        let mut set = ConstraintSet::new();
        for (a, b) in pairs {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            set.add_range(lo, hi).unwrap();
        }
        set
    })
}

proptest! {
    #[test]
    fn union_is_idempotent(a in arb_set(2000, 20)) {
        let mut aa = a.clone();
        aa.merge(&a);
        prop_assert_eq!(aa, a);
    }

    #[test]
    fn union_is_commutative(a in arb_set(2000, 20), b in arb_set(2000, 20)) {
        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn union_is_associative(a in arb_set(1000, 10), b in arb_set(1000, 10), c in arb_set(1000, 10)) {
        let mut ab_c = a.clone();
        ab_c.merge(&b);
        ab_c.merge(&c);

        let mut bc = b.clone();
        bc.merge(&c);
        let mut a_bc = a.clone();
        a_bc.merge(&bc);

        prop_assert_eq!(ab_c, a_bc);
    }

    #[test]
    fn intersect_is_idempotent(a in arb_set(2000, 20)) {
        let mut aa = a.clone();
        aa.apply(&a);
        prop_assert_eq!(aa, a);
    }

    #[test]
    fn intersect_is_commutative(a in arb_set(2000, 20), b in arb_set(2000, 20)) {
        let mut ab = a.clone();
        ab.apply(&b);
        let mut ba = b.clone();
        ba.apply(&a);
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn intersect_is_associative(a in arb_set(1000, 10), b in arb_set(1000, 10), c in arb_set(1000, 10)) {
        let mut ab_c = a.clone();
        ab_c.apply(&b);
        ab_c.apply(&c);

        let mut bc = b.clone();
        bc.apply(&c);
        let mut a_bc = a.clone();
        a_bc.apply(&bc);

        prop_assert_eq!(ab_c, a_bc);
    }

    #[test]
    fn size_cache_matches_recount(a in arb_set(2000, 20), b in arb_set(2000, 20)) {
        let mut merged = a.clone();
        merged.merge(&b);
        prop_assert_eq!(merged.size(), merged.calculate_size());

        let mut intersected = a.clone();
        intersected.apply(&b);
        prop_assert_eq!(intersected.size(), intersected.calculate_size());

        let mut subtracted = a;
        subtracted.subtract(&b);
        prop_assert_eq!(subtracted.size(), subtracted.calculate_size());
    }

    #[test]
    fn normalisation_holds_after_any_merge_subtract_sequence(
        a in arb_set(5000, 30), b in arb_set(5000, 30), c in arb_set(5000, 30)
    ) {
        let mut s = a;
        s.merge(&b);
        s.subtract(&c);
        let pairs: Vec<_> = s.iter().collect();
        for w in pairs.windows(2) {
            prop_assert!(w[0].1 < w[1].0);
            prop_assert!(w[1].0 - w[0].1 > 1, "adjacent intervals must be merged: {:?}", w);
        }
    }

    #[test]
    fn subtract_then_union_is_superset_of_original(a in arb_set(2000, 15), b in arb_set(2000, 15)) {
        let mut union = a.clone();
        union.merge(&b);
        let mut diff = union;
        diff.subtract(&b);
        prop_assert!(a.contains_set(&diff));
    }

    #[test]
    fn align_with_page_is_idempotent(a in arb_set(1 << 20, 15)) {
        let once = a.align_with_page(0xfff);
        let twice = once.align_with_page(0xfff);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn align_with_size_is_idempotent(a in arb_set(1 << 20, 15)) {
        let once = a.align_with_size(0xff, 0x100);
        let twice = once.align_with_size(0xff, 0x100);
        prop_assert_eq!(once, twice);
    }
}
