// Copyright 2025. FORCE-RISCV core contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A weighted set of named alternatives, optionally nested, used wherever a
//! random decision needs to be externally tunable (e.g. "Instruction/Data
//! Page Aliasing" in `page-model`, or `AddressReuseMode` selection in
//! `address-solver`). Rather than the clone-then-choose pattern of the
//! source material, `ChoiceTree` borrows its weights and only materialises
//! the winning path, which sidesteps the clone cost the original design
//! flagged without changing the sampled distribution.

use rand::Rng;

/// A single alternative in a [`ChoiceTree`]: a leaf value, an inclusive
/// numeric range, or a nested sub-tree.
#[derive(Debug, Clone)]
pub enum Choice {
    Value(i64),
    Range(i64, i64),
    SubTree(ChoiceTree),
}

/// A weighted set of named [`Choice`]s. Weights are non-negative; a weight of
/// zero makes an alternative unreachable without removing it, which is useful
/// for templates that toggle choices on and off without re-authoring the
/// tree.
#[derive(Debug, Clone, Default)]
pub struct ChoiceTree {
    entries: Vec<(String, u32, Choice)>,
}

impl ChoiceTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, weight: u32, choice: Choice) -> &mut Self {
        self.entries.push((name.into(), weight, choice));
        self
    }

    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|(_, w, _)| u64::from(*w)).sum()
    }

    /// Samples one value from the tree, recursing into sub-trees weighted by
    /// their own total. Returns `None` if every entry has weight zero.
    pub fn choose(&self, rng: &mut impl Rng) -> Option<i64> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let mut target = rng.gen_range(0..total);
        for (_, weight, choice) in &self.entries {
            let weight = u64::from(*weight);
            if weight == 0 {
                continue;
            }
            if target < weight {
                return Some(match choice {
                    Choice::Value(v) => *v,
                    Choice::Range(lo, hi) => rng.gen_range(*lo..=*hi),
                    Choice::SubTree(sub) => sub.choose(rng)?,
                });
            }
            target -= weight;
        }
        None
    }

    /// Looks up an alternative by name, for templates that want to force a
    /// specific branch rather than sample one.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Choice> {
        self.entries
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, c)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn zero_weight_entries_are_unreachable() {
        let mut tree = ChoiceTree::new();
        tree.push("never", 0, Choice::Value(1));
        tree.push("always", 10, Choice::Value(2));
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(tree.choose(&mut rng), Some(2));
        }
    }

    #[test]
    fn empty_tree_yields_none() {
        let tree = ChoiceTree::new();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert_eq!(tree.choose(&mut rng), None);
    }

    #[test]
    fn named_lookup() {
        let mut tree = ChoiceTree::new();
        tree.push("flat", 1, Choice::Value(0));
        tree.push("alias", 1, Choice::Value(1));
        assert!(matches!(tree.named("alias"), Some(Choice::Value(1))));
        assert!(tree.named("missing").is_none());
    }
}
