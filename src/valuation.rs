//! Matroid-rank valuations induced by conjunctions of linear constraints.
//!
//! A bundle is *independent* when every constraint admits it; its *value*
//! (rank) is the size of the largest independent subset. Because the induced
//! set function is a matroid rank, a single greedy augmentation pass computes
//! it exactly. Both queries are memoized per valuation on the canonically
//! sorted bundle key; memo tables are never shared between valuations.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::constraints::{ConstraintError, LinearConstraint};
use crate::ItemIndex;

/// A rank valuation over bundles of item indices.
///
/// Bundles are multisets: duplicate indices are legal and count toward
/// cardinality, but never toward independence (the constraint indicator
/// collapses them). [`UniqueItemsValuation`] removes duplicates up front.
pub trait Valuation {
    /// True when the bundle receives maximal value, i.e. `value(S) == |S|`.
    fn independent(&self, bundle: &[ItemIndex]) -> bool;

    /// Size of the largest independent subset of the bundle.
    fn value(&self, bundle: &[ItemIndex]) -> u64;
}

/// Lookup counters for one memo table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoStats {
    /// Total queries answered.
    pub lookups: u64,
    /// Queries that had to be computed.
    pub misses: u64,
}

#[derive(Debug, Default, Clone)]
struct Memo {
    independent: HashMap<Vec<ItemIndex>, bool>,
    value: HashMap<Vec<ItemIndex>, u64>,
    independent_stats: MemoStats,
    value_stats: MemoStats,
}

/// Sorted copy of the bundle; the canonical memo key for a multiset.
fn canonical(bundle: &[ItemIndex]) -> Vec<ItemIndex> {
    let mut key = bundle.to_vec();
    key.sort_unstable();
    key
}

/// Valuation that limits independence with a conjunction of constraints.
#[derive(Debug, Clone)]
pub struct ConstraintValuation {
    constraints: Vec<LinearConstraint>,
    memo: Option<RefCell<Memo>>,
}

impl ConstraintValuation {
    pub fn new(constraints: Vec<LinearConstraint>) -> Self {
        Self {
            constraints,
            memo: Some(RefCell::new(Memo::default())),
        }
    }

    /// Identical semantics, no caching.
    pub fn without_memo(constraints: Vec<LinearConstraint>) -> Self {
        Self {
            constraints,
            memo: None,
        }
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// `(independent, value)` lookup counters, when memoization is enabled.
    pub fn memo_stats(&self) -> Option<(MemoStats, MemoStats)> {
        self.memo
            .as_ref()
            .map(|memo| {
                let memo = memo.borrow();
                (memo.independent_stats, memo.value_stats)
            })
    }

    /// Stacks every constraint into one pruned constraint.
    ///
    /// The compiled valuation is equivalent (same `independent`, same
    /// `value`) but answers each query with a single matrix product. The
    /// allocation program (see [`crate::optimization`]) requires compiled
    /// input.
    pub fn compile(&self) -> Result<ConstraintValuation, ConstraintError> {
        let mut iter = self.constraints.iter();
        let Some(first) = iter.next() else {
            return Ok(Self::new(Vec::new()));
        };
        let mut stacked = first.clone();
        for constraint in iter {
            stacked = stacked.stack(constraint)?;
        }
        Ok(Self::new(vec![stacked.prune()]))
    }

    fn compute_independent(&self, bundle: &[ItemIndex]) -> bool {
        self.constraints.iter().all(|c| c.satisfies(bundle))
    }

    /// Greedy augmentation: grow an independent set in bundle order. Matroid
    /// rank semantics make the single pass exact.
    fn compute_value(&self, bundle: &[ItemIndex]) -> u64 {
        if self.independent(bundle) {
            return bundle.len() as u64;
        }
        let mut kept: Vec<ItemIndex> = Vec::with_capacity(bundle.len());
        for &item in bundle {
            kept.push(item);
            if !self.independent(&kept) {
                kept.pop();
            }
        }
        kept.len() as u64
    }
}

impl Valuation for ConstraintValuation {
    fn independent(&self, bundle: &[ItemIndex]) -> bool {
        let Some(memo) = &self.memo else {
            return self.compute_independent(bundle);
        };
        let key = canonical(bundle);
        {
            let mut memo = memo.borrow_mut();
            memo.independent_stats.lookups += 1;
            if let Some(&hit) = memo.independent.get(&key) {
                return hit;
            }
            memo.independent_stats.misses += 1;
        }
        let result = self.compute_independent(bundle);
        memo.borrow_mut().independent.insert(key, result);
        result
    }

    fn value(&self, bundle: &[ItemIndex]) -> u64 {
        let Some(memo) = &self.memo else {
            return self.compute_value(bundle);
        };
        let key = canonical(bundle);
        {
            let mut memo = memo.borrow_mut();
            memo.value_stats.lookups += 1;
            if let Some(&hit) = memo.value.get(&key) {
                return hit;
            }
            memo.value_stats.misses += 1;
        }
        let result = self.compute_value(bundle);
        memo.borrow_mut().value.insert(key, result);
        result
    }
}

/// Adapter that de-duplicates bundles before delegating.
///
/// Under matroid rank semantics a second copy of an item can never add
/// value; agents expose this adapter to the allocator so repeated-item
/// queries stay safe.
#[derive(Debug, Clone)]
pub struct UniqueItemsValuation {
    inner: ConstraintValuation,
}

impl UniqueItemsValuation {
    pub fn new(inner: ConstraintValuation) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &ConstraintValuation {
        &self.inner
    }

    /// Compiles the underlying valuation; see [`ConstraintValuation::compile`].
    pub fn compile(&self) -> Result<UniqueItemsValuation, ConstraintError> {
        Ok(Self::new(self.inner.compile()?))
    }

    fn dedup(bundle: &[ItemIndex]) -> Vec<ItemIndex> {
        let mut unique = canonical(bundle);
        unique.dedup();
        unique
    }
}

impl Valuation for UniqueItemsValuation {
    fn independent(&self, bundle: &[ItemIndex]) -> bool {
        self.inner.independent(&Self::dedup(bundle))
    }

    fn value(&self, bundle: &[ItemIndex]) -> u64 {
        self.inner.value(&Self::dedup(bundle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Reference rank: recursively drop one element and take the best. Only
    /// used to audit the greedy pass on small bundles.
    fn value_exhaustive<V: Valuation>(valuation: &V, bundle: &[ItemIndex]) -> u64 {
        if valuation.independent(bundle) {
            return bundle.len() as u64;
        }
        (0..bundle.len())
            .map(|drop| {
                let mut sub = bundle.to_vec();
                sub.remove(drop);
                value_exhaustive(valuation, &sub)
            })
            .max()
            .unwrap_or(0)
    }

    fn powerset(ground: &[ItemIndex]) -> Vec<Vec<ItemIndex>> {
        let mut sets = vec![Vec::new()];
        for &item in ground {
            let mut grown: Vec<Vec<ItemIndex>> = sets
                .iter()
                .map(|s| {
                    let mut s = s.clone();
                    s.push(item);
                    s
                })
                .collect();
            sets.append(&mut grown);
        }
        sets
    }

    /// Overall cap of 2 plus mutual exclusivity between items 0 and 1.
    fn fixture() -> ConstraintValuation {
        ConstraintValuation::new(vec![
            LinearConstraint::new(array![[1, 1, 1, 1]], array![2]).unwrap(),
            LinearConstraint::new(array![[1, 1, 0, 0]], array![1]).unwrap(),
        ])
    }

    // ── matroid-rank laws ─────────────────────────────────────────────

    #[test]
    fn empty_bundle_has_zero_value() {
        assert_eq!(fixture().value(&[]), 0);
        assert!(fixture().independent(&[]));
    }

    #[test]
    fn value_is_monotone_and_bounded() {
        let v = fixture();
        let ground = [0, 1, 2, 3];
        for set in powerset(&ground) {
            let val = v.value(&set);
            assert!(val <= set.len() as u64);
            for &extra in ground.iter().filter(|i| !set.contains(i)) {
                let mut bigger = set.clone();
                bigger.push(extra);
                assert!(v.value(&bigger) >= val);
            }
        }
    }

    #[test]
    fn value_is_submodular() {
        let v = fixture();
        let ground = [0, 1, 2, 3];
        let sets = powerset(&ground);
        for s in &sets {
            for t in &sets {
                let mut union = s.clone();
                union.extend(t.iter().filter(|i| !s.contains(i)));
                let intersection: Vec<ItemIndex> =
                    s.iter().copied().filter(|i| t.contains(i)).collect();
                assert!(
                    v.value(s) + v.value(t) >= v.value(&union) + v.value(&intersection),
                    "submodularity fails at {s:?} / {t:?}"
                );
            }
        }
    }

    #[test]
    fn independent_iff_value_equals_cardinality() {
        let v = fixture();
        for set in powerset(&[0, 1, 2, 3]) {
            assert_eq!(v.independent(&set), v.value(&set) == set.len() as u64);
        }
    }

    // ── greedy vs reference ───────────────────────────────────────────

    #[test]
    fn greedy_matches_exhaustive_rank() {
        let v = fixture();
        for set in powerset(&[0, 1, 2, 3]) {
            assert_eq!(v.value(&set), value_exhaustive(&v, &set), "at {set:?}");
        }
    }

    #[test]
    fn conflicting_pair_ranks_one() {
        let v = fixture();
        assert_eq!(v.value(&[0, 1]), 1);
        assert!(!v.independent(&[0, 1]));
    }

    // ── memoization ───────────────────────────────────────────────────

    #[test]
    fn memo_counts_unique_and_total_lookups() {
        let v = fixture();
        v.value(&[0, 2]);
        v.value(&[2, 0]); // same multiset, different order
        let (_, value_stats) = v.memo_stats().unwrap();
        assert_eq!(value_stats.lookups, 2);
        assert_eq!(value_stats.misses, 1);
    }

    #[test]
    fn disabling_memo_preserves_semantics() {
        let cached = fixture();
        let uncached = ConstraintValuation::without_memo(fixture().constraints().to_vec());
        assert!(uncached.memo_stats().is_none());
        for set in powerset(&[0, 1, 2, 3]) {
            assert_eq!(cached.value(&set), uncached.value(&set));
            assert_eq!(cached.independent(&set), uncached.independent(&set));
        }
    }

    // ── compile ───────────────────────────────────────────────────────

    #[test]
    fn compiled_valuation_is_equivalent() {
        let v = fixture();
        let compiled = v.compile().unwrap();
        assert_eq!(compiled.constraints().len(), 1);
        for set in powerset(&[0, 1, 2, 3]) {
            assert_eq!(v.value(&set), compiled.value(&set));
            assert_eq!(v.independent(&set), compiled.independent(&set));
        }
    }

    // ── unique-items adapter ──────────────────────────────────────────

    #[test]
    fn duplicates_count_for_raw_but_not_unique_valuation() {
        // Total cap of 2 with no exclusivity: a duplicated item still
        // satisfies the constraint, so the raw rank counts both copies.
        let raw = ConstraintValuation::new(vec![
            LinearConstraint::new(array![[1, 1]], array![2]).unwrap(),
        ]);
        assert_eq!(raw.value(&[0, 0]), 2);

        let unique = UniqueItemsValuation::new(raw);
        assert_eq!(unique.value(&[0, 0]), 1);
    }
}
