use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;

use crate::features::symbolic::SymExpr;
use crate::shared::models::Line;

/// One branch outcome: the true side or the false side of a branch line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BranchKey {
    pub line: Line,
    pub outcome: bool,
}

impl BranchKey {
    pub fn new(line: Line, outcome: bool) -> Self {
        Self { line, outcome }
    }

    pub fn flipped(&self) -> Self {
        Self {
            line: self.line,
            outcome: !self.outcome,
        }
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, if self.outcome { "T" } else { "F" })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKey {
    /// Equality constraints reproducing a random argument set
    Seed,
    Branch(BranchKey),
}

impl fmt::Display for ConstraintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKey::Seed => write!(f, "seed"),
            ConstraintKey::Branch(key) => write!(f, "{}", key),
        }
    }
}

/// Worklist of path constraints plus solved/infeasible bookkeeping
///
/// Cloning gives a snapshot the driver restores when a run fails.
#[derive(Debug, Clone, Default)]
pub struct ConstraintStore {
    unsolved: IndexMap<ConstraintKey, Vec<SymExpr>>,
    solved: FxHashSet<BranchKey>,
    infeasible: FxHashSet<ConstraintKey>,
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as driven; drops any pending entry for it
    ///
    /// Returns true when the key was not solved before.
    pub fn mark_solved(&mut self, key: BranchKey) -> bool {
        self.unsolved.shift_remove(&ConstraintKey::Branch(key));
        self.solved.insert(key)
    }

    /// Store the conjunction reaching `key`, unless `key` is already solved
    /// or infeasible
    ///
    /// An existing entry is overwritten and moves to the top of the
    /// worklist. Returns whether the entry was stored.
    pub fn record_unsolved(&mut self, key: BranchKey, conjunction: Vec<SymExpr>) -> bool {
        let constraint_key = ConstraintKey::Branch(key);
        if self.solved.contains(&key) || self.infeasible.contains(&constraint_key) {
            return false;
        }
        self.push_top(constraint_key, conjunction);
        true
    }

    /// Seed the worklist with one entry (replaces a pending seed)
    pub fn seed(&mut self, conjunction: Vec<SymExpr>) {
        self.push_top(ConstraintKey::Seed, conjunction);
    }

    fn push_top(&mut self, key: ConstraintKey, conjunction: Vec<SymExpr>) {
        self.unsolved.shift_remove(&key);
        self.unsolved.insert(key, conjunction);
    }

    /// Pop the most recently discovered entry
    pub fn pop_latest(&mut self) -> Option<(ConstraintKey, Vec<SymExpr>)> {
        self.unsolved.pop()
    }

    /// Mark a popped key unreachable; it is never stored again
    pub fn mark_infeasible(&mut self, key: ConstraintKey) {
        self.unsolved.shift_remove(&key);
        // The seed is a concrete assignment; it is never unreachable for good
        if key != ConstraintKey::Seed {
            self.infeasible.insert(key);
        }
    }

    pub fn is_solved(&self, key: &BranchKey) -> bool {
        self.solved.contains(key)
    }

    pub fn is_infeasible(&self, key: &BranchKey) -> bool {
        self.infeasible.contains(&ConstraintKey::Branch(*key))
    }

    pub fn is_pending(&self, key: &ConstraintKey) -> bool {
        self.unsolved.contains_key(key)
    }

    pub fn pending(&self, key: &ConstraintKey) -> Option<&[SymExpr]> {
        self.unsolved.get(key).map(Vec::as_slice)
    }

    pub fn solved_count(&self) -> usize {
        self.solved.len()
    }

    pub fn unsolved_count(&self) -> usize {
        self.unsolved.len()
    }

    pub fn infeasible_count(&self) -> usize {
        self.infeasible.len()
    }

    /// Solved keys in line order
    pub fn solved_keys(&self) -> Vec<BranchKey> {
        let mut keys: Vec<_> = self.solved.iter().copied().collect();
        keys.sort();
        keys
    }

    /// Pending keys, oldest first
    pub fn unsolved_keys(&self) -> impl Iterator<Item = &ConstraintKey> {
        self.unsolved.keys()
    }

    pub fn is_exhausted(&self) -> bool {
        self.unsolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn constraint(n: i64) -> Vec<SymExpr> {
        vec![SymExpr::Int(n)]
    }

    #[test]
    fn test_lifo_with_overwrite_moving_to_top() {
        let mut store = ConstraintStore::new();
        store.record_unsolved(BranchKey::new(3, false), constraint(1));
        store.record_unsolved(BranchKey::new(5, true), constraint(2));
        // Rediscovery overwrites and becomes the latest entry
        store.record_unsolved(BranchKey::new(3, false), constraint(3));

        let (key, conj) = store.pop_latest().unwrap();
        assert_eq!(key, ConstraintKey::Branch(BranchKey::new(3, false)));
        assert_eq!(conj, constraint(3));

        let (key, _) = store.pop_latest().unwrap();
        assert_eq!(key, ConstraintKey::Branch(BranchKey::new(5, true)));
        assert!(store.pop_latest().is_none());
    }

    #[test]
    fn test_solved_keys_are_never_re_added() {
        let mut store = ConstraintStore::new();
        let key = BranchKey::new(7, true);
        store.record_unsolved(key, constraint(1));
        assert!(store.mark_solved(key));
        assert!(!store.is_pending(&ConstraintKey::Branch(key)));

        assert!(!store.record_unsolved(key, constraint(2)));
        assert!(!store.mark_solved(key));
        assert_eq!(store.solved_count(), 1);
    }

    #[test]
    fn test_infeasible_keys_are_never_re_added() {
        let mut store = ConstraintStore::new();
        let key = BranchKey::new(4, false);
        store.record_unsolved(key, constraint(1));
        let (popped, _) = store.pop_latest().unwrap();
        store.mark_infeasible(popped);

        assert!(store.is_infeasible(&key));
        assert!(!store.record_unsolved(key, constraint(1)));
        assert!(store.is_exhausted());
    }

    #[test]
    fn test_seed_is_not_tracked_as_infeasible() {
        let mut store = ConstraintStore::new();
        store.seed(constraint(1));
        store.mark_infeasible(ConstraintKey::Seed);
        assert_eq!(store.infeasible_count(), 0);
        store.seed(constraint(2));
        assert!(store.is_pending(&ConstraintKey::Seed));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Record(u32, bool),
        Solve(u32, bool),
        PopInfeasible,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..6, any::<bool>()).prop_map(|(l, o)| Op::Record(l, o)),
            (0u32..6, any::<bool>()).prop_map(|(l, o)| Op::Solve(l, o)),
            Just(Op::PopInfeasible),
        ]
    }

    proptest! {
        #[test]
        fn prop_solved_is_monotone_and_disjoint(ops in proptest::collection::vec(op_strategy(), 0..60)) {
            let mut store = ConstraintStore::new();
            let mut previous = 0;
            for op in ops {
                match op {
                    Op::Record(l, o) => { store.record_unsolved(BranchKey::new(l, o), constraint(0)); }
                    Op::Solve(l, o) => { store.mark_solved(BranchKey::new(l, o)); }
                    Op::PopInfeasible => {
                        if let Some((key, _)) = store.pop_latest() {
                            store.mark_infeasible(key);
                        }
                    }
                }
                prop_assert!(store.solved_count() >= previous);
                previous = store.solved_count();
                for key in store.solved_keys() {
                    prop_assert!(!store.is_pending(&ConstraintKey::Branch(key)));
                }
            }
        }
    }
}
