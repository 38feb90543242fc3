//! What a transaction asks to lock
//!
//! A request names a finite set of resources, or asks for the whole system.
//! Whole-system locking is not implemented and is rejected up front.

use crate::error::{LockError, LockResult};
use std::collections::{BTreeSet, HashSet};

/// Set of resources requested by one acquire call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockScope {
    /// Lock every resource in the system (unsupported)
    Global,
    /// Lock the named resources; order and duplicates are irrelevant.
    /// An empty list only takes an admission slot.
    Resources(Vec<String>),
}

impl LockScope {
    /// Scope over the given resource names
    pub fn resources<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LockScope::Resources(names.into_iter().map(Into::into).collect())
    }

    /// Admission-only scope that locks no resources
    pub fn none() -> Self {
        LockScope::Resources(Vec::new())
    }

    /// True for [`LockScope::Global`]
    pub fn is_global(&self) -> bool {
        matches!(self, LockScope::Global)
    }

    /// Resolve to the acquisition order: sorted, duplicates removed.
    ///
    /// Every transaction locks in this one global order, which is what rules
    /// out circular waits between transactions.
    pub fn into_lock_order(self) -> LockResult<Vec<String>> {
        match self {
            LockScope::Global => Err(LockError::UnsupportedGlobalLock),
            LockScope::Resources(mut names) => {
                names.sort_unstable();
                names.dedup();
                Ok(names)
            }
        }
    }
}

impl From<Vec<String>> for LockScope {
    fn from(names: Vec<String>) -> Self {
        LockScope::Resources(names)
    }
}

impl From<Vec<&str>> for LockScope {
    fn from(names: Vec<&str>) -> Self {
        LockScope::resources(names)
    }
}

impl From<&[&str]> for LockScope {
    fn from(names: &[&str]) -> Self {
        LockScope::resources(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for LockScope {
    fn from(names: [&str; N]) -> Self {
        LockScope::resources(names)
    }
}

impl From<&str> for LockScope {
    fn from(name: &str) -> Self {
        LockScope::Resources(vec![name.to_string()])
    }
}

impl From<BTreeSet<String>> for LockScope {
    fn from(names: BTreeSet<String>) -> Self {
        LockScope::Resources(names.into_iter().collect())
    }
}

impl From<HashSet<String>> for LockScope {
    fn from(names: HashSet<String>) -> Self {
        LockScope::Resources(names.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    #[test]
    fn test_sorted_and_deduplicated() {
        let order = LockScope::from(["b", "a", "b"]).into_lock_order().unwrap();
        assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_global_is_unsupported() {
        assert!(LockScope::Global.is_global());
        assert_eq!(
            LockScope::Global.into_lock_order(),
            Err(LockError::UnsupportedGlobalLock)
        );
    }

    #[test]
    fn test_empty_scope_is_admission_only() {
        assert_eq!(LockScope::none().into_lock_order().unwrap(), Vec::<String>::new());
        assert!(!LockScope::none().is_global());
    }

    #[test]
    fn test_conversions() {
        let mut set = HashSet::new();
        set.insert("x".to_string());
        assert_eq!(LockScope::from(set), LockScope::resources(["x"]));
        assert_eq!(LockScope::from("x"), LockScope::resources(vec!["x"]));
        let slice: &[&str] = &["y", "x"];
        assert_eq!(
            LockScope::from(slice).into_lock_order().unwrap(),
            vec!["x".to_string(), "y".to_string()]
        );
    }

    proptest! {
        #[test]
        fn prop_lock_order_independent_of_input_order(
            mut names in proptest::collection::vec("[a-d]{1,2}", 0..12),
            seed in any::<u64>(),
        ) {
            let expected: Vec<String> = names.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
            let forward = LockScope::from(names.clone()).into_lock_order().unwrap();

            names.shuffle(&mut StdRng::seed_from_u64(seed));
            let shuffled = LockScope::from(names).into_lock_order().unwrap();

            prop_assert_eq!(&forward, &expected);
            prop_assert_eq!(&shuffled, &expected);
        }
    }
}
