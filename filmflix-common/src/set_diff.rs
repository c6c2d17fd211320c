//! Order-irrelevant set difference over reference lists
//!
//! Shared by every update path that rewrites a reference list (film roles,
//! film directors, actor/director films) to decide which reverse
//! references to add and which to remove.

use std::collections::HashSet;
use std::hash::Hash;

/// Result of comparing an old reference list with a new one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<T> {
    /// Present in `new` but not in `old`
    pub added: Vec<T>,
    /// Present in `old` but not in `new`
    pub removed: Vec<T>,
}

impl<T> Diff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compute `added = new − old` and `removed = old − new`.
///
/// Duplicates collapse; each side keeps first-occurrence order of its source
/// list so the emitted intents are deterministic.
pub fn diff<T>(old: &[T], new: &[T]) -> Diff<T>
where
    T: Eq + Hash + Clone,
{
    let old_set: HashSet<&T> = old.iter().collect();
    let new_set: HashSet<&T> = new.iter().collect();

    Diff {
        added: dedup(new.iter().filter(|item| !old_set.contains(item)).cloned()),
        removed: dedup(old.iter().filter(|item| !new_set.contains(item)).cloned()),
    }
}

/// Collapse duplicates, keeping the first occurrence of each item.
pub fn dedup<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
