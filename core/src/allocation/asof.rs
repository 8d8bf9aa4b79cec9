//! Forward ("asof") range matching.
//!
//! A value is paired with the reference entry whose upper bound is the
//! smallest one >= the value. Entries sharing an upper bound keep their
//! input order; the first of them wins.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct ForwardIndex<'a, T> {
    entries: Vec<(i64, &'a T)>,
}

impl<'a, T> ForwardIndex<'a, T> {
    pub fn new<I, F>(items: I, upper_bound: F) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> i64,
    {
        let mut entries: Vec<(i64, &'a T)> = items
            .into_iter()
            .map(|item| (upper_bound(item), item))
            .collect();
        // Stable: equal bounds stay in input order.
        entries.sort_by_key(|(bound, _)| *bound);
        Self { entries }
    }

    pub fn find(&self, key: i64) -> Option<&'a T> {
        let idx = self.entries.partition_point(|(bound, _)| *bound < key);
        self.entries.get(idx).map(|(_, item)| *item)
    }
}

/// Forward index split by a secondary key. Entries without a key are
/// unreachable, as in a keyed join.
#[derive(Debug, Clone)]
pub struct PartitionedForwardIndex<'a, K, T> {
    parts: HashMap<K, ForwardIndex<'a, T>>,
}

impl<'a, K: Hash + Eq, T> PartitionedForwardIndex<'a, K, T> {
    pub fn new<I, P, F>(items: I, partition: P, upper_bound: F) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        P: Fn(&T) -> Option<K>,
        F: Fn(&T) -> i64 + Copy,
    {
        let mut grouped: HashMap<K, Vec<&'a T>> = HashMap::new();
        for item in items {
            if let Some(key) = partition(item) {
                grouped.entry(key).or_default().push(item);
            }
        }
        let parts = grouped
            .into_iter()
            .map(|(key, members)| (key, ForwardIndex::new(members, upper_bound)))
            .collect();
        Self { parts }
    }

    pub fn find<Q>(&self, part: &Q, key: i64) -> Option<&'a T>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.parts.get(part).and_then(|index| index.find(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Band {
        label: &'static str,
        kind:  Option<&'static str>,
        until: i64,
    }

    fn bands() -> Vec<Band> {
        vec![
            Band { label: "c", kind: Some("rural"), until: 5000 },
            Band { label: "a", kind: Some("urban"), until: 1000 },
            Band { label: "b", kind: Some("urban"), until: 2500 },
            Band { label: "d", kind: None,          until: 9000 },
        ]
    }

    #[test]
    fn picks_smallest_upper_bound_at_or_above_key() {
        let bands = bands();
        let index = ForwardIndex::new(&bands, |b| b.until);

        assert_eq!(index.find(1).map(|b| b.label), Some("a"));
        assert_eq!(index.find(1000).map(|b| b.label), Some("a"));
        assert_eq!(index.find(1001).map(|b| b.label), Some("b"));
        assert_eq!(index.find(9000).map(|b| b.label), Some("d"));
        assert_eq!(index.find(9001), None);
    }

    #[test]
    fn equal_bounds_resolve_to_first_in_input_order() {
        let bands = vec![
            Band { label: "first",  kind: None, until: 100 },
            Band { label: "second", kind: None, until: 100 },
        ];
        let index = ForwardIndex::new(&bands, |b| b.until);
        assert_eq!(index.find(50).map(|b| b.label), Some("first"));
    }

    #[test]
    fn partitioned_lookup_stays_inside_its_partition() {
        let bands = bands();
        let index = PartitionedForwardIndex::new(
            &bands,
            |b| b.kind.map(str::to_string),
            |b| b.until,
        );

        assert_eq!(index.find("urban", 2000).map(|b| b.label), Some("b"));
        assert_eq!(index.find("urban", 3000), None);
        assert_eq!(index.find("rural", 10).map(|b| b.label), Some("c"));
        assert_eq!(index.find("suburban", 10), None);
    }
}
