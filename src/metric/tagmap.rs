//! tagmap is the set of key, value pairs that sits inside each `Point`. Think
//! of it as a specialized hashmap. Keys are kept sorted at all times, which is
//! what lets two points with the same tags in a different insertion order
//! share one series identity.

use std::cmp;
use std::hash::Hash;
use std::slice::Iter;

/// The tagmap key, value collection. Behaves similarly to
/// `std::collections::BTreeMap` but with a specialized implementation for
/// fast searching over a small collection.
#[derive(Clone, Debug, Eq)]
pub struct TagMap<K, V>
where
    K: Hash,
    V: Hash,
{
    inner: Vec<(K, V)>,
}

impl<K, V> PartialEq for TagMap<K, V>
where
    K: Hash + PartialEq,
    V: Hash + PartialEq,
{
    fn eq(&self, other: &TagMap<K, V>) -> bool {
        self.inner == other.inner
    }
}

impl<'a, K, V> IntoIterator for &'a TagMap<K, V>
where
    K: Hash,
    V: Hash,
{
    type Item = &'a (K, V);
    type IntoIter = Iter<'a, (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K, V> TagMap<K, V>
where
    K: cmp::Ord + Hash,
    V: Hash,
{
    /// Iterate the key / value pairs in ascending key order.
    pub fn iter(&self) -> Iter<(K, V)> {
        self.inner.iter()
    }

    /// Get a value from the tagmap, if it exists.
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.inner.binary_search_by(|probe| probe.0.cmp(key)) {
            Ok(idx) => Some(&self.inner[idx].1),
            Err(_) => None,
        }
    }

    /// Determine if the tagmap is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Insert a key / value into self
    ///
    /// This method will return the value previously stored under the given
    /// key, if there was such a value.
    pub fn insert(&mut self, key: K, val: V) -> Option<V> {
        match self.inner.binary_search_by(|probe| probe.0.cmp(&key)) {
            Ok(idx) => Some(::std::mem::replace(&mut self.inner[idx].1, val)),
            Err(idx) => {
                self.inner.insert(idx, (key, val));
                None
            }
        }
    }

    /// Return the length of the tagmap. This is the total number of key /
    /// values stored in the map.
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> Default for TagMap<K, V>
where
    K: Hash,
    V: Hash,
{
    fn default() -> TagMap<K, V> {
        TagMap {
            inner: Vec::with_capacity(4),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    #[test]
    fn insert_keeps_keys_sorted() {
        let mut tags: TagMap<String, String> = TagMap::default();
        tags.insert("fqdn".into(), "host1".into());
        tags.insert("cpuid".into(), "all".into());
        tags.insert("device".into(), "sda".into());

        let keys: Vec<&str> = tags.iter().map(|&(ref k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["cpuid", "device", "fqdn"]);
    }

    #[test]
    fn insert_replaces_existing_value() {
        let mut tags: TagMap<String, String> = TagMap::default();
        assert_eq!(None, tags.insert("iface".into(), "eth0".into()));
        assert_eq!(
            Some("eth0".to_string()),
            tags.insert("iface".into(), "eth1".into())
        );
        assert_eq!(1, tags.len());
        assert_eq!(Some(&"eth1".to_string()), tags.get(&"iface".to_string()));
    }

    #[test]
    fn get_missing_key() {
        let mut tags: TagMap<String, String> = TagMap::default();
        assert!(tags.is_empty());
        assert_eq!(None, tags.get(&"disk".to_string()));
        tags.insert("disk".into(), "/dev/sda1".into());
        assert!(!tags.is_empty());
        assert_eq!(None, tags.get(&"device".to_string()));
    }

    #[test]
    fn insertion_order_is_irrelevant() {
        fn inner(pairs: Vec<(u8, u8)>) -> TestResult {
            let mut forward: TagMap<u8, u8> = TagMap::default();
            let mut backward: TagMap<u8, u8> = TagMap::default();
            let mut seen = Vec::new();
            for &(k, v) in &pairs {
                if seen.contains(&k) {
                    continue;
                }
                seen.push(k);
                forward.insert(k, v);
            }
            let mut seen = Vec::new();
            for &(k, v) in pairs.iter().rev() {
                if seen.contains(&k) {
                    continue;
                }
                seen.push(k);
                // keep the value of the first occurrence, as forward did
                let first = pairs.iter().find(|p| p.0 == k).map(|p| p.1).unwrap_or(v);
                backward.insert(k, first);
            }
            assert_eq!(forward, backward);
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .quickcheck(inner as fn(Vec<(u8, u8)>) -> TestResult);
    }
}
