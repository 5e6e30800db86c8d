//! Version vectors for causal delivery tracking.
//!
//! A [`VersionVector`] maps each site to the highest counter this replica
//! knows that site has produced. It answers "has this operation already been
//! applied?" and compares the progress of two replicas.

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::cmp::Ordering;

use crate::timestamp::Timestamp;
use crate::Crdt;

/// Relationship between two version vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Causality {
    /// Both vectors hold the same counter for every site.
    Equal,
    /// `self` dominates `other` and differs on at least one site.
    Greater,
    /// `other` dominates `self` and differs on at least one site.
    Less,
    /// Neither vector dominates the other.
    Concurrent,
}

/// Per-site high-water marks.
///
/// A missing site counts as `0`. Counters only ever rise over the life of a
/// replica.
///
/// # Example
///
/// ```
/// use crdt_array::{Causality, VersionVector};
///
/// let a: VersionVector = [("s1", 3), ("s2", 1)].into_iter().collect();
/// let b: VersionVector = [("s1", 3), ("s2", 2)].into_iter().collect();
/// let c: VersionVector = [("s1", 1), ("s2", 3)].into_iter().collect();
///
/// assert_eq!(a.compare(&b), Causality::Less);
/// assert_eq!(a.compare(&c), Causality::Concurrent);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VersionVector {
    versions: BTreeMap<String, u64>,
}

impl VersionVector {
    /// Create an empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The highest counter known for `site`, or `0`.
    #[must_use]
    pub fn get(&self, site: &str) -> u64 {
        self.versions.get(site).copied().unwrap_or(0)
    }

    /// Raise the counter for `site` to `counter`.
    ///
    /// Lower values are ignored. Returns `true` if the stored value changed.
    pub fn update(&mut self, site: &str, counter: u64) -> bool {
        if counter <= self.get(site) {
            return false;
        }
        self.versions.insert(site.into(), counter);
        true
    }

    /// Whether an operation `(site, counter)` is covered by this vector.
    #[must_use]
    pub fn has_seen(&self, site: &str, counter: u64) -> bool {
        counter <= self.get(site)
    }

    /// Whether the operation stamped `ts` has already been applied.
    #[must_use]
    pub fn has_applied(&self, ts: &Timestamp) -> bool {
        self.has_seen(ts.site(), ts.counter())
    }

    /// Compare pointwise over the union of known sites.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Causality {
        let mut greater = false;
        let mut less = false;

        for site in self.versions.keys().chain(other.versions.keys()) {
            match self.get(site).cmp(&other.get(site)) {
                Ordering::Greater => greater = true,
                Ordering::Less => less = true,
                Ordering::Equal => {}
            }
            if greater && less {
                return Causality::Concurrent;
            }
        }

        match (greater, less) {
            (false, false) => Causality::Equal,
            (true, false) => Causality::Greater,
            (false, true) => Causality::Less,
            (true, true) => Causality::Concurrent,
        }
    }

    /// Iterate `(site, counter)` pairs in site order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.versions.iter().map(|(site, c)| (site.as_str(), *c))
    }

    /// Number of sites with an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether no site has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl Crdt for VersionVector {
    fn merge(&mut self, other: &Self) {
        for (site, counter) in other.iter() {
            self.update(site, counter);
        }
    }
}

impl PartialEq for VersionVector {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Causality::Equal
    }
}

impl Eq for VersionVector {}

impl PartialOrd for VersionVector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.compare(other) {
            Causality::Equal => Some(Ordering::Equal),
            Causality::Greater => Some(Ordering::Greater),
            Causality::Less => Some(Ordering::Less),
            Causality::Concurrent => None,
        }
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for VersionVector {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut vector = Self::new();
        for (site, counter) in iter {
            let site = site.into();
            vector.update(&site, counter);
        }
        vector
    }
}

impl From<BTreeMap<String, u64>> for VersionVector {
    fn from(versions: BTreeMap<String, u64>) -> Self {
        versions.into_iter().collect()
    }
}

impl From<VersionVector> for BTreeMap<String, u64> {
    fn from(vector: VersionVector) -> Self {
        vector.versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vv(entries: &[(&str, u64)]) -> VersionVector {
        entries.iter().map(|(s, c)| (*s, *c)).collect()
    }

    #[test]
    fn missing_site_is_zero() {
        let v = VersionVector::new();
        assert_eq!(v.get("s1"), 0);
        assert!(v.is_empty());
    }

    #[test]
    fn update_only_raises() {
        let mut v = VersionVector::new();
        assert!(v.update("s1", 3));
        assert!(!v.update("s1", 2));
        assert!(!v.update("s1", 3));
        assert_eq!(v.get("s1"), 3);
    }

    #[test]
    fn has_applied_checks_high_water_mark() {
        let v = vv(&[("s1", 3)]);
        assert!(v.has_applied(&Timestamp::new("s1", 1)));
        assert!(v.has_applied(&Timestamp::new("s1", 3)));
        assert!(!v.has_applied(&Timestamp::new("s1", 4)));
        assert!(!v.has_applied(&Timestamp::new("s2", 1)));
    }

    #[test]
    fn compare_cases() {
        let a = vv(&[("s1", 3), ("s2", 1)]);
        assert_eq!(a.compare(&vv(&[("s1", 3), ("s2", 2)])), Causality::Less);
        assert_eq!(a.compare(&vv(&[("s1", 1), ("s2", 3)])), Causality::Concurrent);
        assert_eq!(a.compare(&vv(&[("s1", 3)])), Causality::Greater);
        assert_eq!(a.compare(&a.clone()), Causality::Equal);
        assert_eq!(VersionVector::new().compare(&VersionVector::new()), Causality::Equal);
    }

    #[test]
    fn explicit_zero_equals_absent() {
        let mut map = BTreeMap::new();
        map.insert("s1".into(), 0);
        let with_zero = VersionVector { versions: map };
        assert_eq!(with_zero, VersionVector::new());
    }

    #[test]
    fn partial_ord_matches_compare() {
        let a = vv(&[("s1", 1)]);
        let b = vv(&[("s1", 2)]);
        let c = vv(&[("s2", 1)]);
        assert!(a < b);
        assert!(b > a);
        assert_eq!(a.partial_cmp(&c), None);
    }

    #[test]
    fn merge_takes_pointwise_max() {
        let mut a = vv(&[("s1", 3), ("s2", 1)]);
        let b = vv(&[("s1", 1), ("s2", 4), ("s3", 2)]);
        a.merge(&b);
        assert_eq!(a, vv(&[("s1", 3), ("s2", 4), ("s3", 2)]));
    }

    #[test]
    fn merge_is_commutative_and_idempotent() {
        let a = vv(&[("s1", 3), ("s2", 1)]);
        let b = vv(&[("s2", 5)]);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab, ba);

        let snapshot = ab.clone();
        ab.merge(&snapshot);
        assert_eq!(ab, snapshot);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_plain_map() {
        let v = vv(&[("s1", 3), ("s2", 1)]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"s1":3,"s2":1}"#);
        let back: VersionVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
