/// Core trait for state-based merging.
///
/// A replica merges another replica's state into its own so that both end up
/// holding the least upper bound of what either has seen.
///
/// # Properties
///
/// All implementations must satisfy:
/// - **Commutativity:** `a.merge(b) == b.merge(a)`
/// - **Associativity:** `a.merge(b.merge(c)) == a.merge(b).merge(c)`
/// - **Idempotency:** `a.merge(a) == a`
pub trait Crdt {
    /// Merge another replica's state into this one.
    fn merge(&mut self, other: &Self);
}

/// Extension trait for delta-state synchronization.
///
/// Instead of shipping full state, a replica produces the part of its state
/// another replica is missing and the other side applies just that.
///
/// # Example
///
/// ```
/// use crdt_array::prelude::*;
///
/// let mut a: Document<&str> = Document::new("s1");
/// a.insert("list", 0, "x");
///
/// let mut b: Document<&str> = Document::new("s2");
/// let delta = a.delta(&b);
/// b.apply_delta(&delta);
///
/// assert_eq!(b.to_vec("list"), vec!["x"]);
/// ```
pub trait DeltaCrdt: Crdt {
    /// The type of delta produced by this CRDT.
    type Delta;

    /// Generate a delta containing changes in `self` that `other` does not have.
    fn delta(&self, other: &Self) -> Self::Delta;

    /// Apply a delta to this replica's state.
    fn apply_delta(&mut self, delta: &Self::Delta);
}
