//! Operation-based application of updates.
//!
//! Besides state merging, replicas exchange individual operations: every
//! local insert or delete produces an [`Update`](crate::Update) record that
//! can be broadcast and applied on other replicas, in any order and any
//! number of times.

use crate::Crdt;

/// A CRDT that can apply discrete operations produced by another replica.
///
/// ```text
/// local edit ──► Update ──► transport ──► apply_op() ──► converged state
/// ```
///
/// For convergence `apply_op` must be:
/// - **Commutative** for concurrent operations
/// - **Idempotent**: applying the same op twice has no additional effect
pub trait OpCrdt: Crdt {
    /// The operation type this CRDT produces.
    type Op;

    /// Apply an operation to the current state.
    fn apply_op(&mut self, op: &Self::Op);
}
