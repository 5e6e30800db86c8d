//! Deduplication of outgoing items before a synchronization batch.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::item::Item;
use crate::timestamp::ItemId;

/// An item queued for transmission, tagged with the slot it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<T> {
    /// Container the item belongs to.
    pub container: String,
    /// Id of the item's left neighbour, if any.
    pub left: Option<ItemId>,
    /// Id of the item's right neighbour, if any.
    pub right: Option<ItemId>,
    /// The item itself.
    pub item: Item<T>,
}

type SlotKey = (String, Option<ItemId>, Option<ItemId>);

/// Keep only the highest-counter candidate per `(container, left, right)`
/// slot. On equal counters the first candidate seen wins.
///
/// Output preserves the order in which slots were first seen.
pub fn compress<T, I>(candidates: I) -> Vec<Candidate<T>>
where
    I: IntoIterator<Item = Candidate<T>>,
{
    let mut slots: BTreeMap<SlotKey, usize> = BTreeMap::new();
    let mut kept: Vec<Candidate<T>> = Vec::new();

    for candidate in candidates {
        let key = (
            candidate.container.clone(),
            candidate.left.clone(),
            candidate.right.clone(),
        );
        match slots.get(&key) {
            Some(&at) => {
                if candidate.item.timestamp().counter() > kept[at].item.timestamp().counter() {
                    kept[at] = candidate;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(candidate);
            }
        }
    }

    kept
}
