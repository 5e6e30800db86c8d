use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::mem;

use crate::item::{Item, Tombstone};
use crate::timestamp::{ItemId, Timestamp};
use crate::Crdt;

/// Stable index of an item inside a [`Sequence`]'s arena.
type Handle = usize;

/// An arena slot: the item plus its cached adjacency.
#[derive(Debug, Clone)]
struct Slot<T> {
    item: Item<T>,
    left: Option<Handle>,
    right: Option<Handle>,
}

/// An ordered container of replicated [`Item`]s.
///
/// Items live in an arena and are addressed by stable handles. The
/// authoritative order is a list of handles; each slot additionally caches
/// its left and right neighbour so local splices relink in constant time.
/// Deleted items stay in the order as tombstones until garbage collection.
///
/// Remote items are placed by [`integrate`](Sequence::integrate) at the
/// first position whose occupant sorts after them under
/// [`Item::ordering`], so replicas that integrate the same items end up with
/// the same order regardless of arrival sequence.
///
/// # Example
///
/// ```
/// use crdt_array::{Item, Sequence, Timestamp};
///
/// let mut list = Sequence::new();
/// list.insert(0, Timestamp::new("s1", 1), 'H');
/// list.insert(1, Timestamp::new("s1", 2), 'i');
///
/// let mut replica = Sequence::new();
/// for item in list.items() {
///     replica.integrate(item.clone());
/// }
///
/// assert_eq!(replica.to_vec(), vec!['H', 'i']);
/// ```
#[derive(Debug, Clone)]
pub struct Sequence<T> {
    slots: Vec<Slot<T>>,
    /// Handles in container order, tombstones included.
    order: Vec<Handle>,
    index: BTreeMap<ItemId, Handle>,
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            order: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<T> Sequence<T> {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `content` at visible `index` under the given timestamp.
    ///
    /// The index is clamped to `[0, len]`. The new item depends on its
    /// predecessor in the raw order, if there is one.
    pub fn insert(&mut self, index: usize, timestamp: Timestamp, content: T) -> &Item<T> {
        let pos = self.raw_position(index);
        let mut item = Item::new(timestamp, content);
        if let Some(&left) = pos.checked_sub(1).and_then(|p| self.order.get(p)) {
            item.add_dependency(self.slots[left].item.id().clone());
        }
        let handle = self.splice(pos, item);
        &self.slots[handle].item
    }

    /// Tombstone the item at visible `index`.
    ///
    /// Returns `None` when the index does not resolve to a visible item.
    pub fn delete(&mut self, index: usize, tombstone: Tombstone) -> Option<&Item<T>> {
        let handle = *self.order.get(self.raw_position(index))?;
        self.mark(handle, tombstone);
        Some(&self.slots[handle].item)
    }

    /// Tombstone the item with the given id.
    ///
    /// Returns `true` if a live item was found and deleted.
    pub fn tombstone(&mut self, id: &ItemId, tombstone: Tombstone) -> bool {
        match self.index.get(id) {
            Some(&handle) => self.mark(handle, tombstone),
            None => false,
        }
    }

    /// Number of visible (non-tombstoned) items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active_items().count()
    }

    /// Number of items including tombstones.
    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no visible items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_items().next().is_none()
    }

    /// The visible item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Item<T>> {
        self.active_items().nth(index)
    }

    /// Look up an item (tombstoned or not) by id.
    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&Item<T>> {
        self.index.get(id).map(|&h| &self.slots[h].item)
    }

    /// Whether an item with this id has been integrated.
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    /// Raw position of the item with this id, tombstones included.
    #[must_use]
    pub fn position(&self, id: &ItemId) -> Option<usize> {
        let handle = *self.index.get(id)?;
        self.order.iter().position(|&h| h == handle)
    }

    /// All items in container order, tombstones included.
    pub fn items(&self) -> impl Iterator<Item = &Item<T>> + '_ {
        self.order.iter().map(move |&h| &self.slots[h].item)
    }

    /// Visible items in container order.
    pub fn active_items(&self) -> impl Iterator<Item = &Item<T>> + '_ {
        self.items().filter(|item| !item.is_deleted())
    }

    /// Visible payloads in container order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.active_items().map(Item::content)
    }

    /// The cached neighbours of an item, as ids.
    #[must_use]
    pub fn neighbors(&self, id: &ItemId) -> Option<(Option<&ItemId>, Option<&ItemId>)> {
        let slot = &self.slots[*self.index.get(id)?];
        let id_of = |h: Option<Handle>| h.map(|h| self.slots[h].item.id());
        Some((id_of(slot.left), id_of(slot.right)))
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
        self.index.clear();
    }

    /// Keep only the items for which `keep` returns `true`.
    ///
    /// Survivors keep their relative order and identity; adjacency is
    /// recomputed. Returns the number of items removed.
    pub fn retain<F: FnMut(&Item<T>) -> bool>(&mut self, mut keep: F) -> usize {
        let before = self.order.len();
        let mut slots: Vec<Option<Slot<T>>> = mem::take(&mut self.slots).into_iter().map(Some).collect();
        let order = mem::take(&mut self.order);
        self.index.clear();

        for handle in order {
            let Some(slot) = slots[handle].take() else {
                continue;
            };
            if keep(&slot.item) {
                let new_handle = self.slots.len();
                self.index.insert(slot.item.id().clone(), new_handle);
                self.slots.push(Slot {
                    item: slot.item,
                    left: None,
                    right: None,
                });
                self.order.push(new_handle);
            }
        }

        self.relink();
        before - self.order.len()
    }

    /// Raw position of the `index`-th visible item, or the raw end when
    /// `index` is past the last visible item.
    fn raw_position(&self, index: usize) -> usize {
        self.order
            .iter()
            .enumerate()
            .filter(|&(_, &h)| !self.slots[h].item.is_deleted())
            .nth(index)
            .map_or(self.order.len(), |(pos, _)| pos)
    }

    /// Place `item` at raw position `pos` and link it to its neighbours.
    fn splice(&mut self, pos: usize, item: Item<T>) -> Handle {
        let handle = self.slots.len();
        let left = pos.checked_sub(1).map(|p| self.order[p]);
        let right = self.order.get(pos).copied();

        if !item.is_deleted() {
            if let Some(l) = left {
                self.slots[l].right = Some(handle);
            }
            if let Some(r) = right {
                self.slots[r].left = Some(handle);
            }
        }

        self.index.insert(item.id().clone(), handle);
        self.slots.push(Slot { item, left, right });
        self.order.insert(pos, handle);
        handle
    }

    /// Tombstone the item behind `handle` and unsplice it from the chain.
    fn mark(&mut self, handle: Handle, tombstone: Tombstone) -> bool {
        if !self.slots[handle].item.mark_deleted(tombstone) {
            return false;
        }
        let (left, right) = (self.slots[handle].left, self.slots[handle].right);
        if let Some(l) = left {
            self.slots[l].right = right;
        }
        if let Some(r) = right {
            self.slots[r].left = left;
        }
        true
    }

    /// Recompute every slot's neighbours from the raw order.
    fn relink(&mut self) {
        for (pos, &handle) in self.order.iter().enumerate() {
            let slot = &mut self.slots[handle];
            slot.left = pos.checked_sub(1).map(|p| self.order[p]);
            slot.right = self.order.get(pos + 1).copied();
        }
    }
}

impl<T: Ord> Sequence<T> {
    /// Merge a remote item into the container.
    ///
    /// Already-known ids are ignored. Otherwise the item goes before the
    /// first occupant that sorts after it. Returns `true` if it was added.
    pub fn integrate(&mut self, item: Item<T>) -> bool {
        if self.index.contains_key(item.id()) {
            return false;
        }
        let pos = self
            .order
            .iter()
            .position(|&h| item.ordering(&self.slots[h].item) == Ordering::Less)
            .unwrap_or(self.order.len());
        self.splice(pos, item);
        true
    }

    /// Integrate an unknown item, or carry a remote tombstone over to a
    /// known one. Returns `true` if the container changed.
    pub fn join(&mut self, item: Item<T>) -> bool {
        if self.contains(item.id()) {
            match item.tombstone() {
                Some(tombstone) => self.tombstone(item.id(), tombstone.clone()),
                None => false,
            }
        } else {
            self.integrate(item)
        }
    }

    /// Re-sort the container by [`Item::ordering`] and rebuild adjacency.
    ///
    /// Local inserts are placed at the index the caller asked for; this
    /// replaces those placements with the order every replica agrees on.
    pub fn normalize(&mut self) {
        let mut order = mem::take(&mut self.order);
        order.sort_by(|&a, &b| self.slots[a].item.ordering(&self.slots[b].item));
        self.order = order;
        self.relink();
    }
}

impl<T: Clone> Sequence<T> {
    /// Collect visible payloads into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: PartialEq> PartialEq for Sequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items().eq(other.items())
    }
}

impl<T: Eq> Eq for Sequence<T> {}

impl<T: Clone + Ord> Crdt for Sequence<T> {
    fn merge(&mut self, other: &Self) {
        for item in other.items() {
            self.join(item.clone());
        }
        self.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(site: &str, counter: u64) -> Timestamp {
        Timestamp::new(site, counter)
    }

    fn ids<T>(seq: &Sequence<T>) -> Vec<alloc::string::String> {
        seq.items().map(|i| alloc::string::ToString::to_string(i.id())).collect()
    }

    fn build(site: &str, values: &[char]) -> Sequence<char> {
        let mut seq = Sequence::new();
        for (i, v) in values.iter().enumerate() {
            seq.insert(i, ts(site, i as u64 + 1), *v);
        }
        seq
    }

    #[test]
    fn new_sequence_is_empty() {
        let seq = Sequence::<char>::new();
        assert!(seq.is_empty());
        assert_eq!(seq.len(), 0);
        assert_eq!(seq.raw_len(), 0);
        assert!(seq.get(0).is_none());
    }

    #[test]
    fn insert_in_order() {
        let seq = build("s1", &['a', 'b', 'c']);
        assert_eq!(seq.to_vec(), vec!['a', 'b', 'c']);
        assert_eq!(seq.get(1).map(Item::content), Some(&'b'));
    }

    #[test]
    fn insert_in_middle_and_head() {
        let mut seq = Sequence::new();
        seq.insert(0, ts("s1", 1), 'a');
        seq.insert(1, ts("s1", 2), 'c');
        seq.insert(1, ts("s1", 3), 'b');
        seq.insert(0, ts("s1", 4), '_');
        assert_eq!(seq.to_vec(), vec!['_', 'a', 'b', 'c']);
    }

    #[test]
    fn insert_index_is_clamped() {
        let mut seq = Sequence::new();
        seq.insert(10, ts("s1", 1), 'a');
        seq.insert(99, ts("s1", 2), 'b');
        assert_eq!(seq.to_vec(), vec!['a', 'b']);
    }

    #[test]
    fn origin_is_left_neighbour() {
        let mut seq = Sequence::new();
        seq.insert(0, ts("s1", 1), 'a');
        let b = seq.insert(1, ts("s1", 2), 'b').clone();
        assert!(b.depends_on(&ts("s1", 1)));

        let head = seq.insert(0, ts("s1", 3), 'z').clone();
        assert!(head.origin().is_empty());
    }

    #[test]
    fn delete_keeps_tombstone() {
        let mut seq = build("s1", &['A', 'B']);
        let removed = seq.delete(0, Tombstone::new(10, "s1")).cloned();

        assert_eq!(removed.as_ref().map(Item::content), Some(&'A'));
        assert_eq!(seq.to_vec(), vec!['B']);
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.raw_len(), 2);

        let raw: Vec<_> = seq.items().collect();
        assert!(raw[0].is_deleted());
        assert_eq!(raw[0].deleted_at(), Some(10));
    }

    #[test]
    fn delete_resolves_visible_index() {
        let mut seq = build("s1", &['a', 'b', 'c']);
        seq.delete(0, Tombstone::default());
        seq.delete(0, Tombstone::default());
        assert_eq!(seq.to_vec(), vec!['c']);
        assert!(seq.item(&ts("s1", 2)).map_or(false, Item::is_deleted));
    }

    #[test]
    fn delete_out_of_range_is_none() {
        let mut seq = build("s1", &['a']);
        assert!(seq.delete(1, Tombstone::default()).is_none());
        seq.delete(0, Tombstone::default());
        assert!(seq.delete(0, Tombstone::default()).is_none());
        assert_eq!(seq.raw_len(), 1);
    }

    #[test]
    fn insert_after_tombstone_lands_before_next_visible() {
        let mut seq = build("s1", &['a', 'b', 'c']);
        seq.delete(1, Tombstone::default());
        seq.insert(1, ts("s1", 4), 'x');
        assert_eq!(seq.to_vec(), vec!['a', 'x', 'c']);
        assert_eq!(ids(&seq), vec!["s1:1", "s1:2", "s1:4", "s1:3"]);
    }

    #[test]
    fn delete_unsplices_neighbours() {
        let mut seq = build("s1", &['a', 'b', 'c']);
        seq.delete(1, Tombstone::default());

        let (left, right) = seq.neighbors(&ts("s1", 1)).unwrap();
        assert_eq!(left, None);
        assert_eq!(right, Some(&ts("s1", 3)));

        let (left, _) = seq.neighbors(&ts("s1", 3)).unwrap();
        assert_eq!(left, Some(&ts("s1", 1)));

        // The tombstone keeps pointing at its old neighbours.
        let (left, right) = seq.neighbors(&ts("s1", 2)).unwrap();
        assert_eq!(left, Some(&ts("s1", 1)));
        assert_eq!(right, Some(&ts("s1", 3)));
    }

    #[test]
    fn tombstone_by_id() {
        let mut seq = build("s1", &['a', 'b']);
        assert!(seq.tombstone(&ts("s1", 2), Tombstone::new(1, "s2")));
        assert!(!seq.tombstone(&ts("s1", 2), Tombstone::new(2, "s3")));
        assert!(!seq.tombstone(&ts("s9", 1), Tombstone::default()));
        assert_eq!(seq.to_vec(), vec!['a']);
        assert_eq!(seq.item(&ts("s1", 2)).and_then(Item::deleted_by), Some("s2"));
    }

    #[test]
    fn integrate_is_idempotent() {
        let mut seq = Sequence::new();
        let item = Item::new(ts("s1", 1), 'a');
        assert!(seq.integrate(item.clone()));
        assert!(!seq.integrate(item));
        assert_eq!(seq.raw_len(), 1);
    }

    #[test]
    fn concurrent_heads_break_tie_by_site() {
        let a = Item::new(ts("s1", 1), 'A');
        let b = Item::new(ts("s2", 1), 'B');

        let mut left = Sequence::new();
        left.integrate(a.clone());
        left.integrate(b.clone());

        let mut right = Sequence::new();
        right.integrate(b);
        right.integrate(a);

        assert_eq!(left.to_vec(), vec!['A', 'B']);
        assert_eq!(left, right);
    }

    #[test]
    fn integrate_commutes_for_many_items() {
        let items: Vec<_> = [("s2", 3), ("s1", 1), ("s3", 1), ("s1", 2), ("s2", 1)]
            .iter()
            .enumerate()
            .map(|(i, (s, c))| Item::new(ts(s, *c), i))
            .collect();

        let mut forward = Sequence::new();
        for item in items.iter().cloned() {
            forward.integrate(item);
        }
        let mut backward = Sequence::new();
        for item in items.iter().rev().cloned() {
            backward.integrate(item);
        }

        assert_eq!(forward, backward);
        assert_eq!(ids(&forward), vec!["s1:1", "s2:1", "s3:1", "s1:2", "s2:3"]);
    }

    #[test]
    fn join_carries_tombstone() {
        let mut seq = build("s1", &['a']);
        let mut deleted = seq.get(0).cloned().unwrap();
        deleted.mark_deleted(Tombstone::new(3, "s2"));

        assert!(seq.join(deleted.clone()));
        assert!(!seq.join(deleted));
        assert!(seq.is_empty());
        assert_eq!(seq.raw_len(), 1);
    }

    #[test]
    fn join_unknown_tombstone_integrates_it() {
        let mut seq = Sequence::new();
        let mut deleted = Item::new(ts("s2", 1), 'x');
        deleted.mark_deleted(Tombstone::default());
        assert!(seq.join(deleted));
        assert!(seq.is_empty());
        assert_eq!(seq.raw_len(), 1);

        // The original insert arriving later does not resurrect it.
        assert!(!seq.join(Item::new(ts("s2", 1), 'x')));
        assert!(seq.is_empty());
    }

    #[test]
    fn normalize_restores_comparator_order() {
        let mut seq = Sequence::new();
        seq.insert(0, ts("s1", 1), 'a');
        seq.insert(0, ts("s1", 2), 'b');
        assert_eq!(seq.to_vec(), vec!['b', 'a']);

        seq.normalize();
        assert_eq!(seq.to_vec(), vec!['a', 'b']);
        let (left, right) = seq.neighbors(&ts("s1", 2)).unwrap();
        assert_eq!(left, Some(&ts("s1", 1)));
        assert_eq!(right, None);
    }

    #[test]
    fn retain_preserves_order_and_identity() {
        let mut seq = build("s1", &['a', 'b', 'c', 'd']);
        seq.delete(1, Tombstone::default());
        let before: Vec<_> = seq.items().filter(|i| !i.is_deleted()).cloned().collect();

        let removed = seq.retain(|item| !item.is_deleted());
        assert_eq!(removed, 1);
        assert_eq!(seq.raw_len(), 3);
        assert_eq!(seq.items().cloned().collect::<Vec<_>>(), before);
        assert!(!seq.contains(&ts("s1", 2)));
        assert_eq!(seq.position(&ts("s1", 3)), Some(1));

        let (left, right) = seq.neighbors(&ts("s1", 3)).unwrap();
        assert_eq!(left, Some(&ts("s1", 1)));
        assert_eq!(right, Some(&ts("s1", 4)));
    }

    #[test]
    fn clear_empties_everything() {
        let mut seq = build("s1", &['a', 'b']);
        seq.clear();
        assert_eq!(seq.raw_len(), 0);
        assert!(!seq.contains(&ts("s1", 1)));
    }

    #[test]
    fn merge_converges_and_is_idempotent() {
        let mut r1 = build("s1", &['x', 'y']);
        let mut r2 = build("s2", &['z']);
        r1.normalize();

        let mut left = r1.clone();
        left.merge(&r2);
        r2.merge(&r1);
        assert_eq!(left, r2);

        let snapshot = left.clone();
        left.merge(&snapshot);
        assert_eq!(left, snapshot);
    }

    #[test]
    fn merge_with_deletions() {
        let mut r1 = build("s1", &['a', 'b', 'c']);
        let mut r2 = r1.clone();

        r1.delete(1, Tombstone::default());
        r2.insert(3, ts("s2", 1), 'd');

        r1.merge(&r2);
        r2.merge(&r1);
        assert_eq!(r1.to_vec(), r2.to_vec());
        assert!(!r1.to_vec().contains(&'b'));
        assert!(r1.to_vec().contains(&'d'));
    }
}
