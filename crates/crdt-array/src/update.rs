//! Update records and batches exchanged between replicas.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::StateError;
use crate::item::Item;
use crate::version::VersionVector;

/// Container name used by updates that concern every container.
pub const ALL_CONTAINERS: &str = "*";

/// What an [`Update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UpdateKind {
    /// A single item was inserted.
    Insert,
    /// A single item was tombstoned.
    Delete,
    /// Several items at once.
    Batch,
}

/// A change record, delivered to observers and shipped to other replicas.
///
/// `origin` and `counter` form the timestamp of the operation. For inserts
/// it equals the item's own timestamp; a delete consumes a fresh counter of
/// the deleting site.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[cfg_attr(feature = "serde", serde(bound(deserialize = "T: serde::Deserialize<'de>")))]
pub struct Update<T> {
    /// The kind of change.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: UpdateKind,
    /// The container the change applies to.
    #[cfg_attr(feature = "serde", serde(rename = "containerName"))]
    pub container: String,
    /// Visible index at the origin, for single-item updates.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub index: Option<usize>,
    /// The affected item, for single-item updates.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub item: Option<Item<T>>,
    /// The affected items, for batches.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub items: Vec<Item<T>>,
    /// Site that produced the change.
    #[cfg_attr(feature = "serde", serde(rename = "originSite"))]
    pub origin: String,
    /// Counter of the change at its origin site.
    pub counter: u64,
}

impl<T> Update<T> {
    /// An insert record.
    pub fn insert(
        container: impl Into<String>,
        index: usize,
        item: Item<T>,
        origin: impl Into<String>,
        counter: u64,
    ) -> Self {
        Self {
            kind: UpdateKind::Insert,
            container: container.into(),
            index: Some(index),
            item: Some(item),
            items: Vec::new(),
            origin: origin.into(),
            counter,
        }
    }

    /// A delete record carrying the tombstoned item.
    pub fn delete(
        container: impl Into<String>,
        index: usize,
        item: Item<T>,
        origin: impl Into<String>,
        counter: u64,
    ) -> Self {
        Self {
            kind: UpdateKind::Delete,
            ..Self::insert(container, index, item, origin, counter)
        }
    }

    /// A batch record.
    pub fn batch(
        container: impl Into<String>,
        items: Vec<Item<T>>,
        origin: impl Into<String>,
        counter: u64,
    ) -> Self {
        Self {
            kind: UpdateKind::Batch,
            container: container.into(),
            index: None,
            item: None,
            items,
            origin: origin.into(),
            counter,
        }
    }

    /// Check that the record carries what its kind needs.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.origin.is_empty() {
            return Err(StateError::InvalidItem(format!(
                "{:?} update without an origin site",
                self.kind
            )));
        }
        match self.kind {
            UpdateKind::Insert | UpdateKind::Delete if self.item.is_none() => Err(
                StateError::InvalidItem(format!("{:?} update without an item", self.kind)),
            ),
            _ => Ok(()),
        }
    }
}

/// Items from several containers plus the sender's version vector.
///
/// Produced by the batching layer and by synchronization, consumed by
/// [`Document::apply_batch`](crate::Document::apply_batch).
///
/// The batch holds every item between `base` and `vector`. A receiver adopts
/// `vector` only when it already covers `base`; otherwise it keeps just the
/// items.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Batch<T> {
    /// Items keyed by the container they belong to.
    pub containers: BTreeMap<String, Vec<Item<T>>>,
    /// Causal knowledge the batch brings along.
    pub vector: VersionVector,
    /// Knowledge the batch was computed against.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "VersionVector::is_empty"))]
    pub base: VersionVector,
}

impl<T> Batch<T> {
    /// An empty batch carrying `vector`, computed against nothing.
    #[must_use]
    pub fn new(vector: VersionVector) -> Self {
        Self {
            containers: BTreeMap::new(),
            vector,
            base: VersionVector::new(),
        }
    }

    /// Set the knowledge this batch was computed against.
    #[must_use]
    pub fn with_base(mut self, base: VersionVector) -> Self {
        self.base = base;
        self
    }

    /// Add an item to a container's list.
    pub fn push(&mut self, container: impl Into<String>, item: Item<T>) {
        self.containers.entry(container.into()).or_default().push(item);
    }

    /// Iterate `(container, item)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item<T>)> {
        self.containers
            .iter()
            .flat_map(|(name, items)| items.iter().map(move |item| (name.as_str(), item)))
    }

    /// Total number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.values().map(Vec::len).sum()
    }

    /// Whether the batch carries no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
