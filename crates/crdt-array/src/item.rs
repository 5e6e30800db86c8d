use alloc::collections::BTreeSet;
use alloc::string::String;
use core::cmp::Ordering;

use crate::timestamp::{ItemId, Timestamp};

/// Deletion metadata of a tombstoned [`Item`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tombstone {
    /// Milliseconds timestamp of the deletion, if known.
    pub deleted_at: Option<u64>,
    /// Site that performed the deletion, if known.
    pub deleted_by: Option<String>,
}

impl Tombstone {
    /// Tombstone recorded by `site` at time `at`.
    pub fn new(at: u64, site: impl Into<String>) -> Self {
        Self {
            deleted_at: Some(at),
            deleted_by: Some(site.into()),
        }
    }
}

/// One element of a replicated sequence.
///
/// The id is derived from the timestamp of the insert that created the item.
/// Deleting an item sets its tombstone, which is never cleared; the item
/// stays in its container to keep the order stable for later merges.
///
/// `origin` holds the ids this item causally depends on. It is seeded with
/// the left neighbour at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item<T> {
    timestamp: Timestamp,
    content: T,
    tombstone: Option<Tombstone>,
    origin: BTreeSet<ItemId>,
}

impl<T> Item<T> {
    /// Create a live item with an empty origin set.
    pub fn new(timestamp: Timestamp, content: T) -> Self {
        Self {
            timestamp,
            content,
            tombstone: None,
            origin: BTreeSet::new(),
        }
    }

    /// The item's unique id.
    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.timestamp
    }

    /// The timestamp of the insert that created this item.
    #[must_use]
    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    /// The payload.
    #[must_use]
    pub fn content(&self) -> &T {
        &self.content
    }

    /// Consume the item, returning its payload.
    pub fn into_content(self) -> T {
        self.content
    }

    /// Whether the item has been deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.tombstone.is_some()
    }

    /// Deletion metadata, if the item is tombstoned.
    #[must_use]
    pub fn tombstone(&self) -> Option<&Tombstone> {
        self.tombstone.as_ref()
    }

    /// When the item was deleted, if known.
    #[must_use]
    pub fn deleted_at(&self) -> Option<u64> {
        self.tombstone.as_ref().and_then(|t| t.deleted_at)
    }

    /// Which site deleted the item, if known.
    #[must_use]
    pub fn deleted_by(&self) -> Option<&str> {
        self.tombstone.as_ref().and_then(|t| t.deleted_by.as_deref())
    }

    /// Tombstone the item. Returns `false` if it was already deleted, in
    /// which case the original metadata is kept.
    pub fn mark_deleted(&mut self, tombstone: Tombstone) -> bool {
        if self.tombstone.is_some() {
            return false;
        }
        self.tombstone = Some(tombstone);
        true
    }

    /// The ids this item causally depends on.
    #[must_use]
    pub fn origin(&self) -> &BTreeSet<ItemId> {
        &self.origin
    }

    /// Record a causal dependency on `id`.
    pub fn add_dependency(&mut self, id: ItemId) {
        self.origin.insert(id);
    }

    /// Whether this item depends on `id`.
    #[must_use]
    pub fn depends_on(&self, id: &ItemId) -> bool {
        self.origin.contains(id)
    }

    /// Iterate the dependency ids.
    pub fn dependencies(&self) -> impl Iterator<Item = &ItemId> {
        self.origin.iter()
    }

    /// Neither item depends on the other.
    #[must_use]
    pub fn is_concurrent(&self, other: &Self) -> bool {
        !self.depends_on(other.id()) && !other.depends_on(self.id())
    }
}

impl<T: Ord> Item<T> {
    /// The deterministic placement order: counter, then site id, then
    /// content. Every replica sorts the same item set identically with it.
    #[must_use]
    pub fn ordering(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.content.cmp(&other.content))
    }
}

#[cfg(feature = "serde")]
mod wire {
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Item, Tombstone};
    use crate::timestamp::{ItemId, Timestamp};

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ItemRef<'a, T> {
        id: String,
        content: &'a T,
        timestamp: &'a Timestamp,
        tombstone: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        deleted_at: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        deleted_by: Option<&'a str>,
        origin: Vec<String>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct ItemOwned<T> {
        id: Option<String>,
        content: T,
        timestamp: Timestamp,
        #[serde(default)]
        tombstone: bool,
        #[serde(default)]
        deleted_at: Option<u64>,
        #[serde(default)]
        deleted_by: Option<String>,
        #[serde(default)]
        origin: Vec<String>,
    }

    impl<T: Serialize> Serialize for Item<T> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            ItemRef {
                id: self.timestamp.to_string(),
                content: &self.content,
                timestamp: &self.timestamp,
                tombstone: self.is_deleted(),
                deleted_at: self.deleted_at(),
                deleted_by: self.deleted_by(),
                origin: self.origin.iter().map(ToString::to_string).collect(),
            }
            .serialize(serializer)
        }
    }

    impl<'de, T: Deserialize<'de>> Deserialize<'de> for Item<T> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let raw = ItemOwned::<T>::deserialize(deserializer)?;

            if let Some(id) = &raw.id {
                if *id != raw.timestamp.to_string() {
                    return Err(D::Error::custom(alloc::format!(
                        "item id {id:?} does not match its timestamp {}",
                        raw.timestamp
                    )));
                }
            }

            let mut item = Item::new(raw.timestamp, raw.content);
            for dep in raw.origin {
                let dep: ItemId = dep.parse().map_err(D::Error::custom)?;
                item.add_dependency(dep);
            }
            if raw.tombstone {
                item.mark_deleted(Tombstone {
                    deleted_at: raw.deleted_at,
                    deleted_by: raw.deleted_by,
                });
            }
            Ok(item)
        }
    }
}
