//! The replicated document: named sequences, causal bookkeeping, observers
//! and the cooperative background tasks.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use tracing::{debug, info, trace};

use crate::batch::{BatchManager, DEFAULT_BATCH_DELAY_MS};
use crate::clock::{self, TimeSource};
use crate::compressor::{self, Candidate};
use crate::error::StateError;
use crate::events::OpCrdt;
use crate::gc::{GarbageCollector, DEFAULT_GC_INTERVAL_MS, DEFAULT_GC_MAX_AGE_MS};
use crate::item::{Item, Tombstone};
use crate::sequence::Sequence;
use crate::state::DocState;
use crate::timestamp::Timestamp;
use crate::update::{Batch, Update, UpdateKind, ALL_CONTAINERS};
use crate::version::{Causality, VersionVector};
use crate::{Crdt, DeltaCrdt};

/// Callback invoked synchronously for every change a document applies.
pub type Observer<T> = Box<dyn FnMut(&Update<T>)>;

/// Handle returned by [`Document::observe`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

/// Tunables of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Debounce delay before local changes are flushed as a batch.
    pub batch_delay_ms: u64,
    /// Time between garbage collection passes.
    pub gc_interval_ms: u64,
    /// How long tombstones are retained.
    pub gc_max_age_ms: u64,
    /// Whether periodic garbage collection runs at all.
    pub gc_enabled: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            gc_interval_ms: DEFAULT_GC_INTERVAL_MS,
            gc_max_age_ms: DEFAULT_GC_MAX_AGE_MS,
            gc_enabled: true,
        }
    }
}

/// Builder for a [`Document`] with custom configuration or time source.
///
/// ```
/// use crdt_array::clock::ManualClock;
/// use crdt_array::Document;
///
/// let clock = ManualClock::new(0);
/// let doc: Document<u32> = Document::builder("s1")
///     .batch_delay_ms(10)
///     .gc_enabled(false)
///     .clock(clock.clone())
///     .build();
///
/// assert_eq!(doc.config().batch_delay_ms, 10);
/// assert_eq!(doc.next_deadline(), None);
/// ```
pub struct DocumentBuilder<T> {
    site: String,
    config: DocumentConfig,
    clock: Option<Arc<dyn TimeSource>>,
    marker: PhantomData<fn() -> T>,
}

impl<T> DocumentBuilder<T> {
    /// Replace the whole configuration.
    pub fn config(mut self, config: DocumentConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the batch debounce delay.
    pub fn batch_delay_ms(mut self, ms: u64) -> Self {
        self.config.batch_delay_ms = ms;
        self
    }

    /// Set the garbage collection interval.
    pub fn gc_interval_ms(mut self, ms: u64) -> Self {
        self.config.gc_interval_ms = ms;
        self
    }

    /// Set the tombstone retention window.
    pub fn gc_max_age_ms(mut self, ms: u64) -> Self {
        self.config.gc_max_age_ms = ms;
        self
    }

    /// Enable or disable periodic garbage collection.
    pub fn gc_enabled(mut self, enabled: bool) -> Self {
        self.config.gc_enabled = enabled;
        self
    }

    /// Use `clock` instead of the system clock.
    pub fn clock(self, clock: impl TimeSource + 'static) -> Self {
        self.shared_clock(Arc::new(clock))
    }

    /// Use an already shared time source.
    pub fn shared_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the document and start its garbage collector.
    pub fn build(self) -> Document<T> {
        let clock = self.clock.unwrap_or_else(clock::default_source);
        let mut gc = GarbageCollector::new(self.config.gc_max_age_ms, self.config.gc_interval_ms);
        if self.config.gc_enabled {
            gc.start(clock.now_ms());
        }
        Document {
            site: self.site,
            containers: BTreeMap::new(),
            version: VersionVector::new(),
            ahead: BTreeMap::new(),
            counter: 0,
            flushed: 0,
            observers: BTreeMap::new(),
            next_observer: 0,
            batch: BatchManager::new(self.config.batch_delay_ms),
            gc,
            clock,
            config: self.config,
        }
    }
}

/// Summary counters of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocStats {
    /// Number of containers.
    pub container_count: usize,
    /// Items across all containers, tombstones included.
    pub item_count: usize,
    /// Registered observers.
    pub observer_count: usize,
    /// The document's version vector.
    pub version: VersionVector,
}

/// What a call to [`Document::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A pending batch was flushed.
    pub flushed: bool,
    /// Items removed by a garbage collection pass.
    pub collected: usize,
}

/// A replica holding named sequence containers.
///
/// Local edits advance the document's own counter and are reported to
/// observers immediately. Remote work arrives through
/// [`receive_update`](Self::receive_update), [`apply_batch`](Self::apply_batch)
/// or [`sync`](Self::sync); every path is idempotent.
///
/// Background work (batch flushes and tombstone collection) is cooperative:
/// call [`tick`](Self::tick) at or after [`next_deadline`](Self::next_deadline).
///
/// # Example
///
/// ```
/// use crdt_array::Document;
///
/// let mut s1: Document<&str> = Document::new("s1");
/// let mut s2: Document<&str> = Document::new("s2");
///
/// s1.insert("list", 0, "X");
/// s1.insert("list", 1, "Y");
/// s2.insert("list", 0, "Z");
///
/// s1.sync(&mut s2);
///
/// assert_eq!(s1.to_vec("list"), vec!["X", "Z", "Y"]);
/// assert_eq!(s1.to_vec("list"), s2.to_vec("list"));
/// ```
pub struct Document<T> {
    site: String,
    containers: BTreeMap<String, Sequence<T>>,
    /// Contiguous per-site knowledge: every operation at or below an entry
    /// has been received.
    version: VersionVector,
    /// Counters received above `version`, waiting for the gap to close.
    ahead: BTreeMap<String, BTreeSet<u64>>,
    /// Last counter this site handed out. Survives `clear`.
    counter: u64,
    /// Own counter at the last flush.
    flushed: u64,
    observers: BTreeMap<ObserverId, Observer<T>>,
    next_observer: u64,
    batch: BatchManager<T>,
    gc: GarbageCollector,
    clock: Arc<dyn TimeSource>,
    config: DocumentConfig,
}

impl<T> Document<T> {
    /// A document for `site` with default configuration and the system clock.
    pub fn new(site: impl Into<String>) -> Self {
        Self::builder(site).build()
    }

    /// Start configuring a document for `site`.
    pub fn builder(site: impl Into<String>) -> DocumentBuilder<T> {
        DocumentBuilder {
            site: site.into(),
            config: DocumentConfig::default(),
            clock: None,
            marker: PhantomData,
        }
    }

    /// This replica's site id.
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// The version vector.
    #[must_use]
    pub fn version(&self) -> &VersionVector {
        &self.version
    }

    /// A copy of the version vector.
    #[must_use]
    pub fn state_vector(&self) -> VersionVector {
        self.version.clone()
    }

    /// The container called `name`, if it exists.
    #[must_use]
    pub fn container(&self, name: &str) -> Option<&Sequence<T>> {
        self.containers.get(name)
    }

    /// All containers with their names.
    pub fn containers(&self) -> impl Iterator<Item = (&str, &Sequence<T>)> + '_ {
        self.containers.iter().map(|(name, seq)| (name.as_str(), seq))
    }

    /// Names of all containers.
    pub fn container_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.containers.keys().map(String::as_str)
    }

    /// Register a callback for every applied change.
    pub fn observe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&Update<T>) + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.insert(id, Box::new(observer));
        id
    }

    /// Unregister an observer. Returns `false` if it was already gone.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.observers.remove(&id).is_some()
    }

    /// When [`tick`](Self::tick) next has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.batch.deadline(), self.gc.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Counters describing the document.
    #[must_use]
    pub fn stats(&self) -> DocStats {
        DocStats {
            container_count: self.containers.len(),
            item_count: self.containers.values().map(Sequence::raw_len).sum(),
            observer_count: self.observers.len(),
            version: self.version.clone(),
        }
    }

    /// Drop tombstones older than the retention window now.
    pub fn collect_garbage(&mut self) -> usize {
        let now = self.now();
        self.collect_at(now)
    }

    /// Remove every container, reset causal knowledge and discard pending
    /// batches. Observers receive a batch update for container `"*"`.
    ///
    /// The site's own counter keeps counting, so ids are never reused.
    pub fn clear(&mut self) {
        self.containers.clear();
        self.version = VersionVector::new();
        self.ahead.clear();
        self.batch.clear();
        self.flushed = self.counter;
        debug!(site = %self.site, "document cleared");
        let counter = self.version.get(&self.site);
        let notice = Update::batch(ALL_CONTAINERS, Vec::new(), self.site.clone(), counter);
        self.notify(&notice);
    }

    /// Stop background tasks, drop observers and clear the document.
    pub fn destroy(&mut self) {
        self.gc.stop();
        self.batch.clear();
        self.observers.clear();
        self.clear();
    }

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn notify(&mut self, update: &Update<T>) {
        for observer in self.observers.values_mut() {
            observer(update);
        }
    }

    fn collect_at(&mut self, now: u64) -> usize {
        let removed = self.gc.collect(self.containers.values_mut(), now);
        if removed > 0 {
            info!(site = %self.site, removed, "garbage collected tombstones");
        }
        removed
    }

    fn container_mut(&mut self, name: &str) -> &mut Sequence<T> {
        self.containers.entry(String::from(name)).or_default()
    }

    fn next_counter(&mut self) -> u64 {
        self.counter = self.counter.saturating_add(1);
        self.counter
    }

    /// Whether operation `(site, counter)` has been received.
    fn knows(&self, site: &str, counter: u64) -> bool {
        self.version.has_seen(site, counter)
            || self.ahead.get(site).map_or(false, |seen| seen.contains(&counter))
    }

    /// Note that operation `(site, counter)` has been received.
    fn record(&mut self, site: &str, counter: u64) {
        if self.knows(site, counter) {
            return;
        }
        if self.version.get(site).checked_add(1) == Some(counter) && !self.ahead.contains_key(site) {
            self.version.update(site, counter);
            return;
        }
        let seen = self.ahead.entry(String::from(site)).or_default();
        seen.insert(counter);
        if !advance(&mut self.version, site, seen) {
            self.ahead.remove(site);
        }
    }

    /// Adopt `vector` wholesale. This site's entry never passes its own counter.
    fn adopt(&mut self, vector: &VersionVector) {
        for (site, counter) in vector.iter() {
            let counter = if site == self.site {
                counter.min(self.counter)
            } else {
                counter
            };
            self.version.update(site, counter);
        }
        let version = &mut self.version;
        self.ahead.retain(|site, seen| advance(version, site, seen));
    }
}

/// Drop counters of `site` already covered by `version` and raise it over
/// those that now follow on. Returns `false` once nothing is left ahead.
fn advance(version: &mut VersionVector, site: &str, seen: &mut BTreeSet<u64>) -> bool {
    let mut known = version.get(site);
    match known.checked_add(1) {
        Some(next) => *seen = seen.split_off(&next),
        None => seen.clear(),
    }
    while known < u64::MAX && seen.remove(&(known + 1)) {
        known += 1;
    }
    version.update(site, known);
    !seen.is_empty()
}

impl<T: Clone + Ord> Document<T> {
    /// Insert `content` at visible `index` of `container`.
    ///
    /// The container is created on first use and the index is clamped to
    /// its length. Returns the new item.
    pub fn insert(&mut self, container: &str, index: usize, content: T) -> Item<T> {
        let counter = self.next_counter();
        let timestamp = Timestamp::new(self.site.clone(), counter);
        let seq = self.container_mut(container);
        let index = index.min(seq.len());
        let item = seq.insert(index, timestamp, content).clone();

        self.record_own(counter);
        let now = self.now();
        self.batch.register(container, item.clone(), now);
        trace!(site = %self.site, container, index, counter, "local insert");

        let update = Update::insert(container, index, item.clone(), self.site.clone(), counter);
        self.notify(&update);
        item
    }

    /// Tombstone the visible item at `index` of `container`.
    ///
    /// Returns `None`, without consuming a counter or notifying anyone, when
    /// the index is out of range.
    pub fn delete(&mut self, container: &str, index: usize) -> Option<Item<T>> {
        let now = self.now();
        let tombstone = Tombstone::new(now, self.site.clone());
        let item = self.container_mut(container).delete(index, tombstone)?.clone();

        let counter = self.next_counter();
        self.record_own(counter);
        self.batch.register(container, item.clone(), now);
        trace!(site = %self.site, container, index, counter, "local delete");

        let update = Update::delete(container, index, item.clone(), self.site.clone(), counter);
        self.notify(&update);
        Some(item)
    }

    /// Apply an update produced by another replica.
    ///
    /// Updates may arrive in any order, including out of order from one site.
    /// Returns `false` when the update was already applied, is malformed, or
    /// claims to come from this document's own site.
    pub fn receive_update(&mut self, update: &Update<T>) -> bool {
        if let Err(err) = update.validate() {
            debug!(site = %self.site, %err, "ignoring malformed update");
            return false;
        }
        if update.origin == self.site {
            debug!(site = %self.site, counter = update.counter, "ignoring update from own site");
            return false;
        }
        let known = self.knows(&update.origin, update.counter);
        if known && update.kind != UpdateKind::Batch {
            debug!(
                site = %self.site,
                origin = %update.origin,
                counter = update.counter,
                "update already applied"
            );
            return false;
        }

        let mut changed = false;
        match update.kind {
            UpdateKind::Insert => {
                if let Some(item) = &update.item {
                    changed = self.container_mut(&update.container).join(item.clone());
                    self.record(item.timestamp().site(), item.timestamp().counter());
                }
            }
            UpdateKind::Delete => {
                if let Some(item) = &update.item {
                    let mut item = item.clone();
                    if !item.is_deleted() {
                        item.mark_deleted(Tombstone::new(self.now(), update.origin.clone()));
                    }
                    self.record(item.timestamp().site(), item.timestamp().counter());
                    changed = self.container_mut(&update.container).join(item);
                }
            }
            UpdateKind::Batch if update.container == ALL_CONTAINERS => {}
            UpdateKind::Batch => {
                let seq = self.container_mut(&update.container);
                for item in &update.items {
                    changed |= seq.join(item.clone());
                }
                seq.normalize();
                for item in &update.items {
                    self.record(item.timestamp().site(), item.timestamp().counter());
                }
            }
        }
        self.record(&update.origin, update.counter);
        if known && !changed {
            return false;
        }

        trace!(
            site = %self.site,
            kind = ?update.kind,
            origin = %update.origin,
            counter = update.counter,
            changed,
            "applied remote update"
        );
        self.notify(update);
        true
    }

    /// Integrate a batch and fold its version vector into this document's.
    ///
    /// Items are applied in a global order (counter, site, container,
    /// content) so the result does not depend on how the batch was built.
    /// Known items only pick up tombstones. Every touched container is
    /// normalized afterwards. The batch's vector is adopted only when this
    /// document already covers the batch's base. Returns the number of items
    /// that changed something.
    pub fn apply_batch(&mut self, batch: &Batch<T>) -> usize {
        let mut pairs: Vec<(&str, &Item<T>)> = batch.iter().collect();
        pairs.sort_by(|(ca, a), (cb, b)| {
            a.timestamp()
                .cmp(b.timestamp())
                .then_with(|| ca.cmp(cb))
                .then_with(|| a.content().cmp(b.content()))
        });

        let mut touched = BTreeSet::new();
        let mut changed = 0;
        let covered = self.version >= batch.base;
        for (name, item) in pairs {
            if self.container_mut(name).join(item.clone()) {
                changed += 1;
            }
            self.record(item.timestamp().site(), item.timestamp().counter());
            touched.insert(name);
        }
        for name in touched {
            self.container_mut(name).normalize();
        }

        if covered {
            self.adopt(&batch.vector);
        }
        trace!(site = %self.site, items = batch.len(), changed, covered, "applied batch");
        changed
    }

    /// Flush pending local changes now.
    ///
    /// The batch is applied locally, which settles optimistic placements into
    /// the order every replica agrees on, and observers receive one batch
    /// update per container. The batch is returned for shipping.
    pub fn flush(&mut self) -> Option<Batch<T>> {
        let base = self
            .version
            .iter()
            .filter(|(site, _)| *site != self.site)
            .chain(core::iter::once((self.site.as_str(), self.flushed)))
            .collect();
        let batch = self.batch.take(self.version.clone())?.with_base(base);
        self.flushed = self.counter;
        debug!(site = %self.site, items = batch.len(), "flushing batch");
        self.apply_batch(&batch);

        let counter = self.version.get(&self.site);
        for (container, items) in &batch.containers {
            let update = Update::batch(container.clone(), items.clone(), self.site.clone(), counter);
            self.notify(&update);
        }
        Some(batch)
    }

    /// Run whatever background work is due.
    pub fn tick(&mut self) -> TickReport {
        let now = self.now();
        let mut report = TickReport::default();
        if self.batch.is_due(now) {
            report.flushed = self.flush().is_some();
        }
        if self.gc.fire(now) {
            report.collected = self.collect_at(now);
        }
        report
    }

    /// Items a replica at `other` is missing, plus every tombstone.
    ///
    /// Every entry of a document's vector is a contiguous prefix, so an item
    /// above `other` is one the replica may lack. Candidates are keyed by
    /// their raw neighbours before [`compressor::compress`]; each position
    /// has its own key, so no item of this document is ever dropped. The
    /// batch carries this document's vector and `other` as its base.
    #[must_use]
    pub fn diff(&self, other: &VersionVector) -> Batch<T> {
        let mut candidates = Vec::new();
        for (name, seq) in &self.containers {
            let items: Vec<&Item<T>> = seq.items().collect();
            for (pos, item) in items.iter().enumerate() {
                if other.has_applied(item.timestamp()) && !item.is_deleted() {
                    continue;
                }
                candidates.push(Candidate {
                    container: name.clone(),
                    left: pos.checked_sub(1).map(|p| items[p].id().clone()),
                    right: items.get(pos + 1).map(|next| next.id().clone()),
                    item: (*item).clone(),
                });
            }
        }

        let mut batch = Batch::new(self.version.clone()).with_base(other.clone());
        for candidate in compressor::compress(candidates) {
            batch.push(candidate.container, candidate.item);
        }
        batch
    }

    /// Exchange missing work with `peer` in both directions.
    ///
    /// Does nothing when both version vectors are equal and neither side
    /// holds operations above its vector. Afterwards both documents hold the
    /// same items in the same order and the same vector.
    pub fn sync(&mut self, peer: &mut Document<T>) {
        let causality = self.version.compare(&peer.version);
        if causality == Causality::Equal && self.ahead.is_empty() && peer.ahead.is_empty() {
            debug!(site = %self.site, peer = %peer.site, "already in sync");
            return;
        }

        let mut joined = self.version.clone();
        joined.merge(&peer.version);

        let mut outgoing = self.diff(&peer.version);
        let mut incoming = peer.diff(&self.version);
        outgoing.vector = joined.clone();
        incoming.vector = joined;

        debug!(
            site = %self.site,
            peer = %peer.site,
            ?causality,
            sent = outgoing.len(),
            received = incoming.len(),
            "syncing"
        );
        peer.apply_batch(&outgoing);
        self.apply_batch(&incoming);

        self.normalize_all();
        peer.normalize_all();
    }

    /// Visible payloads of `container`, empty if it does not exist.
    #[must_use]
    pub fn to_vec(&self, container: &str) -> Vec<T> {
        self.containers
            .get(container)
            .map(Sequence::to_vec)
            .unwrap_or_default()
    }

    /// Snapshot the visible content and version vector.
    #[must_use]
    pub fn get_state(&self) -> DocState<T> {
        DocState {
            containers: self
                .containers
                .iter()
                .map(|(name, seq)| (name.clone(), seq.to_vec()))
                .collect(),
            version: self.version.clone(),
        }
    }

    /// Replace the document's content with a snapshot.
    ///
    /// The replacement is a local edit: visible items are tombstoned and the
    /// snapshot's payloads are inserted as new items of this site, numbered
    /// above anything the snapshot's vector covers. The vector is merged in.
    /// The changes ship with the next flush. On error the document is left
    /// untouched.
    pub fn set_state(&mut self, state: &DocState<T>) -> Result<(), StateError> {
        state.validate()?;
        self.restore(state);
        Ok(())
    }

    /// An independent copy under site id `"<site>:clone"`.
    ///
    /// The copy holds the same items and vector and shares this document's
    /// time source and configuration, but none of its observers or pending
    /// batches.
    #[must_use]
    pub fn fork(&self) -> Document<T> {
        let mut copy: Document<T> = Document::builder(format!("{}:clone", self.site))
            .config(self.config.clone())
            .shared_clock(Arc::clone(&self.clock))
            .build();
        copy.containers = self.containers.clone();
        copy.version = self.version.clone();
        copy.ahead = self.ahead.clone();
        copy
    }

    fn restore(&mut self, state: &DocState<T>) {
        self.counter = self.counter.max(state.version.get(&self.site));
        self.adopt(&state.version);

        let now = self.now();
        let names: Vec<String> = self.containers.keys().cloned().collect();
        for name in &names {
            loop {
                let tombstone = Tombstone::new(now, self.site.clone());
                let item = match self.container_mut(name).delete(0, tombstone) {
                    Some(item) => item.clone(),
                    None => break,
                };
                let counter = self.next_counter();
                self.record_own(counter);
                self.batch.register(name, item, now);
            }
        }

        for (name, payloads) in &state.containers {
            self.container_mut(name);
            for (index, payload) in payloads.iter().enumerate() {
                let counter = self.next_counter();
                let timestamp = Timestamp::new(self.site.clone(), counter);
                let item = self.container_mut(name).insert(index, timestamp, payload.clone()).clone();
                self.record_own(counter);
                self.batch.register(name, item, now);
            }
        }
        debug!(site = %self.site, items = state.len(), "restored snapshot");
    }

    fn record_own(&mut self, counter: u64) {
        let site = self.site.clone();
        self.record(&site, counter);
    }

    fn normalize_all(&mut self) {
        for seq in self.containers.values_mut() {
            seq.normalize();
        }
    }
}

#[cfg(feature = "serde")]
impl<T: Clone + Ord + serde::Serialize> Document<T> {
    /// Encode a snapshot as JSON.
    pub fn to_json(&self) -> Result<String, StateError> {
        self.get_state().to_json()
    }
}

#[cfg(feature = "serde")]
impl<T: Clone + Ord + serde::de::DeserializeOwned> Document<T> {
    /// Build a document for `site` from a JSON snapshot.
    pub fn from_json(json: &str, site: impl Into<String>) -> Result<Self, StateError> {
        let state = DocState::from_json(json)?;
        let mut doc = Self::new(site);
        doc.restore(&state);
        Ok(doc)
    }
}

impl<T: fmt::Debug> fmt::Debug for Document<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("site", &self.site)
            .field("containers", &self.containers)
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .field("pending", &self.batch.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<T: Clone + Ord> Crdt for Document<T> {
    /// Pull everything `other` has that this document lacks.
    fn merge(&mut self, other: &Self) {
        let batch = other.diff(&self.version);
        self.apply_batch(&batch);
    }
}

impl<T: Clone + Ord> DeltaCrdt for Document<T> {
    type Delta = Batch<T>;

    fn delta(&self, other: &Self) -> Batch<T> {
        self.diff(&other.version)
    }

    fn apply_delta(&mut self, delta: &Batch<T>) {
        self.apply_batch(delta);
    }
}

impl<T: Clone + Ord> OpCrdt for Document<T> {
    type Op = Update<T>;

    fn apply_op(&mut self, op: &Update<T>) {
        self.receive_update(op);
    }
}
