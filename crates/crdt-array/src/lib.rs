//! # crdt-array
//!
//! A replicated array CRDT for local-first applications.
//!
//! A [`Document`] holds named [`Sequence`] containers that several replicas
//! edit independently. Every insert creates an [`Item`] identified by a
//! `(site, counter)` [`Timestamp`]; deletes leave tombstones. Replicas
//! exchange single [`Update`]s, debounced [`Batch`]es, or synchronize
//! directly, and always converge to the same contents.
//!
//! ## Quick Start
//!
//! ```
//! use crdt_array::prelude::*;
//!
//! let mut s1: Document<&str> = Document::new("s1");
//! let mut s2: Document<&str> = Document::new("s2");
//!
//! // Concurrent inserts at the same position.
//! s1.insert("list", 0, "A");
//! s2.insert("list", 0, "B");
//!
//! s1.sync(&mut s2);
//! assert_eq!(s1.to_vec("list"), vec!["A", "B"]);
//! assert_eq!(s2.to_vec("list"), vec!["A", "B"]);
//! ```
//!
//! ## Ordering
//!
//! Items are placed by a total order: counter ascending, then site id, then
//! content. Local inserts go where the caller asks and settle into that
//! order when the document flushes its pending batch.
//!
//! ## Background work
//!
//! Batch flushes and tombstone collection are driven by [`Document::tick`].
//! Time comes from a [`clock::TimeSource`]; use [`clock::ManualClock`] to
//! control it in tests.
//!
//! ## `no_std` Support
//!
//! The crate works with `alloc` only. Disable default features and supply a
//! time source through [`Document::builder`]:
//!
//! ```toml
//! [dependencies]
//! crdt-array = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod batch;
mod compressor;
mod crdt;
mod document;
mod error;
mod gc;
mod item;
mod sequence;
mod state;
mod timestamp;
mod update;
mod version;
#[cfg(feature = "wasm")]
mod wasm;

pub mod clock;
pub mod events;
pub mod prelude;
pub mod timer;

pub use batch::{BatchManager, DEFAULT_BATCH_DELAY_MS};
pub use compressor::{compress, Candidate};
pub use crdt::{Crdt, DeltaCrdt};
pub use document::{
    DocStats, Document, DocumentBuilder, DocumentConfig, Observer, ObserverId, TickReport,
};
pub use error::StateError;
pub use events::OpCrdt;
pub use gc::{GarbageCollector, DEFAULT_GC_INTERVAL_MS, DEFAULT_GC_MAX_AGE_MS};
pub use item::{Item, Tombstone};
pub use sequence::Sequence;
#[cfg(feature = "serde")]
pub use state::decode_update;
pub use state::DocState;
pub use timestamp::{ItemId, ParseIdError, Timestamp};
pub use update::{Batch, Update, UpdateKind, ALL_CONTAINERS};
pub use version::{Causality, VersionVector};
