//! Convenient re-exports for common usage.
//!
//! ```
//! use crdt_array::prelude::*;
//! ```

pub use crate::Batch;
pub use crate::Crdt;
pub use crate::DeltaCrdt;
pub use crate::DocState;
pub use crate::Document;
pub use crate::Item;
pub use crate::OpCrdt;
pub use crate::Sequence;
pub use crate::Timestamp;
pub use crate::Update;
pub use crate::VersionVector;
