//! Per-call graph state for the reference-slot protocol.
//!
//! This module defines the write-side [`ReferenceTracker`], the read-side [`InstanceTable`]
//! and the [`GraphWriter`]/[`GraphReader`] pair that every `GraphType` implementation encodes
//! through. All of it is created fresh for each call and never shared between threads.

/// Defines the `RefIndex` type.
pub mod id;
/// Defines the `InstanceTable` used while decoding.
pub mod instances;
/// Defines the `GraphReader`.
pub mod reader;
/// Defines the `ReferenceTracker` used while encoding.
pub mod tracker;
/// Defines the `GraphWriter`.
pub mod writer;

pub use id::RefIndex;
pub use instances::{Instance, InstanceTable};
pub use reader::{GraphReader, RefSlot, MAX_ZERO_WIDTH_ITEMS};
pub use tracker::ReferenceTracker;
pub use writer::GraphWriter;
