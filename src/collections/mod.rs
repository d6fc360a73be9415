//! Container types with a dedicated wire shape.
//!
//! Standard collections (`Vec`, `HashMap`, sets...) are encoded by the implementations in
//! the crate's `impls` module. The types here exist because no standard type carries the
//! information their codecs need: the rank and dimensions of a rectangular array, the
//! comparer of a hash map, or the open-ended entries of a property bag.

/// Defines the `PropertyBag`.
pub mod bag;
/// Defines `GraphMap` and its key comparers.
pub mod map;
/// Defines `RectArray`.
pub mod rect;

pub use bag::PropertyBag;
pub use map::{CaseInsensitive, DefaultComparer, GraphMap, KeyComparer};
pub use rect::{RectArray, MAX_RANK};
