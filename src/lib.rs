//! # Graphcode
//!
//! A binary object-graph codec for Rust that preserves shared references and cycles, detects
//! schema drift through structural hashes, and carries concrete type names for dynamically
//! typed values.
//!
//! ## Overview
//!
//! Most serialization formats flatten data into a tree: two handles to one allocation come
//! back as two independent copies, and a cycle either loops forever or is rejected. Graphcode
//! instead treats the value as a graph. Every reference-typed value (`Rc`, `Arc`,
//! [`ObjectRef`]) is written through a small slot protocol that records each allocation once
//! and refers back to it by index afterwards, so identity and cycles survive a round trip.
//!
//! ### Key Features
//!
//! *   **Identity Preservation:** Shared allocations are written once and restored as shared
//!     allocations. Cycles through `Rc<RefCell<T>>`, `Arc<Mutex<T>>` or `Arc<RwLock<T>>` are
//!     reconstructed exactly.
//! *   **Schema Drift Detection:** Every type gets an xxHash32 structural hash computed from
//!     its layout. A stream written with a different layout fails loudly with
//!     [`GraphcodeError::SchemaChanged`] instead of decoding garbage.
//! *   **Polymorphism:** [`ObjectRef`] fields and [`PropertyBag`] entries carry the concrete
//!     type's name, resolved through a [`CodecRegistry`] on read.
//! *   **Rich Containers:** Rectangular arrays ([`RectArray`]), jagged arrays, dictionaries
//!     with serializable comparers ([`GraphMap`]), sets, tuples and fixed arrays.
//! *   **Custom Contracts:** Types may serialize themselves as a name/value bag and be rebuilt
//!     by a factory ([`GraphContract`]).
//!
//! ## Architecture
//!
//! ### Stream Layout
//!
//! ```text
//! [ i16 format_version ] [ u8 omit_root_type_name ] [ Root Descriptor? ] [ Payload ]
//! ```
//!
//! All integers are fixed width, most significant byte first. A reference slot is
//! `u8 not_null`, then `u8 is_new`, then either an `i32` back-reference index or the value.
//! An empty stream is the absent value. See [`format`] and [`wire`] for the details.
//!
//! ### Codecs
//!
//! Encoding is statically dispatched through the [`GraphType`] trait, implemented for the
//! standard library types and derived for your own with `#[derive(GraphcodeObject)]`. The
//! [`CodecRegistry`] caches each type's validated descriptor together with the dynamically
//! dispatched entry points needed where the concrete type is only known at runtime.
//!
//! ### Graph State
//!
//! Each call owns a [`graph::GraphWriter`] or [`graph::GraphReader`]. The writer keeps a
//! [`graph::ReferenceTracker`] keyed by allocation address; the reader keeps an
//! [`graph::InstanceTable`] indexed in the same encounter order. Nothing but the registry is
//! shared between calls.
//!
//! ## Usage Patterns
//!
//! ### Basic Serialization
//!
//! ```rust
//! use graphcode::{Graphcode, GraphcodeObject};
//!
//! #[derive(Debug, PartialEq, GraphcodeObject)]
//! struct Player {
//!     name: String,
//!     level: u32,
//!     scores: Vec<i64>,
//! }
//!
//! let codec = Graphcode::new();
//! let player = Player { name: "ana".into(), level: 7, scores: vec![10, 20] };
//! let bytes = codec.serialize(&player)?;
//! assert_eq!(codec.deserialize::<Player>(&bytes)?, Some(player));
//! # Ok::<(), graphcode::GraphcodeError>(())
//! ```
//!
//! ### Shared References
//!
//! ```rust
//! use std::rc::Rc;
//! use graphcode::{Graphcode, GraphcodeObject};
//!
//! #[derive(Debug, GraphcodeObject)]
//! struct Team {
//!     captain: Rc<String>,
//!     members: Vec<Rc<String>>,
//! }
//!
//! let ana = Rc::new("ana".to_string());
//! let team = Team { captain: Rc::clone(&ana), members: vec![Rc::clone(&ana)] };
//!
//! let codec = Graphcode::new();
//! let back = codec.deserialize::<Team>(&codec.serialize(&team)?)?.unwrap();
//! assert!(Rc::ptr_eq(&back.captain, &back.members[0]));
//! # Ok::<(), graphcode::GraphcodeError>(())
//! ```
//!
//! ### Dynamic Values
//!
//! ```rust
//! use graphcode::{object, Graphcode, GraphcodeObject};
//!
//! #[derive(Debug, PartialEq, GraphcodeObject)]
//! struct Circle { radius: f64 }
//!
//! let codec = Graphcode::new();
//! codec.register::<Circle>()?;
//!
//! let bytes = codec.serialize_object(&object(Circle { radius: 2.0 }))?;
//! let back = codec.deserialize_object(&bytes, None)?.unwrap();
//! assert_eq!(back.downcast_ref::<Circle>(), Some(&Circle { radius: 2.0 }));
//! # Ok::<(), graphcode::GraphcodeError>(())
//! ```
//!
//! ## Safety and Error Handling
//!
//! * **Encapsulated Unsafe:** the only `unsafe` block memory-maps a file in
//!   [`Graphcode::load`]; auto-registration relies on `inventory`.
//! * **No Panics:** No `unwrap()` or `panic!()` calls in the library (enforced by clippy lints).
//! * **Comprehensive Errors:** All failures correspond to a [`GraphcodeError`] variant, and a
//!   failed call never yields a partially built value.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// --- PUBLIC API MODULES ---
pub mod api;
pub mod collections;
pub mod contract;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod inspector;
pub mod object;
pub mod registry;
pub mod wire;

// --- INTERNAL IMPLEMENTATION MODULES ---
pub mod graph;
pub mod impls;

// --- MACRO SUPPORT MODULES ---

/// Runtime utilities used by the derived code.
#[doc(hidden)]
pub mod rt;

/// Internal re-exports for the macro to ensure dependencies are available.
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

// --- RE-EXPORTS ---

pub use api::{Graphcode, GraphcodeBuilder, GraphcodeOptions, DEFAULT_MAX_DEPTH};
pub use collections::{
    CaseInsensitive, DefaultComparer, GraphMap, KeyComparer, PropertyBag, RectArray,
};
pub use contract::{GraphCallbacks, GraphContract};
pub use descriptor::{FieldInfo, TypeDescriptor, TypeInfo, TypeKind};
pub use error::{GraphcodeError, Result};
pub use impls::Dictionary;
pub use inspector::{LayoutNode, StreamReport};
pub use object::{downcast_rc, object, AnyObject, GraphType, ObjectRef};
pub use registry::{AutoRegistration, Codec, CodecRegistry};

// Re-export the derive macro so it is accessible as `graphcode::GraphcodeObject`
pub use graphcode_derive::GraphcodeObject;

/// Constants used throughout the library.
pub mod constants {
    pub use crate::format::{FORMAT_VERSION, HEADER_SIZE};
}
