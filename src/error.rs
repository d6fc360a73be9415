//! Centralized error handling for Graphcode.
//!
//! Every failure the codec can hit is represented as a [`GraphcodeError`] and propagated
//! through [`Result`]. The library never panics on malformed input: a truncated stream, an
//! unknown type name or a schema drift all surface as errors, and a failed deserialization
//! never yields a partially built object.
//!
//! ## Error Categories
//!
//! - **Schema errors** ([`GraphcodeError::UnknownType`], [`GraphcodeError::SchemaChanged`],
//!   [`GraphcodeError::TypeMismatch`]): the stream names a type that cannot be resolved, or
//!   whose layout no longer matches the local definition.
//! - **Codec construction errors** ([`GraphcodeError::UnsupportedType`],
//!   [`GraphcodeError::MissingFactory`]): raised when a codec is built for a type, before any
//!   byte is written or read.
//! - **Stream errors** ([`GraphcodeError::TruncatedStream`],
//!   [`GraphcodeError::FormatCorruption`], [`GraphcodeError::InvalidVersion`],
//!   [`GraphcodeError::RootFlagMismatch`]): the byte stream itself is malformed.
//! - **Graph errors** ([`GraphcodeError::UnexpectedNull`],
//!   [`GraphcodeError::PendingReference`], [`GraphcodeError::DepthLimitExceeded`]): the
//!   stream is well formed but describes a graph the target types cannot hold.
//! - **I/O errors** ([`GraphcodeError::Io`]): only produced by the reader/writer and file
//!   helpers of [`crate::Graphcode`].
//!
//! ## Usage
//!
//! ```rust
//! use graphcode::{Graphcode, GraphcodeError, GraphcodeObject};
//!
//! #[derive(Debug, PartialEq, GraphcodeObject)]
//! struct Point { x: i32, y: i32 }
//!
//! let codec = Graphcode::new();
//! match codec.deserialize::<Point>(&[0, 7, 0]) {
//!     Err(GraphcodeError::InvalidVersion { found, .. }) => assert_eq!(found, 7),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for Graphcode operations.
///
/// Equivalent to `std::result::Result<T, GraphcodeError>`.
pub type Result<T> = std::result::Result<T, GraphcodeError>;

/// The master error enum covering all failure domains in Graphcode.
///
/// All variants are fatal: the codec never retries and never returns partial results.
///
/// ## Cloneability
///
/// This type is `Clone` so errors can be stored or shared across threads. I/O errors are
/// wrapped in an `Arc` to make that cheap.
#[derive(Debug, Clone)]
pub enum GraphcodeError {
    /// Low-level I/O failure while writing to or reading from an external sink/source.
    Io(Arc<io::Error>),

    /// A type name found in the stream is not known to the codec registry.
    ///
    /// Names become resolvable once a codec has been built for the type in the registry
    /// used for deserialization (see [`crate::CodecRegistry::register`] and
    /// [`crate::CodecRegistry::auto_register`]).
    UnknownType(String),

    /// The structural hash recorded in the stream differs from the local type's hash.
    ///
    /// The layout of the type changed between the write and the read. The codec does not
    /// attempt any migration.
    SchemaChanged {
        /// Serialized name of the type.
        type_name: String,
        /// Hash computed from the local definition.
        expected: i32,
        /// Hash recorded in the stream.
        found: i32,
    },

    /// The type (or one of the types reachable from its fields) cannot be represented.
    ///
    /// Function pointers and raw pointers are rejected when the codec is constructed.
    UnsupportedType(String),

    /// A custom-contract type has no reconstruction factory.
    MissingFactory(String),

    /// The stream ended before the declared amount of data could be read.
    TruncatedStream {
        /// Bytes the current read required.
        needed: usize,
        /// Bytes that were left in the stream.
        remaining: usize,
    },

    /// The stream is structurally invalid (bad flag byte, invalid UTF-8, trailing bytes...).
    FormatCorruption(String),

    /// The header carries a format version this implementation does not speak.
    InvalidVersion {
        /// Version produced by this implementation.
        expected: i16,
        /// Version found in the header.
        found: i16,
    },

    /// The stream omits the root type name and the caller did not supply one.
    MissingExpectedType,

    /// The header's omit-root-type-name flag disagrees with the reader's configuration.
    RootFlagMismatch {
        /// Flag configured on the reading side.
        expected: bool,
        /// Flag found in the header.
        found: bool,
    },

    /// A value in the stream is of a different (known) type than the one requested.
    TypeMismatch {
        /// Type requested by the reading code.
        expected: String,
        /// Type found in the stream.
        found: String,
    },

    /// A null reference was read where the target type cannot hold null.
    UnexpectedNull(String),

    /// A back-reference points at an immutable instance that is still being decoded.
    ///
    /// Cycles can only be rebuilt through interior-mutable shared types such as
    /// `Rc<RefCell<T>>` or `Arc<Mutex<T>>`.
    PendingReference(i32),

    /// Nesting of shared, boxed or polymorphic values exceeded the configured limit.
    DepthLimitExceeded(usize),

    /// A length does not fit the wire format's signed 32-bit length prefix.
    LengthOverflow(usize),

    /// A rectangular array has more dimensions than the wire format can describe.
    RankOverflow(usize),

    /// A rectangular array's dimensions do not match its element count.
    InvalidShape(String),

    /// A property bag lacks an entry required to rebuild a custom-contract type.
    MissingEntry(String),

    /// Logic error inside the codec (poisoned lock, conflicting borrow...).
    Internal(String),
}

impl fmt::Display for GraphcodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O Error: {e}"),
            Self::UnknownType(name) => write!(f, "Unknown type '{name}'"),
            Self::SchemaChanged {
                type_name,
                expected,
                found,
            } => write!(
                f,
                "Schema of '{type_name}' changed: local hash {expected:#010x}, stream hash {found:#010x}"
            ),
            Self::UnsupportedType(name) => write!(f, "Unsupported type '{name}'"),
            Self::MissingFactory(name) => {
                write!(f, "Contract type '{name}' has no reconstruction factory")
            }
            Self::TruncatedStream { needed, remaining } => write!(
                f,
                "Truncated stream: needed {needed} bytes, {remaining} remaining"
            ),
            Self::FormatCorruption(s) => write!(f, "Format Corruption: {s}"),
            Self::InvalidVersion { expected, found } => write!(
                f,
                "Invalid format version {found} (expected {expected})"
            ),
            Self::MissingExpectedType => write!(
                f,
                "Root type name omitted from stream and no expected type supplied"
            ),
            Self::RootFlagMismatch { expected, found } => write!(
                f,
                "Root type name flag mismatch: reader expects omit={expected}, stream has omit={found}"
            ),
            Self::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected '{expected}', found '{found}'")
            }
            Self::UnexpectedNull(name) => write!(f, "Unexpected null for '{name}'"),
            Self::PendingReference(index) => write!(
                f,
                "Back-reference #{index} points at an instance still under construction"
            ),
            Self::DepthLimitExceeded(limit) => write!(f, "Nesting depth limit {limit} exceeded"),
            Self::LengthOverflow(len) => write!(f, "Length {len} exceeds the wire limit"),
            Self::RankOverflow(rank) => write!(f, "Array rank {rank} exceeds 255"),
            Self::InvalidShape(s) => write!(f, "Invalid array shape: {s}"),
            Self::MissingEntry(name) => write!(f, "Missing property bag entry '{name}'"),
            Self::Internal(s) => write!(f, "Internal Logic Error: {s}"),
        }
    }
}

impl std::error::Error for GraphcodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GraphcodeError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
