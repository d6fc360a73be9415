//! Fixed-width primitive encoding.
//!
//! Integers are written most significant byte first with a fixed width per type; there is no
//! variable-length encoding. Floats travel as their IEEE-754 bit pattern through the integer
//! path. Strings and arbitrary-precision integers share the same shape: a signed 32-bit length
//! followed by the raw bytes.
//!
//! [`WireWriter`] appends to a growable buffer owned by the current call. [`WireReader`]
//! walks a borrowed slice and hands out sub-slices of it, so string reads never copy into a
//! scratch buffer.

mod reader;
mod writer;

pub use reader::WireReader;
pub use writer::WireWriter;

/// Largest scale a decimal value can carry.
pub(crate) const MAX_DECIMAL_SCALE: u32 = 28;

/// Bit of the decimal flags word holding the sign.
pub(crate) const DECIMAL_SIGN_BIT: u32 = 1 << 31;

/// Number of nanoseconds in one second.
pub(crate) const NANOS_PER_SEC: u32 = 1_000_000_000;
