//! Defines the framing of a Graphcode stream.
//!
//! # Layout
//! Every non-empty stream starts with a fixed three byte header, optionally followed by the
//! root descriptor, followed by the root payload:
//!
//! `[ i16 format_version ] [ u8 omit_root_type_name ] [ Root Descriptor? ] [ Payload ]`
//!
//! The root descriptor is a length-prefixed type name plus the type's `i32` structural hash.
//! It is present unless the writer was configured to omit it, in which case the reader has to
//! know the root type up front.
//!
//! An empty stream encodes the absent value and carries no header at all.

use crate::error::{GraphcodeError, Result};
use crate::wire::{WireReader, WireWriter};

/// The format version produced and accepted by this implementation.
pub const FORMAT_VERSION: i16 = 1;

/// The fixed size of the stream header.
/// Version(2) + OmitFlag(1) = 3
pub const HEADER_SIZE: usize = 3;

/// Flag byte marking a null reference slot.
pub const SLOT_NULL: u8 = 0;
/// Flag byte marking a non-null reference slot.
pub const SLOT_PRESENT: u8 = 1;
/// Flag byte marking a back-reference to an already tracked instance.
pub const SLOT_TRACKED: u8 = 0;
/// Flag byte marking a new instance whose payload follows.
pub const SLOT_NEW: u8 = 1;

/// Polymorphic marker: the value's type is the declared type.
pub const TYPE_DECLARED: u8 = 0;
/// Polymorphic marker: an explicit type descriptor follows.
pub const TYPE_EXPLICIT: u8 = 1;

/// The per-call stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    /// Format version of the stream.
    pub format_version: i16,
    /// Whether the root descriptor was left out of the stream.
    pub omit_root_type_name: bool,
}

impl WireHeader {
    /// Creates a header for the current format version.
    pub fn new(omit_root_type_name: bool) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            omit_root_type_name,
        }
    }

    /// Serializes the header.
    pub fn write(&self, wire: &mut WireWriter) {
        wire.write_i16(self.format_version);
        wire.write_bool(self.omit_root_type_name);
    }

    /// Reads a header without validating it.
    pub fn read(wire: &mut WireReader<'_>) -> Result<Self> {
        let format_version = wire.read_i16()?;
        let omit_root_type_name = wire.read_bool()?;
        Ok(Self {
            format_version,
            omit_root_type_name,
        })
    }

    /// Reads a header and checks it against the reader's expectations.
    pub fn read_validated(wire: &mut WireReader<'_>, omit_root_type_name: bool) -> Result<Self> {
        // Version first: a foreign stream should not be reported as a flag mismatch.
        let format_version = wire.read_i16()?;
        if format_version != FORMAT_VERSION {
            return Err(GraphcodeError::InvalidVersion {
                expected: FORMAT_VERSION,
                found: format_version,
            });
        }
        let found = wire.read_bool()?;
        if found != omit_root_type_name {
            return Err(GraphcodeError::RootFlagMismatch {
                expected: omit_root_type_name,
                found,
            });
        }
        Ok(Self {
            format_version,
            omit_root_type_name: found,
        })
    }
}

/// A type descriptor as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireDescriptor {
    /// Serialized type name.
    pub name: String,
    /// Structural hash recorded by the writer.
    pub hash: i32,
}

impl WireDescriptor {
    /// Serializes the descriptor.
    pub fn write(name: &str, hash: i32, wire: &mut WireWriter) -> Result<()> {
        wire.write_str(name)?;
        wire.write_i32(hash);
        Ok(())
    }

    /// Reads a descriptor. A null name is corruption.
    pub fn read(wire: &mut WireReader<'_>) -> Result<Self> {
        let name = wire
            .read_str()?
            .ok_or_else(|| GraphcodeError::FormatCorruption("null type name".into()))?
            .to_owned();
        let hash = wire.read_i32()?;
        Ok(Self { name, hash })
    }
}
