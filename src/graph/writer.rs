use std::any::Any;

use super::ReferenceTracker;
use crate::descriptor::TypeDescriptor;
use crate::error::{GraphcodeError, Result};
use crate::format::{WireDescriptor, SLOT_NEW, SLOT_NULL, SLOT_PRESENT, SLOT_TRACKED};
use crate::object::GraphType;
use crate::registry::CodecRegistry;
use crate::wire::WireWriter;

/// Encoding state for one serialize call.
///
/// Owns the output buffer and the reference tracker, and borrows the codec registry used to
/// resolve descriptors of polymorphic values.
#[derive(Debug)]
pub struct GraphWriter<'r> {
    wire: WireWriter,
    registry: &'r CodecRegistry,
    tracker: ReferenceTracker,
    depth: usize,
    max_depth: usize,
}

impl<'r> GraphWriter<'r> {
    /// Creates a writer with an empty buffer.
    pub fn new(registry: &'r CodecRegistry, max_depth: usize) -> Self {
        Self {
            wire: WireWriter::new(),
            registry,
            tracker: ReferenceTracker::new(),
            depth: 0,
            max_depth,
        }
    }

    /// The primitive encoder.
    #[inline]
    pub fn wire(&mut self) -> &mut WireWriter {
        &mut self.wire
    }

    /// The registry backing this call.
    pub fn registry(&self) -> &'r CodecRegistry {
        self.registry
    }

    /// The identities tracked so far.
    pub fn tracker(&self) -> &ReferenceTracker {
        &self.tracker
    }

    /// Writes a null reference slot.
    pub fn write_null(&mut self) {
        self.wire.write_u8(SLOT_NULL);
    }

    /// Writes a non-null reference slot.
    ///
    /// The first time `identity` is seen it is registered and `body` encodes the value;
    /// afterwards only its index is written. Registration happens before `body` runs, so the
    /// value's own fields may refer back to it.
    pub fn write_shared<F>(&mut self, identity: usize, retain: Box<dyn Any>, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.wire.write_u8(SLOT_PRESENT);
        match self.tracker.track(identity, retain)? {
            Some(index) => {
                self.wire.write_u8(SLOT_TRACKED);
                self.wire.write_i32(index.as_wire());
                Ok(())
            }
            None => {
                self.wire.write_u8(SLOT_NEW);
                self.nested(body)
            }
        }
    }

    /// Writes a type name and structural hash.
    pub fn write_descriptor(&mut self, descriptor: &TypeDescriptor) -> Result<()> {
        WireDescriptor::write(descriptor.name(), descriptor.structural_hash(), &mut self.wire)
    }

    /// Writes the descriptor of `T`, building its codec if needed.
    pub fn write_type_of<T: GraphType>(&mut self) -> Result<()> {
        let codec = self.registry.codec_for::<T>()?;
        self.write_descriptor(codec.descriptor())
    }

    /// Runs `body` one nesting level deeper.
    pub fn nested<F, R>(&mut self, body: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        if self.depth >= self.max_depth {
            return Err(GraphcodeError::DepthLimitExceeded(self.max_depth));
        }
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.wire.into_bytes()
    }
}

/// Identity of a (possibly unsized) allocation: its data address.
pub(crate) fn identity_of<T: ?Sized>(ptr: *const T) -> usize {
    ptr.cast::<()>() as usize
}
