use std::sync::Arc;

use super::{InstanceTable, RefIndex};
use crate::error::{GraphcodeError, Result};
use crate::format::{WireDescriptor, SLOT_NEW, SLOT_NULL, SLOT_PRESENT, SLOT_TRACKED};
use crate::object::GraphType;
use crate::registry::{Codec, CodecRegistry};
use crate::wire::WireReader;

/// Most elements a sequence may declare when its elements occupy no input.
pub const MAX_ZERO_WIDTH_ITEMS: usize = 1 << 20;

/// A decoded reference slot header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSlot {
    /// The reference is null.
    Null,
    /// The reference points at an instance decoded earlier.
    Tracked(RefIndex),
    /// A new instance follows.
    New,
}

/// Decoding state for one deserialize call.
#[derive(Debug)]
pub struct GraphReader<'a> {
    wire: WireReader<'a>,
    registry: &'a CodecRegistry,
    instances: InstanceTable,
    depth: usize,
    max_depth: usize,
}

impl<'a> GraphReader<'a> {
    /// Creates a reader over `wire`, continuing from its current position.
    pub fn new(wire: WireReader<'a>, registry: &'a CodecRegistry, max_depth: usize) -> Self {
        Self {
            wire,
            registry,
            instances: InstanceTable::new(),
            depth: 0,
            max_depth,
        }
    }

    /// The primitive decoder.
    #[inline]
    pub fn wire(&mut self) -> &mut WireReader<'a> {
        &mut self.wire
    }

    /// The registry backing this call.
    pub fn registry(&self) -> &'a CodecRegistry {
        self.registry
    }

    /// The instances decoded so far.
    pub fn instances(&mut self) -> &mut InstanceTable {
        &mut self.instances
    }

    /// Reads a reference slot header.
    pub fn read_slot(&mut self) -> Result<RefSlot> {
        match self.wire.read_u8()? {
            SLOT_NULL => Ok(RefSlot::Null),
            SLOT_PRESENT => match self.wire.read_u8()? {
                SLOT_TRACKED => {
                    let raw = self.wire.read_i32()?;
                    RefIndex::from_wire(raw).map(RefSlot::Tracked).ok_or_else(|| {
                        GraphcodeError::FormatCorruption(format!("negative back-reference {raw}"))
                    })
                }
                SLOT_NEW => Ok(RefSlot::New),
                other => Err(GraphcodeError::FormatCorruption(format!(
                    "invalid instance flag {other:#04x}"
                ))),
            },
            other => Err(GraphcodeError::FormatCorruption(format!(
                "invalid reference flag {other:#04x}"
            ))),
        }
    }

    /// Reads a type name and structural hash.
    pub fn read_descriptor(&mut self) -> Result<WireDescriptor> {
        WireDescriptor::read(&mut self.wire)
    }

    /// Reads a descriptor and resolves it to a registered codec, validating its hash.
    pub fn resolve_descriptor(&mut self) -> Result<Arc<Codec>> {
        let found = self.read_descriptor()?;
        let codec = self.registry.resolve(&found.name)?;
        codec.descriptor().check_hash(found.hash)?;
        Ok(codec)
    }

    /// Reads a descriptor that must name `T`.
    pub fn expect_type<T: GraphType>(&mut self) -> Result<Arc<Codec>> {
        let codec = self.registry.codec_for::<T>()?;
        let found = self.read_descriptor()?;
        self.check_descriptor(&codec, &found)?;
        Ok(codec)
    }

    /// Validates a descriptor read from the stream against an expected codec.
    pub fn check_descriptor(&self, expected: &Codec, found: &WireDescriptor) -> Result<()> {
        if found.name != expected.descriptor().name() {
            return Err(if self.registry.contains_name(&found.name) {
                GraphcodeError::TypeMismatch {
                    expected: expected.descriptor().name().to_owned(),
                    found: found.name.clone(),
                }
            } else {
                GraphcodeError::UnknownType(found.name.clone())
            });
        }
        expected.descriptor().check_hash(found.hash)
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

    /// Remaining capacity hint for collections: never preallocates beyond the unread input.
    pub fn capacity_hint(&self, len: usize) -> usize {
        len.min(self.wire.remaining())
    }

    /// Decodes `len` consecutive elements through `item`.
    ///
    /// Elements that consume input are bounded by the unread bytes. When the first element
    /// consumes none, counts above [`MAX_ZERO_WIDTH_ITEMS`] are rejected.
    pub fn read_items<F>(&mut self, len: usize, mut item: F) -> Result<()>
    where
        F: FnMut(&mut Self) -> Result<()>,
    {
        for i in 0..len {
            let before = self.wire.remaining();
            item(self)?;
            if i == 0 && len > MAX_ZERO_WIDTH_ITEMS && self.wire.remaining() == before {
                return Err(GraphcodeError::FormatCorruption(format!(
                    "{len} elements that occupy no input"
                )));
            }
        }
        Ok(())
    }

    /// Ends the call, rejecting unconsumed trailing bytes.
    pub fn finish(self) -> Result<()> {
        let trailing = self.wire.remaining();
        if trailing == 0 {
            Ok(())
        } else {
            Err(GraphcodeError::FormatCorruption(format!(
                "{trailing} trailing bytes after payload at offset {}",
                self.wire.position()
            )))
        }
    }
}
