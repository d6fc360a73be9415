use std::fmt;

/// Position of a shared instance in encounter order.
///
/// The writer's tracker and the reader's instance table assign the same index to the same
/// instance because both walk the graph depth-first in pre-order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefIndex(u32); // Back-references travel as a non-negative i32.

impl RefIndex {
    /// Creates a new RefIndex.
    /// Restrict visibility to the graph module to prevent arbitrary creation.
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Converts an index read from the wire. Negative values are rejected.
    pub(crate) fn from_wire(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().map(Self)
    }

    /// Returns the raw numeric value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the value as written on the wire.
    pub fn as_wire(&self) -> i32 {
        // Indices are only handed out below i32::MAX.
        self.0 as i32
    }

    pub(crate) fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RefIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefIndex({})", self.0)
    }
}

impl fmt::Display for RefIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
