use std::any::Any;
use std::collections::HashMap;

use super::RefIndex;
use crate::error::{GraphcodeError, Result};

/// Write-side identity map for shared values.
///
/// Identities are allocation addresses. Every tracked allocation is retained until the tracker
/// is dropped, so an address seen once can never be reused by another allocation during the
/// same call.
#[derive(Default)]
pub struct ReferenceTracker {
    seen: HashMap<usize, RefIndex>,
    retained: Vec<Box<dyn Any>>,
}

impl ReferenceTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `identity`.
    ///
    /// Returns `None` the first time an identity is seen, after assigning it the next
    /// sequential index and taking ownership of `retain`. Returns the assigned index on every
    /// later call with the same identity.
    pub fn track(&mut self, identity: usize, retain: Box<dyn Any>) -> Result<Option<RefIndex>> {
        if let Some(index) = self.seen.get(&identity) {
            return Ok(Some(*index));
        }
        let next = u32::try_from(self.seen.len())
            .ok()
            .filter(|n| *n < i32::MAX as u32)
            .ok_or(GraphcodeError::LengthOverflow(self.seen.len()))?;
        self.seen.insert(identity, RefIndex::new(next));
        self.retained.push(retain);
        Ok(None)
    }

    /// Number of distinct identities tracked so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns `true` if nothing has been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl std::fmt::Debug for ReferenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceTracker")
            .field("tracked", &self.seen.len())
            .finish()
    }
}
