//! Open-ended name/value records.

use crate::descriptor::{TypeInfo, TypeKind};
use crate::error::{GraphcodeError, Result};
use crate::graph::{GraphReader, GraphWriter};
use crate::object::{object, GraphType, ObjectRef};

/// An ordered list of named, dynamically typed values.
///
/// Values are [`ObjectRef`]s, so each one carries its concrete type on the wire and keeps its
/// identity: the same object stored under two names is written once.
///
/// ```rust
/// use graphcode::PropertyBag;
///
/// let mut bag = PropertyBag::new();
/// bag.insert_value("port", 8080u16);
/// bag.insert_value("host", "localhost".to_string());
/// assert_eq!(*bag.value::<u16>("port")?, 8080);
/// # Ok::<(), graphcode::GraphcodeError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    entries: Vec<(String, Option<ObjectRef>)>,
}

impl PropertyBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == name)
    }

    fn put(&mut self, name: String, value: Option<ObjectRef>) {
        match self.position(&name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Stores a value under `name`, replacing any previous entry in place.
    pub fn set(&mut self, name: impl Into<String>, value: ObjectRef) {
        self.put(name.into(), Some(value));
    }

    /// Stores a null entry under `name`.
    pub fn set_null(&mut self, name: impl Into<String>) {
        self.put(name.into(), None);
    }

    /// Wraps `value` into an [`ObjectRef`] and stores it under `name`.
    pub fn insert_value<T: GraphType>(&mut self, name: impl Into<String>, value: T) {
        self.set(name, object(value));
    }

    /// The object stored under `name`, or `None` if the entry is missing or null.
    pub fn get(&self, name: &str) -> Option<&ObjectRef> {
        self.position(name).and_then(|i| self.entries[i].1.as_ref())
    }

    /// Borrows the value stored under `name` as a `T`.
    pub fn value<T: GraphType>(&self, name: &str) -> Result<&T> {
        let index = self
            .position(name)
            .ok_or_else(|| GraphcodeError::MissingEntry(name.to_owned()))?;
        let object = self.entries[index]
            .1
            .as_ref()
            .ok_or_else(|| GraphcodeError::UnexpectedNull(name.to_owned()))?;
        object
            .downcast_ref::<T>()
            .ok_or_else(|| GraphcodeError::TypeMismatch {
                expected: T::type_name(),
                found: (**object).object_type_name(),
            })
    }

    /// Returns `true` if an entry (possibly null) exists under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes the entry under `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Option<ObjectRef>> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ObjectRef>)> + '_ {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }
}

impl GraphType for PropertyBag {
    const KIND: TypeKind = TypeKind::Bag;

    fn type_name() -> String {
        "PropertyBag".to_owned()
    }

    fn type_info() -> TypeInfo {
        TypeInfo::new(Self::type_name(), Self::KIND).field::<ObjectRef>("value")
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        w.wire().write_len(self.entries.len())?;
        for (name, value) in &self.entries {
            w.wire().write_str(name)?;
            <ObjectRef as GraphType>::encode_option(value.as_ref(), w)?;
        }
        Ok(())
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        let len = r.wire().read_len()?;
        let mut entries = Vec::with_capacity(r.capacity_hint(len));
        for _ in 0..len {
            let name = String::decode(r)?;
            let value = <ObjectRef as GraphType>::decode_option(r)?;
            entries.push((name, value));
        }
        Ok(Self { entries })
    }
}
