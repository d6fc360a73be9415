//! Dictionaries.
//!
//! Every map type is written the same way: a comparer marker, then an `i32` entry count, then
//! each key followed by its value. Standard maps always use their type's own hashing or
//! ordering and write marker `0`. A [`GraphMap`] with a non-default comparer writes marker `1`,
//! the comparer's descriptor and the comparer itself, so the rebuilt map compares keys the
//! same way the original did.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use crate::collections::{DefaultComparer, GraphMap, KeyComparer};
use crate::descriptor::{TypeInfo, TypeKind};
use crate::error::Result;
use crate::graph::{GraphReader, GraphWriter};
use crate::object::GraphType;
use crate::rt;

/// A map that can be encoded by the dictionary codec.
///
/// Implemented for `HashMap`, `BTreeMap` and [`GraphMap`]. A struct deriving
/// `GraphcodeObject` can mark one field with `#[graphcode(entries)]` to be encoded as a
/// dictionary with its remaining fields stored between the comparer marker and the entries.
pub trait Dictionary: Sized {
    /// Key type.
    type Key: GraphType;
    /// Value type.
    type Value: GraphType;
    /// Comparer type; [`DefaultComparer`] for maps without one.
    type Comparer: GraphType;

    /// The comparer to write, or `None` when the map uses its default key semantics.
    fn comparer(&self) -> Option<&Self::Comparer>;

    /// Number of entries.
    fn entry_count(&self) -> usize;

    /// Visits every entry in iteration order, stopping at the first error.
    fn try_for_each_entry<F>(&self, f: F) -> Result<()>
    where
        F: FnMut(&Self::Key, &Self::Value) -> Result<()>;

    /// Creates an empty map with room for `capacity` entries.
    fn with_comparer(comparer: Option<Self::Comparer>, capacity: usize) -> Self;

    /// Adds an entry read from a stream.
    fn insert_entry(&mut self, key: Self::Key, value: Self::Value);
}

fn map_info<K: GraphType, V: GraphType>() -> TypeInfo {
    TypeInfo::new(map_name::<K, V>(), TypeKind::Map)
        .field::<K>("key")
        .field::<V>("value")
}

fn map_name<K: GraphType, V: GraphType>() -> String {
    format!("Map<{},{}>", K::type_name(), V::type_name())
}

impl<K, V, S> Dictionary for HashMap<K, V, S>
where
    K: GraphType + Eq + Hash,
    V: GraphType,
    S: BuildHasher + Default,
{
    type Key = K;
    type Value = V;
    type Comparer = DefaultComparer;

    fn comparer(&self) -> Option<&DefaultComparer> {
        None
    }

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn try_for_each_entry<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&K, &V) -> Result<()>,
    {
        self.iter().try_for_each(|(k, v)| f(k, v))
    }

    fn with_comparer(_: Option<DefaultComparer>, capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, S::default())
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K, V> Dictionary for BTreeMap<K, V>
where
    K: GraphType + Ord,
    V: GraphType,
{
    type Key = K;
    type Value = V;
    type Comparer = DefaultComparer;

    fn comparer(&self) -> Option<&DefaultComparer> {
        None
    }

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn try_for_each_entry<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&K, &V) -> Result<()>,
    {
        self.iter().try_for_each(|(k, v)| f(k, v))
    }

    fn with_comparer(_: Option<DefaultComparer>, _capacity: usize) -> Self {
        BTreeMap::new()
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K, V, C> Dictionary for GraphMap<K, V, C>
where
    K: GraphType,
    V: GraphType,
    C: GraphType + KeyComparer<K> + Default,
{
    type Key = K;
    type Value = V;
    type Comparer = C;

    fn comparer(&self) -> Option<&C> {
        if TypeId::of::<C>() == TypeId::of::<DefaultComparer>() {
            None
        } else {
            Some(GraphMap::comparer(self))
        }
    }

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn try_for_each_entry<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&K, &V) -> Result<()>,
    {
        self.iter().try_for_each(|(k, v)| f(k, v))
    }

    fn with_comparer(comparer: Option<C>, capacity: usize) -> Self {
        GraphMap::with_capacity_and_comparer(capacity, comparer.unwrap_or_default())
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

macro_rules! impl_dictionary_codec {
    ($(impl<$($gen:ident),*> for $ty:ty where [$($bounds:tt)*];)*) => {
        $(
            impl<$($gen),*> GraphType for $ty
            where
                $($bounds)*
            {
                const KIND: TypeKind = TypeKind::Map;

                fn type_name() -> String {
                    map_name::<K, V>()
                }

                fn type_info() -> TypeInfo {
                    map_info::<K, V>()
                }

                fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
                    rt::encode_dictionary(self, w, |_| Ok(()))
                }

                fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
                    rt::decode_dictionary(r, |_| Ok(())).map(|(map, ())| map)
                }
            }
        )*
    };
}

impl_dictionary_codec! {
    impl<K, V, S> for HashMap<K, V, S>
        where [K: GraphType + Eq + Hash, V: GraphType, S: BuildHasher + Default + 'static];
    impl<K, V> for BTreeMap<K, V>
        where [K: GraphType + Ord, V: GraphType];
    impl<K, V, C> for GraphMap<K, V, C>
        where [K: GraphType, V: GraphType, C: GraphType + KeyComparer<K> + Default];
}
