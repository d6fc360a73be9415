//! A hash map driven by a serializable key comparer.
//!
//! [`GraphMap`] stores entries in a `hashbrown::HashTable` and delegates hashing and key
//! equality to a [`KeyComparer`]. Because the comparer is itself a [`GraphType`], it is written
//! with the map and rebuilt on read, so a case-insensitive map comes back case-insensitive.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

use hashbrown::hash_table::Entry;
use hashbrown::HashTable;
use twox_hash::XxHash64;

use crate::descriptor::TypeKind;
use crate::error::Result;
use crate::graph::{GraphReader, GraphWriter};
use crate::object::GraphType;

/// Hashing and equality strategy for the keys of a [`GraphMap`].
///
/// Implementations must be consistent: keys that compare equal must hash equally.
pub trait KeyComparer<K: ?Sized> {
    /// Hashes a key.
    fn hash_key(&self, key: &K) -> u64;

    /// Compares two keys for equality.
    fn eq_keys(&self, a: &K, b: &K) -> bool;
}

/// Comparer using the key's own `Hash` and `Eq`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultComparer;

impl<K: Hash + Eq + ?Sized> KeyComparer<K> for DefaultComparer {
    fn hash_key(&self, key: &K) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn eq_keys(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Comparer treating string keys case-insensitively (Unicode simple lowercase).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseInsensitive;

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

impl<K: AsRef<str> + ?Sized> KeyComparer<K> for CaseInsensitive {
    fn hash_key(&self, key: &K) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for c in folded(key.as_ref()) {
            hasher.write_u32(u32::from(c));
        }
        hasher.finish()
    }

    fn eq_keys(&self, a: &K, b: &K) -> bool {
        folded(a.as_ref()).eq(folded(b.as_ref()))
    }
}

macro_rules! impl_stateless_comparer {
    ($($ty:ident => $name:literal;)*) => {
        $(
            impl GraphType for $ty {
                const KIND: TypeKind = TypeKind::Struct;

                fn type_name() -> String {
                    $name.to_owned()
                }

                fn encode(&self, _: &mut GraphWriter<'_>) -> Result<()> {
                    Ok(())
                }

                fn decode(_: &mut GraphReader<'_>) -> Result<Self> {
                    Ok($ty)
                }
            }
        )*
    };
}

impl_stateless_comparer! {
    DefaultComparer => "graphcode::DefaultComparer";
    CaseInsensitive => "graphcode::CaseInsensitive";
}

/// Hash map whose key semantics come from a [`KeyComparer`].
///
/// ```rust
/// use graphcode::{CaseInsensitive, GraphMap};
///
/// let mut headers = GraphMap::with_comparer(CaseInsensitive);
/// headers.insert("Content-Type".to_string(), 1);
/// assert_eq!(headers.get("content-type"), Some(&1));
/// ```
#[derive(Clone)]
pub struct GraphMap<K, V, C = DefaultComparer> {
    table: HashTable<(K, V)>,
    comparer: C,
}

impl<K, V, C: Default> Default for GraphMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparer(C::default())
    }
}

impl<K, V> GraphMap<K, V, DefaultComparer> {
    /// Creates an empty map using the keys' own `Hash` and `Eq`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, C> GraphMap<K, V, C> {
    /// Creates an empty map with the given comparer.
    pub fn with_comparer(comparer: C) -> Self {
        Self::with_capacity_and_comparer(0, comparer)
    }

    /// Creates an empty map with room for `capacity` entries.
    pub fn with_capacity_and_comparer(capacity: usize, comparer: C) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            comparer,
        }
    }

    /// The comparer driving key semantics.
    pub fn comparer(&self) -> &C {
        &self.comparer
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.table.iter().map(|(k, v)| (k, v))
    }

    /// Iterates over keys in table order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.table.iter().map(|(k, _)| k)
    }

    /// Iterates over values in table order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.table.iter().map(|(_, v)| v)
    }

    /// Removes every entry, keeping the comparer.
    pub fn clear(&mut self) {
        self.table.clear();
    }
}

impl<K, V, C: KeyComparer<K>> GraphMap<K, V, C> {
    /// Inserts an entry, returning the value previously stored under an equal key.
    ///
    /// The originally inserted key is kept when an equal key already exists.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let comparer = &self.comparer;
        let hash = <C as KeyComparer<K>>::hash_key(comparer, &key);
        match self.table.entry(
            hash,
            |(k, _)| <C as KeyComparer<K>>::eq_keys(comparer, k, &key),
            |(k, _)| <C as KeyComparer<K>>::hash_key(comparer, k),
        ) {
            Entry::Occupied(mut slot) => Some(std::mem::replace(&mut slot.get_mut().1, value)),
            Entry::Vacant(slot) => {
                slot.insert((key, value));
                None
            }
        }
    }

    /// Looks up the value stored under a key equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        let hash = <C as KeyComparer<Q>>::hash_key(&self.comparer, key);
        self.table
            .find(hash, |(k, _)| {
                <C as KeyComparer<Q>>::eq_keys(&self.comparer, <K as Borrow<Q>>::borrow(k), key)
            })
            .map(|(_, v)| v)
    }

    /// Mutable lookup.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        let comparer = &self.comparer;
        let hash = <C as KeyComparer<Q>>::hash_key(comparer, key);
        self.table
            .find_mut(hash, |(k, _)| {
                <C as KeyComparer<Q>>::eq_keys(comparer, <K as Borrow<Q>>::borrow(k), key)
            })
            .map(|(_, v)| v)
    }

    /// Returns `true` if a key equal to `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        self.get(key).is_some()
    }

    /// Removes the entry stored under a key equal to `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        let comparer = &self.comparer;
        let hash = <C as KeyComparer<Q>>::hash_key(comparer, key);
        self.table
            .find_entry(hash, |(k, _)| {
                <C as KeyComparer<Q>>::eq_keys(comparer, <K as Borrow<Q>>::borrow(k), key)
            })
            .ok()
            .map(|slot| slot.remove().0 .1)
    }
}

impl<K, V, C> FromIterator<(K, V)> for GraphMap<K, V, C>
where
    C: KeyComparer<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C: KeyComparer<K>> Extend<(K, V)> for GraphMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for GraphMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V: PartialEq, C: KeyComparer<K>> PartialEq for GraphMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| {
                let hash = <C as KeyComparer<K>>::hash_key(&other.comparer, k);
                other
                    .table
                    .find(hash, |(ok, _)| <C as KeyComparer<K>>::eq_keys(&other.comparer, ok, k))
                    .is_some_and(|(_, ov)| ov == v)
            })
    }
}
