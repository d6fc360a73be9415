//! Sequences, sets and tuples.
//!
//! Sequences are written as an `i32` element count followed by each element through its own
//! codec. A jagged array is simply a sequence of sequences: `Vec<Vec<T>>` keeps its rows
//! inline, while `Vec<Rc<Vec<T>>>` gives every row its own identity through the reference
//! slot.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};

use crate::descriptor::{TypeInfo, TypeKind};
use crate::error::{GraphcodeError, Result};
use crate::graph::{GraphReader, GraphWriter};
use crate::object::GraphType;

fn element_info<T: GraphType>(name: String, kind: TypeKind) -> TypeInfo {
    TypeInfo::new(name, kind).field::<T>("item")
}

fn encode_seq<'a, T, I>(len: usize, items: I, w: &mut GraphWriter<'_>) -> Result<()>
where
    T: GraphType,
    I: IntoIterator<Item = &'a T>,
{
    w.wire().write_len(len)?;
    for item in items {
        item.encode(w)?;
    }
    Ok(())
}

impl<T: GraphType> GraphType for Vec<T> {
    const KIND: TypeKind = TypeKind::Array;

    fn type_name() -> String {
        format!("Vec<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        element_info::<T>(Self::type_name(), Self::KIND)
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        encode_seq(self.len(), self, w)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        let len = r.wire().read_len()?;
        let mut items = Vec::with_capacity(r.capacity_hint(len));
        r.read_items(len, |r| {
            items.push(T::decode(r)?);
            Ok(())
        })?;
        Ok(items)
    }
}

impl<T: GraphType> GraphType for VecDeque<T> {
    const KIND: TypeKind = TypeKind::Array;

    fn type_name() -> String {
        format!("Vec<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        element_info::<T>(Self::type_name(), Self::KIND)
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        encode_seq(self.len(), self, w)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        Vec::<T>::decode(r).map(VecDeque::from)
    }
}

// Fixed-size arrays carry their length in the type name, not on the wire.
impl<T: GraphType, const N: usize> GraphType for [T; N] {
    const KIND: TypeKind = TypeKind::Array;

    fn type_name() -> String {
        format!("Array<{};{N}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        element_info::<T>(Self::type_name(), Self::KIND)
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        for item in self {
            item.encode(w)?;
        }
        Ok(())
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        let mut items = Vec::with_capacity(r.capacity_hint(N));
        for _ in 0..N {
            items.push(T::decode(r)?);
        }
        items.try_into().map_err(|_: Vec<T>| {
            GraphcodeError::Internal(format!("array of {N} elements lost its length"))
        })
    }
}

impl<T, S> GraphType for HashSet<T, S>
where
    T: GraphType + Eq + Hash,
    S: BuildHasher + Default + 'static,
{
    const KIND: TypeKind = TypeKind::Set;

    fn type_name() -> String {
        format!("Set<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        element_info::<T>(Self::type_name(), Self::KIND)
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        encode_seq(self.len(), self, w)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        let len = r.wire().read_len()?;
        let mut items = HashSet::with_capacity_and_hasher(r.capacity_hint(len), S::default());
        r.read_items(len, |r| {
            items.insert(T::decode(r)?);
            Ok(())
        })?;
        Ok(items)
    }
}

impl<T: GraphType + Ord> GraphType for BTreeSet<T> {
    const KIND: TypeKind = TypeKind::Set;

    fn type_name() -> String {
        format!("Set<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        element_info::<T>(Self::type_name(), Self::KIND)
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        encode_seq(self.len(), self, w)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        let len = r.wire().read_len()?;
        let mut items = BTreeSet::new();
        r.read_items(len, |r| {
            items.insert(T::decode(r)?);
            Ok(())
        })?;
        Ok(items)
    }
}

macro_rules! impl_tuple {
    ($(($($name:ident $idx:tt),+);)*) => {
        $(
            impl<$($name: GraphType),+> GraphType for ($($name,)+) {
                const KIND: TypeKind = TypeKind::Tuple;

                fn type_name() -> String {
                    let parts: Vec<String> = vec![$($name::type_name()),+];
                    format!("({})", parts.join(","))
                }

                fn type_info() -> TypeInfo {
                    TypeInfo::new(Self::type_name(), Self::KIND)
                        $(.field::<$name>(stringify!($idx)))+
                }

                fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
                    $(self.$idx.encode(w)?;)+
                    Ok(())
                }

                fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
                    Ok(($($name::decode(r)?,)+))
                }
            }
        )*
    };
}

impl_tuple! {
    (A 0);
    (A 0, B 1);
    (A 0, B 1, C 2);
    (A 0, B 1, C 2, D 3);
}
