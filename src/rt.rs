//! Runtime helpers for code generated by `#[derive(GraphcodeObject)]`.
//! Do not use directly.

use crate::collections::PropertyBag;
use crate::contract::GraphContract;
use crate::error::{GraphcodeError, Result};
use crate::format::{TYPE_DECLARED, TYPE_EXPLICIT};
use crate::graph::{GraphReader, GraphWriter};
use crate::impls::Dictionary;
use crate::object::GraphType;

/// Writes a dictionary: comparer marker, `extra` fields, entry count, entries.
pub fn encode_dictionary<D, F>(map: &D, w: &mut GraphWriter<'_>, extra: F) -> Result<()>
where
    D: Dictionary,
    F: FnOnce(&mut GraphWriter<'_>) -> Result<()>,
{
    match map.comparer() {
        None => w.wire().write_u8(TYPE_DECLARED),
        Some(comparer) => {
            w.wire().write_u8(TYPE_EXPLICIT);
            w.write_type_of::<D::Comparer>()?;
            comparer.encode(w)?;
        }
    }
    extra(w)?;
    w.wire().write_len(map.entry_count())?;
    map.try_for_each_entry(|key, value| {
        key.encode(w)?;
        value.encode(w)
    })
}

/// Reads a dictionary written by [`encode_dictionary`], returning it with the `extra` fields.
pub fn decode_dictionary<D, X, F>(r: &mut GraphReader<'_>, extra: F) -> Result<(D, X)>
where
    D: Dictionary,
    F: FnOnce(&mut GraphReader<'_>) -> Result<X>,
{
    let comparer = match r.wire().read_u8()? {
        TYPE_DECLARED => None,
        TYPE_EXPLICIT => {
            r.expect_type::<D::Comparer>()?;
            Some(D::Comparer::decode(r)?)
        }
        other => {
            return Err(GraphcodeError::FormatCorruption(format!(
                "invalid comparer marker {other:#04x}"
            )))
        }
    };
    let extra = extra(r)?;
    let len = r.wire().read_len()?;
    let mut map = D::with_comparer(comparer, r.capacity_hint(len));
    r.read_items(len, |r| {
        let key = D::Key::decode(r)?;
        let value = D::Value::decode(r)?;
        map.insert_entry(key, value);
        Ok(())
    })?;
    Ok((map, extra))
}

/// Writes a custom-contract value as its property bag.
pub fn encode_contract<T: GraphContract>(value: &T, w: &mut GraphWriter<'_>) -> Result<()> {
    value.to_entries()?.encode(w)
}

/// Reads a property bag and rebuilds a custom-contract value through its factory.
pub fn decode_contract<T: GraphContract + GraphType>(r: &mut GraphReader<'_>) -> Result<T> {
    let bag = PropertyBag::decode(r)?;
    let factory = T::FACTORY.ok_or_else(|| GraphcodeError::MissingFactory(T::type_name()))?;
    let mut value = factory(&bag)?;
    value.on_deserialized()?;
    Ok(value)
}

/// Error for an enum tag that names no variant.
pub fn unknown_variant(type_name: &str, tag: i32) -> GraphcodeError {
    GraphcodeError::FormatCorruption(format!("'{type_name}' has no variant with tag {tag}"))
}
