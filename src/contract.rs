//! Serialization hooks and custom contracts.
//!
//! Two opt-in extension points exist for derived types:
//!
//! * [`GraphCallbacks`] (`#[graphcode(callbacks)]`) keeps the regular field-by-field encoding
//!   and calls user hooks around it.
//! * [`GraphContract`] (`#[graphcode(contract)]`) replaces the field encoding altogether: the
//!   value is written as the [`PropertyBag`] returned by [`GraphContract::to_entries`] and
//!   rebuilt by [`GraphContract::FACTORY`] once the whole bag has been read.
//!
//! ```rust
//! use graphcode::{Graphcode, GraphcodeObject, GraphContract, PropertyBag, Result};
//!
//! #[derive(Debug, PartialEq, GraphcodeObject)]
//! #[graphcode(contract)]
//! struct Celsius(f64);
//!
//! impl GraphContract for Celsius {
//!     const FACTORY: Option<fn(&PropertyBag) -> Result<Self>> =
//!         Some(|bag| Ok(Celsius(*bag.value::<f64>("degrees")?)));
//!
//!     fn to_entries(&self) -> Result<PropertyBag> {
//!         let mut bag = PropertyBag::new();
//!         bag.insert_value("degrees", self.0);
//!         Ok(bag)
//!     }
//! }
//!
//! let codec = Graphcode::new();
//! let bytes = codec.serialize(&Celsius(21.5))?;
//! assert_eq!(codec.deserialize::<Celsius>(&bytes)?, Some(Celsius(21.5)));
//! # Ok::<(), graphcode::GraphcodeError>(())
//! ```

use crate::collections::PropertyBag;
use crate::error::Result;

/// Hooks invoked around the field-by-field codec of a derived type.
///
/// Every method has an empty default, so implementors only override what they need.
pub trait GraphCallbacks {
    /// Called before the first field is written.
    fn on_serializing(&self) {}

    /// Called after the last field is written.
    fn on_serialized(&self) {}

    /// Called before the first field is read.
    fn on_deserializing()
    where
        Self: Sized,
    {
    }

    /// Called on the fully built value, before it is returned or shared.
    fn on_deserialized(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A type that serializes itself as an explicit name/value bag.
pub trait GraphContract: Sized + 'static {
    /// Rebuilds a value from the bag read off the stream.
    ///
    /// A contract type without a factory can still be declared, but building its codec fails
    /// with [`crate::GraphcodeError::MissingFactory`].
    const FACTORY: Option<fn(&PropertyBag) -> Result<Self>> = None;

    /// Produces the entries to write, in order.
    fn to_entries(&self) -> Result<PropertyBag>;

    /// Called on the value built by [`GraphContract::FACTORY`].
    fn on_deserialized(&mut self) -> Result<()> {
        Ok(())
    }
}
