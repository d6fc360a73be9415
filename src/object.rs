//! The per-type codec trait and the polymorphic object handle.
//!
//! [`GraphType`] is the compile-time half of a codec: every serializable type implements it,
//! usually through `#[derive(GraphcodeObject)]`, and encodes itself field by field through a
//! [`GraphWriter`]. Dispatch is static; the registry only caches the descriptor and the
//! dynamically dispatched entry points needed at polymorphic sites.
//!
//! [`AnyObject`] is the dynamic half. It is implemented for every `GraphType` and lets an
//! [`ObjectRef`] (`Rc<dyn AnyObject>`) hold a value of any registered type. On the wire an
//! `ObjectRef` carries the concrete type's name and structural hash ahead of its payload.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::descriptor::{TypeInfo, TypeKind};
use crate::error::{GraphcodeError, Result};
use crate::format::{TYPE_DECLARED, TYPE_EXPLICIT};
use crate::graph::writer::identity_of;
use crate::graph::{GraphReader, GraphWriter, Instance, RefSlot};
use crate::registry::{Codec, CodecRegistry};

/// A type that can be written to and read from a Graphcode stream.
///
/// `encode` and `decode` must be exact mirrors of each other. Shared types (`Rc`, `Arc`,
/// [`ObjectRef`]) route through the reference-slot protocol; everything else is written
/// inline.
pub trait GraphType: Sized + 'static {
    /// Shape of the type.
    const KIND: TypeKind;

    /// Stable serialized name.
    fn type_name() -> String;

    /// Layout used for structural hashing and codec validation.
    fn type_info() -> TypeInfo {
        TypeInfo::new(Self::type_name(), Self::KIND)
    }

    /// Writes the value.
    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()>;

    /// Reads a value.
    fn decode(r: &mut GraphReader<'_>) -> Result<Self>;

    /// Writes a nullable value. Defaults to a presence byte followed by the value.
    fn encode_option(value: Option<&Self>, w: &mut GraphWriter<'_>) -> Result<()> {
        match value {
            None => {
                w.wire().write_u8(0);
                Ok(())
            }
            Some(value) => {
                w.wire().write_u8(1);
                value.encode(w)
            }
        }
    }

    /// Reads a nullable value written by [`GraphType::encode_option`].
    fn decode_option(r: &mut GraphReader<'_>) -> Result<Option<Self>> {
        match r.wire().read_u8()? {
            0 => Ok(None),
            1 => Self::decode(r).map(Some),
            other => Err(GraphcodeError::FormatCorruption(format!(
                "invalid presence byte {other:#04x} for '{}'",
                Self::type_name()
            ))),
        }
    }

    /// Reads a new shared instance and registers it in the instance table.
    ///
    /// The default reserves a slot, decodes the value and then fills the slot, so a
    /// back-reference to the value from inside itself fails with
    /// [`GraphcodeError::PendingReference`]. Interior-mutable types override this to register
    /// before decoding, which is what makes cycles reconstructible.
    fn decode_rc(r: &mut GraphReader<'_>) -> Result<Rc<Self>> {
        let index = r.instances().reserve()?;
        let value = Rc::new(Self::decode(r)?);
        r.instances().fill(index, Instance::local(&value))?;
        Ok(value)
    }

    /// Thread-safe counterpart of [`GraphType::decode_rc`].
    fn decode_arc(r: &mut GraphReader<'_>) -> Result<Arc<Self>>
    where
        Self: Send + Sync,
    {
        let index = r.instances().reserve()?;
        let value = Arc::new(Self::decode(r)?);
        r.instances().fill(index, Instance::shared(&value))?;
        Ok(value)
    }
}

/// Object-safe view of a [`GraphType`] value.
pub trait AnyObject: Any {
    /// Upcasts to `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts a shared handle to `Rc<dyn Any>`.
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;

    /// Serialized name of the concrete type.
    fn object_type_name(&self) -> String;

    /// Codec of the concrete type, built in `registry` if needed.
    fn object_codec(&self, registry: &CodecRegistry) -> Result<Arc<Codec>>;

    /// Writes the concrete value's payload.
    fn encode_object(&self, w: &mut GraphWriter<'_>) -> Result<()>;
}

impl<T: GraphType> AnyObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn object_type_name(&self) -> String {
        T::type_name()
    }

    fn object_codec(&self, registry: &CodecRegistry) -> Result<Arc<Codec>> {
        registry.codec_for::<T>()
    }

    fn encode_object(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        self.encode(w)
    }
}

impl fmt::Debug for dyn AnyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.object_type_name())
    }
}

impl dyn AnyObject {
    /// Returns `true` if the concrete type is `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrows the concrete value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A shared, dynamically typed value.
///
/// Identity is preserved across a round trip exactly like `Rc<T>`.
pub type ObjectRef = Rc<dyn AnyObject>;

/// Wraps a value into an [`ObjectRef`].
pub fn object<T: GraphType>(value: T) -> ObjectRef {
    Rc::new(value)
}

/// Recovers the concrete `Rc<T>` behind an [`ObjectRef`], keeping identity.
pub fn downcast_rc<T: GraphType>(object: &ObjectRef) -> Option<Rc<T>> {
    Rc::clone(object).into_any_rc().downcast::<T>().ok()
}

/// Writes a polymorphic payload: the type marker, the concrete type's descriptor, then the
/// value.
///
/// An `ObjectRef` site declares no concrete type, so the marker is always explicit.
pub(crate) fn encode_polymorphic(value: &dyn AnyObject, w: &mut GraphWriter<'_>) -> Result<()> {
    let codec = value.object_codec(w.registry())?;
    w.wire().write_u8(TYPE_EXPLICIT);
    w.write_descriptor(codec.descriptor())?;
    codec.write_object(value, w)
}

/// Reads a polymorphic payload written by [`encode_polymorphic`] and registers the instance.
pub(crate) fn decode_polymorphic(r: &mut GraphReader<'_>) -> Result<ObjectRef> {
    let codec = match r.wire().read_u8()? {
        TYPE_DECLARED => {
            return Err(GraphcodeError::FormatCorruption(
                "declared-type marker at an untyped site".into(),
            ))
        }
        TYPE_EXPLICIT => r.resolve_descriptor()?,
        other => {
            return Err(GraphcodeError::FormatCorruption(format!(
                "invalid type marker {other:#04x}"
            )))
        }
    };
    codec.read_object(r)
}

impl GraphType for ObjectRef {
    const KIND: TypeKind = TypeKind::Object;

    fn type_name() -> String {
        "Object".to_owned()
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        let retain: Box<dyn Any> = Box::new(Rc::clone(self));
        w.write_shared(identity_of(Rc::as_ptr(self)), retain, |w| {
            encode_polymorphic(&**self, w)
        })
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        Self::decode_option(r)?.ok_or_else(|| GraphcodeError::UnexpectedNull(Self::type_name()))
    }

    fn encode_option(value: Option<&Self>, w: &mut GraphWriter<'_>) -> Result<()> {
        match value {
            Some(value) => value.encode(w),
            None => {
                w.write_null();
                Ok(())
            }
        }
    }

    fn decode_option(r: &mut GraphReader<'_>) -> Result<Option<Self>> {
        match r.read_slot()? {
            RefSlot::Null => Ok(None),
            RefSlot::Tracked(index) => r.instances().resolve_object(index).map(Some),
            RefSlot::New => r.nested(|r| decode_polymorphic(r)).map(Some),
        }
    }
}
