//! Nullable, boxed, shared and interior-mutable wrappers.
//!
//! `Rc` and `Arc` are the reference-typed values of the format: every occurrence goes through
//! the reference slot, so two handles to one allocation come back as two handles to one
//! allocation. Cycles need a cell between the handle and the value (`Rc<RefCell<T>>`,
//! `Arc<Mutex<T>>`, `Arc<RwLock<T>>`); those are allocated with `T::default()` and registered
//! before their contents are read.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex, RwLock};

use crate::descriptor::{TypeInfo, TypeKind};
use crate::error::{GraphcodeError, Result};
use crate::graph::writer::identity_of;
use crate::graph::{GraphReader, GraphWriter, Instance, RefSlot};
use crate::object::GraphType;

impl<T: GraphType> GraphType for Option<T> {
    const KIND: TypeKind = TypeKind::Nullable;

    fn type_name() -> String {
        format!("Option<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        TypeInfo::new(Self::type_name(), Self::KIND).field::<T>("value")
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        T::encode_option(self.as_ref(), w)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        T::decode_option(r)
    }
}

// Boxes are transparent on the wire; they only count towards the nesting depth.
impl<T: GraphType> GraphType for Box<T> {
    const KIND: TypeKind = T::KIND;

    fn type_name() -> String {
        T::type_name()
    }

    fn type_info() -> TypeInfo {
        T::type_info()
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        w.nested(|w| (**self).encode(w))
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        r.nested(|r| T::decode(r)).map(Box::new)
    }

    fn encode_option(value: Option<&Self>, w: &mut GraphWriter<'_>) -> Result<()> {
        w.nested(|w| T::encode_option(value.map(|b| &**b), w))
    }

    fn decode_option(r: &mut GraphReader<'_>) -> Result<Option<Self>> {
        r.nested(|r| T::decode_option(r)).map(|value| value.map(Box::new))
    }
}

fn shared_info<T: GraphType>(name: String) -> TypeInfo {
    TypeInfo::new(name, TypeKind::Shared).field::<T>("target")
}

impl<T: GraphType> GraphType for Rc<T> {
    const KIND: TypeKind = TypeKind::Shared;

    fn type_name() -> String {
        format!("Ref<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        shared_info::<T>(Self::type_name())
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        let retain: Box<dyn Any> = Box::new(Rc::clone(self));
        w.write_shared(identity_of(Rc::as_ptr(self)), retain, |w| (**self).encode(w))
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
            RefSlot::Tracked(index) => r.instances().resolve_rc::<T>(index).map(Some),
            RefSlot::New => r.nested(|r| T::decode_rc(r)).map(Some),
        }
    }
}

impl<T: GraphType + Send + Sync> GraphType for Arc<T> {
    const KIND: TypeKind = TypeKind::Shared;

    fn type_name() -> String {
        format!("Ref<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        shared_info::<T>(Self::type_name())
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        let retain: Box<dyn Any> = Box::new(Arc::clone(self));
        w.write_shared(identity_of(Arc::as_ptr(self)), retain, |w| (**self).encode(w))
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
            RefSlot::Tracked(index) => r.instances().resolve_arc::<T>(index).map(Some),
            RefSlot::New => r.nested(|r| T::decode_arc(r)).map(Some),
        }
    }
}

macro_rules! impl_shared_str {
    ($ptr:ident) => {
        impl GraphType for $ptr<str> {
            const KIND: TypeKind = TypeKind::Shared;

            fn type_name() -> String {
                "Ref<String>".to_owned()
            }

            fn type_info() -> TypeInfo {
                shared_info::<String>(Self::type_name())
            }

            fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
                let retain: Box<dyn Any> = Box::new($ptr::clone(self));
                w.write_shared(identity_of($ptr::as_ptr(self)), retain, |w| {
                    w.wire().write_str(self)
                })
            }

            fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
                Self::decode_option(r)?
                    .ok_or_else(|| GraphcodeError::UnexpectedNull(Self::type_name()))
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
                    RefSlot::Tracked(index) => r.instances().resolve_handle::<Self>(index).map(Some),
                    RefSlot::New => {
                        let value: Self = $ptr::from(String::decode(r)?);
                        r.instances().register(Instance::handle(&value))?;
                        Ok(Some(value))
                    }
                }
            }
        }
    };
}

impl_shared_str!(Rc);
impl_shared_str!(Arc);

fn cell_info<T: GraphType>(name: String) -> TypeInfo {
    TypeInfo::new(name, TypeKind::Cell).field::<T>("value")
}

fn borrow_conflict<T: GraphType>() -> GraphcodeError {
    GraphcodeError::Internal(format!("Cell<{}> is already borrowed", T::type_name()))
}

fn poisoned<T: GraphType>() -> GraphcodeError {
    GraphcodeError::Internal(format!("lock around '{}' is poisoned", T::type_name()))
}

impl<T: GraphType + Default> GraphType for RefCell<T> {
    const KIND: TypeKind = TypeKind::Cell;

    fn type_name() -> String {
        format!("Cell<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        cell_info::<T>(Self::type_name())
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        let value = self.try_borrow().map_err(|_| borrow_conflict::<T>())?;
        value.encode(w)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        T::decode(r).map(RefCell::new)
    }

    fn decode_rc(r: &mut GraphReader<'_>) -> Result<Rc<Self>> {
        let cell = Rc::new(RefCell::new(T::default()));
        r.instances().register(Instance::local(&cell))?;
        let value = T::decode(r)?;
        *cell.try_borrow_mut().map_err(|_| borrow_conflict::<T>())? = value;
        Ok(cell)
    }
}

impl<T: GraphType + Default + Send> GraphType for Mutex<T> {
    const KIND: TypeKind = TypeKind::Cell;

    fn type_name() -> String {
        format!("Cell<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        cell_info::<T>(Self::type_name())
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        let value = self.lock().map_err(|_| poisoned::<T>())?;
        value.encode(w)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        T::decode(r).map(Mutex::new)
    }

    fn decode_rc(r: &mut GraphReader<'_>) -> Result<Rc<Self>> {
        let cell = Rc::new(Mutex::new(T::default()));
        r.instances().register(Instance::local(&cell))?;
        let value = T::decode(r)?;
        *cell.lock().map_err(|_| poisoned::<T>())? = value;
        Ok(cell)
    }

    fn decode_arc(r: &mut GraphReader<'_>) -> Result<Arc<Self>>
    where
        Self: Send + Sync,
    {
        let cell = Arc::new(Mutex::new(T::default()));
        r.instances().register(Instance::shared(&cell))?;
        let value = T::decode(r)?;
        *cell.lock().map_err(|_| poisoned::<T>())? = value;
        Ok(cell)
    }
}

impl<T: GraphType + Default + Send + Sync> GraphType for RwLock<T> {
    const KIND: TypeKind = TypeKind::Cell;

    fn type_name() -> String {
        format!("Cell<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        cell_info::<T>(Self::type_name())
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        let value = self.read().map_err(|_| poisoned::<T>())?;
        value.encode(w)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        T::decode(r).map(RwLock::new)
    }

    fn decode_rc(r: &mut GraphReader<'_>) -> Result<Rc<Self>> {
        let cell = Rc::new(RwLock::new(T::default()));
        r.instances().register(Instance::local(&cell))?;
        let value = T::decode(r)?;
        *cell.write().map_err(|_| poisoned::<T>())? = value;
        Ok(cell)
    }

    fn decode_arc(r: &mut GraphReader<'_>) -> Result<Arc<Self>>
    where
        Self: Send + Sync,
    {
        let cell = Arc::new(RwLock::new(T::default()));
        r.instances().register(Instance::shared(&cell))?;
        let value = T::decode(r)?;
        *cell.write().map_err(|_| poisoned::<T>())? = value;
        Ok(cell)
    }
}
