use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

use super::RefIndex;
use crate::error::{GraphcodeError, Result};
use crate::object::{GraphType, ObjectRef};

enum Value {
    Local {
        any: Rc<dyn Any>,
        object: Option<ObjectRef>,
    },
    Shared(Arc<dyn Any + Send + Sync>),
}

/// A decoded shared instance, as stored in the [`InstanceTable`].
pub struct Instance {
    value: Value,
    type_name: fn() -> String,
}

impl Instance {
    /// Wraps a single-threaded shared allocation.
    pub fn local<T: GraphType>(value: &Rc<T>) -> Self {
        let any: Rc<dyn Any> = value.clone();
        let object: ObjectRef = value.clone();
        Self {
            value: Value::Local {
                any,
                object: Some(object),
            },
            type_name: T::type_name,
        }
    }

    /// Wraps a thread-safe shared allocation.
    pub fn shared<T: GraphType + Send + Sync>(value: &Arc<T>) -> Self {
        let any: Arc<dyn Any + Send + Sync> = value.clone();
        Self {
            value: Value::Shared(any),
            type_name: T::type_name,
        }
    }

    /// Wraps a cheaply clonable handle (such as `Rc<str>`) that is resolved by cloning.
    pub fn handle<H: GraphType + Clone>(handle: &H) -> Self {
        Self {
            value: Value::Local {
                any: Rc::new(handle.clone()),
                object: None,
            },
            type_name: H::type_name,
        }
    }

    /// Serialized name of the instance's type.
    pub fn type_name(&self) -> String {
        (self.type_name)()
    }

    fn mismatch<T: GraphType>(&self) -> GraphcodeError {
        GraphcodeError::TypeMismatch {
            expected: T::type_name(),
            found: self.type_name(),
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flavor = match self.value {
            Value::Local { .. } => "local",
            Value::Shared(_) => "shared",
        };
        write!(f, "Instance({flavor} {})", self.type_name())
    }
}

/// Read-side arena of shared instances, addressed by [`RefIndex`].
///
/// Instances are appended in the writer's encounter order. Cycle-capable allocations are
/// registered before their contents are decoded; immutable ones reserve a pending slot first
/// and fill it once built.
#[derive(Debug, Default)]
pub struct InstanceTable {
    slots: Vec<Option<Instance>>,
}

impl InstanceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered or reserved slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn next_index(&self) -> Result<RefIndex> {
        u32::try_from(self.slots.len())
            .ok()
            .filter(|n| *n < i32::MAX as u32)
            .map(RefIndex::new)
            .ok_or(GraphcodeError::LengthOverflow(self.slots.len()))
    }

    /// Appends a fully allocated instance.
    pub fn register(&mut self, instance: Instance) -> Result<RefIndex> {
        let index = self.next_index()?;
        self.slots.push(Some(instance));
        Ok(index)
    }

    /// Appends a pending slot to be filled once its value is built.
    pub fn reserve(&mut self) -> Result<RefIndex> {
        let index = self.next_index()?;
        self.slots.push(None);
        Ok(index)
    }

    /// Fills a slot previously returned by [`Self::reserve`].
    pub fn fill(&mut self, index: RefIndex, instance: Instance) -> Result<()> {
        let slot = self.slots.get_mut(index.as_usize()).ok_or_else(|| {
            GraphcodeError::Internal(format!("instance slot {index} was never reserved"))
        })?;
        if slot.is_some() {
            return Err(GraphcodeError::Internal(format!(
                "instance slot {index} filled twice"
            )));
        }
        *slot = Some(instance);
        Ok(())
    }

    /// Looks up a registered instance.
    pub fn get(&self, index: RefIndex) -> Result<&Instance> {
        match self.slots.get(index.as_usize()) {
            Some(Some(instance)) => Ok(instance),
            Some(None) => Err(GraphcodeError::PendingReference(index.as_wire())),
            None => Err(GraphcodeError::FormatCorruption(format!(
                "back-reference {index} out of range ({} instances)",
                self.slots.len()
            ))),
        }
    }

    /// Resolves a back-reference to an `Rc<T>`.
    pub fn resolve_rc<T: GraphType>(&self, index: RefIndex) -> Result<Rc<T>> {
        let instance = self.get(index)?;
        match &instance.value {
            Value::Local { any, .. } => Rc::clone(any)
                .downcast::<T>()
                .map_err(|_| instance.mismatch::<T>()),
            Value::Shared(_) => Err(instance.mismatch::<T>()),
        }
    }

    /// Resolves a back-reference to an `Arc<T>`.
    pub fn resolve_arc<T: GraphType + Send + Sync>(&self, index: RefIndex) -> Result<Arc<T>> {
        let instance = self.get(index)?;
        match &instance.value {
            Value::Shared(any) => Arc::clone(any)
                .downcast::<T>()
                .map_err(|_| instance.mismatch::<T>()),
            Value::Local { .. } => Err(instance.mismatch::<T>()),
        }
    }

    /// Resolves a back-reference registered with [`Instance::handle`].
    pub fn resolve_handle<H: GraphType + Clone>(&self, index: RefIndex) -> Result<H> {
        let instance = self.get(index)?;
        match &instance.value {
            Value::Local { any, .. } => any
                .downcast_ref::<H>()
                .cloned()
                .ok_or_else(|| instance.mismatch::<H>()),
            Value::Shared(_) => Err(instance.mismatch::<H>()),
        }
    }

    /// Resolves a back-reference at a polymorphic site.
    pub fn resolve_object(&self, index: RefIndex) -> Result<ObjectRef> {
        let instance = self.get(index)?;
        match &instance.value {
            Value::Local {
                object: Some(object),
                ..
            } => Ok(Rc::clone(object)),
            _ => Err(GraphcodeError::TypeMismatch {
                expected: ObjectRef::type_name(),
                found: instance.type_name(),
            }),
        }
    }
}
