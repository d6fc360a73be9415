//! The concurrent codec cache.
//!
//! A [`CodecRegistry`] maps runtime types to their [`Codec`]: the validated descriptor
//! (serialized name and structural hash) plus the dynamically dispatched entry points used at
//! polymorphic sites. Codecs are built on first request, validated once and cached for the
//! lifetime of the registry.
//!
//! Every registry starts with the built-in scalar, string and property-bag codecs in place,
//! so those names resolve in any process.
//!
//! The registry is an explicit value. [`crate::Graphcode`] holds one behind an `Arc`, so
//! several engines (or threads) can share a cache, and tests can isolate themselves with a
//! fresh registry or [`CodecRegistry::clear`].

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use log::{debug, warn};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::collections::{CaseInsensitive, DefaultComparer, PropertyBag};
use crate::descriptor::{TypeDescriptor, TypeInfo, TypeKind};
use crate::error::{GraphcodeError, Result};
use crate::graph::{GraphReader, GraphWriter};
use crate::object::{AnyObject, GraphType, ObjectRef};

type WriteObjectFn = fn(&dyn AnyObject, &mut GraphWriter<'_>) -> Result<()>;
type ReadObjectFn = fn(&mut GraphReader<'_>) -> Result<ObjectRef>;

/// The cached codec of one type.
pub struct Codec {
    descriptor: TypeDescriptor,
    kind: TypeKind,
    info: fn() -> TypeInfo,
    write: WriteObjectFn,
    read: ReadObjectFn,
    read_root: ReadObjectFn,
}

impl Codec {
    /// Builds and validates the codec of `T`.
    ///
    /// Fails with [`GraphcodeError::UnsupportedType`] if `T` or any type reachable from its
    /// fields cannot be encoded, and with [`GraphcodeError::MissingFactory`] if a
    /// custom-contract type has no factory.
    pub fn build<T: GraphType>() -> Result<Self> {
        let info: TypeInfo = T::type_info();
        info.validate()?;
        let hash = info.structural_hash();
        debug!(
            "built codec for '{}' ({:?}, hash {hash:#010x})",
            info.name(),
            info.kind()
        );
        Ok(Self {
            descriptor: TypeDescriptor::new(info.name().to_owned(), hash, TypeId::of::<T>()),
            kind: info.kind(),
            info: T::type_info,
            write: write_object::<T>,
            read: read_object::<T>,
            read_root: read_root::<T>,
        })
    }

    /// Name, hash and runtime type.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Shape of the type.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Layout of the type, rebuilt on each call.
    pub fn type_info(&self) -> TypeInfo {
        (self.info)()
    }

    /// Writes a value of this codec's type behind a `dyn AnyObject`.
    pub fn write_object(&self, value: &dyn AnyObject, w: &mut GraphWriter<'_>) -> Result<()> {
        (self.write)(value, w)
    }

    /// Reads a new shared instance of this codec's type.
    pub fn read_object(&self, r: &mut GraphReader<'_>) -> Result<ObjectRef> {
        (self.read)(r)
    }

    /// Reads a root payload, which takes no instance index.
    pub fn read_root(&self, r: &mut GraphReader<'_>) -> Result<ObjectRef> {
        (self.read_root)(r)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("name", &self.descriptor.name())
            .field("hash", &self.descriptor.structural_hash())
            .field("kind", &self.kind)
            .finish()
    }
}

fn write_object<T: GraphType>(value: &dyn AnyObject, w: &mut GraphWriter<'_>) -> Result<()> {
    match value.downcast_ref::<T>() {
        Some(value) => value.encode(w),
        None => Err(GraphcodeError::TypeMismatch {
            expected: T::type_name(),
            found: value.object_type_name(),
        }),
    }
}

fn read_object<T: GraphType>(r: &mut GraphReader<'_>) -> Result<ObjectRef> {
    let value: Rc<T> = T::decode_rc(r)?;
    Ok(value)
}

fn read_root<T: GraphType>(r: &mut GraphReader<'_>) -> Result<ObjectRef> {
    Ok(Rc::new(T::decode(r)?))
}

type RegisterFn = fn(&CodecRegistry) -> Result<TypeDescriptor>;

// Types whose names resolve without prior registration. `usize` and `isize` travel as
// "u64" and "i64", so those names resolve to the 64-bit codecs.
const BUILTINS: &[RegisterFn] = &[
    register_type::<bool>,
    register_type::<u8>,
    register_type::<i8>,
    register_type::<u16>,
    register_type::<i16>,
    register_type::<u32>,
    register_type::<i32>,
    register_type::<u64>,
    register_type::<i64>,
    register_type::<u128>,
    register_type::<i128>,
    register_type::<f32>,
    register_type::<f64>,
    register_type::<char>,
    register_type::<()>,
    register_type::<String>,
    register_type::<Decimal>,
    register_type::<DateTime<Utc>>,
    register_type::<DateTime<FixedOffset>>,
    register_type::<TimeDelta>,
    register_type::<Duration>,
    register_type::<Uuid>,
    register_type::<BigInt>,
    register_type::<PropertyBag>,
    register_type::<DefaultComparer>,
    register_type::<CaseInsensitive>,
];

/// Concurrent, lazily populated map from runtime types to codecs.
pub struct CodecRegistry {
    by_type: DashMap<TypeId, Arc<Codec>>,
    by_name: DashMap<String, Arc<Codec>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// Creates a registry holding only the built-in codecs.
    pub fn new() -> Self {
        let registry = Self {
            by_type: DashMap::new(),
            by_name: DashMap::new(),
        };
        registry.register_builtins();
        registry
    }

    fn register_builtins(&self) {
        for register in BUILTINS {
            if let Err(e) = register(self) {
                warn!("skipping built-in codec: {e}");
            }
        }
    }

    /// Number of codecs a fresh registry starts with.
    pub fn builtin_count() -> usize {
        BUILTINS.len()
    }

    /// Returns the codec of `T`, building it on first request.
    ///
    /// The codec is built outside of any map lock. If two threads race on the same type both
    /// build it, the first insertion wins and every caller gets that instance.
    pub fn codec_for<T: GraphType>(&self) -> Result<Arc<Codec>> {
        let type_id = TypeId::of::<T>();
        if let Some(codec) = self.by_type.get(&type_id) {
            return Ok(Arc::clone(codec.value()));
        }
        let built = Arc::new(Codec::build::<T>()?);
        let codec = Arc::clone(self.by_type.entry(type_id).or_insert(built).value());
        self.index_name(&codec);
        Ok(codec)
    }

    fn index_name(&self, codec: &Arc<Codec>) {
        let name = codec.descriptor().name();
        match self.by_name.entry(name.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(codec));
            }
            Entry::Occupied(existing) => {
                let existing = existing.get();
                // Wire-identical types share names; only a differing layout is a conflict.
                if existing.descriptor().type_id() != codec.descriptor().type_id()
                    && existing.descriptor().structural_hash() != codec.descriptor().structural_hash()
                {
                    warn!(
                        "type name '{name}' already registered with hash {:#010x}; keeping it over {:#010x}",
                        existing.descriptor().structural_hash(),
                        codec.descriptor().structural_hash()
                    );
                }
            }
        }
    }

    /// Builds and caches the codec of `T`, making its name resolvable.
    pub fn register<T: GraphType>(&self) -> Result<TypeDescriptor> {
        self.codec_for::<T>().map(|codec| codec.descriptor().clone())
    }

    /// Descriptor of `T` (write path).
    pub fn descriptor_of<T: GraphType>(&self) -> Result<TypeDescriptor> {
        self.register::<T>()
    }

    /// Resolves a serialized name to its codec (read path).
    pub fn resolve(&self, name: &str) -> Result<Arc<Codec>> {
        self.by_name
            .get(name)
            .map(|codec| Arc::clone(codec.value()))
            .ok_or_else(|| GraphcodeError::UnknownType(name.to_owned()))
    }

    /// Returns `true` if `name` resolves.
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the cached codec of a runtime type, if any.
    pub fn codec_by_type_id(&self, type_id: TypeId) -> Option<Arc<Codec>> {
        self.by_type.get(&type_id).map(|codec| Arc::clone(codec.value()))
    }

    /// Registers every type submitted with `#[graphcode(auto_register)]`.
    ///
    /// Returns the number of types registered. A type whose codec fails to build is skipped
    /// with a warning.
    pub fn auto_register(&self) -> usize {
        let mut count = 0;
        for entry in inventory::iter::<AutoRegistration> {
            match (entry.register)(self) {
                Ok(descriptor) => {
                    debug!("auto-registered '{}'", descriptor.name());
                    count += 1;
                }
                Err(e) => warn!("skipping auto-registration: {e}"),
            }
        }
        count
    }

    /// Number of cached codecs, built-ins included.
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Returns `true` if no codec is cached. Only a registry caught mid-[`clear`] is empty.
    ///
    /// [`clear`]: CodecRegistry::clear
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Drops every codec built since creation, leaving the built-ins in place.
    pub fn clear(&self) {
        self.by_type.clear();
        self.by_name.clear();
        self.register_builtins();
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.by_type.len())
            .field("names", &self.by_name.len())
            .finish()
    }
}

/// A type submitted for registration by `#[graphcode(auto_register)]`.
pub struct AutoRegistration {
    register: fn(&CodecRegistry) -> Result<TypeDescriptor>,
}

impl fmt::Debug for AutoRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AutoRegistration")
    }
}

impl AutoRegistration {
    /// Creates the submission for `T`.
    pub const fn of<T: GraphType>() -> Self {
        Self {
            register: register_type::<T>,
        }
    }
}

fn register_type<T: GraphType>(registry: &CodecRegistry) -> Result<TypeDescriptor> {
    registry.register::<T>()
}

#[allow(unsafe_code)]
mod collect {
    inventory::collect!(super::AutoRegistration);
}
