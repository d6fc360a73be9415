//! The public entry point.
//!
//! [`Graphcode`] frames every call: it writes or validates the stream header and the root
//! descriptor, then hands the payload to the root type's codec through a fresh
//! [`GraphWriter`]/[`GraphReader`]. It holds nothing but options and a shared
//! [`CodecRegistry`], so it is cheap to clone and safe to use from many threads at once.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use log::trace;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use crate::descriptor::TypeDescriptor;
use crate::error::{GraphcodeError, Result};
use crate::format::WireHeader;
use crate::graph::{GraphReader, GraphWriter};
use crate::object::{GraphType, ObjectRef};
use crate::registry::CodecRegistry;
use crate::wire::WireReader;

/// Default nesting limit for a single call.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Per-engine settings.
///
/// Deserializable so it can live in an application's configuration file; missing keys take
/// their defaults.
///
/// ```rust
/// use graphcode::GraphcodeOptions;
///
/// let options: GraphcodeOptions = serde_json::from_str(r#"{ "max_depth": 64 }"#).unwrap();
/// assert_eq!(options.max_depth, 64);
/// assert!(!options.omit_root_type_name);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphcodeOptions {
    /// Leave the root descriptor out of the stream. Both sides must agree on this flag.
    pub omit_root_type_name: bool,
    /// Deepest nesting of shared references and boxes a call will follow.
    pub max_depth: usize,
}

impl Default for GraphcodeOptions {
    fn default() -> Self {
        Self {
            omit_root_type_name: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Builder for [`Graphcode`].
#[derive(Debug, Default)]
pub struct GraphcodeBuilder {
    options: GraphcodeOptions,
    registry: Option<Arc<CodecRegistry>>,
}

impl GraphcodeBuilder {
    /// Replaces all options at once.
    pub fn options(mut self, options: GraphcodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets [`GraphcodeOptions::omit_root_type_name`].
    pub fn omit_root_type_name(mut self, omit: bool) -> Self {
        self.options.omit_root_type_name = omit;
        self
    }

    /// Sets [`GraphcodeOptions::max_depth`].
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Shares an existing codec cache instead of creating a new one.
    pub fn registry(mut self, registry: Arc<CodecRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the engine.
    pub fn build(self) -> Graphcode {
        Graphcode {
            registry: self.registry.unwrap_or_default(),
            options: self.options,
        }
    }
}

/// Serializes and deserializes object graphs.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use graphcode::{Graphcode, GraphcodeObject};
///
/// #[derive(Debug, Default, GraphcodeObject)]
/// struct Node {
///     label: String,
///     next: Option<Rc<RefCell<Node>>>,
/// }
///
/// let node = Rc::new(RefCell::new(Node { label: "loop".into(), next: None }));
/// node.borrow_mut().next = Some(Rc::clone(&node));
///
/// let codec = Graphcode::new();
/// let bytes = codec.serialize(&node)?;
/// let back = codec.deserialize::<Rc<RefCell<Node>>>(&bytes)?.unwrap();
/// let next = back.borrow().next.clone().unwrap();
/// assert!(Rc::ptr_eq(&back, &next));
/// # back.borrow_mut().next = None;
/// # node.borrow_mut().next = None;
/// # Ok::<(), graphcode::GraphcodeError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Graphcode {
    registry: Arc<CodecRegistry>,
    options: GraphcodeOptions,
}

impl Graphcode {
    /// Creates an engine with default options and its own codec cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a [`GraphcodeBuilder`].
    pub fn builder() -> GraphcodeBuilder {
        GraphcodeBuilder::default()
    }

    /// Creates an engine with the given options and its own codec cache.
    pub fn with_options(options: GraphcodeOptions) -> Self {
        Self::builder().options(options).build()
    }

    /// The engine's options.
    pub fn options(&self) -> &GraphcodeOptions {
        &self.options
    }

    /// The codec cache shared by every call on this engine and its clones.
    pub fn registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }

    /// Builds and caches the codec of `T` so streams naming it can be read polymorphically.
    pub fn register<T: GraphType>(&self) -> Result<TypeDescriptor> {
        self.registry.register::<T>()
    }

    /// Registers every type declared with `#[graphcode(auto_register)]`.
    pub fn auto_register(&self) -> usize {
        self.registry.auto_register()
    }

    fn writer(&self) -> GraphWriter<'_> {
        let mut w = GraphWriter::new(&self.registry, self.options.max_depth);
        WireHeader::new(self.options.omit_root_type_name).write(w.wire());
        w
    }

    fn reader<'a>(&'a self, bytes: &'a [u8]) -> Result<GraphReader<'a>> {
        let mut wire = WireReader::new(bytes);
        WireHeader::read_validated(&mut wire, self.options.omit_root_type_name)?;
        Ok(GraphReader::new(wire, &self.registry, self.options.max_depth))
    }

    /// Serializes a value.
    pub fn serialize<T: GraphType>(&self, value: &T) -> Result<Vec<u8>> {
        self.serialize_option(Some(value))
    }

    /// Serializes a possibly absent value. `None` produces an empty stream.
    pub fn serialize_option<T: GraphType>(&self, value: Option<&T>) -> Result<Vec<u8>> {
        let Some(value) = value else {
            trace!("serialized absent '{}'", T::type_name());
            return Ok(Vec::new());
        };
        let codec = self.registry.codec_for::<T>()?;
        let mut w = self.writer();
        if !self.options.omit_root_type_name {
            w.write_descriptor(codec.descriptor())?;
        }
        value.encode(&mut w)?;
        let bytes = w.finish();
        trace!(
            "serialized '{}' into {} bytes",
            codec.descriptor().name(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Drains an iterator and serializes the items as a `Vec<T>`.
    pub fn serialize_iter<T, I>(&self, items: I) -> Result<Vec<u8>>
    where
        T: GraphType,
        I: IntoIterator<Item = T>,
    {
        let snapshot: Vec<T> = items.into_iter().collect();
        self.serialize(&snapshot)
    }

    /// Deserializes a value of type `T`. An empty stream yields `None`.
    pub fn deserialize<T: GraphType>(&self, bytes: &[u8]) -> Result<Option<T>> {
        if bytes.is_empty() {
            trace!("deserialized absent '{}'", T::type_name());
            return Ok(None);
        }
        // Built first so construction errors win over stream errors.
        self.registry.codec_for::<T>()?;
        let mut r = self.reader(bytes)?;
        if !self.options.omit_root_type_name {
            r.expect_type::<T>()?;
        }
        let value = T::decode(&mut r)?;
        r.finish()?;
        trace!("deserialized '{}' from {} bytes", T::type_name(), bytes.len());
        Ok(Some(value))
    }

    /// Serializes a dynamically typed value. The root descriptor names its concrete type.
    ///
    /// The stream is the one [`Graphcode::serialize`] writes for the concrete value, so
    /// either deserializer reads it.
    pub fn serialize_object(&self, value: &ObjectRef) -> Result<Vec<u8>> {
        let codec = (**value).object_codec(&self.registry)?;
        let mut w = self.writer();
        if !self.options.omit_root_type_name {
            w.write_descriptor(codec.descriptor())?;
        }
        codec.write_object(&**value, &mut w)?;
        let bytes = w.finish();
        trace!(
            "serialized object '{}' into {} bytes",
            codec.descriptor().name(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Deserializes a dynamically typed value.
    ///
    /// `expected` names the root type. It is required when the root descriptor is omitted and
    /// checked against the stream otherwise.
    pub fn deserialize_object(
        &self,
        bytes: &[u8],
        expected: Option<&str>,
    ) -> Result<Option<ObjectRef>> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let mut r = self.reader(bytes)?;
        let codec = if self.options.omit_root_type_name {
            let name = expected.ok_or(GraphcodeError::MissingExpectedType)?;
            self.registry.resolve(name)?
        } else {
            let codec = r.resolve_descriptor()?;
            if let Some(name) = expected {
                if name != codec.descriptor().name() {
                    return Err(GraphcodeError::TypeMismatch {
                        expected: name.to_owned(),
                        found: codec.descriptor().name().to_owned(),
                    });
                }
            }
            codec
        };
        let value = codec.read_root(&mut r)?;
        r.finish()?;
        trace!(
            "deserialized object '{}' from {} bytes",
            codec.descriptor().name(),
            bytes.len()
        );
        Ok(Some(value))
    }

    /// Serializes a value into a writer.
    pub fn write_to<T: GraphType, W: Write>(&self, mut writer: W, value: &T) -> Result<()> {
        let bytes = self.serialize(value)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a reader to its end and deserializes the bytes.
    pub fn read_from<T: GraphType, R: Read>(&self, mut reader: R) -> Result<Option<T>> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.deserialize(&bytes)
    }

    /// Serializes a value into a file, replacing its contents.
    pub fn save<T: GraphType, P: AsRef<Path>>(&self, path: P, value: &T) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file), value)
    }

    /// Deserializes a value from a memory-mapped file.
    pub fn load<T: GraphType, P: AsRef<Path>>(&self, path: P) -> Result<Option<T>> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(None);
        }
        // Safety: the mapping is only read for the duration of this call. Another process
        // truncating the file meanwhile is outside what this API protects against.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        self.deserialize(&mmap)
    }
}
