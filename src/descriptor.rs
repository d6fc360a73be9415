//! Type descriptors and structural hashing.
//!
//! Every serializable type describes its layout through a [`TypeInfo`]: its serialized name,
//! its [`TypeKind`] and the ordered list of fields (or variants, or element types) that make
//! up its encoding. From that description the registry derives a [`TypeDescriptor`], whose
//! structural hash is written next to the type name wherever a stream identifies a type.
//!
//! ## Structural Hash
//!
//! The hash is xxHash32 (seed 0) over the kind tag, the type name and, for every field in
//! declaration order, the field name, the field type name and the digest of the field type's
//! own layout. Nested digests are folded in recursively, so renaming, adding, removing or
//! retyping a field anywhere below a root changes the root's hash. Recursive types are cut at
//! the first revisit of a type name that is already being hashed, which keeps the result
//! finite and deterministic.
//!
//! Within one computation the digest of a nested type whose subtree made no recursion cut is
//! memoized by name, so shared subtrees are hashed once.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::hash::Hasher;

use twox_hash::XxHash32;

use crate::error::{GraphcodeError, Result};
use crate::object::GraphType;

const END_OF_FIELDS: u8 = 0xFE;
const RECURSION_CUT: u8 = 0xFF;

/// The shape of a serializable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Fixed-width scalar (integers, floats, bool, char, decimal, instants, UUID...).
    Primitive,
    /// Length-prefixed UTF-8 string.
    String,
    /// Enumeration, written as a discriminant or variant index.
    Enum,
    /// Plain struct encoded field by field.
    Struct,
    /// Nullable wrapper around another type.
    Nullable,
    /// Identity-tracked shared allocation (`Rc`, `Arc`).
    Shared,
    /// Interior-mutable container (`RefCell`, `Mutex`, `RwLock`).
    Cell,
    /// Sequence of independently encoded elements, including jagged arrays.
    Array,
    /// Rectangular multi-dimensional array.
    RectArray,
    /// Fixed-arity heterogeneous tuple.
    Tuple,
    /// Dictionary with a comparer marker.
    Map,
    /// Set of unique elements.
    Set,
    /// Type serialized through an explicit name/value bag and a factory.
    Contract,
    /// Open-ended name/value record.
    Bag,
    /// Polymorphic reference whose concrete type travels with the value.
    Object,
    /// A shape the codec refuses to encode (function or raw pointers).
    Unsupported,
}

impl TypeKind {
    fn tag(self) -> u8 {
        match self {
            Self::Primitive => 1,
            Self::String => 2,
            Self::Enum => 3,
            Self::Struct => 4,
            Self::Nullable => 5,
            Self::Shared => 6,
            Self::Cell => 7,
            Self::Array => 8,
            Self::RectArray => 9,
            Self::Tuple => 10,
            Self::Map => 11,
            Self::Set => 12,
            Self::Contract => 13,
            Self::Bag => 14,
            Self::Object => 15,
            Self::Unsupported => 16,
        }
    }
}

/// One member of a [`TypeInfo`]: a struct field, an enum variant or an element type.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    name: String,
    type_name: String,
    info: Option<fn() -> TypeInfo>,
}

impl FieldInfo {
    /// Name of the member.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialized name of the member's type, or the discriminant for a unit variant.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Layout of the member's type, if it has one.
    pub fn info(&self) -> Option<TypeInfo> {
        self.info.map(|f| f())
    }
}

/// Layout description of a serializable type.
///
/// Built by `GraphType::type_info`, either by hand or by `#[derive(GraphcodeObject)]`:
///
/// ```rust
/// use graphcode::{TypeInfo, TypeKind};
///
/// let info = TypeInfo::new("app::Point", TypeKind::Struct)
///     .field::<i32>("x")
///     .field::<i32>("y");
/// assert_eq!(info.fields().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TypeInfo {
    name: String,
    kind: TypeKind,
    fields: Vec<FieldInfo>,
    has_factory: bool,
}

impl TypeInfo {
    /// Starts a description with no members.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            has_factory: true,
        }
    }

    /// Appends a member of type `F`.
    pub fn field<F: GraphType>(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            type_name: F::type_name(),
            info: Some(F::type_info as fn() -> TypeInfo),
        });
        self
    }

    /// Appends a unit enum variant with its discriminant.
    pub fn variant(mut self, name: impl Into<String>, discriminant: i64) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            type_name: discriminant.to_string(),
            info: None,
        });
        self
    }

    /// Records whether a custom-contract type can be rebuilt from its bag.
    pub fn factory(mut self, has_factory: bool) -> Self {
        self.has_factory = has_factory;
        self
    }

    /// Serialized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shape of the type.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Members in encoding order.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Whether a contract type declares a factory. Always `true` for other kinds.
    pub fn has_factory(&self) -> bool {
        self.has_factory
    }

    /// Computes the structural hash of this layout.
    pub fn structural_hash(&self) -> i32 {
        let mut in_progress = vec![self.name.clone()];
        let mut memo = HashMap::new();
        let (digest, _) = self.digest(&mut in_progress, &mut memo);
        digest as i32
    }

    // Returns the digest and whether the walk below this layout avoided every recursion cut.
    // Only cut-free digests are independent of the path that reached them.
    fn digest(&self, in_progress: &mut Vec<String>, memo: &mut HashMap<String, u32>) -> (u32, bool) {
        let mut hasher = XxHash32::with_seed(0);
        let mut cut_free = true;
        hasher.write(&[self.kind.tag()]);
        write_terminated(&mut hasher, &self.name);
        for field in &self.fields {
            write_terminated(&mut hasher, &field.name);
            write_terminated(&mut hasher, &field.type_name);
            let Some(info) = field.info else { continue };
            if in_progress.iter().any(|name| *name == field.type_name) {
                hasher.write(&[RECURSION_CUT]);
                cut_free = false;
                continue;
            }
            let nested = match memo.get(&field.type_name) {
                Some(digest) => *digest,
                None => {
                    in_progress.push(field.type_name.clone());
                    let (digest, closed) = info().digest(in_progress, memo);
                    in_progress.pop();
                    if closed {
                        memo.insert(field.type_name.clone(), digest);
                    } else {
                        cut_free = false;
                    }
                    digest
                }
            };
            hasher.write(&nested.to_be_bytes());
        }
        hasher.write(&[END_OF_FIELDS]);
        // XxHash32 only produces 32 significant bits.
        (hasher.finish() as u32, cut_free)
    }

    /// Walks every type reachable from this layout and rejects shapes the codec cannot
    /// represent.
    pub fn validate(&self) -> Result<()> {
        let mut visited = HashSet::new();
        visited.insert(self.name.clone());
        self.validate_inner(&mut visited)
    }

    fn validate_inner(&self, visited: &mut HashSet<String>) -> Result<()> {
        match self.kind {
            TypeKind::Unsupported => {
                return Err(GraphcodeError::UnsupportedType(self.name.clone()));
            }
            TypeKind::Contract if !self.has_factory => {
                return Err(GraphcodeError::MissingFactory(self.name.clone()));
            }
            _ => {}
        }
        for field in &self.fields {
            let Some(info) = field.info else { continue };
            if !visited.insert(field.type_name.clone()) {
                continue;
            }
            info().validate_inner(visited).map_err(|e| match e {
                GraphcodeError::UnsupportedType(inner) => GraphcodeError::UnsupportedType(
                    format!("{}.{}: {inner}", self.name, field.name),
                ),
                other => other,
            })?;
        }
        Ok(())
    }
}

fn write_terminated(hasher: &mut XxHash32, text: &str) {
    hasher.write(text.as_bytes());
    hasher.write(&[0]);
}

/// The resolved identity of a serializable type: serialized name, structural hash and the
/// local runtime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: String,
    hash: i32,
    type_id: TypeId,
}

impl TypeDescriptor {
    pub(crate) fn new(name: String, hash: i32, type_id: TypeId) -> Self {
        Self {
            name,
            hash,
            type_id,
        }
    }

    /// Serialized type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural hash of the type's layout.
    pub fn structural_hash(&self) -> i32 {
        self.hash
    }

    /// Runtime type this descriptor resolves to.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Checks a hash read from a stream against this descriptor.
    pub fn check_hash(&self, found: i32) -> Result<()> {
        if found == self.hash {
            Ok(())
        } else {
            Err(GraphcodeError::SchemaChanged {
                type_name: self.name.clone(),
                expected: self.hash,
                found,
            })
        }
    }
}
