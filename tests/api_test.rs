#![allow(missing_docs)]

use std::fs;
use std::io::Cursor;
use std::rc::Rc;
use std::sync::Arc;

use graphcode::{
    object, CodecRegistry, Graphcode, GraphcodeError, GraphcodeObject, GraphcodeOptions,
};

#[derive(Debug, Clone, PartialEq, GraphcodeObject)]
struct SimpleData {
    id: u32,
    message: String,
}

#[derive(Debug, Clone, PartialEq, GraphcodeObject)]
struct ComplexData {
    title: String,
    numbers: Vec<u64>,
    inner: SimpleData,
    tags: Option<Vec<String>>,
}

#[derive(Debug, GraphcodeObject)]
struct Chain {
    value: u32,
    next: Option<Box<Chain>>,
}

// Generator of data
fn create_complex_data() -> ComplexData {
    ComplexData {
        title: "Integration Test".to_string(),
        numbers: (0..5_000).collect(),
        inner: SimpleData {
            id: 42,
            message: "Hello World".to_string(),
        },
        tags: Some(vec!["a".into(), "b".into()]),
    }
}

fn chain(len: u32) -> Chain {
    (1..len).fold(Chain { value: 0, next: None }, |next, value| Chain {
        value,
        next: Some(Box::new(next)),
    })
}

// --- TESTS ---

/// Standard File IO
/// Validate `Graphcode::save` and the memory-mapped `Graphcode::load`.
#[test]
fn test_standard_file_io() -> graphcode::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("complex.gc");
    let codec = Graphcode::new();
    let data = create_complex_data();

    codec.save(&path, &data)?;
    assert_eq!(fs::read(&path)?, codec.serialize(&data)?);
    assert_eq!(codec.load::<ComplexData, _>(&path)?, Some(data));
    Ok(())
}

/// Empty Files
/// An empty file holds the absent value.
#[test]
fn test_load_empty_file() -> graphcode::Result<()> {
    let file = tempfile::NamedTempFile::new()?;
    let codec = Graphcode::new();
    assert_eq!(codec.load::<SimpleData, _>(file.path())?, None);
    Ok(())
}

/// Missing Files
#[test]
fn test_load_missing_file() {
    let codec = Graphcode::new();
    assert!(matches!(
        codec.load::<SimpleData, _>("definitely/not/here.gc"),
        Err(GraphcodeError::Io(_))
    ));
}

/// Memory IO
/// Validate `write_to` and `read_from` over in-memory buffers.
#[test]
fn test_memory_io() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let data = create_complex_data();

    let mut buffer = Vec::new();
    codec.write_to(&mut buffer, &data)?;
    let back = codec.read_from::<ComplexData, _>(Cursor::new(buffer))?;
    assert_eq!(back, Some(data));
    Ok(())
}

/// Absent vs Null
/// An absent root is an empty stream; a null inside the graph is a flag byte.
#[test]
fn test_absent_and_null() -> graphcode::Result<()> {
    let codec = Graphcode::new();

    let absent = codec.serialize_option::<SimpleData>(None)?;
    assert!(absent.is_empty());
    assert_eq!(codec.deserialize::<SimpleData>(&absent)?, None);
    assert_eq!(codec.deserialize_object(&absent, None)?.map(|_| ()), None);

    let null_inside = codec.serialize(&Option::<Rc<String>>::None)?;
    assert!(!null_inside.is_empty());
    assert_eq!(codec.deserialize::<Option<Rc<String>>>(&null_inside)?, Some(None));
    Ok(())
}

/// Header Validation
#[test]
fn test_header_errors() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let mut bytes = codec.serialize(&SimpleData { id: 1, message: "x".into() })?;

    let mut future = bytes.clone();
    future[1] = 2;
    assert!(matches!(
        codec.deserialize::<SimpleData>(&future),
        Err(GraphcodeError::InvalidVersion { expected: 1, found: 2 })
    ));

    let omitting = Graphcode::builder().omit_root_type_name(true).build();
    assert!(matches!(
        omitting.deserialize::<SimpleData>(&bytes),
        Err(GraphcodeError::RootFlagMismatch { expected: true, found: false })
    ));

    bytes.push(0xFF);
    assert!(matches!(
        codec.deserialize::<SimpleData>(&bytes),
        Err(GraphcodeError::FormatCorruption(_))
    ));
    Ok(())
}

/// Truncation
/// Every proper prefix of a stream fails; none of them panics or yields a value.
/// Cutting the last byte leaves the 11-byte message one byte short.
#[test]
fn test_truncated_stream() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let bytes = codec.serialize(&SimpleData { id: 7, message: "truncate me".into() })?;

    for cut in 1..bytes.len() {
        assert!(codec.deserialize::<SimpleData>(&bytes[..cut]).is_err(), "prefix {cut}");
    }
    assert!(matches!(
        codec.deserialize::<SimpleData>(&bytes[..bytes.len() - 1]),
        Err(GraphcodeError::TruncatedStream { needed: 11, remaining: 10 })
    ));
    Ok(())
}

/// Omitted Root Type
/// Both sides agree on the flag; the stream is then shorter by the descriptor.
#[test]
fn test_omit_root_type_name() -> graphcode::Result<()> {
    let named = Graphcode::new();
    let bare = Graphcode::builder().omit_root_type_name(true).build();
    let data = create_complex_data();

    let full = named.serialize(&data)?;
    let short = bare.serialize(&data)?;
    assert!(short.len() < full.len());
    assert_eq!(short[2], 1);
    assert_eq!(bare.deserialize::<ComplexData>(&short)?, Some(data));
    Ok(())
}

/// Dynamic Roots
/// The root's concrete type comes from the stream, or from the caller when omitted.
#[test]
fn test_object_roots() -> graphcode::Result<()> {
    let named = Graphcode::new();
    named.register::<SimpleData>()?;
    let value = object(SimpleData { id: 3, message: "dyn".into() });

    let bytes = named.serialize_object(&value)?;
    let back = named.deserialize_object(&bytes, None)?.unwrap();
    assert_eq!(back.downcast_ref::<SimpleData>(), Some(&SimpleData { id: 3, message: "dyn".into() }));

    let name = "api_test::SimpleData";
    assert!(named.deserialize_object(&bytes, Some(name))?.is_some());
    assert!(matches!(
        named.deserialize_object(&bytes, Some("u32")),
        Err(GraphcodeError::TypeMismatch { .. })
    ));

    let bare = Graphcode::builder()
        .omit_root_type_name(true)
        .registry(Arc::clone(named.registry()))
        .build();
    let short = bare.serialize_object(&value)?;
    assert!(matches!(
        bare.deserialize_object(&short, None),
        Err(GraphcodeError::MissingExpectedType)
    ));
    let back = bare.deserialize_object(&short, Some(name))?.unwrap();
    assert!(back.is::<SimpleData>());
    Ok(())
}

/// Typed and Dynamic Roots
/// Both root APIs write the same stream, so each reads what the other wrote.
#[test]
fn test_typed_and_object_roots_interoperate() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let data = SimpleData { id: 7, message: "both ways".into() };

    let typed = codec.serialize(&data)?;
    let dynamic = codec.serialize_object(&object(data.clone()))?;
    assert_eq!(typed, dynamic);

    let back = codec.deserialize_object(&typed, None)?.unwrap();
    assert_eq!(back.downcast_ref::<SimpleData>(), Some(&data));
    assert_eq!(codec.deserialize::<SimpleData>(&dynamic)?, Some(data));

    // Built-in roots need no registration on the reading side.
    let number = Graphcode::new().serialize(&1.25f64)?;
    let back = Graphcode::new().deserialize_object(&number, None)?.unwrap();
    assert_eq!(back.downcast_ref::<f64>(), Some(&1.25));
    Ok(())
}

/// Shared Registries
/// Engines built over one registry resolve each other's types.
#[test]
fn test_shared_registry() -> graphcode::Result<()> {
    let registry = Arc::new(CodecRegistry::new());
    let a = Graphcode::builder().registry(Arc::clone(&registry)).build();
    let b = Graphcode::builder().registry(Arc::clone(&registry)).build();

    a.register::<SimpleData>()?;
    let bytes = b.serialize_object(&object(SimpleData { id: 1, message: "x".into() }))?;
    assert!(a.deserialize_object(&bytes, None)?.is_some());
    assert!(registry.contains_name("api_test::SimpleData"));

    registry.clear();
    assert!(matches!(
        a.deserialize_object(&bytes, None),
        Err(GraphcodeError::UnknownType(_))
    ));
    assert_eq!(registry.len(), CodecRegistry::builtin_count());
    assert!(registry.contains_name("String"));
    Ok(())
}

/// Depth Limit
/// Deep nesting fails cleanly on either side instead of exhausting the stack.
#[test]
fn test_depth_limit() -> graphcode::Result<()> {
    let shallow = Graphcode::builder().max_depth(8).build();
    let deep = Graphcode::new();

    assert!(shallow.serialize(&chain(8)).is_ok());
    assert!(matches!(
        shallow.serialize(&chain(20)),
        Err(GraphcodeError::DepthLimitExceeded(8))
    ));

    let bytes = deep.serialize(&chain(20))?;
    assert!(matches!(
        shallow.deserialize::<Chain>(&bytes),
        Err(GraphcodeError::DepthLimitExceeded(8))
    ));
    assert_eq!(deep.deserialize::<Chain>(&bytes)?.map(|c| c.value), Some(19));
    Ok(())
}

/// Options From Configuration
#[test]
fn test_options_from_json() -> graphcode::Result<()> {
    let options: GraphcodeOptions =
        serde_json::from_str(r#"{ "omit_root_type_name": true, "max_depth": 16 }"#)
            .map_err(|e| GraphcodeError::Internal(e.to_string()))?;
    let codec = Graphcode::with_options(options);
    assert_eq!(codec.options().max_depth, 16);

    let bytes = codec.serialize(&5u8)?;
    assert_eq!(bytes, vec![0, 1, 1, 5]);
    assert_eq!(codec.deserialize::<u8>(&bytes)?, Some(5));
    Ok(())
}

/// Inspector
/// The report names the root type and shows its layout without decoding the payload.
#[test]
fn test_inspector() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let bytes = codec.serialize(&create_complex_data())?;

    let report = codec.inspect(&bytes)?;
    assert_eq!(report.format_version, Some(1));
    assert_eq!(report.root_type.as_deref(), Some("api_test::ComplexData"));
    assert_eq!(report.root_hash, report.local_hash);
    assert!(!report.schema_changed());
    assert_eq!(report.payload_offset + report.payload_len, bytes.len());

    let layout = report.layout.as_ref().unwrap();
    let members: Vec<&str> = layout
        .children
        .iter()
        .filter_map(|c| c.member.as_deref())
        .collect();
    assert_eq!(members, vec!["title", "numbers", "inner", "tags"]);

    let text = report.to_string();
    assert!(text.contains("GRAPHCODE STREAM REPORT"));
    assert!(text.contains("inner: api_test::SimpleData"));

    // A fresh engine can still read the framing.
    let stranger = Graphcode::new().inspect(&bytes)?;
    assert_eq!(stranger.root_type, report.root_type);
    assert!(stranger.layout.is_none());

    assert!(codec.inspect(&[])?.is_absent());
    Ok(())
}
