#![allow(missing_docs)]

use graphcode::wire::{WireReader, WireWriter};
use graphcode::{GraphcodeError, GraphcodeObject, GraphType, Graphcode, TypeInfo, TypeKind};
use rust_decimal::Decimal;

// Each level holds two copies of the one below, so the expanded layout doubles per level.
macro_rules! layer {
    ($($name:ident => $below:ty;)*) => {
        $(
            #[derive(Debug, GraphcodeObject)]
            #[allow(dead_code)]
            struct $name {
                left: $below,
                right: $below,
            }
        )*
    };
}

layer! {
    L1 => u8; L2 => L1; L3 => L2; L4 => L3; L5 => L4; L6 => L5; L7 => L6; L8 => L7;
    L9 => L8; L10 => L9; L11 => L10; L12 => L11; L13 => L12; L14 => L13; L15 => L14;
    L16 => L15; L17 => L16; L18 => L17; L19 => L18; L20 => L19; L21 => L20; L22 => L21;
    L23 => L22; L24 => L23; L25 => L24; L26 => L25; L27 => L26; L28 => L27; L29 => L28;
    L30 => L29; L31 => L30; L32 => L31; L33 => L32; L34 => L33; L35 => L34; L36 => L35;
    L37 => L36; L38 => L37; L39 => L38; L40 => L39;
}

/// Big-endian Integers
#[test]
fn test_fixed_width_big_endian() -> graphcode::Result<()> {
    let mut w = WireWriter::new();
    w.write_i16(1);
    w.write_i32(-2);
    w.write_u64(0x0102_0304_0506_0708);
    w.write_f32(1.0);
    let bytes = w.into_bytes();

    assert_eq!(&bytes[..2], &[0, 1]);
    assert_eq!(&bytes[2..6], &[0xFF, 0xFF, 0xFF, 0xFE]);
    assert_eq!(&bytes[6..14], &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(&bytes[14..], &[0x3F, 0x80, 0, 0]);

    let mut r = WireReader::new(&bytes);
    assert_eq!(r.read_i16()?, 1);
    assert_eq!(r.read_i32()?, -2);
    assert_eq!(r.read_u64()?, 0x0102_0304_0506_0708);
    assert_eq!(r.read_f32()?, 1.0);
    assert!(r.is_exhausted());
    Ok(())
}

/// Strings
/// Present strings carry a flag and a byte length; null is a single zero byte.
#[test]
fn test_strings() -> graphcode::Result<()> {
    let mut w = WireWriter::new();
    w.write_str("añ")?;
    w.write_opt_str(None)?;
    w.write_str("")?;
    let bytes = w.into_bytes();
    assert_eq!(&bytes[..5], &[1, 0, 0, 0, 3]);

    let mut r = WireReader::new(&bytes);
    assert_eq!(r.read_str()?, Some("añ"));
    assert_eq!(r.read_str()?, None);
    assert_eq!(r.read_str()?, Some(""));
    Ok(())
}

/// Corrupt Input
#[test]
fn test_corrupt_primitives() {
    assert!(matches!(
        WireReader::new(&[2]).read_bool(),
        Err(GraphcodeError::FormatCorruption(_))
    ));
    assert!(matches!(
        WireReader::new(&[0xFF, 0xFF, 0xFF, 0xFF]).read_len(),
        Err(GraphcodeError::FormatCorruption(_))
    ));
    assert!(matches!(
        WireReader::new(&[0, 0x11, 0, 0]).read_char(),
        Err(GraphcodeError::FormatCorruption(_))
    ));
    assert!(matches!(
        WireReader::new(&[1, 0, 0, 0, 2, 0xC3, 0x28]).read_str(),
        Err(GraphcodeError::FormatCorruption(_))
    ));
    assert!(matches!(
        WireReader::new(&[0, 0]).read_u32(),
        Err(GraphcodeError::TruncatedStream { needed: 4, remaining: 2 })
    ));
}

/// Decimal Layout
/// Mantissa words first, then sign and scale in the flags word.
#[test]
fn test_decimal_layout() -> graphcode::Result<()> {
    let value = Decimal::new(-15, 1);
    let mut w = WireWriter::new();
    w.write_decimal(&value);
    let bytes = w.into_bytes();
    assert_eq!(bytes.len(), 20);
    assert_eq!(&bytes[..8], &[0, 0, 0, 0, 0, 0, 0, 15]);
    assert_eq!(&bytes[16..], &[0x80, 1, 0, 0]);

    let back = WireReader::new(&bytes).read_decimal()?;
    assert_eq!(back, value);
    assert_eq!(back.scale(), 1);
    Ok(())
}

/// Structural Hash
/// The hash depends on names, kinds and field order, and survives recursion.
#[test]
fn test_structural_hash_inputs() {
    let base = TypeInfo::new("A", TypeKind::Struct).field::<u32>("x").field::<String>("y");
    let swapped = TypeInfo::new("A", TypeKind::Struct).field::<String>("y").field::<u32>("x");
    let renamed = TypeInfo::new("B", TypeKind::Struct).field::<u32>("x").field::<String>("y");
    let retyped = TypeInfo::new("A", TypeKind::Struct).field::<u64>("x").field::<String>("y");

    let hash = base.structural_hash();
    assert_eq!(hash, TypeInfo::new("A", TypeKind::Struct).field::<u32>("x").field::<String>("y").structural_hash());
    assert_ne!(hash, swapped.structural_hash());
    assert_ne!(hash, renamed.structural_hash());
    assert_ne!(hash, retyped.structural_hash());
}

/// Shared Subtrees
/// A layout that reuses a nested type is hashed once per distinct type, not per occurrence.
#[test]
fn test_structural_hash_of_shared_subtrees() -> graphcode::Result<()> {
    let hash = L40::type_info().structural_hash();
    assert_eq!(hash, L40::type_info().structural_hash());
    assert_ne!(hash, L39::type_info().structural_hash());

    let descriptor = Graphcode::new().register::<L40>()?;
    assert_eq!(descriptor.structural_hash(), hash);
    Ok(())
}

/// Builtin Names
#[test]
fn test_builtin_type_names() {
    assert_eq!(Vec::<Option<String>>::type_name(), "Vec<Option<String>>");
    assert_eq!(
        std::collections::HashMap::<String, i32>::type_name(),
        "Map<String,i32>"
    );
    assert_eq!(std::rc::Rc::<u8>::type_name(), "Ref<u8>");
    assert_eq!(Box::<u8>::type_name(), "u8");
}
