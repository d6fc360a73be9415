#![allow(missing_docs)]

use graphcode::{object, Graphcode, GraphcodeError, GraphcodeObject, GraphType};

mod v1 {
    use graphcode::GraphcodeObject;

    #[derive(Debug, Clone, PartialEq, GraphcodeObject)]
    #[graphcode(name = "app::Profile")]
    pub struct Profile {
        pub name: String,
        pub age: u32,
    }

    #[derive(Debug, Clone, PartialEq, GraphcodeObject)]
    #[graphcode(name = "app::Settings")]
    pub struct Settings {
        pub theme: String,
    }

    #[derive(Debug, Clone, PartialEq, GraphcodeObject)]
    #[graphcode(name = "app::Account")]
    pub struct Account {
        pub id: u64,
        pub settings: Settings,
    }
}

mod v2 {
    use graphcode::GraphcodeObject;

    // `age` was widened.
    #[derive(Debug, Clone, PartialEq, GraphcodeObject)]
    #[graphcode(name = "app::Profile")]
    pub struct Profile {
        pub name: String,
        pub age: u64,
    }

    // A field was added.
    #[derive(Debug, Clone, PartialEq, GraphcodeObject)]
    #[graphcode(name = "app::Settings")]
    pub struct Settings {
        pub theme: String,
        pub dark: bool,
    }

    // Unchanged itself, but its nested type moved on.
    #[derive(Debug, Clone, PartialEq, GraphcodeObject)]
    #[graphcode(name = "app::Account")]
    pub struct Account {
        pub id: u64,
        pub settings: Settings,
    }
}

mod v3 {
    use graphcode::GraphcodeObject;

    // Same layout as v1, only a transient field was added.
    #[derive(Debug, Clone, PartialEq, GraphcodeObject)]
    #[graphcode(name = "app::Profile")]
    pub struct Profile {
        pub name: String,
        pub age: u32,
        #[graphcode(skip)]
        pub cache: Option<String>,
    }

    // Same types, one field renamed in the layout.
    #[derive(Debug, Clone, PartialEq, GraphcodeObject)]
    #[graphcode(name = "app::Profile")]
    pub struct RenamedProfile {
        #[graphcode(rename = "full_name")]
        pub name: String,
        pub age: u32,
    }
}

#[derive(Debug, PartialEq, GraphcodeObject)]
struct Unrelated {
    value: u8,
}

fn profile() -> v1::Profile {
    v1::Profile {
        name: "ana".into(),
        age: 31,
    }
}

/// Schema Drift
/// A stream written by an older layout of the same type name is rejected.
#[test]
fn test_schema_change_detected() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let bytes = codec.serialize(&profile())?;

    match codec.deserialize::<v2::Profile>(&bytes) {
        Err(GraphcodeError::SchemaChanged { type_name, expected, found }) => {
            assert_eq!(type_name, "app::Profile");
            assert_ne!(expected, found);
        }
        other => panic!("expected SchemaChanged, got {other:?}"),
    }
    Ok(())
}

/// Nested Drift
/// Changing a nested type changes the hash of every type that contains it.
#[test]
fn test_nested_schema_change_detected() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let account = v1::Account {
        id: 7,
        settings: v1::Settings { theme: "light".into() },
    };
    let bytes = codec.serialize(&account)?;
    assert!(matches!(
        codec.deserialize::<v2::Account>(&bytes),
        Err(GraphcodeError::SchemaChanged { .. })
    ));
    Ok(())
}

/// Hash Stability
/// Transient fields do not take part in the layout; renames do.
#[test]
fn test_hash_inputs() -> graphcode::Result<()> {
    let hash_v1 = v1::Profile::type_info().structural_hash();
    assert_eq!(hash_v1, v1::Profile::type_info().structural_hash());
    assert_eq!(hash_v1, v3::Profile::type_info().structural_hash());
    assert_ne!(hash_v1, v3::RenamedProfile::type_info().structural_hash());
    assert_ne!(hash_v1, v2::Profile::type_info().structural_hash());

    let codec = Graphcode::new();
    let back = codec
        .deserialize::<v3::Profile>(&codec.serialize(&profile())?)?
        .unwrap();
    assert_eq!(back.name, "ana");
    assert_eq!(back.cache, None);
    Ok(())
}

/// Unknown Root Type
/// A reader that has never seen the stream's root type cannot resolve it.
#[test]
fn test_unknown_root_type() -> graphcode::Result<()> {
    let bytes = Graphcode::new().serialize(&profile())?;

    match Graphcode::new().deserialize::<Unrelated>(&bytes) {
        Err(GraphcodeError::UnknownType(name)) => assert_eq!(name, "app::Profile"),
        other => panic!("expected UnknownType, got {other:?}"),
    }
    Ok(())
}

/// Root Type Mismatch
/// A reader that knows the stream's root type reports the mismatch.
#[test]
fn test_root_type_mismatch() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let bytes = codec.serialize(&profile())?;

    match codec.deserialize::<Unrelated>(&bytes) {
        Err(GraphcodeError::TypeMismatch { expected, found }) => {
            assert_eq!(expected, Unrelated::type_name());
            assert_eq!(found, "app::Profile");
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    Ok(())
}

/// Polymorphic Drift
/// The hash carried next to an object's type name is checked on read as well.
#[test]
fn test_polymorphic_schema_change() -> graphcode::Result<()> {
    let writer = Graphcode::new();
    let bytes = writer.serialize_object(&object(profile()))?;

    let reader = Graphcode::new();
    reader.register::<v2::Profile>()?;
    assert!(matches!(
        reader.deserialize_object(&bytes, None),
        Err(GraphcodeError::SchemaChanged { .. })
    ));
    Ok(())
}

/// Default Type Names
/// Derived types are named after their module path.
#[test]
fn test_default_type_name() {
    assert_eq!(Unrelated::type_name(), "schema_test::Unrelated");
    assert_eq!(v1::Profile::type_name(), "app::Profile");
}
