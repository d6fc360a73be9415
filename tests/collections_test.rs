#![allow(missing_docs)]

use std::collections::HashMap;
use std::rc::Rc;

use graphcode::graph::MAX_ZERO_WIDTH_ITEMS;
use graphcode::{
    object, CaseInsensitive, GraphMap, Graphcode, GraphcodeError, GraphcodeObject, PropertyBag,
    RectArray,
};

#[derive(Debug, Clone, PartialEq, GraphcodeObject)]
struct Heightmap {
    name: String,
    cells: RectArray<f32>,
}

#[derive(Debug, GraphcodeObject)]
struct Sheet {
    rows: Vec<Option<Rc<Vec<i32>>>>,
}

#[derive(Debug, GraphcodeObject)]
struct Headers {
    values: GraphMap<String, String, CaseInsensitive>,
}

#[derive(Debug, PartialEq, GraphcodeObject)]
struct Inventory {
    #[graphcode(entries)]
    stock: HashMap<String, u32>,
    warehouse: String,
    open: bool,
}

/// Rectangular Arrays
/// A 2x3 grid keeps its shape and its row-major order.
#[test]
fn test_rect_array_round_trip() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let value = Heightmap {
        name: "valley".into(),
        cells: RectArray::from_fn(vec![2, 3], |idx| (idx[0] * 10 + idx[1]) as f32)?,
    };

    let back = codec.deserialize::<Heightmap>(&codec.serialize(&value)?)?.unwrap();
    assert_eq!(back.cells.dims(), &[2, 3]);
    assert_eq!(back.cells.get(&[1, 2]), Some(&12.0));
    assert_eq!(back.cells.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    assert_eq!(back, value);
    Ok(())
}

/// Rectangular Wire Layout
/// Rank byte, one length per dimension, then the elements.
#[test]
fn test_rect_array_layout() -> graphcode::Result<()> {
    let codec = Graphcode::builder().omit_root_type_name(true).build();
    let grid = RectArray::new(vec![1, 2], vec![5u8, 6])?;
    let bytes = codec.serialize(&grid)?;
    assert_eq!(&bytes[3..], &[2, 0, 0, 0, 1, 0, 0, 0, 2, 5, 6]);
    Ok(())
}

/// Empty Dimensions
#[test]
fn test_rect_array_with_zero_length_dimension() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let empty = RectArray::<String>::new(vec![3, 0, 2], vec![])?;
    let back = codec
        .deserialize::<RectArray<String>>(&codec.serialize(&empty)?)?
        .unwrap();
    assert_eq!(back.dims(), &[3, 0, 2]);
    assert!(back.is_empty());
    Ok(())
}

/// Shape Validation
#[test]
fn test_rect_array_shape_errors() {
    assert!(matches!(
        RectArray::new(vec![2, 2], vec![1, 2, 3]),
        Err(GraphcodeError::InvalidShape(_))
    ));
    assert!(matches!(
        RectArray::<u8>::new(vec![], vec![]),
        Err(GraphcodeError::InvalidShape(_))
    ));
    assert!(matches!(
        RectArray::<u8>::new(vec![1; 300], vec![0]),
        Err(GraphcodeError::RankOverflow(300))
    ));
}

/// Zero-Width Elements
/// Elements that occupy no input cannot justify an arbitrarily large declared count.
#[test]
fn test_zero_width_element_counts() -> graphcode::Result<()> {
    let codec = Graphcode::builder().omit_root_type_name(true).build();

    let grid = [0, 1, 1, 2, 0x7F, 0xFF, 0xFF, 0xFF, 0x7F, 0xFF, 0xFF, 0xFF];
    assert!(matches!(
        codec.deserialize::<RectArray<()>>(&grid),
        Err(GraphcodeError::FormatCorruption(_))
    ));

    let mut list = vec![0, 1, 1];
    list.extend_from_slice(&(MAX_ZERO_WIDTH_ITEMS as i32 + 1).to_be_bytes());
    assert!(matches!(
        codec.deserialize::<Vec<()>>(&list),
        Err(GraphcodeError::FormatCorruption(_))
    ));

    // Small counts are still honored.
    let units = codec.serialize(&vec![(); 3])?;
    assert_eq!(codec.deserialize::<Vec<()>>(&units)?, Some(vec![(); 3]));
    Ok(())
}

/// Jagged Arrays
/// Rows of different lengths, including an empty one.
#[test]
fn test_jagged_rows() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let rows: Vec<Vec<u16>> = vec![vec![], vec![1, 2], vec![3, 4, 5, 6, 7]];
    let back = codec.deserialize::<Vec<Vec<u16>>>(&codec.serialize(&rows)?)?.unwrap();
    let lengths: Vec<usize> = back.iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![0, 2, 5]);
    assert_eq!(back, rows);
    Ok(())
}

/// Shared Jagged Rows
/// Rows are references: a repeated row is shared, a missing row stays missing.
#[test]
fn test_jagged_rows_with_shared_and_null() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let shared = Rc::new(vec![1, 2, 3]);
    let sheet = Sheet {
        rows: vec![Some(Rc::clone(&shared)), None, Some(Rc::clone(&shared))],
    };

    let back = codec.deserialize::<Sheet>(&codec.serialize(&sheet)?)?.unwrap();
    assert!(back.rows[1].is_none());
    let first = back.rows[0].as_ref().unwrap();
    let last = back.rows[2].as_ref().unwrap();
    assert!(Rc::ptr_eq(first, last));
    assert_eq!(**first, vec![1, 2, 3]);
    Ok(())
}

/// Dictionaries Keep Their Comparer
/// A case-insensitive map is still case-insensitive after a round trip.
#[test]
fn test_case_insensitive_map_round_trip() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let mut values = GraphMap::with_comparer(CaseInsensitive);
    values.insert("Content-Type".to_string(), "text/plain".to_string());
    values.insert("X-Trace".to_string(), "abc".to_string());

    let back = codec
        .deserialize::<Headers>(&codec.serialize(&Headers { values })?)?
        .unwrap();
    assert_eq!(back.values.len(), 2);
    assert_eq!(back.values.get("content-type").map(String::as_str), Some("text/plain"));
    assert!(back.values.contains_key("x-TRACE"));

    let mut again = back.values.clone();
    again.insert("CONTENT-TYPE".to_string(), "application/json".to_string());
    assert_eq!(again.len(), 2);
    Ok(())
}

/// Comparer Marker
/// Default maps write a zero marker; custom comparers write their descriptor.
#[test]
fn test_comparer_marker() -> graphcode::Result<()> {
    let codec = Graphcode::builder().omit_root_type_name(true).build();

    let plain: GraphMap<String, u8> = GraphMap::new();
    assert_eq!(&codec.serialize(&plain)?[3..], &[0, 0, 0, 0, 0]);

    let folded: GraphMap<String, u8, CaseInsensitive> = GraphMap::with_comparer(CaseInsensitive);
    let bytes = codec.serialize(&folded)?;
    assert_eq!(bytes[3], 1);
    let name = b"graphcode::CaseInsensitive";
    assert_eq!(&bytes[9..9 + name.len()], name);
    Ok(())
}

/// Dictionary Structs
/// A struct marked with an entries field is written as a dictionary plus its other fields.
#[test]
fn test_entries_struct_round_trip() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let value = Inventory {
        stock: HashMap::from([("bolt".to_string(), 120), ("nut".to_string(), 80)]),
        warehouse: "north".into(),
        open: true,
    };
    assert_eq!(codec.deserialize::<Inventory>(&codec.serialize(&value)?)?, Some(value));
    Ok(())
}

/// Property Bags
/// Entries keep their order, their concrete types and their identity.
#[test]
fn test_property_bag_round_trip() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let shared = object("shared".to_string());
    let mut bag = PropertyBag::new();
    bag.insert_value("port", 8080u16);
    bag.set("left", Rc::clone(&shared));
    bag.set_null("nothing");
    bag.set("right", Rc::clone(&shared));

    // Built-in entry types resolve in an engine that did not write them.
    let bytes = codec.serialize(&bag)?;
    let back = Graphcode::new().deserialize::<PropertyBag>(&bytes)?.unwrap();
    let names: Vec<&str> = back.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["port", "left", "nothing", "right"]);
    assert_eq!(*back.value::<u16>("port")?, 8080);
    assert!(back.contains("nothing"));
    assert!(back.get("nothing").is_none());
    assert!(Rc::ptr_eq(back.get("left").unwrap(), back.get("right").unwrap()));
    Ok(())
}

/// Bag Lookup Errors
#[test]
fn test_property_bag_errors() {
    let mut bag = PropertyBag::new();
    bag.insert_value("port", 8080u16);
    bag.set_null("host");

    assert!(matches!(bag.value::<u16>("missing"), Err(GraphcodeError::MissingEntry(_))));
    assert!(matches!(bag.value::<String>("host"), Err(GraphcodeError::UnexpectedNull(_))));
    assert!(matches!(bag.value::<i64>("port"), Err(GraphcodeError::TypeMismatch { .. })));
}
