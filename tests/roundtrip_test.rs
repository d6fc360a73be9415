#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use graphcode::{Graphcode, GraphcodeObject};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, GraphcodeObject)]
struct Scalars {
    flag: bool,
    tiny: i8,
    byte: u8,
    short: i16,
    word: u32,
    long: i64,
    huge: u128,
    size: usize,
    ratio: f32,
    precise: f64,
    letter: char,
    text: String,
    maybe_text: Option<String>,
    missing_number: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, GraphcodeObject)]
struct Record {
    id: Uuid,
    bits: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, GraphcodeObject)]
struct Ledger {
    amount: Decimal,
    big: BigInt,
    at: DateTime<Utc>,
    local: DateTime<FixedOffset>,
    elapsed: TimeDelta,
    timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, GraphcodeObject)]
struct Containers {
    queue: VecDeque<u16>,
    fixed: [i32; 3],
    pair: (String, u8),
    unique: BTreeSet<String>,
    hashed: HashSet<i64>,
    ordered: BTreeMap<String, Vec<u8>>,
    lookup: HashMap<u32, String>,
    boxed: Box<Scalars>,
}

fn scalars() -> Scalars {
    Scalars {
        flag: true,
        tiny: -5,
        byte: 250,
        short: -12_000,
        word: 4_000_000_000,
        long: i64::MIN,
        huge: u128::MAX - 7,
        size: 123_456,
        ratio: 1.5,
        precise: -0.000_123,
        letter: 'ß',
        text: "héllo".to_string(),
        maybe_text: Some(String::new()),
        missing_number: None,
    }
}

/// Primitive Round Trip
/// Every fixed-width scalar, strings and nullable values come back unchanged.
#[test]
fn test_scalars_round_trip() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let value = scalars();
    let bytes = codec.serialize(&value)?;
    assert_eq!(codec.deserialize::<Scalars>(&bytes)?, Some(value));
    Ok(())
}

/// Mixed Round Trip
/// A UUID next to a boolean array.
#[test]
fn test_uuid_and_bool_array() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let value = Record {
        id: Uuid::new_v4(),
        bits: vec![true, false, true],
    };
    let bytes = codec.serialize(&value)?;
    assert_eq!(codec.deserialize::<Record>(&bytes)?, Some(value));
    Ok(())
}

/// Extended Scalars
/// Decimals keep their scale, instants keep their offsets.
#[test]
fn test_ledger_round_trip() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let value = Ledger {
        amount: Decimal::new(-123_456_789, 4),
        big: "-123456789012345678901234567890".parse().unwrap_or_default(),
        at: Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 0).unwrap(),
        local: offset.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap(),
        elapsed: TimeDelta::milliseconds(-1_500),
        timeout: Duration::new(90, 250),
    };
    let bytes = codec.serialize(&value)?;
    let back = codec.deserialize::<Ledger>(&bytes)?.unwrap();
    assert_eq!(back, value);
    assert_eq!(back.amount.scale(), 4);
    assert_eq!(back.local.offset().local_minus_utc(), 7200);
    Ok(())
}

/// Standard Containers
#[test]
fn test_containers_round_trip() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let value = Containers {
        queue: VecDeque::from(vec![1, 2, 3]),
        fixed: [7, 8, 9],
        pair: ("left".to_string(), 1),
        unique: ["b", "a"].iter().map(|s| s.to_string()).collect(),
        hashed: [1, -1, 42].into_iter().collect(),
        ordered: BTreeMap::from([("x".to_string(), vec![1, 2]), ("y".to_string(), vec![])]),
        lookup: HashMap::from([(1, "one".to_string()), (2, "two".to_string())]),
        boxed: Box::new(scalars()),
    };
    let bytes = codec.serialize(&value)?;
    assert_eq!(codec.deserialize::<Containers>(&bytes)?, Some(value));
    Ok(())
}

/// Wire Layout
/// Header, root descriptor and big-endian payload are laid out as documented.
#[test]
fn test_root_layout() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let bytes = codec.serialize(&0x0102_0304u32)?;

    // version 1, omit flag 0
    assert_eq!(&bytes[..3], &[0, 1, 0]);
    // "u32": present flag, i32 length, then the bytes
    assert_eq!(&bytes[3..8], &[1, 0, 0, 0, 3]);
    assert_eq!(&bytes[8..11], b"u32");
    // 4 hash bytes, then the payload
    assert_eq!(&bytes[15..], &[1, 2, 3, 4]);
    Ok(())
}

/// Root Collections
/// Iterators are snapshotted into a sequence.
#[test]
fn test_serialize_iter() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let bytes = codec.serialize_iter((1..=4).map(|i| i * 10))?;
    assert_eq!(codec.deserialize::<Vec<i32>>(&bytes)?, Some(vec![10, 20, 30, 40]));
    Ok(())
}
