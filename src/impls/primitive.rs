//! Scalar and string implementations.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::descriptor::TypeKind;
use crate::error::{GraphcodeError, Result};
use crate::graph::{GraphReader, GraphWriter};
use crate::object::GraphType;

macro_rules! impl_fixed {
    ($($ty:ty => $name:literal, $write:ident, $read:ident;)*) => {
        $(
            impl GraphType for $ty {
                const KIND: TypeKind = TypeKind::Primitive;

                fn type_name() -> String {
                    $name.to_owned()
                }

                #[inline]
                fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
                    w.wire().$write(*self);
                    Ok(())
                }

                #[inline]
                fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
                    r.wire().$read()
                }
            }
        )*
    };
}

impl_fixed! {
    bool => "bool", write_bool, read_bool;
    u8 => "u8", write_u8, read_u8;
    i8 => "i8", write_i8, read_i8;
    u16 => "u16", write_u16, read_u16;
    i16 => "i16", write_i16, read_i16;
    u32 => "u32", write_u32, read_u32;
    i32 => "i32", write_i32, read_i32;
    u64 => "u64", write_u64, read_u64;
    i64 => "i64", write_i64, read_i64;
    u128 => "u128", write_u128, read_u128;
    i128 => "i128", write_i128, read_i128;
    f32 => "f32", write_f32, read_f32;
    f64 => "f64", write_f64, read_f64;
    char => "char", write_char, read_char;
}

macro_rules! impl_by_ref {
    ($($ty:ty => $name:literal, $write:ident, $read:ident;)*) => {
        $(
            impl GraphType for $ty {
                const KIND: TypeKind = TypeKind::Primitive;

                fn type_name() -> String {
                    $name.to_owned()
                }

                fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
                    w.wire().$write(self);
                    Ok(())
                }

                fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
                    r.wire().$read()
                }
            }
        )*
    };
}

impl_by_ref! {
    Decimal => "Decimal", write_decimal, read_decimal;
    DateTime<Utc> => "DateTime", write_datetime, read_datetime;
    DateTime<FixedOffset> => "DateTimeOffset", write_datetime_offset, read_datetime_offset;
    TimeDelta => "TimeDelta", write_time_delta, read_time_delta;
    Duration => "Duration", write_duration, read_duration;
    Uuid => "Uuid", write_uuid, read_uuid;
}

// Pointer-sized integers travel as 64 bits.
impl GraphType for usize {
    const KIND: TypeKind = TypeKind::Primitive;

    fn type_name() -> String {
        "u64".to_owned()
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        w.wire().write_u64(*self as u64);
        Ok(())
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        let raw = r.wire().read_u64()?;
        usize::try_from(raw).map_err(|_| {
            GraphcodeError::FormatCorruption(format!("{raw} does not fit a usize"))
        })
    }
}

impl GraphType for isize {
    const KIND: TypeKind = TypeKind::Primitive;

    fn type_name() -> String {
        "i64".to_owned()
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        w.wire().write_i64(*self as i64);
        Ok(())
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        let raw = r.wire().read_i64()?;
        isize::try_from(raw).map_err(|_| {
            GraphcodeError::FormatCorruption(format!("{raw} does not fit an isize"))
        })
    }
}

impl GraphType for BigInt {
    const KIND: TypeKind = TypeKind::Primitive;

    fn type_name() -> String {
        "BigInt".to_owned()
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        w.wire().write_bigint(self)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        r.wire().read_bigint()
    }
}

impl GraphType for () {
    const KIND: TypeKind = TypeKind::Primitive;

    fn type_name() -> String {
        "()".to_owned()
    }

    fn encode(&self, _: &mut GraphWriter<'_>) -> Result<()> {
        Ok(())
    }

    fn decode(_: &mut GraphReader<'_>) -> Result<Self> {
        Ok(())
    }
}

/// Strings carry their own null marker, so a nullable string costs no extra byte.
impl GraphType for String {
    const KIND: TypeKind = TypeKind::String;

    fn type_name() -> String {
        "String".to_owned()
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        w.wire().write_str(self)
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        Self::decode_option(r)?.ok_or_else(|| GraphcodeError::UnexpectedNull(Self::type_name()))
    }

    fn encode_option(value: Option<&Self>, w: &mut GraphWriter<'_>) -> Result<()> {
        w.wire().write_opt_str(value.map(String::as_str))
    }

    fn decode_option(r: &mut GraphReader<'_>) -> Result<Option<Self>> {
        Ok(r.wire().read_str()?.map(str::to_owned))
    }
}

macro_rules! impl_unsupported {
    ($(<$($gen:ident),*> $ty:ty;)*) => {
        $(
            impl<$($gen: 'static),*> GraphType for $ty {
                const KIND: TypeKind = TypeKind::Unsupported;

                fn type_name() -> String {
                    std::any::type_name::<Self>().to_owned()
                }

                fn encode(&self, _: &mut GraphWriter<'_>) -> Result<()> {
                    Err(GraphcodeError::UnsupportedType(Self::type_name()))
                }

                fn decode(_: &mut GraphReader<'_>) -> Result<Self> {
                    Err(GraphcodeError::UnsupportedType(Self::type_name()))
                }
            }
        )*
    };
}

// Accepted by the type system so that deriving types compile, rejected when a codec is built.
impl_unsupported! {
    <R> fn() -> R;
    <A, R> fn(A) -> R;
    <A, B, R> fn(A, B) -> R;
    <A, B, C, R> fn(A, B, C) -> R;
    <T> *const T;
    <T> *mut T;
}
