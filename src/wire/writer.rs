use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::DECIMAL_SIGN_BIT;
use crate::error::{GraphcodeError, Result};

macro_rules! write_fixed {
    ($($(#[$doc:meta])* $name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(&mut self, value: $ty) {
                self.buf.extend_from_slice(&value.to_be_bytes());
            }
        )*
    };
}

/// Append-only big-endian encoder over an owned buffer.
///
/// Writes of fixed-width values cannot fail. Writes that carry a length prefix return
/// [`GraphcodeError::LengthOverflow`] when the length does not fit an `i32`.
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with a preallocated buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    write_fixed! {
        /// Writes a signed byte.
        write_i8 => i8;
        /// Writes a big-endian `u16`.
        write_u16 => u16;
        /// Writes a big-endian `i16`.
        write_i16 => i16;
        /// Writes a big-endian `u32`.
        write_u32 => u32;
        /// Writes a big-endian `i32`.
        write_i32 => i32;
        /// Writes a big-endian `u64`.
        write_u64 => u64;
        /// Writes a big-endian `i64`.
        write_i64 => i64;
        /// Writes a big-endian `u128`.
        write_u128 => u128;
        /// Writes a big-endian `i128`.
        write_i128 => i128;
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Writes `0` or `1`.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Writes the bit pattern of an `f32`.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Writes the bit pattern of an `f64`.
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    /// Writes a Unicode scalar value as a `u32`.
    #[inline]
    pub fn write_char(&mut self, value: char) {
        self.write_u32(u32::from(value));
    }

    /// Appends raw bytes without any prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a length or count as an `i32`.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len).map_err(|_| GraphcodeError::LengthOverflow(len))?;
        self.write_i32(len);
        Ok(())
    }

    /// Writes a non-null string: `1`, the UTF-8 byte length, then the bytes.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_u8(1);
        self.write_len(value.len())?;
        self.write_raw(value.as_bytes());
        Ok(())
    }

    /// Writes a nullable string; `None` is the single byte `0`.
    pub fn write_opt_str(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(s) => self.write_str(s),
            None => {
                self.write_u8(0);
                Ok(())
            }
        }
    }

    /// Writes a decimal as its 96-bit mantissa and a flags word.
    ///
    /// Layout: `u64 (mid << 32 | lo)`, `u64 hi`, `u32 (sign << 31 | scale << 16)`.
    pub fn write_decimal(&mut self, value: &Decimal) {
        let mantissa = value.mantissa().unsigned_abs();
        let lo = (mantissa & 0xFFFF_FFFF) as u64;
        let mid = ((mantissa >> 32) & 0xFFFF_FFFF) as u64;
        let hi = ((mantissa >> 64) & 0xFFFF_FFFF) as u64;
        let mut flags = value.scale() << 16;
        if value.is_sign_negative() {
            flags |= DECIMAL_SIGN_BIT;
        }
        self.write_u64(mid << 32 | lo);
        self.write_u64(hi);
        self.write_u32(flags);
    }

    /// Writes an arbitrary-precision integer as length-prefixed two's complement bytes.
    pub fn write_bigint(&mut self, value: &BigInt) -> Result<()> {
        let bytes = value.to_signed_bytes_be();
        self.write_len(bytes.len())?;
        self.write_raw(&bytes);
        Ok(())
    }

    /// Writes a UTC instant as seconds since the epoch plus nanoseconds.
    pub fn write_datetime(&mut self, value: &DateTime<Utc>) {
        self.write_i64(value.timestamp());
        self.write_u32(value.timestamp_subsec_nanos());
    }

    /// Writes an instant with its fixed offset from UTC in seconds.
    pub fn write_datetime_offset(&mut self, value: &DateTime<FixedOffset>) {
        self.write_i64(value.timestamp());
        self.write_u32(value.timestamp_subsec_nanos());
        self.write_i32(value.offset().local_minus_utc());
    }

    /// Writes a signed duration as whole seconds plus signed nanoseconds.
    pub fn write_time_delta(&mut self, value: &TimeDelta) {
        self.write_i64(value.num_seconds());
        self.write_i32(value.subsec_nanos());
    }

    /// Writes an unsigned duration as whole seconds plus nanoseconds.
    pub fn write_duration(&mut self, value: &Duration) {
        self.write_u64(value.as_secs());
        self.write_u32(value.subsec_nanos());
    }

    /// Writes the 16 raw bytes of a UUID.
    pub fn write_uuid(&mut self, value: &Uuid) {
        self.write_raw(value.as_bytes());
    }
}
