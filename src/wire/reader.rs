use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{DECIMAL_SIGN_BIT, MAX_DECIMAL_SCALE, NANOS_PER_SEC};
use crate::error::{GraphcodeError, Result};

macro_rules! read_fixed {
    ($($(#[$doc:meta])* $name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(&mut self) -> Result<$ty> {
                Ok(<$ty>::from_be_bytes(self.take_array()?))
            }
        )*
    };
}

/// Cursor over a borrowed byte slice.
///
/// Every read checks the remaining length first and fails with
/// [`GraphcodeError::TruncatedStream`] instead of reading past the end.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` once the whole input has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrows the next `len` bytes and advances past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(GraphcodeError::TruncatedStream {
                needed: len,
                remaining,
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.data[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    read_fixed! {
        /// Reads a single byte.
        read_u8 => u8;
        /// Reads a signed byte.
        read_i8 => i8;
        /// Reads a big-endian `u16`.
        read_u16 => u16;
        /// Reads a big-endian `i16`.
        read_i16 => i16;
        /// Reads a big-endian `u32`.
        read_u32 => u32;
        /// Reads a big-endian `i32`.
        read_i32 => i32;
        /// Reads a big-endian `u64`.
        read_u64 => u64;
        /// Reads a big-endian `i64`.
        read_i64 => i64;
        /// Reads a big-endian `u128`.
        read_u128 => u128;
        /// Reads a big-endian `i128`.
        read_i128 => i128;
    }

    /// Reads a boolean byte. Values other than `0` and `1` are corruption.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(GraphcodeError::FormatCorruption(format!(
                "invalid boolean byte {other:#04x} at offset {}",
                self.pos - 1
            ))),
        }
    }

    /// Reads an `f32` from its bit pattern.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads an `f64` from its bit pattern.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads a Unicode scalar value.
    pub fn read_char(&mut self) -> Result<char> {
        let raw = self.read_u32()?;
        char::from_u32(raw).ok_or_else(|| {
            GraphcodeError::FormatCorruption(format!("invalid char scalar {raw:#x}"))
        })
    }

    /// Reads an `i32` length or count. Negative values are corruption.
    pub fn read_len(&mut self) -> Result<usize> {
        let raw = self.read_i32()?;
        usize::try_from(raw)
            .map_err(|_| GraphcodeError::FormatCorruption(format!("negative length {raw}")))
    }

    /// Reads a nullable string, borrowing its bytes from the input.
    pub fn read_str(&mut self) -> Result<Option<&'a str>> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => {
                let len = self.read_len()?;
                let bytes = self.take(len)?;
                std::str::from_utf8(bytes).map(Some).map_err(|e| {
                    GraphcodeError::FormatCorruption(format!("invalid UTF-8 in string: {e}"))
                })
            }
            other => Err(GraphcodeError::FormatCorruption(format!(
                "invalid string flag {other:#04x}"
            ))),
        }
    }

    /// Reads a decimal written by [`super::WireWriter::write_decimal`].
    pub fn read_decimal(&mut self) -> Result<Decimal> {
        let lo_mid = self.read_u64()?;
        let hi = self.read_u64()?;
        let flags = self.read_u32()?;
        if hi > u64::from(u32::MAX) {
            return Err(GraphcodeError::FormatCorruption(
                "decimal mantissa exceeds 96 bits".into(),
            ));
        }
        let scale = (flags >> 16) & 0xFF;
        if scale > MAX_DECIMAL_SCALE || flags & !(DECIMAL_SIGN_BIT | 0x00FF_0000) != 0 {
            return Err(GraphcodeError::FormatCorruption(format!(
                "invalid decimal flags {flags:#010x}"
            )));
        }
        let mantissa = (u128::from(hi) << 64) | u128::from(lo_mid);
        let mantissa = i128::try_from(mantissa)
            .map_err(|_| GraphcodeError::FormatCorruption("decimal mantissa overflow".into()))?;
        let mut value = Decimal::try_from_i128_with_scale(mantissa, scale)
            .map_err(|e| GraphcodeError::FormatCorruption(format!("invalid decimal: {e}")))?;
        value.set_sign_negative(flags & DECIMAL_SIGN_BIT != 0);
        Ok(value)
    }

    /// Reads a length-prefixed two's complement integer.
    pub fn read_bigint(&mut self) -> Result<BigInt> {
        let len = self.read_len()?;
        Ok(BigInt::from_signed_bytes_be(self.take(len)?))
    }

    /// Reads a UTC instant.
    pub fn read_datetime(&mut self) -> Result<DateTime<Utc>> {
        let secs = self.read_i64()?;
        let nanos = self.read_u32()?;
        DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
            GraphcodeError::FormatCorruption(format!("instant out of range: {secs}s {nanos}ns"))
        })
    }

    /// Reads an instant carrying a fixed UTC offset.
    pub fn read_datetime_offset(&mut self) -> Result<DateTime<FixedOffset>> {
        let utc = self.read_datetime()?;
        let offset = self.read_i32()?;
        let offset = FixedOffset::east_opt(offset).ok_or_else(|| {
            GraphcodeError::FormatCorruption(format!("invalid UTC offset {offset}s"))
        })?;
        Ok(utc.with_timezone(&offset))
    }

    /// Reads a signed duration.
    pub fn read_time_delta(&mut self) -> Result<TimeDelta> {
        let secs = self.read_i64()?;
        let nanos = self.read_i32()?;
        if nanos.unsigned_abs() >= NANOS_PER_SEC {
            return Err(GraphcodeError::FormatCorruption(format!(
                "duration nanoseconds out of range: {nanos}"
            )));
        }
        TimeDelta::try_seconds(secs)
            .and_then(|whole| whole.checked_add(&TimeDelta::nanoseconds(i64::from(nanos))))
            .ok_or_else(|| {
                GraphcodeError::FormatCorruption(format!("duration out of range: {secs}s"))
            })
    }

    /// Reads an unsigned duration.
    pub fn read_duration(&mut self) -> Result<Duration> {
        let secs = self.read_u64()?;
        let nanos = self.read_u32()?;
        if nanos >= NANOS_PER_SEC {
            return Err(GraphcodeError::FormatCorruption(format!(
                "duration nanoseconds out of range: {nanos}"
            )));
        }
        Ok(Duration::new(secs, nanos))
    }

    /// Reads the 16 raw bytes of a UUID.
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        Ok(Uuid::from_bytes(self.take_array()?))
    }
}
