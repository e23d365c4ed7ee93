//! Purpose: Decode fixed-width field bytes into typed values, one match over `DataKind`.
//! Exports: `Value`, `FieldValue`, `Timestamp`, `TimeSpan`, `Guid`, `ParseGuidError`.
//! Role: Shared by typed row access, the key codec, and CLI rendering.
//! Invariants: Every kind decodes from exactly `DataKind::width` little-endian bytes.
//! Invariants: Absent fields read as the kind's zero value, never as an error.
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::error::Error;
use crate::core::kind::DataKind;
use crate::core::strings::PoolHandle;

/// Seconds since the Unix epoch, as stored by datetime columns.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn seconds(self) -> i64 {
        self.0
    }

    pub fn to_offset_datetime(self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.0).ok()
    }

    pub fn to_rfc3339(self) -> Option<String> {
        self.to_offset_datetime()?.format(&Rfc3339).ok()
    }
}

/// Signed count of 100ns ticks, as stored by duration columns.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimeSpan(pub i64);

impl TimeSpan {
    pub const TICKS_PER_SECOND: i64 = 10_000_000;
    const NANOS_PER_TICK: i64 = 100;

    pub fn ticks(self) -> i64 {
        self.0
    }

    pub fn to_duration(self) -> time::Duration {
        let seconds = self.0 / Self::TICKS_PER_SECOND;
        let nanos = (self.0 % Self::TICKS_PER_SECOND) * Self::NANOS_PER_TICK;
        time::Duration::new(seconds, nanos as i32)
    }
}

/// 16 raw bytes in the mixed-endian layout .NET writes for `Guid`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseGuidError;

impl fmt::Display for ParseGuidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected 32 hex digits in 8-4-4-4-12 groups")
    }
}

impl std::error::Error for ParseGuidError {}

impl FromStr for Guid {
    type Err = ParseGuidError;

    /// Parses the canonical text form back into the stored byte layout.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = text.trim_matches(['{', '}']).split('-').collect();
        let [a, b, c, d, e] = groups.as_slice() else {
            return Err(ParseGuidError);
        };
        if [a.len(), b.len(), c.len(), d.len(), e.len()] != [8, 4, 4, 4, 12] {
            return Err(ParseGuidError);
        }
        if !groups.iter().all(|group| group.bytes().all(|b| b.is_ascii_hexdigit())) {
            return Err(ParseGuidError);
        }
        let data1 = u32::from_str_radix(a, 16).map_err(|_| ParseGuidError)?;
        let data2 = u16::from_str_radix(b, 16).map_err(|_| ParseGuidError)?;
        let data3 = u16::from_str_radix(c, 16).map_err(|_| ParseGuidError)?;
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&data1.to_le_bytes());
        bytes[4..6].copy_from_slice(&data2.to_le_bytes());
        bytes[6..8].copy_from_slice(&data3.to_le_bytes());
        let tail = format!("{d}{e}");
        for (index, slot) in bytes[8..].iter_mut().enumerate() {
            let pair = tail.get(index * 2..index * 2 + 2).ok_or(ParseGuidError)?;
            *slot = u8::from_str_radix(pair, 16).map_err(|_| ParseGuidError)?;
        }
        Ok(Guid(bytes))
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        let data1 = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let data2 = u16::from_le_bytes([b[4], b[5]]);
        let data3 = u16::from_le_bytes([b[6], b[7]]);
        write!(f, "{data1:08x}-{data2:04x}-{data3:04x}-{:02x}{:02x}-", b[8], b[9])?;
        for byte in &b[10..16] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(Rc<str>),
    DateTime(Timestamp),
    Duration(TimeSpan),
    Guid(Guid),
}

impl Value {
    pub fn kind(&self) -> DataKind {
        match self {
            Value::Bool(_) => DataKind::Bool,
            Value::Int8(_) => DataKind::Int8,
            Value::UInt8(_) => DataKind::UInt8,
            Value::Int16(_) => DataKind::Int16,
            Value::UInt16(_) => DataKind::UInt16,
            Value::Int32(_) => DataKind::Int32,
            Value::UInt32(_) => DataKind::UInt32,
            Value::Int64(_) => DataKind::Int64,
            Value::UInt64(_) => DataKind::UInt64,
            Value::Float32(_) => DataKind::Float32,
            Value::Float64(_) => DataKind::Float64,
            Value::String(_) => DataKind::String,
            Value::DateTime(_) => DataKind::DateTime,
            Value::Duration(_) => DataKind::Duration,
            Value::Guid(_) => DataKind::Guid,
        }
    }

    pub fn zero(kind: DataKind) -> Self {
        match kind {
            DataKind::Bool => Value::Bool(false),
            DataKind::Int8 => Value::Int8(0),
            DataKind::UInt8 => Value::UInt8(0),
            DataKind::Int16 => Value::Int16(0),
            DataKind::UInt16 => Value::UInt16(0),
            DataKind::Int32 => Value::Int32(0),
            DataKind::UInt32 => Value::UInt32(0),
            DataKind::Int64 => Value::Int64(0),
            DataKind::UInt64 => Value::UInt64(0),
            DataKind::Float32 => Value::Float32(0.0),
            DataKind::Float64 => Value::Float64(0.0),
            DataKind::String => Value::String(Rc::from("")),
            DataKind::DateTime => Value::DateTime(Timestamp::default()),
            DataKind::Duration => Value::Duration(TimeSpan::default()),
            DataKind::Guid => Value::Guid(Guid::default()),
        }
    }

    /// Decodes `kind` from the start of `bytes`. Callers guarantee at least
    /// `kind.width()` bytes; row loading validates that bound once per field.
    pub(crate) fn decode(kind: DataKind, bytes: &[u8], pool: &PoolHandle) -> Result<Self, Error> {
        let value = match kind {
            DataKind::Bool => Value::Bool(bytes[0] != 0),
            DataKind::Int8 => Value::Int8(bytes[0] as i8),
            DataKind::UInt8 => Value::UInt8(bytes[0]),
            DataKind::Int16 => Value::Int16(i16::from_le_bytes(fixed(bytes))),
            DataKind::UInt16 => Value::UInt16(u16::from_le_bytes(fixed(bytes))),
            DataKind::Int32 => Value::Int32(i32::from_le_bytes(fixed(bytes))),
            DataKind::UInt32 => Value::UInt32(u32::from_le_bytes(fixed(bytes))),
            DataKind::Int64 => Value::Int64(i64::from_le_bytes(fixed(bytes))),
            DataKind::UInt64 => Value::UInt64(u64::from_le_bytes(fixed(bytes))),
            DataKind::Float32 => Value::Float32(f32::from_le_bytes(fixed(bytes))),
            DataKind::Float64 => Value::Float64(f64::from_le_bytes(fixed(bytes))),
            DataKind::String => Value::String(pool.get(i32::from_le_bytes(fixed(bytes)))?),
            DataKind::DateTime => Value::DateTime(Timestamp(i64::from_le_bytes(fixed(bytes)))),
            DataKind::Duration => Value::Duration(TimeSpan(i64::from_le_bytes(fixed(bytes)))),
            DataKind::Guid => Value::Guid(Guid(fixed(bytes))),
        };
        Ok(value)
    }

    /// Appends the key-buffer encoding: native little-endian bytes, or the
    /// text hash for strings.
    pub(crate) fn encode_key(&self, out: &mut Vec<u8>) {
        match self {
            Value::Bool(v) => out.push(u8::from(*v)),
            Value::Int8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::UInt8(v) => out.push(*v),
            Value::Int16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::UInt16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::UInt32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::UInt64(v) => out.extend_from_slice(&v.to_le_bytes()),
            // -0.0 == 0.0, so both must hash alike.
            Value::Float32(v) => out.extend_from_slice(&(v + 0.0).to_le_bytes()),
            Value::Float64(v) => out.extend_from_slice(&(v + 0.0).to_le_bytes()),
            Value::String(text) => {
                out.extend_from_slice(&crate::core::keys::text_hash(text).to_le_bytes())
            }
            Value::DateTime(v) => out.extend_from_slice(&v.0.to_le_bytes()),
            Value::Duration(v) => out.extend_from_slice(&v.0.to_le_bytes()),
            Value::Guid(v) => out.extend_from_slice(&v.0),
        }
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// Rust types that can be read out of a column of exactly one kind.
pub trait FieldValue: Sized {
    const KIND: DataKind;

    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! field_value {
    ($ty:ty, $variant:ident) => {
        impl FieldValue for $ty {
            const KIND: DataKind = DataKind::$variant;

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

field_value!(bool, Bool);
field_value!(i8, Int8);
field_value!(u8, UInt8);
field_value!(i16, Int16);
field_value!(u16, UInt16);
field_value!(i32, Int32);
field_value!(u32, UInt32);
field_value!(i64, Int64);
field_value!(u64, UInt64);
field_value!(f32, Float32);
field_value!(f64, Float64);
field_value!(Rc<str>, String);
field_value!(Timestamp, DateTime);
field_value!(TimeSpan, Duration);
field_value!(Guid, Guid);

impl FieldValue for String {
    const KIND: DataKind = DataKind::String;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(text.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Guid, TimeSpan, Timestamp, Value};
    use crate::core::kind::DataKind;
    use crate::core::strings::PoolHandle;
    use std::rc::Rc;

    #[test]
    fn numeric_kinds_decode_little_endian() {
        let pool = PoolHandle::acquire();
        let bytes = (-2i16).to_le_bytes();
        assert_eq!(
            Value::decode(DataKind::Int16, &bytes, &pool).expect("decode"),
            Value::Int16(-2)
        );
        let bytes = 1.5f64.to_le_bytes();
        assert_eq!(
            Value::decode(DataKind::Float64, &bytes, &pool).expect("decode"),
            Value::Float64(1.5)
        );
        assert_eq!(
            Value::decode(DataKind::Bool, &[1], &pool).expect("decode"),
            Value::Bool(true)
        );
    }

    #[test]
    fn string_kind_resolves_through_pool() {
        let pool = PoolHandle::acquire();
        pool.insert(901, "lance");
        let value = Value::decode(DataKind::String, &901i32.to_le_bytes(), &pool).expect("decode");
        assert_eq!(value, Value::String(Rc::from("lance")));
    }

    #[test]
    fn zero_values_match_kind() {
        for kind in [DataKind::Int64, DataKind::String, DataKind::Guid, DataKind::Duration] {
            assert_eq!(Value::zero(kind).kind(), kind);
        }
        assert_eq!(Value::zero(DataKind::String), Value::String(Rc::from("")));
    }

    #[test]
    fn key_encoding_uses_native_widths() {
        let mut out = Vec::new();
        Value::Int16(7).encode_key(&mut out);
        Value::Bool(true).encode_key(&mut out);
        Value::DateTime(Timestamp(1)).encode_key(&mut out);
        Value::String(Rc::from("x")).encode_key(&mut out);
        assert_eq!(out.len(), 2 + 1 + 8 + 4);
        assert_eq!(&out[0..2], &7i16.to_le_bytes());
    }

    #[test]
    fn field_value_extracts_matching_variant() {
        assert_eq!(i32::from_value(Value::Int32(4)), Some(4));
        assert_eq!(i32::from_value(Value::Int64(4)), None);
        assert_eq!(String::from_value(Value::String(Rc::from("a"))), Some("a".to_string()));
        assert_eq!(<Timestamp as FieldValue>::KIND, DataKind::DateTime);
    }

    #[test]
    fn timestamp_and_timespan_convert() {
        assert_eq!(
            Timestamp(0).to_rfc3339().as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
        let span = TimeSpan(15_000_000);
        assert_eq!(span.to_duration(), time::Duration::milliseconds(1500));
        assert_eq!(TimeSpan(-5).to_duration(), time::Duration::nanoseconds(-500));
    }

    #[test]
    fn guid_formats_dotnet_layout() {
        let guid = Guid([
            0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ]);
        assert_eq!(guid.to_string(), "00112233-4455-6677-8899-aabbccddeeff");
        assert_eq!("00112233-4455-6677-8899-aabbccddeeff".parse::<Guid>(), Ok(guid));
        assert!("00112233-4455-6677-8899".parse::<Guid>().is_err());
        assert!("0011223g-4455-6677-8899-aabbccddeeff".parse::<Guid>().is_err());
        assert!("+0112233-4455-6677-8899-aabbccddeeff".parse::<Guid>().is_err());
        assert!("00112233-+455-6677-8899-aabbccddeeff".parse::<Guid>().is_err());
    }

    #[test]
    fn signed_zero_floats_share_key_bytes() {
        let mut positive = Vec::new();
        let mut negative = Vec::new();
        Value::Float64(0.0).encode_key(&mut positive);
        Value::Float64(-0.0).encode_key(&mut negative);
        assert_eq!(positive, negative);

        positive.clear();
        negative.clear();
        Value::Float32(0.0).encode_key(&mut positive);
        Value::Float32(-0.0).encode_key(&mut negative);
        assert_eq!(positive, negative);
    }
}
