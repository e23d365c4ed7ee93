//! Purpose: Encode composite key values into a fixed-width buffer and index rows by its hash.
//! Exports: `KeyValue`, `IntoKey`, `KeyCodec`, `KeyIndex`, `KeyHasher`, `text_hash`.
//! Role: Shared by row-store construction and `find`; the two must encode identically.
//! Invariants: Values are written in declared key order at each kind's native width.
//! Invariants: Strings contribute `text_hash` of their UTF-8 bytes, never a TextId.
//! Invariants: Colliding hashes keep every row; callers disambiguate by field equality.
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_64;
use xxhash_rust::xxh32::xxh32;

use crate::core::column::Column;
use crate::core::error::Error;
use crate::core::kind::{DataKind, KindFamily};
use crate::core::value::{Guid, TimeSpan, Timestamp, Value};

/// Hash applied to a finished key buffer. Any stable function works since the
/// index is rebuilt on every load.
pub type KeyHasher = fn(&[u8]) -> u64;

pub fn default_key_hash(buf: &[u8]) -> u64 {
    xxh3_64(buf)
}

/// Deterministic 32-bit hash of a string's UTF-8 bytes.
pub fn text_hash(text: &str) -> u32 {
    xxh32(text.as_bytes(), 0)
}

/// One caller-supplied key component, before it is narrowed to a column kind.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Guid(Guid),
}

impl KeyValue {
    pub fn family(&self) -> KindFamily {
        match self {
            KeyValue::Bool(_) => KindFamily::Bool,
            KeyValue::Int(_) | KeyValue::UInt(_) => KindFamily::Integral,
            KeyValue::Float(_) => KindFamily::Float,
            KeyValue::Text(_) => KindFamily::Text,
            KeyValue::Guid(_) => KindFamily::Guid,
        }
    }

    /// Narrows this component to `column`'s kind. `Ok(None)` means the value
    /// cannot be represented at that width, so no stored row can carry it.
    pub(crate) fn coerce(&self, column: &Column) -> Result<Option<Value>, Error> {
        let kind = column.kind();
        if self.family() != kind.family() {
            return Err(Error::type_mismatch(format!(
                "key column '{}' is {kind}, got {:?} value",
                column.name(),
                self.family()
            )));
        }
        let value = match self {
            KeyValue::Bool(v) => Some(Value::Bool(*v)),
            KeyValue::Float(v) => match kind {
                DataKind::Float32 => Some(Value::Float32(*v as f32)),
                _ => Some(Value::Float64(*v)),
            },
            KeyValue::Text(text) => Some(Value::String(Rc::from(text.as_str()))),
            KeyValue::Guid(guid) => Some(Value::Guid(*guid)),
            KeyValue::Int(v) => integral(kind, *v),
            KeyValue::UInt(v) => integral(kind, *v),
        };
        Ok(value)
    }
}

fn integral<T>(kind: DataKind, v: T) -> Option<Value>
where
    T: Copy,
    i8: TryFrom<T>,
    u8: TryFrom<T>,
    i16: TryFrom<T>,
    u16: TryFrom<T>,
    i32: TryFrom<T>,
    u32: TryFrom<T>,
    i64: TryFrom<T>,
    u64: TryFrom<T>,
{
    let value = match kind {
        DataKind::Int8 => Value::Int8(i8::try_from(v).ok()?),
        DataKind::UInt8 => Value::UInt8(u8::try_from(v).ok()?),
        DataKind::Int16 => Value::Int16(i16::try_from(v).ok()?),
        DataKind::UInt16 => Value::UInt16(u16::try_from(v).ok()?),
        DataKind::Int32 => Value::Int32(i32::try_from(v).ok()?),
        DataKind::UInt32 => Value::UInt32(u32::try_from(v).ok()?),
        DataKind::Int64 => Value::Int64(i64::try_from(v).ok()?),
        DataKind::UInt64 => Value::UInt64(u64::try_from(v).ok()?),
        DataKind::DateTime => Value::DateTime(Timestamp(i64::try_from(v).ok()?)),
        DataKind::Duration => Value::Duration(TimeSpan(i64::try_from(v).ok()?)),
        _ => return None,
    };
    Some(value)
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Bool(v) => write!(f, "{v}"),
            KeyValue::Int(v) => write!(f, "{v}"),
            KeyValue::UInt(v) => write!(f, "{v}"),
            KeyValue::Float(v) => write!(f, "{v}"),
            KeyValue::Text(v) => write!(f, "{v:?}"),
            KeyValue::Guid(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! key_from {
    ($variant:ident <- $($ty:ty),+) => {
        $(
            impl From<$ty> for KeyValue {
                fn from(value: $ty) -> Self {
                    KeyValue::$variant(value.into())
                }
            }
        )+
    };
}

key_from!(Bool <- bool);
key_from!(Int <- i8, i16, i32, i64);
key_from!(UInt <- u8, u16, u32, u64);
key_from!(Float <- f32, f64);
key_from!(Text <- String, &str);
key_from!(Guid <- Guid);

impl From<Timestamp> for KeyValue {
    fn from(value: Timestamp) -> Self {
        KeyValue::Int(value.0)
    }
}

impl From<TimeSpan> for KeyValue {
    fn from(value: TimeSpan) -> Self {
        KeyValue::Int(value.0)
    }
}

/// Anything that can be passed to `find` as an ordered key sequence.
pub trait IntoKey {
    fn into_key(self) -> Vec<KeyValue>;
}

macro_rules! scalar_key {
    ($($ty:ty),+) => {
        $(
            impl IntoKey for $ty {
                fn into_key(self) -> Vec<KeyValue> {
                    vec![self.into()]
                }
            }
        )+
    };
}

scalar_key!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, &str, Guid, Timestamp, TimeSpan, KeyValue);

macro_rules! tuple_key {
    ($($name:ident),+) => {
        impl<$($name: Into<KeyValue>),+> IntoKey for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_key(self) -> Vec<KeyValue> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

tuple_key!(A);
tuple_key!(A, B);
tuple_key!(A, B, C);
tuple_key!(A, B, C, D);

impl IntoKey for Vec<KeyValue> {
    fn into_key(self) -> Vec<KeyValue> {
        self
    }
}

impl IntoKey for &[KeyValue] {
    fn into_key(self) -> Vec<KeyValue> {
        self.to_vec()
    }
}

impl<const N: usize> IntoKey for [KeyValue; N] {
    fn into_key(self) -> Vec<KeyValue> {
        self.into()
    }
}

/// Fixed-layout encoder for one table's key columns.
#[derive(Clone, Copy, Debug)]
pub struct KeyCodec {
    width: usize,
    hasher: KeyHasher,
}

impl KeyCodec {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a Column>, hasher: KeyHasher) -> Self {
        let width = keys.into_iter().map(|column| column.kind().width()).sum();
        Self { width, hasher }
    }

    /// Total encoded width: the sum of each key column's fixed width.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn encode(&self, values: &[Value]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.width);
        for value in values {
            value.encode_key(&mut buf);
        }
        buf
    }

    pub fn hash(&self, values: &[Value]) -> u64 {
        (self.hasher)(&self.encode(values))
    }
}

/// Multi-valued hash → row-index map.
#[derive(Clone, Debug, Default)]
pub struct KeyIndex {
    buckets: FxHashMap<u64, Vec<usize>>,
}

impl KeyIndex {
    pub fn insert(&mut self, hash: u64, row: usize) {
        self.buckets.entry(hash).or_default().push(row);
    }

    pub fn candidates(&self, hash: u64) -> &[usize] {
        self.buckets.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct hashes.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
