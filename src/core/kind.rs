// Closed set of column kinds, their producer type names, and fixed encoded widths.
use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    DateTime,
    Duration,
    Guid,
}

/// Lookup families used to validate key arguments against key columns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KindFamily {
    Bool,
    Integral,
    Float,
    Text,
    Guid,
}

const TYPE_NAMES: &[(&str, DataKind)] = &[
    ("boolean", DataKind::Bool),
    ("int8", DataKind::Int8),
    ("uint8", DataKind::UInt8),
    ("int16", DataKind::Int16),
    ("uint16", DataKind::UInt16),
    ("int32", DataKind::Int32),
    ("uint32", DataKind::UInt32),
    ("int64", DataKind::Int64),
    ("uint64", DataKind::UInt64),
    ("float", DataKind::Float32),
    ("double", DataKind::Float64),
    ("string", DataKind::String),
    ("datetime", DataKind::DateTime),
    ("duration", DataKind::Duration),
    ("guid", DataKind::Guid),
];

impl DataKind {
    /// Resolves a producer type name. Names outside the table are user enum
    /// types, which readers of this format treat as int32.
    pub fn from_type_name(name: &str) -> Self {
        Self::lookup(name).unwrap_or(DataKind::Int32)
    }

    pub fn lookup(name: &str) -> Option<Self> {
        TYPE_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, kind)| *kind)
    }

    pub fn type_name(self) -> &'static str {
        TYPE_NAMES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("int32")
    }

    /// Encoded width in a row field and in a key buffer. String fields hold a
    /// 4-byte TextId; in key buffers they hold a 4-byte text hash.
    pub fn width(self) -> usize {
        match self {
            DataKind::Bool | DataKind::Int8 | DataKind::UInt8 => 1,
            DataKind::Int16 | DataKind::UInt16 => 2,
            DataKind::Int32 | DataKind::UInt32 | DataKind::Float32 | DataKind::String => 4,
            DataKind::Int64
            | DataKind::UInt64
            | DataKind::Float64
            | DataKind::DateTime
            | DataKind::Duration => 8,
            DataKind::Guid => 16,
        }
    }

    pub fn family(self) -> KindFamily {
        match self {
            DataKind::Bool => KindFamily::Bool,
            DataKind::Int8
            | DataKind::UInt8
            | DataKind::Int16
            | DataKind::UInt16
            | DataKind::Int32
            | DataKind::UInt32
            | DataKind::Int64
            | DataKind::UInt64
            | DataKind::DateTime
            | DataKind::Duration => KindFamily::Integral,
            DataKind::Float32 | DataKind::Float64 => KindFamily::Float,
            DataKind::String => KindFamily::Text,
            DataKind::Guid => KindFamily::Guid,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
