//! Purpose: Define the stable public Rust API boundary for crema dataset reading.
//! Exports: Reader, table, row, value, key, and error types needed by the CLI and embedders.
//! Role: Public, additive-only surface; hides decoding and wire modules.
//! Invariants: This module is the supported path to every reader primitive.
//! Invariants: Summary types serialize with stable field names for JSON consumers.

mod summary;

pub use crate::core::column::{Column, ColumnSelector, ColumnSet};
pub use crate::core::directory::{SlotState, TableDirectory};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::keys::{IntoKey, KeyHasher, KeyValue, default_key_hash, text_hash};
pub use crate::core::kind::{DataKind, KindFamily};
pub use crate::core::reader::{DatasetReader, ReadFlags};
pub use crate::core::relations::{PARENT_ID_COLUMN, RELATION_ID_COLUMN, parent_name, pure_name};
pub use crate::core::strings::{PoolHandle, StringPool, TextId};
pub use crate::core::table::{RowRef, Rows, Table};
pub use crate::core::value::{FieldValue, Guid, ParseGuidError, TimeSpan, Timestamp, Value};
pub use summary::{ColumnSummary, DatasetSummary, SlotSummary, TableSummary};
