//! Purpose: Serializable snapshots of a dataset, its tables, and their columns.
//! Exports: `DatasetSummary`, `SlotSummary`, `TableSummary`, `ColumnSummary`.
//! Role: Shared contract for CLI output and embedders that want plain data.
//! Invariants: Summaries copy out of the reader; they hold no pool references.
//! Invariants: Building a dataset summary never decodes a table.
use std::io::{Read, Seek};

use serde::Serialize;

use crate::core::column::Column;
use crate::core::directory::SlotState;
use crate::core::kind::DataKind;
use crate::core::reader::DatasetReader;
use crate::core::table::Table;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlotSummary {
    pub name: String,
    pub offset: u64,
    pub loaded: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub revision: String,
    pub types_hash: String,
    pub tables_hash: String,
    pub tags: String,
    pub version: u32,
    pub table_count: usize,
    pub tables: Vec<SlotSummary>,
}

impl DatasetSummary {
    pub fn from_reader<R: Read + Seek>(reader: &DatasetReader<R>) -> Self {
        let directory = reader.tables();
        let tables = (0..directory.len())
            .filter_map(|index| {
                Some(SlotSummary {
                    name: directory.name_at(index)?.to_string(),
                    offset: directory.offset_at(index)?,
                    loaded: matches!(directory.state_at(index)?, SlotState::Loaded(_)),
                })
            })
            .collect();
        Self {
            name: reader.name().to_string(),
            revision: reader.revision().to_string(),
            types_hash: reader.types_hash().to_string(),
            tables_hash: reader.tables_hash().to_string(),
            tags: reader.tags().to_string(),
            version: reader.version(),
            table_count: directory.len(),
            tables,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub type_name: String,
    pub kind: DataKind,
    pub is_key: bool,
    pub position: usize,
}

impl From<&Column> for ColumnSummary {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name().to_string(),
            type_name: column.type_name().to_string(),
            kind: column.kind(),
            is_key: column.is_key(),
            position: column.position(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub category: String,
    pub hash: String,
    pub modified_time: i64,
    pub offset: u64,
    pub row_count: usize,
    pub keys: Vec<String>,
    pub columns: Vec<ColumnSummary>,
}

impl From<&Table> for TableSummary {
    fn from(table: &Table) -> Self {
        Self {
            name: table.name().to_string(),
            category: table.category().to_string(),
            hash: table.hash().to_string(),
            modified_time: table.modified_time(),
            offset: table.offset(),
            row_count: table.rows().len(),
            keys: table.keys().map(|column| column.name().to_string()).collect(),
            columns: table.columns().iter().map(ColumnSummary::from).collect(),
        }
    }
}
