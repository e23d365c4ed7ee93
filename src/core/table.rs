//! Purpose: One decoded table: identity, columns, key columns, and rows with typed access.
//! Exports: `Table`, `Rows`, `RowRef`.
//! Role: Materialized form of a directory slot; borrowed out of the reader by name or index.
//! Invariants: `keys` lists key-flagged columns in declaration order.
//! Invariants: Typed reads check the column's declared kind before touching bytes.
use std::rc::Rc;

use crate::core::column::{Column, ColumnSelector, ColumnSet};
use crate::core::error::Error;
use crate::core::keys::IntoKey;
use crate::core::row::{Row, RowStore};
use crate::core::strings::PoolHandle;
use crate::core::value::{FieldValue, Value};

#[derive(Debug)]
pub struct Table {
    pub(crate) slot: usize,
    pub(crate) offset: u64,
    pub(crate) name: Rc<str>,
    pub(crate) category: Rc<str>,
    pub(crate) hash: Rc<str>,
    pub(crate) modified_time: i64,
    pub(crate) columns: ColumnSet,
    pub(crate) keys: Vec<usize>,
    pub(crate) rows: RowStore,
    pub(crate) pool: Rc<PoolHandle>,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Content hash string the producer stamped on this table.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Raw `modifiedTime` from the table header.
    pub fn modified_time(&self) -> i64 {
        self.modified_time
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Absolute byte offset of the table header in the dataset stream.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn keys(&self) -> impl Iterator<Item = &Column> + '_ {
        self.keys.iter().filter_map(|position| self.columns.get(*position))
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn rows(&self) -> Rows<'_> {
        Rows { table: self }
    }

    pub(crate) fn row_store(&self) -> &RowStore {
        &self.rows
    }
}

/// Borrowed view over a table's rows.
#[derive(Clone, Copy, Debug)]
pub struct Rows<'a> {
    table: &'a Table,
}

impl<'a> Rows<'a> {
    pub fn len(&self) -> usize {
        self.table.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<RowRef<'a>> {
        let row = self.table.rows.get(index)?;
        Some(RowRef {
            table: self.table,
            row,
        })
    }

    pub fn at(&self, index: usize) -> Result<RowRef<'a>, Error> {
        self.get(index).ok_or_else(|| {
            Error::key_not_found(index, "rows").with_table(self.table.name.to_string())
        })
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = RowRef<'a>> + 'a {
        let table = self.table;
        table.rows.iter().map(move |row| RowRef { table, row })
    }

    /// Looks a row up by its key columns, values given in declared key order.
    /// Returns `Ok(None)` when no row carries that key.
    pub fn find(&self, key: impl IntoKey) -> Result<Option<RowRef<'a>>, Error> {
        let table = self.table;
        let key = key.into_key();
        let found = table
            .rows
            .find(&key, &table.columns, &table.keys, &table.pool)
            .map_err(|err| err.with_table(table.name.to_string()))?;
        Ok(found.and_then(|index| self.get(index)))
    }
}

/// One row together with the table that gives its bytes meaning.
#[derive(Clone, Copy, Debug)]
pub struct RowRef<'a> {
    table: &'a Table,
    row: &'a Row,
}

impl<'a> RowRef<'a> {
    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn index(&self) -> usize {
        self.row.index()
    }

    pub fn key_hash(&self) -> Option<u64> {
        self.row.key_hash()
    }

    pub fn raw(&self) -> &'a Row {
        self.row
    }

    pub fn column(&self, column: impl ColumnSelector) -> Result<&'a Column, Error> {
        column
            .select(&self.table.columns)
            .map_err(|err| err.with_table(self.table.name.to_string()))
    }

    pub fn has_value(&self, column: impl ColumnSelector) -> Result<bool, Error> {
        let column = self.column(column)?;
        Ok(self.row.has_value(column))
    }

    pub fn get(&self, column: impl ColumnSelector) -> Result<Value, Error> {
        let column = self.column(column)?;
        self.decode(column)
    }

    /// Typed read. Fails with `TypeMismatch` unless `T` matches the column's kind.
    pub fn value<T: FieldValue>(&self, column: impl ColumnSelector) -> Result<T, Error> {
        let column = self.column(column)?;
        if column.kind() != T::KIND {
            return Err(Error::type_mismatch(format!(
                "column '{}' is {}, requested {}",
                column.name(),
                column.kind(),
                T::KIND
            ))
            .with_table(self.table.name.to_string()));
        }
        let value = self.decode(column)?;
        T::from_value(value).ok_or_else(|| {
            Error::type_mismatch(format!("column '{}' decoded to another kind", column.name()))
        })
    }

    /// Every column's value in declaration order.
    pub fn values(&self) -> Result<Vec<(&'a Column, Value)>, Error> {
        self.table
            .columns
            .iter()
            .map(|column| Ok((column, self.decode(column)?)))
            .collect()
    }

    fn decode(&self, column: &Column) -> Result<Value, Error> {
        self.row
            .value(column, &self.table.pool)
            .map_err(|err| err.with_table(self.table.name.to_string()))
    }
}
