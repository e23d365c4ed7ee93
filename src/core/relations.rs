// Parent/child navigation: `Parent.Child` tables linked through relation id columns.
use std::io::{Read, Seek};

use crate::core::error::{Error, ErrorKind};
use crate::core::reader::DatasetReader;
use crate::core::table::{RowRef, Table};

pub const RELATION_ID_COLUMN: &str = "__RelationID__";
pub const PARENT_ID_COLUMN: &str = "__ParentID__";

/// `Parent` for `Parent.Child`; `None` for root tables.
pub fn parent_name(table: &str) -> Option<&str> {
    table.rsplit_once('.').map(|(parent, _)| parent)
}

/// Last dotted segment of a table name.
pub fn pure_name(table: &str) -> &str {
    table.rsplit_once('.').map_or(table, |(_, child)| child)
}

impl<R: Read + Seek> DatasetReader<R> {
    /// Names of the tables directly nested under `table`, in slot order.
    pub fn child_table_names(&self, table: &str) -> Result<Vec<&str>, Error> {
        let tables = self.tables();
        let parent = tables
            .position(table)
            .ok_or_else(|| Error::key_not_found(table, "tables"))?;
        Ok(tables
            .names()
            .filter(|name| parent_name(name).and_then(|p| tables.position(p)) == Some(parent))
            .collect())
    }

    pub fn parent_table(&mut self, table: &str) -> Result<Option<&Table>, Error> {
        if !self.tables().contains(table) {
            return Err(Error::key_not_found(table, "tables"));
        }
        match parent_name(table) {
            Some(parent) => self.table(parent).map(Some),
            None => Ok(None),
        }
    }

    /// The row of the parent table whose relation id equals this row's parent id.
    pub fn parent_row(&mut self, table: &str, row: usize) -> Result<Option<RowRef<'_>>, Error> {
        let Some(parent) = parent_name(table) else {
            return Ok(None);
        };
        self.tables_mut().load(table)?;
        self.tables_mut().load(parent)?;
        let tables = self.tables();
        let child = loaded(tables.get_loaded(table), table)?;
        let parent = loaded(tables.get_loaded(parent), parent)?;

        let parent_id: i32 = child.rows().at(row)?.value(PARENT_ID_COLUMN)?;
        for candidate in parent.rows().iter() {
            if candidate.value::<i32>(RELATION_ID_COLUMN)? == parent_id {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Rows of `child_table` that point back at `row` of `table`.
    pub fn child_rows(
        &mut self,
        table: &str,
        row: usize,
        child_table: &str,
    ) -> Result<Vec<RowRef<'_>>, Error> {
        let tables = self.tables();
        let is_child = parent_name(child_table)
            .and_then(|parent| tables.position(parent))
            .is_some_and(|parent| Some(parent) == tables.position(table));
        if !is_child {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("'{child_table}' is not a child of '{table}'"))
                .with_table(table.to_string()));
        }
        self.tables_mut().load(table)?;
        self.tables_mut().load(child_table)?;
        let tables = self.tables();
        let parent = loaded(tables.get_loaded(table), table)?;
        let child = loaded(tables.get_loaded(child_table), child_table)?;

        let relation_id: i32 = parent.rows().at(row)?.value(RELATION_ID_COLUMN)?;
        let mut rows = Vec::new();
        for candidate in child.rows().iter() {
            if candidate.value::<i32>(PARENT_ID_COLUMN)? == relation_id {
                rows.push(candidate);
            }
        }
        Ok(rows)
    }
}

fn loaded<'a>(table: Option<&'a Table>, name: &str) -> Result<&'a Table, Error> {
    table.ok_or_else(|| {
        Error::new(ErrorKind::Internal)
            .with_message("table not loaded after load")
            .with_table(name.to_string())
    })
}
