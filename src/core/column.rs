// Column metadata and the ordered, name-indexed column set of one table.
use std::borrow::Cow;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::error::Error;
use crate::core::kind::DataKind;

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: Rc<str>,
    type_name: Rc<str>,
    kind: DataKind,
    is_key: bool,
    position: usize,
    table_slot: usize,
}

impl Column {
    pub(crate) fn new(
        name: Rc<str>,
        type_name: Rc<str>,
        is_key: bool,
        position: usize,
        table_slot: usize,
    ) -> Self {
        let kind = DataKind::from_type_name(&type_name);
        if DataKind::lookup(&type_name).is_none() {
            tracing::debug!(column = %name, type_name = %type_name, "non-primitive column type read as int32");
        }
        Self {
            name,
            type_name,
            kind,
            is_key,
            position,
            table_slot,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name as written by the producer; differs from `kind` for enum types.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn is_key(&self) -> bool {
        self.is_key
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Directory slot of the owning table.
    pub fn table_slot(&self) -> usize {
        self.table_slot
    }
}

#[derive(Debug)]
pub struct ColumnSet {
    columns: Vec<Column>,
    by_name: FxHashMap<String, usize>,
    case_sensitive: bool,
}

impl ColumnSet {
    pub(crate) fn new(columns: Vec<Column>, case_sensitive: bool) -> Self {
        let mut by_name = FxHashMap::default();
        for column in &columns {
            by_name
                .entry(fold_name(column.name(), case_sensitive).into_owned())
                .or_insert(column.position());
        }
        Self {
            columns,
            by_name,
            case_sensitive,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn get(&self, position: usize) -> Option<&Column> {
        self.columns.get(position)
    }

    pub fn at(&self, position: usize) -> Result<&Column, Error> {
        self.get(position)
            .ok_or_else(|| Error::key_not_found(position, "columns"))
    }

    pub fn find(&self, name: &str) -> Option<&Column> {
        let position = *self.by_name.get(&*fold_name(name, self.case_sensitive))?;
        self.columns.get(position)
    }

    pub fn named(&self, name: &str) -> Result<&Column, Error> {
        self.find(name)
            .ok_or_else(|| Error::key_not_found(name, "columns"))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

impl<'a> IntoIterator for &'a ColumnSet {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ways to address a column: by name, by position, or by a column handle.
pub trait ColumnSelector {
    fn select<'a>(&self, columns: &'a ColumnSet) -> Result<&'a Column, Error>;
}

impl ColumnSelector for &str {
    fn select<'a>(&self, columns: &'a ColumnSet) -> Result<&'a Column, Error> {
        columns.named(self)
    }
}

impl ColumnSelector for String {
    fn select<'a>(&self, columns: &'a ColumnSet) -> Result<&'a Column, Error> {
        columns.named(self)
    }
}

impl ColumnSelector for usize {
    fn select<'a>(&self, columns: &'a ColumnSet) -> Result<&'a Column, Error> {
        columns.at(*self)
    }
}

impl ColumnSelector for &Column {
    fn select<'a>(&self, columns: &'a ColumnSet) -> Result<&'a Column, Error> {
        match columns.get(self.position()) {
            Some(column) if column.name() == self.name() && column.table_slot() == self.table_slot() => {
                Ok(column)
            }
            _ => Err(Error::key_not_found(self.name(), "columns")),
        }
    }
}

/// Normalizes a name for map lookups under the reader's case policy.
pub(crate) fn fold_name(name: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.to_lowercase())
    }
}
