// Row blobs (a leading field-offset table followed by fixed-width field
// payloads) and the row store that indexes them by key hash.
use crate::core::column::{Column, ColumnSet};
use crate::core::error::Error;
use crate::core::format::FIELD_OFFSET_LEN;
use crate::core::keys::{KeyCodec, KeyIndex, KeyHasher, KeyValue};
use crate::core::strings::PoolHandle;
use crate::core::value::Value;
use crate::core::wire::read_u32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    blob: Box<[u8]>,
    index: usize,
    table_slot: usize,
    key_hash: Option<u64>,
}

impl Row {
    /// Takes ownership of a raw row blob, checking that the offset table and
    /// every present field fit inside it so later reads cannot go out of bounds.
    pub(crate) fn from_blob(
        blob: Vec<u8>,
        index: usize,
        table_slot: usize,
        columns: &ColumnSet,
    ) -> Result<Self, Error> {
        let table_len = columns.len() * FIELD_OFFSET_LEN;
        if blob.len() < table_len {
            return Err(Error::corrupt(format!(
                "row {index} blob is {} bytes, offset table needs {table_len}",
                blob.len()
            )));
        }
        for column in columns {
            let offset = read_u32(&blob, column.position() * FIELD_OFFSET_LEN) as usize;
            if offset == 0 {
                continue;
            }
            let end = offset.checked_add(column.kind().width());
            if end.is_none_or(|end| end > blob.len()) {
                return Err(Error::corrupt(format!(
                    "row {index} field '{}' at offset {offset} exceeds {} byte blob",
                    column.name(),
                    blob.len()
                )));
            }
        }
        Ok(Self {
            blob: blob.into_boxed_slice(),
            index,
            table_slot,
            key_hash: None,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table_slot(&self) -> usize {
        self.table_slot
    }

    pub fn bytes(&self) -> &[u8] {
        &self.blob
    }

    /// Cached hash of this row's key columns; `None` for keyless tables.
    pub fn key_hash(&self) -> Option<u64> {
        self.key_hash
    }

    pub(crate) fn set_key_hash(&mut self, hash: u64) {
        self.key_hash = Some(hash);
    }

    pub(crate) fn field_offset(&self, column: &Column) -> usize {
        read_u32(&self.blob, column.position() * FIELD_OFFSET_LEN) as usize
    }

    pub(crate) fn has_value(&self, column: &Column) -> bool {
        self.field_offset(column) != 0
    }

    pub(crate) fn value(&self, column: &Column, pool: &PoolHandle) -> Result<Value, Error> {
        let offset = self.field_offset(column);
        if offset == 0 {
            return Ok(Value::zero(column.kind()));
        }
        Value::decode(column.kind(), &self.blob[offset..], pool)
    }
}

/// Rows of one table in file order, plus the key index built over them.
#[derive(Debug)]
pub struct RowStore {
    rows: Vec<Row>,
    codec: KeyCodec,
    index: KeyIndex,
}

impl RowStore {
    /// Hashes every row's key columns once and indexes the row under that hash.
    pub(crate) fn build(
        mut rows: Vec<Row>,
        columns: &ColumnSet,
        keys: &[usize],
        hasher: KeyHasher,
        pool: &PoolHandle,
    ) -> Result<Self, Error> {
        let key_columns = key_columns(columns, keys)?;
        let codec = KeyCodec::new(key_columns.iter().copied(), hasher);
        let mut index = KeyIndex::default();
        if !key_columns.is_empty() {
            for row in &mut rows {
                let values = key_columns
                    .iter()
                    .map(|column| row.value(column, pool))
                    .collect::<Result<Vec<_>, _>>()?;
                let hash = codec.hash(&values);
                row.set_key_hash(hash);
                index.insert(hash, row.index());
            }
        }
        Ok(Self { rows, codec, index })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn index(&self) -> &KeyIndex {
        &self.index
    }

    /// Resolves a key sequence to a row index. Family or arity mismatches are
    /// errors; a well-typed key with no matching row is `Ok(None)`.
    pub(crate) fn find(
        &self,
        key: &[KeyValue],
        columns: &ColumnSet,
        keys: &[usize],
        pool: &PoolHandle,
    ) -> Result<Option<usize>, Error> {
        if key.len() != keys.len() {
            return Err(Error::type_mismatch(format!(
                "expected {} key value(s), got {}",
                keys.len(),
                key.len()
            )));
        }
        let key_columns = key_columns(columns, keys)?;
        let mut values = Vec::with_capacity(key.len());
        let mut representable = true;
        for (component, column) in key.iter().zip(&key_columns) {
            match component.coerce(column)? {
                Some(value) => values.push(value),
                None => representable = false,
            }
        }
        if !representable {
            return Ok(None);
        }
        let hash = self.codec.hash(&values);
        match self.index.candidates(hash) {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            candidates => {
                for &candidate in candidates {
                    let Some(row) = self.rows.get(candidate) else {
                        continue;
                    };
                    if row_matches(row, &key_columns, &values, pool)? {
                        return Ok(Some(candidate));
                    }
                }
                Ok(None)
            }
        }
    }
}

fn key_columns<'a>(columns: &'a ColumnSet, keys: &[usize]) -> Result<Vec<&'a Column>, Error> {
    keys.iter().map(|position| columns.at(*position)).collect()
}

fn row_matches(
    row: &Row,
    key_columns: &[&Column],
    values: &[Value],
    pool: &PoolHandle,
) -> Result<bool, Error> {
    for (column, expected) in key_columns.iter().zip(values) {
        if row.value(column, pool)? != *expected {
            return Ok(false);
        }
    }
    Ok(true)
}
