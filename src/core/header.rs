// Fixed-size record layouts: file header, table index, table header, table info, column.
use std::io::{Read, Seek};

use crate::core::error::Error;
use crate::core::format::{
    self, COLUMN_RECORD_LEN, FILE_HEADER_LEN, MAGIC_LEN, TABLE_HEADER_LEN,
    TABLE_INDEX_ENTRY_LEN, TABLE_INFO_LEN,
};
use crate::core::strings::TextId;
use crate::core::wire::{StreamCursor, read_i32, read_i64, read_u32};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FileHeader {
    pub magic: u32,
    pub revision: TextId,
    pub types_hash: TextId,
    pub tables_hash: TextId,
    pub tags: TextId,
    pub reserved: i32,
    pub table_count: i32,
    pub name: TextId,
    pub index_offset: i64,
    pub tables_offset: i64,
    pub string_resources_offset: i64,
}

impl FileHeader {
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < FILE_HEADER_LEN {
            return Err(Error::corrupt("file header too small"));
        }
        let magic = read_u32(buf, 0);
        if !format::is_supported_magic(magic) {
            return Err(format::format_magic_error(magic));
        }
        Ok(Self {
            magic,
            revision: read_i32(buf, 4),
            types_hash: read_i32(buf, 8),
            tables_hash: read_i32(buf, 12),
            tags: read_i32(buf, 16),
            reserved: read_i32(buf, 20),
            table_count: read_i32(buf, 24),
            name: read_i32(buf, 28),
            index_offset: read_i64(buf, 32),
            tables_offset: read_i64(buf, 40),
            string_resources_offset: read_i64(buf, 48),
        })
    }

    pub fn validate(&self, stream_len: u64) -> Result<(), Error> {
        if self.table_count < 0 {
            return Err(Error::corrupt(format!(
                "negative table count: {}",
                self.table_count
            )));
        }
        absolute_offset(self.index_offset, stream_len, "table index")?;
        let index_offset = self.index_start();
        let index_len = self.table_count as u64 * TABLE_INDEX_ENTRY_LEN as u64;
        if index_offset + index_len > stream_len {
            return Err(Error::corrupt("table index exceeds stream").with_offset(index_offset));
        }
        absolute_offset(self.string_resources_offset, stream_len, "string resources")?;
        Ok(())
    }

    /// Where the index array starts. Producers write it right after the header
    /// and some leave the field zeroed, so zero falls back to that position.
    pub fn index_start(&self) -> u64 {
        if self.index_offset == 0 {
            FILE_HEADER_LEN as u64
        } else {
            self.index_offset as u64
        }
    }

    /// Reads the magic on its own first, so a foreign file of any length is
    /// reported as unsupported rather than short.
    pub(crate) fn read<R: Read + Seek>(cursor: &mut StreamCursor<'_, R>) -> Result<Self, Error> {
        let head = cursor.read_array::<MAGIC_LEN>()?;
        let magic = read_u32(&head, 0);
        if !format::is_supported_magic(magic) {
            return Err(format::format_magic_error(magic));
        }
        let rest = cursor.read_array::<{ FILE_HEADER_LEN - MAGIC_LEN }>()?;
        let mut buf = [0u8; FILE_HEADER_LEN];
        buf[..MAGIC_LEN].copy_from_slice(&head);
        buf[MAGIC_LEN..].copy_from_slice(&rest);
        Self::decode(&buf)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableIndexEntry {
    pub table_name: TextId,
    pub offset: i64,
}

impl TableIndexEntry {
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < TABLE_INDEX_ENTRY_LEN {
            return Err(Error::corrupt("table index entry too small"));
        }
        Ok(Self {
            table_name: read_i32(buf, 0),
            offset: read_i64(buf, 8),
        })
    }

    pub(crate) fn read<R: Read + Seek>(cursor: &mut StreamCursor<'_, R>) -> Result<Self, Error> {
        let buf = cursor.read_array::<TABLE_INDEX_ENTRY_LEN>()?;
        Self::decode(&buf)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableHeader {
    pub magic: u32,
    pub hash: TextId,
    pub modified_time: i64,
    pub table_info_offset: i64,
    pub columns_offset: i64,
    pub rows_offset: i64,
    pub string_resources_offset: i64,
    pub user_offset: i64,
}

impl TableHeader {
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < TABLE_HEADER_LEN {
            return Err(Error::corrupt("table header too small"));
        }
        Ok(Self {
            magic: read_u32(buf, 0),
            hash: read_i32(buf, 4),
            modified_time: read_i64(buf, 8),
            table_info_offset: read_i64(buf, 16),
            columns_offset: read_i64(buf, 24),
            rows_offset: read_i64(buf, 32),
            string_resources_offset: read_i64(buf, 40),
            user_offset: read_i64(buf, 48),
        })
    }

    pub(crate) fn read<R: Read + Seek>(cursor: &mut StreamCursor<'_, R>) -> Result<Self, Error> {
        let buf = cursor.read_array::<TABLE_HEADER_LEN>()?;
        Self::decode(&buf)
    }

    /// Sub-offsets in the header are relative to the table's own base offset.
    pub fn resolve(base: u64, relative: i64, stream_len: u64, what: &str) -> Result<u64, Error> {
        if relative < 0 {
            return Err(
                Error::corrupt(format!("negative {what} offset: {relative}")).with_offset(base)
            );
        }
        let absolute = base
            .checked_add(relative as u64)
            .ok_or_else(|| Error::corrupt(format!("{what} offset overflow")).with_offset(base))?;
        if absolute > stream_len {
            return Err(
                Error::corrupt(format!("{what} offset points past end of stream"))
                    .with_offset(absolute),
            );
        }
        Ok(absolute)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableInfoRecord {
    pub table_name: TextId,
    pub category_name: TextId,
    pub column_count: i32,
    pub row_count: i32,
}

impl TableInfoRecord {
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < TABLE_INFO_LEN {
            return Err(Error::corrupt("table info too small"));
        }
        let record = Self {
            table_name: read_i32(buf, 0),
            category_name: read_i32(buf, 4),
            column_count: read_i32(buf, 8),
            row_count: read_i32(buf, 12),
        };
        if record.column_count < 0 || record.row_count < 0 {
            return Err(Error::corrupt(format!(
                "negative table counts (columns: {}, rows: {})",
                record.column_count, record.row_count
            )));
        }
        Ok(record)
    }

    pub(crate) fn read<R: Read + Seek>(cursor: &mut StreamCursor<'_, R>) -> Result<Self, Error> {
        let at = cursor.position();
        let buf = cursor.read_array::<TABLE_INFO_LEN>()?;
        Self::decode(&buf).map_err(|err| err.with_offset(at))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnRecord {
    pub column_name: TextId,
    pub data_type: TextId,
    pub is_key: bool,
}

impl ColumnRecord {
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < COLUMN_RECORD_LEN {
            return Err(Error::corrupt("column record too small"));
        }
        Ok(Self {
            column_name: read_i32(buf, 0),
            data_type: read_i32(buf, 4),
            is_key: read_i32(buf, 8) != 0,
        })
    }

    pub(crate) fn read<R: Read + Seek>(cursor: &mut StreamCursor<'_, R>) -> Result<Self, Error> {
        let buf = cursor.read_array::<COLUMN_RECORD_LEN>()?;
        Self::decode(&buf)
    }
}

fn absolute_offset(offset: i64, stream_len: u64, what: &str) -> Result<u64, Error> {
    if offset < 0 || offset as u64 > stream_len {
        return Err(Error::corrupt(format!("{what} offset out of range: {offset}")));
    }
    Ok(offset as u64)
}
