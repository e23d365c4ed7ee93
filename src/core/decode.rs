// Decodes one table region: header, info, local strings, columns, rows, key index.
use std::io::{Read, Seek};
use std::rc::Rc;

use crate::core::column::{Column, ColumnSet};
use crate::core::error::Error;
use crate::core::format::{COLUMN_RECORD_LEN, FIELD_OFFSET_LEN};
use crate::core::header::{ColumnRecord, TableHeader, TableInfoRecord};
use crate::core::keys::KeyHasher;
use crate::core::row::{Row, RowStore};
use crate::core::strings::PoolHandle;
use crate::core::table::Table;
use crate::core::wire::StreamCursor;

/// Reader-wide settings every table decode needs.
#[derive(Clone, Debug)]
pub(crate) struct DecodeContext {
    pub file_magic: u32,
    pub case_sensitive: bool,
    pub key_hasher: KeyHasher,
    pub pool: Rc<PoolHandle>,
}

/// Builds the table at absolute `offset`. Nothing is published until every
/// row is read and indexed, so a failure leaves no partial state behind.
pub(crate) fn decode_table<R: Read + Seek>(
    stream: &mut R,
    stream_len: u64,
    slot: usize,
    offset: u64,
    context: &DecodeContext,
) -> Result<Table, Error> {
    let pool = &context.pool;
    let mut cursor = StreamCursor::new(stream, stream_len);
    cursor.seek_to(offset)?;
    let header = TableHeader::read(&mut cursor)?;
    if header.magic != context.file_magic {
        tracing::warn!(
            slot,
            offset,
            table_magic = format_args!("{:#010x}", header.magic),
            file_magic = format_args!("{:#010x}", context.file_magic),
            "table magic differs from file magic"
        );
    }

    cursor.seek_to(TableHeader::resolve(
        offset,
        header.table_info_offset,
        stream_len,
        "table info",
    )?)?;
    let info = TableInfoRecord::read(&mut cursor)?;

    cursor.seek_to(TableHeader::resolve(
        offset,
        header.string_resources_offset,
        stream_len,
        "table strings",
    )?)?;
    pool.prime(&mut cursor)?;

    let name = pool.get(info.table_name)?;
    let category = pool.get(info.category_name)?;
    let hash = pool.get(header.hash)?;

    cursor.seek_to(TableHeader::resolve(
        offset,
        header.columns_offset,
        stream_len,
        "columns",
    )?)?;
    let column_count = info.column_count as usize;
    ensure_fits(&cursor, column_count, COLUMN_RECORD_LEN, "column records")?;
    let mut columns = Vec::with_capacity(column_count);
    for position in 0..column_count {
        let record = ColumnRecord::read(&mut cursor)?;
        columns.push(Column::new(
            pool.get(record.column_name)?,
            pool.get(record.data_type)?,
            record.is_key,
            position,
            slot,
        ));
    }
    let columns = ColumnSet::new(columns, context.case_sensitive);
    let keys: Vec<usize> = columns
        .iter()
        .filter(|column| column.is_key())
        .map(|column| column.position())
        .collect();

    cursor.seek_to(TableHeader::resolve(
        offset,
        header.rows_offset,
        stream_len,
        "rows",
    )?)?;
    let row_count = info.row_count as usize;
    ensure_fits(&cursor, row_count, FIELD_OFFSET_LEN, "row records")?;
    let mut rows = Vec::with_capacity(row_count);
    for index in 0..row_count {
        let at = cursor.position();
        let len = cursor.read_len("row length")?;
        let blob = cursor.read_vec(len)?;
        let row = Row::from_blob(blob, index, slot, &columns).map_err(|err| err.with_offset(at))?;
        rows.push(row);
    }
    let rows = RowStore::build(rows, &columns, &keys, context.key_hasher, pool)?;

    tracing::debug!(
        table = %name,
        slot,
        columns = columns.len(),
        keys = keys.len(),
        rows = rows.len(),
        "decoded table"
    );

    Ok(Table {
        slot,
        offset,
        name,
        category,
        hash,
        modified_time: header.modified_time,
        columns,
        keys,
        rows,
        pool: Rc::clone(pool),
    })
}

/// Rejects counts whose minimum encoded size already exceeds the stream, so
/// a corrupt count cannot drive a huge allocation.
fn ensure_fits<R: Read + Seek>(
    cursor: &StreamCursor<'_, R>,
    count: usize,
    record_len: usize,
    what: &str,
) -> Result<(), Error> {
    let needed = (count as u64).saturating_mul(record_len as u64);
    if needed > cursor.remaining() {
        return Err(Error::corrupt(format!(
            "{count} {what} need {needed} bytes, {} remain",
            cursor.remaining()
        ))
        .with_offset(cursor.position()));
    }
    Ok(())
}
