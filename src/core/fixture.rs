// Test-only writer that lays out small, valid datasets byte by byte.
#![allow(dead_code)]

use std::collections::HashMap;

pub const MAGIC: u32 = 0x0400_0000;
const FILE_HEADER_LEN: usize = 56;
const INDEX_ENTRY_LEN: usize = 16;
const TABLE_HEADER_LEN: usize = 56;
const TABLE_INFO_LEN: usize = 16;
const COLUMN_RECORD_LEN: usize = 12;

#[derive(Clone, Debug)]
pub enum Field {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    /// A string field that stores this id verbatim instead of interning text.
    TextId(i32),
    DateTime(i64),
    Duration(i64),
    Guid([u8; 16]),
}

impl Field {
    pub fn text(value: &str) -> Self {
        Field::Text(value.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct TableSpec {
    name: String,
    category: String,
    hash: String,
    modified_time: i64,
    magic: u32,
    columns: Vec<(String, String, bool)>,
    rows: Vec<Vec<Option<Field>>>,
    extra_strings: Vec<(i32, String)>,
}

impl TableSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: String::new(),
            hash: format!("hash-{name}"),
            modified_time: 0,
            magic: MAGIC,
            columns: Vec::new(),
            rows: Vec::new(),
            extra_strings: Vec::new(),
        }
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn modified_time(mut self, modified_time: i64) -> Self {
        self.modified_time = modified_time;
        self
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn column(mut self, name: &str, type_name: &str) -> Self {
        self.columns.push((name.to_string(), type_name.to_string(), false));
        self
    }

    pub fn key(mut self, name: &str, type_name: &str) -> Self {
        self.columns.push((name.to_string(), type_name.to_string(), true));
        self
    }

    pub fn row(mut self, fields: Vec<Option<Field>>) -> Self {
        self.rows.push(fields);
        self
    }

    /// Adds a raw entry to this table's local string block, after its own strings.
    pub fn extra_string(mut self, id: i32, text: &str) -> Self {
        self.extra_strings.push((id, text.to_string()));
        self
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[derive(Clone, Debug)]
pub struct DatasetSpec {
    name: String,
    revision: String,
    types_hash: String,
    tables_hash: String,
    tags: String,
    magic: u32,
    tables: Vec<TableSpec>,
}

impl DatasetSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            revision: "42".to_string(),
            types_hash: "types-0001".to_string(),
            tables_hash: "tables-0001".to_string(),
            tags: "All".to_string(),
            magic: MAGIC,
            tables: Vec::new(),
        }
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut ids = TextIds::default();
        let mut out = vec![0u8; FILE_HEADER_LEN];
        let index_at = out.len();
        out.resize(index_at + self.tables.len() * INDEX_ENTRY_LEN, 0);
        let tables_at = out.len();

        for (slot, table) in self.tables.iter().enumerate() {
            let base = out.len();
            let entry = index_at + slot * INDEX_ENTRY_LEN;
            put_i32(&mut out, entry, ids.id(&table.name));
            put_i64(&mut out, entry + 8, base as i64);
            write_table(&mut out, table, &mut ids);
        }

        let strings_at = out.len();
        let mut global = vec![
            ids.id(&self.name),
            ids.id(&self.revision),
            ids.id(&self.types_hash),
            ids.id(&self.tables_hash),
            ids.id(&self.tags),
        ];
        global.extend(self.tables.iter().map(|table| ids.id(&table.name)));
        write_strings(&mut out, &ids, &global, &[]);

        put_u32(&mut out, 0, self.magic);
        put_i32(&mut out, 4, ids.id(&self.revision));
        put_i32(&mut out, 8, ids.id(&self.types_hash));
        put_i32(&mut out, 12, ids.id(&self.tables_hash));
        put_i32(&mut out, 16, ids.id(&self.tags));
        put_i32(&mut out, 24, self.tables.len() as i32);
        put_i32(&mut out, 28, ids.id(&self.name));
        put_i64(&mut out, 32, index_at as i64);
        put_i64(&mut out, 40, tables_at as i64);
        put_i64(&mut out, 48, strings_at as i64);
        out
    }
}

/// Absolute offset of the table in `slot`, read back from the index.
pub fn table_offset(bytes: &[u8], slot: usize) -> usize {
    let at = FILE_HEADER_LEN + slot * INDEX_ENTRY_LEN + 8;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    i64::from_le_bytes(raw) as usize
}

/// Offset of the first row record relative to its table base.
pub fn rows_offset(column_count: usize) -> usize {
    TABLE_HEADER_LEN + TABLE_INFO_LEN + column_count * COLUMN_RECORD_LEN
}

#[derive(Default)]
struct TextIds {
    ids: HashMap<String, i32>,
    texts: HashMap<i32, String>,
    next: i32,
}

impl TextIds {
    fn id(&mut self, text: &str) -> i32 {
        if text.is_empty() {
            return 0;
        }
        if let Some(id) = self.ids.get(text) {
            return *id;
        }
        self.next += 1;
        let id = self.next * 7 + 100;
        self.ids.insert(text.to_string(), id);
        self.texts.insert(id, text.to_string());
        id
    }
}

fn write_table(out: &mut Vec<u8>, table: &TableSpec, ids: &mut TextIds) {
    let base = out.len();
    let mut used = Vec::new();
    let mut intern = |ids: &mut TextIds, text: &str| {
        let id = ids.id(text);
        used.push(id);
        id
    };

    let name = intern(ids, table.name.as_str());
    let category = intern(ids, table.category.as_str());
    let hash = intern(ids, table.hash.as_str());
    let columns: Vec<(i32, i32, bool)> = table
        .columns
        .iter()
        .map(|(column, type_name, is_key)| {
            (intern(ids, column.as_str()), intern(ids, type_name.as_str()), *is_key)
        })
        .collect();
    let blobs: Vec<Vec<u8>> = table
        .rows
        .iter()
        .map(|fields| row_blob(fields, table.columns.len(), &mut |text| intern(ids, text)))
        .collect();

    let info_at = TABLE_HEADER_LEN;
    let columns_at = info_at + TABLE_INFO_LEN;
    let rows_at = columns_at + columns.len() * COLUMN_RECORD_LEN;

    out.resize(base + rows_at, 0);
    put_u32(out, base, table.magic);
    put_i32(out, base + 4, hash);
    put_i64(out, base + 8, table.modified_time);
    put_i64(out, base + 16, info_at as i64);
    put_i64(out, base + 24, columns_at as i64);
    put_i64(out, base + 32, rows_at as i64);

    put_i32(out, base + info_at, name);
    put_i32(out, base + info_at + 4, category);
    put_i32(out, base + info_at + 8, columns.len() as i32);
    put_i32(out, base + info_at + 12, blobs.len() as i32);

    for (index, (column, type_name, is_key)) in columns.iter().enumerate() {
        let at = base + columns_at + index * COLUMN_RECORD_LEN;
        put_i32(out, at, *column);
        put_i32(out, at + 4, *type_name);
        put_i32(out, at + 8, i32::from(*is_key));
    }

    for blob in &blobs {
        out.extend_from_slice(&(blob.len() as i32).to_le_bytes());
        out.extend_from_slice(blob);
    }

    let strings_at = out.len() - base;
    put_i64(out, base + 40, strings_at as i64);
    write_strings(out, ids, &used, &table.extra_strings);
}

fn row_blob(fields: &[Option<Field>], column_count: usize, intern: &mut dyn FnMut(&str) -> i32) -> Vec<u8> {
    let mut blob = vec![0u8; column_count * 4];
    for (position, field) in fields.iter().enumerate().take(column_count) {
        let Some(field) = field else {
            continue;
        };
        let at = blob.len();
        put_u32(&mut blob, position * 4, at as u32);
        match field {
            Field::Bool(v) => blob.push(u8::from(*v)),
            Field::I8(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::U8(v) => blob.push(*v),
            Field::I16(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::U16(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::I32(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::U32(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::I64(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::U64(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::F32(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::F64(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::Text(text) => blob.extend_from_slice(&intern(text.as_str()).to_le_bytes()),
            Field::TextId(id) => blob.extend_from_slice(&id.to_le_bytes()),
            Field::DateTime(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::Duration(v) => blob.extend_from_slice(&v.to_le_bytes()),
            Field::Guid(v) => blob.extend_from_slice(v),
        }
    }
    blob
}

fn write_strings(out: &mut Vec<u8>, ids: &TextIds, used: &[i32], extra: &[(i32, String)]) {
    let mut entries: Vec<(i32, &str)> = Vec::new();
    for id in used {
        if *id == 0 || entries.iter().any(|(seen, _)| seen == id) {
            continue;
        }
        if let Some(text) = ids.texts.get(id) {
            entries.push((*id, text.as_str()));
        }
    }
    entries.extend(extra.iter().map(|(id, text)| (*id, text.as_str())));
    out.extend_from_slice(&(entries.len() as i32).to_le_bytes());
    for (id, text) in entries {
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&(text.len() as i32).to_le_bytes());
        out.extend_from_slice(text.as_bytes());
    }
}

fn put_i32(out: &mut [u8], at: usize, value: i32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut [u8], at: usize, value: u32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_i64(out: &mut [u8], at: usize, value: i64) {
    out[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

/// Two tables: `Items` keyed by int32 `id` with a `label`, and `Items.Stats`
/// linked to it through relation columns.
pub fn items_dataset() -> DatasetSpec {
    let items = TableSpec::new("Items")
        .category("Gear")
        .modified_time(1_700_000_000)
        .key("id", "int32")
        .column("label", "string")
        .column("weight", "double")
        .column(RELATION_ID, "int32")
        .row(vec![
            Some(Field::I32(1)),
            Some(Field::text("sword")),
            Some(Field::F64(3.5)),
            Some(Field::I32(100)),
        ])
        .row(vec![
            Some(Field::I32(2)),
            Some(Field::text("shield")),
            None,
            Some(Field::I32(200)),
        ])
        .row(vec![
            Some(Field::I32(3)),
            Some(Field::text("bow")),
            Some(Field::F64(1.25)),
            Some(Field::I32(300)),
        ]);
    let stats = TableSpec::new("Items.Stats")
        .key("stat", "string")
        .key("level", "uint8")
        .column("bonus", "int16")
        .column(PARENT_ID, "int32")
        .row(vec![
            Some(Field::text("power")),
            Some(Field::U8(1)),
            Some(Field::I16(5)),
            Some(Field::I32(100)),
        ])
        .row(vec![
            Some(Field::text("power")),
            Some(Field::U8(2)),
            Some(Field::I16(9)),
            Some(Field::I32(100)),
        ])
        .row(vec![
            Some(Field::text("guard")),
            Some(Field::U8(1)),
            Some(Field::I16(-3)),
            Some(Field::I32(200)),
        ]);
    DatasetSpec::new("Armory").table(items).table(stats)
}

pub const RELATION_ID: &str = "__RelationID__";
pub const PARENT_ID: &str = "__ParentID__";
