//! Purpose: Shared JSON serializers for tables, rows, and field values.
//! Exports: `table_entry_json`, `row_json`, `value_json`.
//! Role: Keep row and table envelope shapes consistent across CLI commands.
//! Invariants: Absent fields render as `null`, present zero values as their zero.
//! Invariants: Datetimes render as RFC 3339 when representable, else epoch seconds.

use crema_reader::api::{Error, RowRef, Table, Value};
use serde_json::{Map, Value as Json, json};

pub(crate) fn table_entry_json(table: &Table) -> Json {
    let keys: Vec<&str> = table.keys().map(|column| column.name()).collect();
    json!({
        "name": table.name(),
        "category": table.category(),
        "hash": table.hash(),
        "modified_time": table.modified_time(),
        "columns": table.columns().len(),
        "rows": table.rows().len(),
        "keys": keys,
    })
}

pub(crate) fn row_json(row: RowRef<'_>) -> Result<Json, Error> {
    let mut fields = Map::new();
    for (column, value) in row.values()? {
        let rendered = if row.has_value(column)? {
            value_json(&value)
        } else {
            Json::Null
        };
        fields.insert(column.name().to_string(), rendered);
    }
    let mut map = Map::new();
    map.insert("index".to_string(), json!(row.index()));
    if let Some(hash) = row.key_hash() {
        map.insert("key_hash".to_string(), json!(format!("{hash:016x}")));
    }
    map.insert("fields".to_string(), Json::Object(fields));
    Ok(Json::Object(map))
}

pub(crate) fn value_json(value: &Value) -> Json {
    match value {
        Value::Bool(v) => json!(v),
        Value::Int8(v) => json!(v),
        Value::UInt8(v) => json!(v),
        Value::Int16(v) => json!(v),
        Value::UInt16(v) => json!(v),
        Value::Int32(v) => json!(v),
        Value::UInt32(v) => json!(v),
        Value::Int64(v) => json!(v),
        Value::UInt64(v) => json!(v),
        Value::Float32(v) => json!(v),
        Value::Float64(v) => json!(v),
        Value::String(text) => json!(&**text),
        Value::DateTime(ts) => match ts.to_rfc3339() {
            Some(text) => json!(text),
            None => json!(ts.seconds()),
        },
        Value::Duration(span) => json!(span.ticks()),
        Value::Guid(guid) => json!(guid.to_string()),
    }
}
