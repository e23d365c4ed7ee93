//! Purpose: Hold top-level CLI command dispatch for `crema`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: `info` never decodes a table; every other read command decodes only what it prints.
//! Invariants: Key arguments are parsed by the kind of the key column they fill.

use super::*;
use crate::table_json::{row_json, table_entry_json};
use crema_reader::api::{
    Column, ColumnSummary, DataKind, DatasetSummary, Guid, KeyValue, TableSummary,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub(super) fn dispatch_command(command: Command, flags: ReadFlags) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "crema", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Info { file } => {
            let reader = open_reader(&file, flags)?;
            let summary = DatasetSummary::from_reader(&reader);
            emit_json(json!({ "dataset": to_json(&summary)? }));
            Ok(RunOutcome::ok())
        }
        Command::Tables { file } => {
            let mut reader = open_reader(&file, flags)?;
            let mut tables = Vec::with_capacity(reader.tables().len());
            for index in 0..reader.tables().len() {
                tables.push(table_entry_json(reader.table_at(index)?));
            }
            emit_json(json!({ "name": reader.name(), "tables": tables }));
            Ok(RunOutcome::ok())
        }
        Command::Columns { file, table } => {
            let mut reader = open_reader(&file, flags)?;
            let table = reader.table(&table)?;
            let columns: Vec<ColumnSummary> = table.columns().iter().map(ColumnSummary::from).collect();
            emit_json(json!({ "table": table.name(), "columns": to_json(&columns)? }));
            Ok(RunOutcome::ok())
        }
        Command::Dump { file, table, limit } => {
            let mut reader = open_reader(&file, flags)?;
            let table = reader.table(&table)?;
            let limit = limit.unwrap_or(usize::MAX);
            let rows = table
                .rows()
                .iter()
                .take(limit)
                .map(row_json)
                .collect::<Result<Vec<_>, _>>()?;
            let summary = TableSummary::from(table);
            emit_json(json!({
                "table": summary.name,
                "row_count": summary.row_count,
                "keys": summary.keys,
                "rows": rows,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Find { file, table, key } => {
            let mut reader = open_reader(&file, flags)?;
            let table = reader.table(&table)?;
            let columns: Vec<&Column> = table.keys().collect();
            if columns.len() != key.len() {
                let names: Vec<&str> = columns.iter().map(|column| column.name()).collect();
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!(
                        "table '{}' has {} key column(s), got {} value(s)",
                        table.name(),
                        columns.len(),
                        key.len()
                    ))
                    .with_hint(if names.is_empty() {
                        "This table has no key columns; use `crema dump` instead.".to_string()
                    } else {
                        format!("Provide values for: {}.", names.join(", "))
                    }));
            }
            let values = key
                .iter()
                .zip(&columns)
                .map(|(text, column)| parse_key_value(text, column))
                .collect::<Result<Vec<_>, _>>()?;
            let display = key.join(", ");
            match table.rows().find(values)? {
                Some(row) => {
                    emit_json(json!({ "table": table.name(), "row": row_json(row)? }));
                    Ok(RunOutcome::ok())
                }
                None => Err(Error::new(ErrorKind::KeyNotFound)
                    .with_message(format!("no row with key ({display})"))
                    .with_table(table.name())
                    .with_hint("Key values must be given in key column order; see `crema columns`.")),
            }
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode summary")
            .with_source(err)
    })
}

/// Parses one command-line key component according to the key column's kind.
fn parse_key_value(text: &str, column: &Column) -> Result<KeyValue, Error> {
    let invalid = || {
        Error::new(ErrorKind::Usage)
            .with_message(format!(
                "invalid {} value for key column '{}': {text}",
                column.kind(),
                column.name()
            ))
    };
    let value = match column.kind() {
        DataKind::Bool => match text {
            "true" | "1" => KeyValue::Bool(true),
            "false" | "0" => KeyValue::Bool(false),
            _ => return Err(invalid().with_hint("Use true/false or 1/0.")),
        },
        DataKind::UInt8 | DataKind::UInt16 | DataKind::UInt32 | DataKind::UInt64 => {
            KeyValue::UInt(text.parse().map_err(|_| invalid())?)
        }
        DataKind::Int8
        | DataKind::Int16
        | DataKind::Int32
        | DataKind::Int64
        | DataKind::Duration => KeyValue::Int(text.parse().map_err(|_| invalid())?),
        DataKind::DateTime => match text.parse::<i64>() {
            Ok(seconds) => KeyValue::Int(seconds),
            Err(_) => {
                let parsed = OffsetDateTime::parse(text, &Rfc3339).map_err(|_| {
                    invalid().with_hint("Use RFC 3339 (1970-01-01T00:00:00Z) or epoch seconds.")
                })?;
                KeyValue::Int(parsed.unix_timestamp())
            }
        },
        DataKind::Float32 | DataKind::Float64 => {
            KeyValue::Float(text.parse().map_err(|_| invalid())?)
        }
        DataKind::String => KeyValue::Text(text.to_string()),
        DataKind::Guid => KeyValue::Guid(text.parse::<Guid>().map_err(|err| {
            invalid()
                .with_hint("Use the 8-4-4-4-12 hex form.")
                .with_source(err)
        })?),
    };
    Ok(value)
}
