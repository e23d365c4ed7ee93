// CLI integration tests for the crema binary.
mod support;

use serde_json::Value;
use std::process::{Command, Output};
use support::{DatasetSpec, dataset_file, items_dataset};

fn cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_crema"))
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value.trim()).expect("json")
}

fn run(args: &[&str]) -> Output {
    cmd().args(args).output().expect("crema")
}

fn stdout_json(output: &Output) -> Value {
    parse_json(&String::from_utf8_lossy(&output.stdout))
}

fn stderr_json(output: &Output) -> Value {
    parse_json(&String::from_utf8_lossy(&output.stderr))
}

#[test]
fn info_reports_identity_without_decoding() {
    let file = dataset_file(&items_dataset().build());
    let path = file.path().to_str().expect("utf8 path");
    let output = run(&["info", path]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let value = stdout_json(&output);
    let dataset = &value["dataset"];
    assert_eq!(dataset["name"], "Armory");
    assert_eq!(dataset["revision"], "42");
    assert_eq!(dataset["types_hash"], "types-0001");
    assert_eq!(dataset["tables_hash"], "tables-0001");
    assert_eq!(dataset["tags"], "All");
    assert_eq!(dataset["version"], 0x0400_0000);
    assert_eq!(dataset["table_count"], 2);
    let tables = dataset["tables"].as_array().expect("tables");
    assert_eq!(tables[0]["name"], "Items");
    assert_eq!(tables[1]["name"], "Items.Stats");
    assert!(tables.iter().all(|slot| slot["loaded"] == false));

    let output = run(&["--eager", "info", path]);
    assert!(output.status.success());
    let value = stdout_json(&output);
    let tables = value["dataset"]["tables"].as_array().expect("tables");
    assert!(tables.iter().all(|slot| slot["loaded"] == true));
}

#[test]
fn tables_lists_keys_and_row_counts() {
    let file = dataset_file(&items_dataset().build());
    let output = run(&["tables", file.path().to_str().expect("utf8 path")]);
    assert!(output.status.success());

    let value = stdout_json(&output);
    assert_eq!(value["name"], "Armory");
    let tables = value["tables"].as_array().expect("tables");
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0]["category"], "Gear");
    assert_eq!(tables[0]["rows"], 3);
    assert_eq!(tables[0]["keys"], serde_json::json!(["id"]));
    assert_eq!(tables[1]["keys"], serde_json::json!(["stat", "level"]));
}

#[test]
fn columns_describe_kinds_and_keys() {
    let file = dataset_file(&items_dataset().build());
    let output = run(&["columns", file.path().to_str().expect("utf8 path"), "items.stats"]);
    assert!(output.status.success());

    let value = stdout_json(&output);
    assert_eq!(value["table"], "Items.Stats");
    let columns = value["columns"].as_array().expect("columns");
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[1]["name"], "level");
    assert_eq!(columns[1]["type_name"], "uint8");
    assert_eq!(columns[1]["kind"], "uint8");
    assert_eq!(columns[1]["is_key"], true);
    assert_eq!(columns[2]["is_key"], false);
}

#[test]
fn case_sensitive_flag_rejects_folded_names() {
    let file = dataset_file(&items_dataset().build());
    let output = run(&[
        "--case-sensitive",
        "columns",
        file.path().to_str().expect("utf8 path"),
        "items",
    ]);
    assert_eq!(output.status.code(), Some(3));
    let value = stderr_json(&output);
    assert_eq!(value["error"]["kind"], "KeyNotFound");
}

#[test]
fn dump_prints_rows_with_absent_fields_as_null() {
    let file = dataset_file(&items_dataset().build());
    let output = run(&[
        "dump",
        file.path().to_str().expect("utf8 path"),
        "Items",
        "--limit",
        "2",
    ]);
    assert!(output.status.success());

    let value = stdout_json(&output);
    assert_eq!(value["table"], "Items");
    assert_eq!(value["row_count"], 3);
    let rows = value["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["fields"]["label"], "sword");
    assert_eq!(rows[0]["fields"]["weight"], 3.5);
    assert!(rows[0]["key_hash"].is_string());
    assert_eq!(rows[1]["index"], 1);
    assert!(rows[1]["fields"]["weight"].is_null());
}

#[test]
fn find_returns_row_for_composite_key() {
    let file = dataset_file(&items_dataset().build());
    let output = run(&[
        "find",
        file.path().to_str().expect("utf8 path"),
        "Items.Stats",
        "guard",
        "1",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let value = stdout_json(&output);
    assert_eq!(value["table"], "Items.Stats");
    assert_eq!(value["row"]["index"], 2);
    assert_eq!(value["row"]["fields"]["bonus"], -3);
}

#[test]
fn find_miss_reports_not_found() {
    let file = dataset_file(&items_dataset().build());
    let output = run(&["find", file.path().to_str().expect("utf8 path"), "Items", "-7"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());

    let value = stderr_json(&output);
    assert_eq!(value["error"]["kind"], "KeyNotFound");
    assert_eq!(value["error"]["table"], "Items");
    assert!(value["error"]["hint"].is_string());
}

#[test]
fn find_with_wrong_key_count_is_usage_error() {
    let file = dataset_file(&items_dataset().build());
    let output = run(&["find", file.path().to_str().expect("utf8 path"), "Items.Stats", "power"]);
    assert_eq!(output.status.code(), Some(2));
    let value = stderr_json(&output);
    assert_eq!(value["error"]["kind"], "Usage");
    let hint = value["error"]["hint"].as_str().expect("hint");
    assert!(hint.contains("stat, level"));

    let output = run(&["find", file.path().to_str().expect("utf8 path"), "Items", "sword"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unsupported_magic_exits_with_format_code() {
    let file = dataset_file(&DatasetSpec::new("Old").magic(0x0300_0000).build());
    let output = run(&["info", file.path().to_str().expect("utf8 path")]);
    assert_eq!(output.status.code(), Some(5));

    let value = stderr_json(&output);
    assert_eq!(value["error"]["kind"], "UnsupportedFormat");
    assert!(value["error"]["path"].is_string());
    assert!(value["error"]["hint"].is_string());
}

#[test]
fn missing_file_exits_with_io_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.bin");
    let output = run(&["info", path.to_str().expect("utf8 path")]);
    assert_eq!(output.status.code(), Some(8));
    let value = stderr_json(&output);
    assert_eq!(value["error"]["kind"], "Io");
}

#[test]
fn bad_arguments_exit_with_usage_code() {
    let output = run(&["dump"]);
    assert_eq!(output.status.code(), Some(2));
    let value = stderr_json(&output);
    assert_eq!(value["error"]["kind"], "Usage");

    let output = run(&["nonsense"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn completion_emits_script() {
    let output = run(&["completion", "bash"]);
    assert!(output.status.success());
    let script = String::from_utf8_lossy(&output.stdout);
    assert!(script.contains("crema"));
}
