//! Purpose: `crema` CLI entry point for inspecting crema datasets.
//! Role: Binary crate root; parses args, opens readers, emits JSON on stdout.
//! Invariants: Successful commands emit exactly one JSON document on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Datasets are only ever opened read-only.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::error::ErrorKind as ClapErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod table_json;

use crema_reader::api::{DatasetReader, Error, ErrorKind, ReadFlags, to_exit_code};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

#[derive(Parser)]
#[command(
    name = "crema",
    version,
    about = "Inspect crema binary datasets",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Datasets are opened read-only. Output is JSON.

Mental model:
  - `info` shows the dataset header and its table slots
  - `columns` and `dump` decode one table
  - `find` looks a row up by its key columns
"#,
    after_help = r#"EXAMPLES
  $ crema info game.dat
  $ crema tables game.dat
  $ crema dump game.dat Items --limit 5
  $ crema find game.dat Items 2
  $ crema find game.dat Items.Stats power 1

LEARN MORE
  $ crema <command> --help
  Set RUST_LOG=debug to trace table decoding on stderr."#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Match table and column names exactly instead of ignoring case"
    )]
    case_sensitive: bool,
    #[arg(
        long,
        global = true,
        help = "Decode every table at open instead of on first use"
    )]
    eager: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Show dataset identity and table slots without decoding tables")]
    Info {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(about = "Decode every table and list names, categories, keys, and row counts")]
    Tables {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(about = "List the columns of one table")]
    Columns {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        table: String,
    },
    #[command(about = "Print the rows of one table")]
    Dump {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        table: String,
        #[arg(long, help = "Print at most this many rows")]
        limit: Option<usize>,
    },
    #[command(
        about = "Find a row by its key values, given in key column order",
        after_help = "Values are parsed by key column kind: integers, floats, true/false, GUIDs, \nRFC 3339 or epoch seconds for datetime, 100ns ticks for duration, text as-is."
    )]
    Find {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        table: String,
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        key: Vec<String>,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    fn read_flags(&self) -> ReadFlags {
        ReadFlags::new()
            .lazy(!self.eager)
            .case_sensitive(self.case_sensitive)
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint(clap_error_hint(&err)));
            }
        },
    };

    let flags = cli.read_flags();
    command_dispatch::dispatch_command(cli.command, flags)
        .map_err(add_format_hint)
        .map_err(add_corrupt_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
}

fn open_reader(
    path: &Path,
    flags: ReadFlags,
) -> Result<DatasetReader<io::Cursor<memmap2::Mmap>>, Error> {
    DatasetReader::open_path(path, flags)
}

fn add_format_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::UnsupportedFormat || err.hint().is_some() {
        return err;
    }
    err.with_hint("The file is not a crema dataset this reader understands.")
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("I/O error. Check that the path exists and is readable.")
}

fn add_corrupt_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Corrupt || err.hint().is_some() {
        return err;
    }
    err.with_hint("Dataset appears truncated or corrupt. Re-export it from the producer.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::KeyNotFound => "not found".to_string(),
        ErrorKind::TypeMismatch => "type mismatch".to_string(),
        ErrorKind::UnsupportedFormat => "unsupported format".to_string(),
        ErrorKind::Corrupt => "corrupt data".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(table) = err.table() {
        inner.insert("table".to_string(), json!(table));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(table) = err.table() {
        lines.push(format!("table: {table}"));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!("offset: {offset}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);
    let Some(usage) = usage else {
        return "Try `crema --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "crema") else {
        return "Try `crema --help`.".to_string();
    };
    let subcommand = tokens
        .iter()
        .skip(pos + 1)
        .find(|token| !token.starts_with('-') && !token.starts_with('<') && !token.starts_with('['));
    match subcommand {
        Some(subcommand) => format!("Try `crema {subcommand} --help`."),
        None => "Try `crema --help`.".to_string(),
    }
}
