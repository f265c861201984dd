//! Purpose: `itemized` CLI entry point and command dispatch support.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable stdout formats (human or JSON by command/flags).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `core::error::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::ffi::OsString;
use std::io::{self, IsTerminal, Write};
use std::ops::Range;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

mod color_json;
mod command_dispatch;
mod row_json;
mod source;

use color_json::colorize_json;
use itemized::core::decode::{DecodedRow, decode_blob};
use itemized::core::error::{Error, ErrorKind, to_exit_code};
use itemized::core::layout::SchemaVariant;
use itemized::core::script;
use row_json::{layout_json, row_json};
use source::{load_blobs, read_blob_arg};

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

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
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
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    init_tracing(cli.verbose, cli.quiet, color_mode);

    let result = command_dispatch::dispatch_command(cli.command, color_mode);

    result
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let replacement = arg.to_str().and_then(|value| match value {
                "---help" => Some("--help"),
                "---version" => Some("--version"),
                _ => None,
            });
            replacement.map(OsString::from).unwrap_or_else(|| arg)
        })
        .collect()
}

// Tracing policy: --quiet forces "off"; --verbose honors RUST_LOG and falls
// back to "info"; the default keeps diagnostics off so script output and
// receipts stay clean.
fn init_tracing(verbose: bool, quiet: bool, color_mode: ColorMode) {
    let filter = if quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    let ansi = color_mode.use_color(io::stderr().is_terminal());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

#[derive(Parser)]
#[command(
    name = "itemized",
    version,
    about = "Unpack legacy item_instance data blobs into discrete typed columns",
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
    before_help = r#"Old item_instance tables pack every column into one whitespace-separated
`data` blob. This tool rewrites that blob into discrete typed columns.

Mental model:
  - `convert` turns exported blob lines into a full migration script
  - `check` scans blob lines and reports every malformed row
  - `inspect` decodes a single blob, column by column
"#,
    after_help = r#"EXAMPLES
  $ mysql -N -B characters -e 'SELECT `data` FROM `item_instance`' > blobs.txt
  $ itemized convert --schema tbc blobs.txt
  $ mysql characters < item_instance_converted.sql

LEARN MORE
  $ itemized <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,
    #[arg(long, help = "Log conversion phases to stderr")]
    verbose: bool,
    #[arg(long, conflicts_with = "verbose", help = "Suppress all diagnostics")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SchemaArg {
    Classic,
    Tbc,
    Wotlk,
}

impl From<SchemaArg> for SchemaVariant {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Classic => SchemaVariant::Classic,
            SchemaArg::Tbc => SchemaVariant::Tbc,
            SchemaArg::Wotlk => SchemaVariant::Wotlk,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Convert blob lines into a migration script",
        long_about = r#"Convert exported item_instance blob lines into a migration script.

The script truncates the table, drops the packed `data` column, adds the
discrete columns, and re-inserts every row in batched INSERT statements."#,
        after_help = r#"EXAMPLES
  $ itemized convert --schema tbc blobs.txt
  $ itemized convert --schema classic blobs.txt -o classic.sql
  $ mysql -N -B characters -e 'SELECT `data` FROM `item_instance`' \
      | itemized convert --schema wotlk - -o -

NOTES
  - The generated script is destructive; back up the database first
  - One malformed blob aborts the whole run and nothing is written
  - `-o -` streams the script to stdout and suppresses the receipt"#
    )]
    Convert {
        #[arg(
            help = "Blob lines file (use - or pipe for stdin)",
            value_hint = ValueHint::FilePath
        )]
        input: Option<String>,
        #[arg(long, value_enum, help = "Source blob layout: classic|tbc|wotlk")]
        schema: SchemaArg,
        #[arg(
            short = 'o',
            long = "output",
            default_value = script::DEFAULT_OUTPUT_FILE,
            help = "Output script path (use - for stdout)",
            value_hint = ValueHint::FilePath
        )]
        output: String,
        #[arg(
            long = "batch-size",
            default_value_t = script::DEFAULT_BATCH_SIZE,
            help = "Rows per INSERT statement"
        )]
        batch_size: usize,
    },
    #[command(
        about = "Scan blob lines and report every malformed row",
        long_about = r#"Decode every blob line and report all rows that fail, instead of stopping
at the first one. Writes nothing."#,
        after_help = r#"EXAMPLES
  $ itemized check --schema tbc blobs.txt
  $ itemized check --schema tbc blobs.txt --json | jq '.check.failures'

NOTES
  - Exits 4 when any row fails to decode
  - Row numbers are one-based positions in the input"#
    )]
    Check {
        #[arg(
            help = "Blob lines file (use - or pipe for stdin)",
            value_hint = ValueHint::FilePath
        )]
        input: Option<String>,
        #[arg(long, value_enum, help = "Source blob layout: classic|tbc|wotlk")]
        schema: SchemaArg,
        #[arg(long, help = "Emit a JSON report instead of the table")]
        json: bool,
    },
    #[command(
        about = "Decode one blob and show every destination column",
        after_help = r#"EXAMPLES
  $ itemized inspect --schema tbc '3 1 0 25 ...'
  $ head -1 blobs.txt | itemized inspect --schema tbc --json"#
    )]
    Inspect {
        #[arg(help = "Packed blob (use - or pipe for stdin)")]
        blob: Option<String>,
        #[arg(long, value_enum, help = "Source blob layout: classic|tbc|wotlk")]
        schema: SchemaArg,
        #[arg(long, help = "Emit JSON instead of the table")]
        json: bool,
    },
    #[command(
        about = "Show a layout's token offsets and conversions",
        after_help = r#"EXAMPLES
  $ itemized layout --schema classic
  $ itemized layout --schema wotlk --json"#
    )]
    Layout {
        #[arg(long, value_enum, help = "Blob layout: classic|tbc|wotlk")]
        schema: SchemaArg,
        #[arg(long, help = "Emit JSON instead of the table")]
        json: bool,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum, help = "Shell to target")]
        shell: Shell,
    },
    #[command(about = "Show version information")]
    Version,
}

struct ConvertReceipt<'a> {
    variant: SchemaVariant,
    rows: usize,
    batches: usize,
    batch_size: usize,
    output: &'a str,
    elapsed_ms: u64,
}

fn emit_convert_receipt(receipt: &ConvertReceipt<'_>, color_mode: ColorMode) {
    if io::stdout().is_terminal() {
        println!(
            "converted {} rows in {}ms (schema: {})",
            receipt.rows,
            receipt.elapsed_ms,
            receipt.variant.label()
        );
        println!("  output: {}", receipt.output);
        println!(
            "  batches: {} (batch size {})",
            receipt.batches, receipt.batch_size
        );
    } else {
        emit_json(
            json!({
                "converted": {
                    "schema": receipt.variant.label(),
                    "rows": receipt.rows,
                    "batches": receipt.batches,
                    "batch_size": receipt.batch_size,
                    "output": receipt.output,
                    "elapsed_ms": receipt.elapsed_ms,
                }
            }),
            color_mode,
        );
    }
}

fn emit_empty_input_notice(variant: SchemaVariant, label: &str, color_mode: ColorMode) {
    warn!(source = %label, "input contained no blob rows");
    if io::stdout().is_terminal() {
        println!("no blob rows in {label}; nothing to convert");
    } else {
        emit_json(
            json!({
                "converted": {
                    "schema": variant.label(),
                    "rows": 0,
                    "batches": 0,
                    "output": Value::Null,
                }
            }),
            color_mode,
        );
    }
}

fn emit_backup_banner(color_mode: ColorMode) {
    if !io::stderr().is_terminal() {
        return;
    }
    let label = colorize_label("warning:", color_mode.use_color(true), AnsiColor::Yellow);
    eprintln!("{label} the generated script truncates `item_instance` and drops its `data` column.");
    eprintln!("Back up the target database before applying it.");
}

fn emit_inspect_human(variant: SchemaVariant, row: &DecodedRow) {
    println!("schema: {}", variant.label());
    let rows = vec![
        vec!["guid".to_string(), row.guid.clone()],
        vec!["owner_guid".to_string(), row.owner_guid.to_string()],
        vec!["itemEntry".to_string(), row.item_entry.clone()],
        vec!["creatorGuid".to_string(), row.creator_guid.to_string()],
        vec![
            "giftCreatorGuid".to_string(),
            row.gift_creator_guid.to_string(),
        ],
        vec!["count".to_string(), row.stack_count.clone()],
        vec!["duration".to_string(), row.duration.clone()],
        vec!["charges".to_string(), row.charges.clone()],
        vec!["flags".to_string(), row.flags.clone()],
        vec!["enchantments".to_string(), row.enchantments.clone()],
        vec![
            "randomPropertyId".to_string(),
            row.random_property_id.to_string(),
        ],
        vec!["durability".to_string(), row.durability.clone()],
        vec![
            row.trailer.column().to_string(),
            row.trailer.value().to_string(),
        ],
    ];
    emit_table(&["COLUMN", "VALUE"], &rows);
}

fn emit_layout_table(variant: SchemaVariant) {
    let layout = variant.layout();
    println!(
        "schema: {} (minimum tokens: {})",
        variant.label(),
        layout.required_tokens()
    );
    let scalar = |column: &str, offset: usize, conversion: &str| {
        vec![column.to_string(), offset.to_string(), conversion.to_string()]
    };
    let ranged = |column: &str, range: &Range<usize>, conversion: &str| {
        vec![
            column.to_string(),
            format!("{}..{}", range.start, range.end),
            conversion.to_string(),
        ]
    };
    let rows = vec![
        scalar("guid", layout.guid, "verbatim"),
        scalar("owner_guid", layout.owner_guid, "u32 widened to u64"),
        scalar("itemEntry", layout.item_entry, "verbatim"),
        scalar("creatorGuid", layout.creator_guid, "u32 widened to u64"),
        scalar(
            "giftCreatorGuid",
            layout.gift_creator_guid,
            "u32 widened to u64",
        ),
        scalar("count", layout.stack_count, "verbatim"),
        scalar("duration", layout.duration, "verbatim"),
        ranged("charges", &layout.charges, "u32 bits as i32, space-joined"),
        scalar("flags", layout.flags, "verbatim"),
        ranged("enchantments", &layout.enchantments, "verbatim, space-joined"),
        scalar(
            "randomPropertyId",
            layout.random_property_id,
            "u32 bits as i32",
        ),
        scalar("durability", layout.durability, "verbatim"),
        scalar(layout.trailer.column(), layout.trailer.offset(), "verbatim"),
    ];
    emit_table(&["COLUMN", "TOKENS", "CONVERSION"], &rows);
}

struct CheckFailure {
    row: u64,
    offset: Option<u64>,
    message: String,
}

fn emit_check_report(
    variant: SchemaVariant,
    source_label: &str,
    total: usize,
    failures: &[CheckFailure],
    as_json: bool,
    color_mode: ColorMode,
) {
    if as_json {
        let entries = failures
            .iter()
            .map(|failure| {
                let mut entry = Map::new();
                entry.insert("row".to_string(), json!(failure.row));
                if let Some(offset) = failure.offset {
                    entry.insert("offset".to_string(), json!(offset));
                }
                entry.insert("message".to_string(), json!(failure.message));
                Value::Object(entry)
            })
            .collect::<Vec<_>>();
        emit_json(
            json!({
                "check": {
                    "schema": variant.label(),
                    "source": source_label,
                    "rows": total,
                    "failed": failures.len(),
                    "failures": entries,
                }
            }),
            color_mode,
        );
        return;
    }

    if failures.is_empty() {
        println!(
            "checked {total} rows (schema: {}); all rows decode cleanly",
            variant.label()
        );
        return;
    }
    println!(
        "checked {total} rows (schema: {}); {} malformed",
        variant.label(),
        failures.len()
    );
    let rows = failures
        .iter()
        .map(|failure| {
            vec![
                failure.row.to_string(),
                failure
                    .offset
                    .map(|offset| offset.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                failure.message.clone(),
            ]
        })
        .collect::<Vec<_>>();
    emit_table(&["ROW", "OFFSET", "DETAIL"], &rows);
}

fn emit_version_output(color_mode: ColorMode) {
    if io::stdout().is_terminal() {
        println!("itemized {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(
            json!({
                "name": "itemized",
                "version": env!("CARGO_PKG_VERSION"),
            }),
            color_mode,
        );
    }
}

fn emit_table(headers: &[&str], rows: &[Vec<String>]) {
    println!("{}", render_table(headers, rows));
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let column_count = headers.len();
    let mut sanitized_rows = Vec::with_capacity(rows.len());
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        let mut sanitized = Vec::with_capacity(column_count);
        for (idx, width) in widths.iter_mut().enumerate() {
            let value = row.get(idx).map(String::as_str).unwrap_or("");
            let cleaned = sanitize_table_cell(value);
            *width = (*width).max(cleaned.chars().count());
            sanitized.push(cleaned);
        }
        sanitized_rows.push(sanitized);
    }

    let mut lines = Vec::with_capacity(sanitized_rows.len() + 1);
    lines.push(format_table_line(
        &headers
            .iter()
            .map(|header| header.to_string())
            .collect::<Vec<_>>(),
        &widths,
    ));
    for row in sanitized_rows {
        lines.push(format_table_line(&row, &widths));
    }
    lines.join("\n")
}

fn sanitize_table_cell(value: &str) -> String {
    value.replace('\n', "\\n").replace('\r', "\\r")
}

fn format_table_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let cell = cells.get(idx).map(String::as_str).unwrap_or("");
        line.push_str(cell);
        let cell_len = cell.chars().count();
        if *width > cell_len {
            line.push_str(&" ".repeat(*width - cell_len));
        }
    }
    line
}

fn emit_json(value: Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let use_color = color_mode.use_color(is_tty);
    let pretty = is_tty || use_color;
    let json = if pretty {
        if use_color {
            colorize_json(&value, true)
        } else {
            serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
        }
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn rfc3339_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Malformed => "malformed blob".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = std::error::Error::source(err);
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
    if let Some(row) = err.row() {
        inner.insert("row".to_string(), json!(row));
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

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(row) = err.row() {
        lines.push(format!(
            "{} {row}",
            colorize_label("row:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!(
            "{} {offset}",
            colorize_label("offset:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("I/O error. Check the path, filesystem, and permissions.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("This is a bug in itemized. Rerun with --verbose and report the output.")
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
        return "Try `itemized --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "itemized") else {
        return "Try `itemized --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        "Try `itemized --help`.".to_string()
    } else {
        format!("Try `itemized {} --help`.", parts.join(" "))
    }
}
