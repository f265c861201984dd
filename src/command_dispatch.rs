//! Purpose: Hold top-level CLI command dispatch for `itemized`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Command behavior, output envelopes, and exit code semantics stay unchanged.
//! Invariants: Helpers in `main.rs` remain the source of command business logic.

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "itemized", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output(color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Convert {
            input,
            schema,
            output,
            batch_size,
        } => {
            if batch_size == 0 {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("--batch-size must be at least 1")
                    .with_hint("Use a positive row count, e.g. --batch-size 25000."));
            }
            let variant = SchemaVariant::from(schema);
            emit_backup_banner(color_mode);
            let loaded = load_blobs(input.as_deref())?;
            info!(rows = loaded.lines.len(), source = %loaded.label, "loaded blob rows");
            if loaded.lines.is_empty() {
                emit_empty_input_notice(variant, &loaded.label, color_mode);
                return Ok(RunOutcome::ok());
            }

            let check_target = input.as_deref().unwrap_or("-").to_string();
            let started = Instant::now();
            let mut tuples = Vec::with_capacity(loaded.lines.len());
            for line in &loaded.lines {
                let row = decode_blob(variant, &line.text).map_err(|err| {
                    err.with_row(line.row).with_hint(format!(
                        "Run `itemized check --schema {} {check_target}` to list every malformed row.",
                        variant.label()
                    ))
                })?;
                tuples.push(row.to_sql_tuple());
            }
            let generated_at = rfc3339_now().unwrap_or_else(|| "unknown".to_string());
            let sql = script::render_script(variant, &tuples, batch_size, &generated_at);
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(rows = tuples.len(), elapsed_ms, "decoded rows and rendered script");

            let batches = tuples.len().div_ceil(batch_size);
            if output == "-" {
                io::stdout().write_all(sql.as_bytes()).map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write script to stdout")
                        .with_source(err)
                })?;
            } else {
                std::fs::write(&output, &sql).map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write script file")
                        .with_path(&output)
                        .with_source(err)
                })?;
                info!(path = %output, "wrote conversion script");
                emit_convert_receipt(
                    &ConvertReceipt {
                        variant,
                        rows: tuples.len(),
                        batches,
                        batch_size,
                        output: &output,
                        elapsed_ms,
                    },
                    color_mode,
                );
            }
            Ok(RunOutcome::ok())
        }
        Command::Check {
            input,
            schema,
            json,
        } => {
            let variant = SchemaVariant::from(schema);
            let loaded = load_blobs(input.as_deref())?;
            info!(rows = loaded.lines.len(), source = %loaded.label, "loaded blob rows");
            let mut failures = Vec::new();
            for line in &loaded.lines {
                if let Err(err) = decode_blob(variant, &line.text) {
                    failures.push(CheckFailure {
                        row: line.row,
                        offset: err.offset(),
                        message: error_message(&err),
                    });
                }
            }
            emit_check_report(
                variant,
                &loaded.label,
                loaded.lines.len(),
                &failures,
                json,
                color_mode,
            );
            if failures.is_empty() {
                Ok(RunOutcome::ok())
            } else {
                Ok(RunOutcome::with_code(to_exit_code(ErrorKind::Malformed)))
            }
        }
        Command::Inspect { blob, schema, json } => {
            let variant = SchemaVariant::from(schema);
            let text = read_blob_arg(blob.as_deref())?;
            let row = decode_blob(variant, &text)?;
            if json {
                emit_json(row_json(variant, &row), color_mode);
            } else {
                emit_inspect_human(variant, &row);
            }
            Ok(RunOutcome::ok())
        }
        Command::Layout { schema, json } => {
            let variant = SchemaVariant::from(schema);
            if json {
                emit_json(layout_json(variant), color_mode);
            } else {
                emit_layout_table(variant);
            }
            Ok(RunOutcome::ok())
        }
    }
}
