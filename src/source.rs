//! Purpose: Load packed blob lines for convert and check runs.
//! Exports: `BlobLine`, `LoadedBlobs`, `load_blobs`, `read_blob_arg`.
//! Role: Input edge of the CLI; maps file/stdin choices to ordered rows.
//! Invariants: Row numbers are one-based input positions, blank lines included.
//! Invariants: Blank lines are dropped from the row set, never decoded.

use std::fs;
use std::io::{self, IsTerminal, Read};

use itemized::core::error::{Error, ErrorKind};

#[derive(Debug)]
pub(crate) struct BlobLine {
    pub row: u64,
    pub text: String,
}

#[derive(Debug)]
pub(crate) struct LoadedBlobs {
    pub label: String,
    pub lines: Vec<BlobLine>,
}

/// Reads blob lines from a file path, or from stdin when the path is `-` or
/// absent. A terminal stdin with no path is a usage error, not a hang.
pub(crate) fn load_blobs(input: Option<&str>) -> Result<LoadedBlobs, Error> {
    match input {
        Some(path) if path != "-" => {
            let text = fs::read_to_string(path).map_err(|err| {
                let kind = if err.kind() == io::ErrorKind::NotFound {
                    ErrorKind::NotFound
                } else {
                    ErrorKind::Io
                };
                let base = Error::new(kind)
                    .with_message("failed to read blob input")
                    .with_path(path)
                    .with_source(err);
                if kind == ErrorKind::NotFound {
                    base.with_hint(
                        "Export the blobs first: mysql -N -B <db> -e 'SELECT `data` FROM `item_instance`' > blobs.txt",
                    )
                } else {
                    base
                }
            })?;
            Ok(collect_lines(&text, path.to_string()))
        }
        _ => {
            if io::stdin().is_terminal() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("no blob input provided")
                    .with_hint("Pass a file path, or pipe blob lines to stdin."));
            }
            let mut text = String::new();
            io::stdin().lock().read_to_string(&mut text).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            Ok(collect_lines(&text, "stdin".to_string()))
        }
    }
}

/// Resolves the single-blob argument for inspect: inline text, or stdin when
/// the argument is `-` or absent.
pub(crate) fn read_blob_arg(blob: Option<&str>) -> Result<String, Error> {
    match blob {
        Some(text) if text != "-" => Ok(text.to_string()),
        _ => {
            if io::stdin().is_terminal() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("no blob provided")
                    .with_hint("Pass the blob inline, or pipe one line to stdin."));
            }
            let mut text = String::new();
            io::stdin().lock().read_to_string(&mut text).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            Ok(text)
        }
    }
}

fn collect_lines(text: &str, label: String) -> LoadedBlobs {
    let mut lines = Vec::new();
    let mut row = 0u64;
    for line in text.lines() {
        row += 1;
        if line.trim().is_empty() {
            continue;
        }
        lines.push(BlobLine {
            row,
            text: line.to_string(),
        });
    }
    LoadedBlobs { label, lines }
}
