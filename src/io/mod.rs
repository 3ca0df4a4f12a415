use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use flate2::read::GzDecoder;

pub mod json_writer;
pub mod lab_table;
pub mod reference_table;
pub mod summary;
pub mod tsv_writer;

pub(crate) fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let decoder = GzDecoder::new(file);
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(file))
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    let mut reader = open_maybe_gz(path)?;
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content)
}

/// Maps each required column to its header position. Names must match exactly,
/// surrounding whitespace included.
pub(crate) fn require_columns(
    headers: &csv::StringRecord,
    required: &[&str],
    source: &str,
) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(required.len());
    let mut missing = Vec::new();
    for &name in required {
        match headers.iter().position(|h| h == name) {
            Some(pos) => {
                index.insert(name.to_string(), pos);
            }
            None => missing.push(format!("'{}'", name)),
        }
    }
    if !missing.is_empty() {
        bail!("{}: missing required column(s) {}", source, missing.join(", "));
    }
    Ok(index)
}

/// Rewrites a csv record error so its line counts from the top of the file.
/// `skipped` is the number of lines dropped before the csv reader saw the text.
pub(crate) fn malformed_record(
    err: csv::Error,
    source: &str,
    skipped: usize,
    fallback_line: usize,
) -> anyhow::Error {
    let line = err
        .position()
        .map(|p| p.line() as usize + skipped)
        .unwrap_or(fallback_line);
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => anyhow!(
            "{}:{} malformed CSV record: expected {} fields, found {}",
            source,
            line,
            expected_len,
            len
        ),
        csv::ErrorKind::Utf8 { err, .. } => {
            anyhow!("{}:{} malformed CSV record: {}", source, line, err)
        }
        _ => anyhow!("{}:{} malformed CSV record", source, line),
    }
}
