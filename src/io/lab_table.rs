use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;

use crate::io::{malformed_record, read_text, require_columns};
use crate::panel::ANTIGEN_PANEL;

pub const ID_COLUMN: &str = "ID";
pub const TRUE_DIAG_COLUMN: &str = "true_diag";

#[derive(Debug, Clone, PartialEq)]
pub struct LabRow {
    pub id: String,
    /// Indexed by panel position; `NaN` for empty cells.
    pub measurements: Vec<f64>,
    pub true_diag: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LabTable {
    pub rows: Vec<LabRow>,
    pub empty_measurements: usize,
}

/// Lab identifiers carry a zero-padded code number (`AB#012`); the reference
/// side does not.
pub fn normalize_lab_id(raw: &str) -> String {
    raw.replace("#0", "#")
}

pub fn read_lab_table(path: &Path) -> Result<LabTable> {
    let content = read_text(path)?;
    parse_lab_table(&content, &path.display().to_string())
}

pub fn parse_lab_table(content: &str, source: &str) -> Result<LabTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .with_context(|| format!("{}: failed to read header row", source))?
        .clone();

    let mut required = vec![ID_COLUMN];
    required.extend(ANTIGEN_PANEL);
    let columns = require_columns(&headers, &required, source)?;
    let id_col = columns[ID_COLUMN];
    let antigen_cols: Vec<usize> = ANTIGEN_PANEL.iter().map(|a| columns[*a]).collect();
    let true_diag_col = headers.iter().position(|h| h == TRUE_DIAG_COLUMN);

    let mut table = LabTable::default();
    for (idx, record) in rdr.records().enumerate() {
        let line_no = idx + 2;
        let record = record.map_err(|err| malformed_record(err, source, 0, line_no))?;

        let raw_id = record.get(id_col).unwrap_or("");
        if raw_id.is_empty() {
            bail!("{}:{} empty '{}' value", source, line_no, ID_COLUMN);
        }

        let mut measurements = Vec::with_capacity(antigen_cols.len());
        for (antigen, &col) in ANTIGEN_PANEL.iter().zip(&antigen_cols) {
            let raw = record.get(col).unwrap_or("").trim();
            if raw.is_empty() {
                table.empty_measurements += 1;
                measurements.push(f64::NAN);
                continue;
            }
            let value: f64 = raw.parse().with_context(|| {
                format!(
                    "{}:{} column '{}': invalid measurement '{}'",
                    source, line_no, antigen, raw
                )
            })?;
            measurements.push(value);
        }

        let true_diag = true_diag_col
            .and_then(|col| record.get(col))
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());

        table.rows.push(LabRow {
            id: normalize_lab_id(raw_id),
            measurements,
            true_diag,
        });
    }

    Ok(table)
}
