use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;

use crate::classify::{Call, ExternalTests, ReferenceCategory};
use crate::io::{malformed_record, read_text, require_columns};

pub const CODE_PREFIX_COLUMN: &str = "Code Prefix";
pub const CODE_NUMBER_COLUMN: &str = "Code Number";
// The trailing space is part of the CDC header.
pub const TWO_TIER_COLUMN: &str = "2-tier interpretation ";
pub const IGG_WB_COLUMN: &str = "IgG WB interpretation";
pub const EIA_COLUMN: &str = "EIA interpretation";
pub const IGM_WB_COLUMN: &str = "IgM WB Interpretation";
pub const SAMPLE_GROUP_COLUMN: &str = "Sample Group";
pub const SAMPLE_CATEGORY_COLUMN: &str = "Sample Category";

/// Banner lines above the header row in the CDC export.
pub const DEFAULT_SKIP_ROWS: usize = 2;

const REQUIRED_COLUMNS: [&str; 8] = [
    CODE_PREFIX_COLUMN,
    CODE_NUMBER_COLUMN,
    TWO_TIER_COLUMN,
    IGG_WB_COLUMN,
    EIA_COLUMN,
    IGM_WB_COLUMN,
    SAMPLE_GROUP_COLUMN,
    SAMPLE_CATEGORY_COLUMN,
];

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    pub id: String,
    pub sample_group: String,
    pub category: ReferenceCategory,
    pub tests: ExternalTests,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    pub rows: Vec<ReferenceRow>,
}

/// Builds the join key `<prefix>#<number>`. Integral numbers written as floats
/// (`12.0`) are rendered without the fraction.
pub fn reference_key(prefix: &str, number: &str) -> Result<String> {
    let number = number.trim();
    if let Ok(n) = number.parse::<i64>() {
        return Ok(format!("{}#{}", prefix, n));
    }
    let value: f64 = number
        .parse()
        .with_context(|| format!("code number '{}' is not numeric", number))?;
    if !value.is_finite() {
        bail!("code number '{}' is not finite", number);
    }
    if value.fract() == 0.0 {
        Ok(format!("{}#{}", prefix, value as i64))
    } else {
        Ok(format!("{}#{}", prefix, value))
    }
}

pub fn read_reference_table(path: &Path, skip_rows: usize) -> Result<ReferenceTable> {
    let content = read_text(path)?;
    parse_reference_table(&content, skip_rows, &path.display().to_string())
}

pub fn parse_reference_table(
    content: &str,
    skip_rows: usize,
    source: &str,
) -> Result<ReferenceTable> {
    let body = skip_lines(content, skip_rows).with_context(|| {
        format!(
            "{}: no header row after skipping {} line(s)",
            source, skip_rows
        )
    })?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());
    let headers = rdr
        .headers()
        .with_context(|| format!("{}: failed to read header row", source))?
        .clone();
    let columns = require_columns(&headers, &REQUIRED_COLUMNS, source)?;
    let col = |name: &str| columns[name];

    let mut table = ReferenceTable::default();
    for (idx, record) in rdr.records().enumerate() {
        let fallback_line = skip_rows + idx + 2;
        let record =
            record.map_err(|err| malformed_record(err, source, skip_rows, fallback_line))?;
        let line_no = record
            .position()
            .map(|p| p.line() as usize + skip_rows)
            .unwrap_or(fallback_line);
        let field = |name: &str| record.get(col(name)).unwrap_or("");

        let id = reference_key(field(CODE_PREFIX_COLUMN), field(CODE_NUMBER_COLUMN))
            .with_context(|| format!("{}:{} invalid sample identifier", source, line_no))?;

        table.rows.push(ReferenceRow {
            id,
            sample_group: field(SAMPLE_GROUP_COLUMN).to_string(),
            category: ReferenceCategory::parse(field(SAMPLE_CATEGORY_COLUMN)),
            tests: ExternalTests {
                two_tier: Call::parse(field(TWO_TIER_COLUMN)),
                eia: Call::parse(field(EIA_COLUMN)),
                igm_wb: Call::parse(field(IGM_WB_COLUMN)),
                igg_wb: Call::parse(field(IGG_WB_COLUMN)),
            },
        });
    }

    Ok(table)
}

fn skip_lines(content: &str, n: usize) -> Option<&str> {
    let mut rest = content;
    for _ in 0..n {
        let pos = rest.find('\n')?;
        rest = &rest[pos + 1..];
    }
    if rest.trim().is_empty() { None } else { Some(rest) }
}
