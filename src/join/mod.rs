use std::collections::HashMap;

use anyhow::{Result, bail};
use tracing::info;

use crate::classify::{ExternalTests, ReferenceCategory};
use crate::io::lab_table::LabTable;
use crate::io::reference_table::ReferenceTable;

/// One specimen with both lab measurements and a reference diagnosis.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedSample {
    pub id: String,
    pub measurements: Vec<f64>,
    pub true_diag: Option<String>,
    pub sample_group: String,
    pub category: ReferenceCategory,
    pub tests: ExternalTests,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub lab_rows: usize,
    pub reference_rows: usize,
    pub joined: usize,
    pub lab_unmatched: usize,
    pub reference_unmatched: usize,
}

/// Indexes keys by position, failing on the first duplicate.
pub fn unique_key_index<'a, I>(keys: I, table: &str) -> Result<HashMap<&'a str, usize>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index = HashMap::new();
    for (i, key) in keys.into_iter().enumerate() {
        if let Some(first) = index.insert(key, i) {
            bail!(
                "{} table: duplicate sample key '{}' at row {} (first seen at row {})",
                table,
                key,
                i + 1,
                first + 1
            );
        }
    }
    Ok(index)
}

/// Inner join on the normalized sample key, in lab-table order. Samples lacking
/// either side cannot be scored and are dropped.
pub fn inner_join(
    lab: &LabTable,
    reference: &ReferenceTable,
) -> Result<(Vec<JoinedSample>, JoinStats)> {
    unique_key_index(lab.rows.iter().map(|r| r.id.as_str()), "lab")?;
    let reference_index =
        unique_key_index(reference.rows.iter().map(|r| r.id.as_str()), "reference")?;

    let mut joined = Vec::with_capacity(lab.rows.len().min(reference.rows.len()));
    for lab_row in &lab.rows {
        let Some(&ref_pos) = reference_index.get(lab_row.id.as_str()) else {
            continue;
        };
        let ref_row = &reference.rows[ref_pos];
        joined.push(JoinedSample {
            id: lab_row.id.clone(),
            measurements: lab_row.measurements.clone(),
            true_diag: lab_row.true_diag.clone(),
            sample_group: ref_row.sample_group.clone(),
            category: ref_row.category.clone(),
            tests: ref_row.tests.clone(),
        });
    }

    let stats = JoinStats {
        lab_rows: lab.rows.len(),
        reference_rows: reference.rows.len(),
        joined: joined.len(),
        lab_unmatched: lab.rows.len() - joined.len(),
        reference_unmatched: reference.rows.len() - joined.len(),
    };
    info!(
        joined = stats.joined,
        lab_unmatched = stats.lab_unmatched,
        reference_unmatched = stats.reference_unmatched,
        "join_complete"
    );

    Ok((joined, stats))
}
