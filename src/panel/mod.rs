mod loader;

use std::path::Path;

use anyhow::{Result, bail};

pub use loader::{load_builtin_v1, load_threshold_tsv, merge_defs, parse_assignment};

/// Antigens measured by the lab assay, in display order.
pub const ANTIGEN_PANEL: [&str; PANEL_SIZE] = [
    "P100", "P41", "OspC", "DbpA", "BmpA", "DbpB", "P45", "P58", "P66", "VlsE", "ErpL", "OspD",
];

pub const PANEL_SIZE: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdDef {
    pub antigen: String,
    pub threshold: f64,
}

#[derive(Debug, Clone)]
pub struct PanelThresholds {
    pub version: String,
    pub defs: Vec<ThresholdDef>,
}

impl PanelThresholds {
    pub fn get(&self, antigen: &str) -> Option<f64> {
        self.defs
            .iter()
            .find(|d| d.antigen == antigen)
            .map(|d| d.threshold)
    }

    pub fn set(&mut self, antigen: &str, threshold: f64) -> Result<()> {
        if antigen_index(antigen).is_none() {
            bail!("unknown antigen '{}'", antigen);
        }
        match self.defs.iter_mut().find(|d| d.antigen == antigen) {
            Some(def) => def.threshold = threshold,
            None => self.defs.push(ThresholdDef {
                antigen: antigen.to_string(),
                threshold,
            }),
        }
        Ok(())
    }
}

pub fn antigen_index(name: &str) -> Option<usize> {
    ANTIGEN_PANEL.iter().position(|a| *a == name)
}

pub fn load_builtin() -> Result<PanelThresholds> {
    let defs = load_builtin_v1()?;
    Ok(PanelThresholds {
        version: "v1".to_string(),
        defs,
    })
}

pub fn load_user(path: &Path) -> Result<Vec<ThresholdDef>> {
    load_threshold_tsv(path)
}

/// Validates antigen names against the panel and returns them deduplicated in
/// panel order.
pub fn resolve_antigens<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>> {
    let mut selected = [false; PANEL_SIZE];
    for name in names {
        let name = name.as_ref().trim();
        match antigen_index(name) {
            Some(idx) => selected[idx] = true,
            None => bail!(
                "unknown antigen '{}' (panel: {})",
                name,
                ANTIGEN_PANEL.join(", ")
            ),
        }
    }
    Ok(ANTIGEN_PANEL
        .iter()
        .zip(selected)
        .filter(|(_, keep)| *keep)
        .map(|(name, _)| name.to_string())
        .collect())
}

pub fn full_panel() -> Vec<String> {
    ANTIGEN_PANEL.iter().map(|a| a.to_string()).collect()
}
