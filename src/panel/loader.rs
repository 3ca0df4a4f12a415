use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::panel::{ThresholdDef, antigen_index};

pub fn load_builtin_v1() -> Result<Vec<ThresholdDef>> {
    let content = include_str!("../../assets/panels/lyme_v1.tsv");
    parse_threshold_tsv(content, "built-in v1")
}

pub fn load_threshold_tsv(path: &Path) -> Result<Vec<ThresholdDef>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read threshold TSV {}", path.display()))?;
    parse_threshold_tsv(&content, &path.display().to_string())
}

/// User thresholds replace built-in ones by antigen name; built-in order is kept.
pub fn merge_defs(mut builtin: Vec<ThresholdDef>, user: Vec<ThresholdDef>) -> Vec<ThresholdDef> {
    if user.is_empty() {
        return builtin;
    }
    let mut user_map: HashMap<String, ThresholdDef> = HashMap::new();
    for def in user {
        user_map.insert(def.antigen.clone(), def);
    }

    let mut merged = Vec::with_capacity(builtin.len() + user_map.len());
    for def in builtin.drain(..) {
        if let Some(user_def) = user_map.remove(&def.antigen) {
            merged.push(user_def);
        } else {
            merged.push(def);
        }
    }
    let mut rest: Vec<ThresholdDef> = user_map.into_values().collect();
    rest.sort_by_key(|d| antigen_index(&d.antigen));
    merged.extend(rest);
    merged
}

/// Parses a `NAME=VALUE` threshold override.
pub fn parse_assignment(raw: &str) -> Result<ThresholdDef> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("threshold override '{}' must be NAME=VALUE", raw))?;
    let antigen = name.trim();
    if antigen_index(antigen).is_none() {
        bail!("threshold override '{}': unknown antigen '{}'", raw, antigen);
    }
    let threshold = parse_threshold(value.trim())
        .with_context(|| format!("threshold override '{}'", raw))?;
    Ok(ThresholdDef {
        antigen: antigen.to_string(),
        threshold,
    })
}

fn parse_threshold(value: &str) -> Result<f64> {
    let threshold: f64 = value
        .parse()
        .with_context(|| format!("invalid threshold value '{}'", value))?;
    if !threshold.is_finite() {
        bail!("threshold must be finite, got '{}'", value);
    }
    Ok(threshold)
}

fn parse_threshold_tsv(content: &str, source: &str) -> Result<Vec<ThresholdDef>> {
    let mut defs: Vec<ThresholdDef> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').collect();
        if parts.len() != 2 {
            bail!("{}:{} malformed TSV (expected 2 columns)", source, line_no);
        }
        let antigen = parts[0].trim();
        if antigen_index(antigen).is_none() {
            bail!("{}:{} unknown antigen '{}'", source, line_no, antigen);
        }
        let threshold = parse_threshold(parts[1].trim())
            .with_context(|| format!("{}:{}", source, line_no))?;
        if defs.iter().any(|d| d.antigen == antigen) {
            bail!("{}:{} duplicate antigen '{}'", source, line_no, antigen);
        }
        defs.push(ThresholdDef {
            antigen: antigen.to_string(),
            threshold,
        });
    }

    Ok(defs)
}
