use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use agro_models::config::ModelConfig;

pub fn load_model_config<P: AsRef<Path>>(path: P) -> Result<ModelConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: ModelConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    config.crop.validate()?;
    config.yield_model.validate()?;
    Ok(config)
}

pub fn validate_tsv_or_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    match delimiter_for(&pb) {
        Some(_) => {}
        None => anyhow::bail!("File must have a .tsv or .csv extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

/// Field delimiter implied by the file extension.
pub fn delimiter_for(path: &Path) -> Option<u8> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") => Some(b'\t'),
        Some("csv") => Some(b','),
        _ => None,
    }
}

/// Read every record of a headed CSV/TSV file. Column names follow the
/// input record fields.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let display = path.display().to_string();
    validate_tsv_or_csv_file(&display)?;
    let delimiter = delimiter_for(path).unwrap_or(b',');

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open input: {}", display))?;

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record: T = row.with_context(|| format!("{}: bad record on line {}", display, idx + 2))?;
        records.push(record);
    }

    log::info!("Loaded {} records from {}", records.len(), display);
    if records.is_empty() {
        log::warn!("{} contains no records", display);
    }
    Ok(records)
}
