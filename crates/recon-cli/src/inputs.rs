//! Reading command inputs: tables, schemas and settings.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use recon_match::MatchSettings;
use recon_model::{SourceTable, TableProfile};
use serde::de::DeserializeOwned;
use tracing::debug;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {what} in {}", path.display()))
}

/// Loads one table with sampled column values.
pub fn load_source_table(path: &Path) -> Result<SourceTable> {
    let table: SourceTable = read_json(path, "source table")?;
    debug!(
        table = %table.name,
        columns = table.columns.len(),
        "loaded source table"
    );
    Ok(table)
}

/// Loads a schema: a JSON array of table profiles.
pub fn load_schema(path: &Path) -> Result<Vec<TableProfile>> {
    let tables: Vec<TableProfile> = read_json(path, "schema")?;
    let mut seen = std::collections::BTreeSet::new();
    for table in &tables {
        if !seen.insert(table.table.as_str()) {
            bail!(
                "duplicate table name {:?} in {}",
                table.table,
                path.display()
            );
        }
    }
    debug!(tables = tables.len(), path = %path.display(), "loaded schema");
    Ok(tables)
}

/// Settings from `config` (or defaults) with environment overrides applied.
pub fn load_settings(config: Option<&Path>) -> Result<MatchSettings> {
    load_settings_with(config, |key| std::env::var(key).ok())
}

/// Same as [`load_settings`] with an explicit variable lookup.
pub fn load_settings_with<F>(config: Option<&Path>, lookup: F) -> Result<MatchSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match config {
        Some(path) => MatchSettings::from_json_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => MatchSettings::default(),
    };
    base.with_env_overrides(lookup)
        .context("invalid settings in environment")
}
