//! Engine settings.
//!
//! Settings are an explicit value handed to every call, so concurrent callers
//! may use different weights or thresholds. Defaults follow the documented
//! values; a JSON file and environment overrides can adjust them.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use recon_model::PairingMode;

use crate::capability::AssignmentSolver;
use crate::error::{ConfigError, Result};

/// Column signal weights. Renormalized to sum to 1 before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub name: f64,
    #[serde(rename = "type")]
    pub type_: f64,
    pub overlap: f64,
    pub embedding: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            name: 0.45,
            type_: 0.20,
            overlap: 0.20,
            embedding: 0.15,
        }
    }
}

impl SignalWeights {
    pub fn new(name: f64, type_: f64, overlap: f64, embedding: f64) -> Self {
        Self {
            name,
            type_,
            overlap,
            embedding,
        }
    }

    /// Weights scaled to sum to 1.
    ///
    /// Negative or non-finite weights count as zero. An all-zero vector falls
    /// back to the defaults.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let raw = [self.name, self.type_, self.overlap, self.embedding].map(non_negative);
        match normalize_slice(raw) {
            Some([name, type_, overlap, embedding]) => Self {
                name,
                type_,
                overlap,
                embedding,
            },
            None => Self::default().normalized(),
        }
    }
}

/// Table-pairing signal weights. Renormalized to sum to 1 before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableWeights {
    pub name: f64,
    pub tags: f64,
    pub dtype: f64,
    pub rows: f64,
    pub keys: f64,
    pub entity: f64,
}

impl Default for TableWeights {
    fn default() -> Self {
        Self {
            name: 0.35,
            tags: 0.20,
            dtype: 0.15,
            rows: 0.10,
            keys: 0.10,
            entity: 0.10,
        }
    }
}

impl TableWeights {
    #[must_use]
    pub fn normalized(&self) -> Self {
        let raw = [
            self.name,
            self.tags,
            self.dtype,
            self.rows,
            self.keys,
            self.entity,
        ]
        .map(non_negative);
        match normalize_slice(raw) {
            Some([name, tags, dtype, rows, keys, entity]) => Self {
                name,
                tags,
                dtype,
                rows,
                keys,
                entity,
            },
            None => Self::default().normalized(),
        }
    }

    /// Weights keyed by signal name, for reporting.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        [
            ("name", self.name),
            ("tags", self.tags),
            ("dtype", self.dtype),
            ("rows", self.rows),
            ("keys", self.keys),
            ("entity", self.entity),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Cross-family confidence cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyGateSettings {
    pub enabled: bool,
    /// Confidence ceiling for incompatible column families.
    pub cap: f64,
}

impl Default for FamilyGateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cap: 0.49,
        }
    }
}

/// Settings for [`crate::TablePairer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePairSettings {
    pub weights: TableWeights,
    /// Pairs scoring below this are never accepted.
    pub min_score: f64,
    /// Pairs at or above this are decided `auto`.
    pub auto_threshold: f64,
    /// Entity signal value when both tables infer the same known entity.
    pub entity_match: f64,
    pub mode: PairingMode,
    pub solver: AssignmentSolver,
}

impl Default for TablePairSettings {
    fn default() -> Self {
        Self {
            weights: TableWeights::default(),
            min_score: 0.45,
            auto_threshold: 0.70,
            entity_match: 0.20,
            mode: PairingMode::Balanced,
            solver: AssignmentSolver::Hungarian,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub weights: SignalWeights,
    /// Default column decision threshold; calls may override it.
    pub auto_threshold: f64,
    /// Default number of values sampled per column for overlap.
    pub sample_n: usize,
    pub family_gate: FamilyGateSettings,
    pub embeddings_enabled: bool,
    /// Mask example values before they leave the engine.
    pub regulated_mode: bool,
    /// Manual effort saved per auto mapping, used by match statistics.
    pub minutes_per_auto_mapping: f64,
    pub table: TablePairSettings,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            auto_threshold: 0.70,
            sample_n: 2000,
            family_gate: FamilyGateSettings::default(),
            embeddings_enabled: false,
            regulated_mode: true,
            minutes_per_auto_mapping: 12.0,
            table: TablePairSettings::default(),
        }
    }
}

impl MatchSettings {
    /// Loads settings from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| -> Result<Option<f64>> {
            lookup(key).map(|raw| parse_number(key, &raw)).transpose()
        };
        let flag = |key: &str| -> Result<Option<bool>> {
            lookup(key).map(|raw| parse_bool(key, &raw)).transpose()
        };

        if let Some(v) = number("MATCH_WEIGHT_NAME")? {
            self.weights.name = v;
        }
        if let Some(v) = number("MATCH_WEIGHT_TYPE")? {
            self.weights.type_ = v;
        }
        if let Some(v) = number("MATCH_WEIGHT_OVERLAP")? {
            self.weights.overlap = v;
        }
        if let Some(v) = number("MATCH_WEIGHT_EMBED")? {
            self.weights.embedding = v;
        }
        if let Some(v) = number("MATCH_AUTO_THRESHOLD")? {
            self.auto_threshold = v;
        }
        if let Some(v) = number("SAMPLE_N")? {
            self.sample_n = v.max(1.0) as usize;
        }
        if let Some(v) = flag("EMBEDDINGS_ENABLED")? {
            self.embeddings_enabled = v;
        }
        if let Some(v) = flag("REGULATED_MODE")? {
            self.regulated_mode = v;
        }
        if let Some(v) = flag("FAMILY_GATE_ENABLED")? {
            self.family_gate.enabled = v;
        }
        if let Some(v) = number("FAMILY_GATE_CAP")? {
            self.family_gate.cap = v;
        }
        if let Some(v) = number("TABLEPAIR_W_NAME")? {
            self.table.weights.name = v;
        }
        if let Some(v) = number("TABLEPAIR_W_TAGS")? {
            self.table.weights.tags = v;
        }
        if let Some(v) = number("TABLEPAIR_W_DTYPE")? {
            self.table.weights.dtype = v;
        }
        if let Some(v) = number("TABLEPAIR_W_ROWS")? {
            self.table.weights.rows = v;
        }
        if let Some(v) = number("TABLEPAIR_W_KEYS")? {
            self.table.weights.keys = v;
        }
        if let Some(v) = number("TABLEPAIR_W_ENTITY")? {
            self.table.weights.entity = v;
        }
        if let Some(v) = number("TABLEPAIR_MIN_SCORE")? {
            self.table.min_score = v;
        }
        if let Some(v) = number("TABLEPAIR_AUTO_THRESHOLD_PCT")? {
            // Accept both 0.75 and 75.
            self.table.auto_threshold = if v > 1.0 { v / 100.0 } else { v };
        }
        if let Some(v) = number("TABLEPAIR_ENTITY_MATCH")? {
            self.table.entity_match = v;
        }
        if let Some(raw) = lookup("TABLEPAIR_MODE") {
            self.table.mode = raw.parse().map_err(|source| ConfigError::InvalidMode {
                key: "TABLEPAIR_MODE".to_string(),
                source,
            })?;
        }
        if let Some(raw) = lookup("TABLEPAIR_SOLVER") {
            self.table.solver =
                AssignmentSolver::from_label(&raw).ok_or_else(|| ConfigError::InvalidSolver {
                    key: "TABLEPAIR_SOLVER".to_string(),
                    value: raw.clone(),
                })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks thresholds and caps lie in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        unit_range("auto_threshold", self.auto_threshold)?;
        unit_range("family_gate.cap", self.family_gate.cap)?;
        unit_range("table.min_score", self.table.min_score)?;
        unit_range("table.auto_threshold", self.table.auto_threshold)?;
        unit_range("table.entity_match", self.table.entity_match)?;
        Ok(())
    }

    #[must_use]
    pub fn with_weights(mut self, weights: SignalWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub fn with_auto_threshold(mut self, threshold: f64) -> Self {
        self.auto_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_family_gate(mut self, enabled: bool, cap: f64) -> Self {
        self.family_gate = FamilyGateSettings { enabled, cap };
        self
    }

    #[must_use]
    pub fn with_embeddings(mut self, enabled: bool) -> Self {
        self.embeddings_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_regulated_mode(mut self, enabled: bool) -> Self {
        self.regulated_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_pairing_mode(mut self, mode: PairingMode) -> Self {
        self.table.mode = mode;
        self
    }

    #[must_use]
    pub fn with_solver(mut self, solver: AssignmentSolver) -> Self {
        self.table.solver = solver;
        self
    }
}

fn non_negative(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 { w } else { 0.0 }
}

fn normalize_slice<const N: usize>(raw: [f64; N]) -> Option<[f64; N]> {
    let total: f64 = raw.iter().sum();
    if !total.is_finite() || total <= f64::EPSILON {
        return None;
    }
    Some(raw.map(|w| w / total))
}

fn unit_range(key: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}

fn parse_number(key: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
