//! Table-level pairing output.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::Decision;

/// Coarse business entity inferred for a table.
///
/// Declaration order is the processing order of entity blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Customers,
    Accounts,
    Loans,
    Transactions,
    Addresses,
    Identifications,
    Unknown,
}

impl EntityType {
    pub const ALL: [EntityType; 7] = [
        EntityType::Customers,
        EntityType::Accounts,
        EntityType::Loans,
        EntityType::Transactions,
        EntityType::Addresses,
        EntityType::Identifications,
        EntityType::Unknown,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Accounts => "accounts",
            Self::Loans => "loans",
            Self::Transactions => "transactions",
            Self::Addresses => "addresses",
            Self::Identifications => "identifications",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How aggressively leftovers are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMode {
    /// Never pair tables whose entity is unknown.
    Strict,
    /// Pair within entity blocks, including the unknown block.
    #[default]
    Balanced,
    /// Additionally pair cross-entity leftovers.
    Lenient,
}

impl PairingMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Lenient => "lenient",
        }
    }
}

impl fmt::Display for PairingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a mode label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pairing mode '{0}' (expected strict, balanced or lenient)")]
pub struct UnknownMode(pub String);

impl FromStr for PairingMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "balanced" => Ok(Self::Balanced),
            "lenient" => Ok(Self::Lenient),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// An accepted table pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSuggestion {
    pub left_table: String,
    pub right_table: String,
    pub score: f64,
    pub decision: Decision,
    pub entity_type: EntityType,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Full score matrix, rows follow `left`, columns follow `right`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairingMatrix {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub scores: Vec<Vec<f64>>,
}

impl PairingMatrix {
    pub fn get(&self, left: &str, right: &str) -> Option<f64> {
        let i = self.left.iter().position(|n| n == left)?;
        let j = self.right.iter().position(|n| n == right)?;
        self.scores.get(i).and_then(|row| row.get(j)).copied()
    }
}

/// Effective settings used by a pairing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedPairingSettings {
    /// Normalized per-signal weights.
    pub weights: BTreeMap<String, f64>,
    pub min_score: f64,
    pub auto_threshold: f64,
    pub mode: PairingMode,
}

/// Output of one table-pairing call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairingOutcome {
    pub settings: AppliedPairingSettings,
    pub pairs: Vec<PairSuggestion>,
    pub unpaired_left: Vec<String>,
    pub unpaired_right: Vec<String>,
    pub matrix: PairingMatrix,
}

impl PairingOutcome {
    pub fn pair_for_left(&self, left_table: &str) -> Option<&PairSuggestion> {
        self.pairs.iter().find(|p| p.left_table == left_table)
    }

    pub fn contains(&self, left_table: &str, right_table: &str) -> bool {
        self.pairs
            .iter()
            .any(|p| p.left_table == left_table && p.right_table == right_table)
    }
}
