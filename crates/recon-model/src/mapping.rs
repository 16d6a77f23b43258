//! Column-level mapping candidates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary outcome of a scored candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Confident enough to apply without review.
    Auto,
    /// Needs a human decision.
    Review,
}

impl Decision {
    /// `Auto` when `score >= threshold`.
    pub fn at_least(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            Self::Auto
        } else {
            Self::Review
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Review => "review",
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-signal scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    pub name: f64,
    #[serde(rename = "type")]
    pub type_: f64,
    pub value_overlap: f64,
    pub embedding: f64,
}

/// Masked sample values shown next to a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchExplain {
    pub left_examples: Vec<String>,
    pub right_examples: Vec<String>,
}

/// A scored, provisional correspondence between a left and a right column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMapping {
    pub left_column: String,
    pub right_column: String,
    pub scores: SignalScores,
    /// Weighted composite of `scores`, possibly capped by the family gate.
    pub confidence: f64,
    pub decision: Decision,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub explain: MatchExplain,
    /// Set on the highest-confidence right column of each left column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_pick: Option<bool>,
}

impl CandidateMapping {
    pub fn is_best_pick(&self) -> bool {
        self.best_pick.unwrap_or(false)
    }
}

/// Summary counts over best-pick candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub auto_count: usize,
    pub review_count: usize,
    /// Share of auto decisions, 0 to 100.
    pub auto_pct: f64,
    pub estimated_minutes_saved: f64,
}

/// Output of one column-matching call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Threshold that produced the decisions.
    pub threshold: f64,
    pub candidates: Vec<CandidateMapping>,
    pub stats: MatchStats,
}

impl MatchResult {
    /// Best-pick candidates in output order.
    pub fn best_picks(&self) -> impl Iterator<Item = &CandidateMapping> {
        self.candidates.iter().filter(|c| c.is_best_pick())
    }

    /// Candidates for one left column, highest confidence first.
    pub fn for_left<'a>(&'a self, left_column: &'a str) -> impl Iterator<Item = &'a CandidateMapping> {
        self.candidates
            .iter()
            .filter(move |c| c.left_column == left_column)
    }
}
