//! Column-level candidate scoring.
//!
//! Every left column is scored against every right column on four signals
//! (name, type, value overlap, header embedding). The weighted composite is
//! capped by the family gate and turned into an `auto`/`review` decision.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use recon_model::{
    CandidateMapping, DataType, Decision, MatchExplain, MatchResult, MatchStats, SignalScores,
    SourceColumn, SourceTable,
};

use crate::capability::Capabilities;
use crate::config::{MatchSettings, SignalWeights};
use crate::family::{ColumnFamily, column_family};
use crate::mask::{Masker, NoMasking, PiiMasker};
use crate::similarity::{
    embedding_similarity, examples, jaccard, sampled_values, sim_name, type_score,
};

const NAME_HIGH: f64 = 0.85;
const NAME_MODERATE: f64 = 0.65;
const NAME_LOW: f64 = 0.50;
const OVERLAP_HIGH: f64 = 0.50;
const OVERLAP_MODERATE: f64 = 0.25;
const OVERLAP_LOW: f64 = 0.15;
const EMBEDDING_MATCH: f64 = 0.60;

/// Decimal places kept on reported scores.
const SCORE_PRECISION: f64 = 1e6;

/// Scores left columns against right columns.
#[derive(Debug, Clone)]
pub struct ColumnMatcher {
    settings: MatchSettings,
    caps: Capabilities,
    masker: Arc<dyn Masker>,
}

impl ColumnMatcher {
    /// Creates a matcher. Example values are masked when
    /// `settings.regulated_mode` is on.
    pub fn new(settings: MatchSettings, caps: Capabilities) -> Self {
        let masker: Arc<dyn Masker> = if settings.regulated_mode {
            Arc::new(PiiMasker)
        } else {
            Arc::new(NoMasking)
        };
        Self {
            settings,
            caps,
            masker,
        }
    }

    /// Replaces the masking policy applied to explain values.
    #[must_use]
    pub fn with_masker(mut self, masker: Arc<dyn Masker>) -> Self {
        self.masker = masker;
        self
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Scores the full cross-product of `left` and `right` columns.
    ///
    /// `threshold` overrides the configured auto threshold for this call.
    /// Candidates are ordered by left column (case-insensitive), then by
    /// descending confidence; the first candidate of each left column is the
    /// best pick. An empty side yields an empty result.
    pub fn suggest(
        &self,
        left: &SourceTable,
        right: &SourceTable,
        sample_n: usize,
        threshold: Option<f64>,
    ) -> MatchResult {
        let threshold = resolve_threshold(threshold, self.settings.auto_threshold);
        if left.is_empty() || right.is_empty() {
            debug!(
                left = left.columns.len(),
                right = right.columns.len(),
                "empty side, no candidates"
            );
            return MatchResult {
                threshold,
                candidates: Vec::new(),
                stats: MatchStats::default(),
            };
        }

        let weights = self.settings.weights.normalized();
        let left_cols = self.prepare(left, sample_n);
        let right_cols = self.prepare(right, sample_n);

        let mut scored: Vec<(usize, usize, CandidateMapping)> =
            Vec::with_capacity(left_cols.len() * right_cols.len());
        for (i, l) in left_cols.iter().enumerate() {
            for (j, r) in right_cols.iter().enumerate() {
                scored.push((i, j, self.score_pair(l, r, &weights, threshold)));
            }
        }

        scored.sort_by(|a, b| candidate_order(&a.2, &b.2).then_with(|| (a.0, a.1).cmp(&(b.0, b.1))));
        let mut candidates: Vec<CandidateMapping> = scored.into_iter().map(|(_, _, c)| c).collect();
        mark_best_picks(&mut candidates);
        let stats = match_stats(&candidates, self.settings.minutes_per_auto_mapping);

        info!(
            left = left.name.as_str(),
            right = right.name.as_str(),
            candidates = candidates.len(),
            auto = stats.auto_count,
            review = stats.review_count,
            threshold,
            "column matching complete"
        );
        MatchResult {
            threshold,
            candidates,
            stats,
        }
    }

    fn prepare<'a>(&self, table: &'a SourceTable, sample_n: usize) -> Vec<PreparedColumn<'a>> {
        let headers: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let embeddings = if self.caps.embeddings.is_enabled() {
            self.caps.embeddings.embed_headers(&headers)
        } else {
            vec![Vec::new(); headers.len()]
        };
        table
            .columns
            .iter()
            .zip(embeddings)
            .map(|(column, embedding)| PreparedColumn {
                column,
                kind: column.kind(),
                family: column_family(column),
                values: sampled_values(column, sample_n),
                examples: self.masker.mask_all(&examples(column)),
                embedding,
            })
            .collect()
    }

    fn score_pair(
        &self,
        left: &PreparedColumn<'_>,
        right: &PreparedColumn<'_>,
        weights: &SignalWeights,
        threshold: f64,
    ) -> CandidateMapping {
        let name = sim_name(self.caps.names, &left.column.name, &right.column.name);
        let type_ = type_score(left.kind, right.kind);
        let overlap = jaccard(&left.values, &right.values);
        let embedding = if self.caps.embeddings.is_enabled() {
            embedding_similarity(&left.embedding, &right.embedding)
        } else {
            0.0
        };

        let mut confidence = (weights.name * name
            + weights.type_ * type_
            + weights.overlap * overlap
            + weights.embedding * embedding)
            .clamp(0.0, 1.0);

        let mut reasons = Vec::new();
        let mut warnings = Vec::new();
        if name >= NAME_HIGH {
            reasons.push("High name similarity".to_string());
        } else if name >= NAME_MODERATE {
            reasons.push("Moderate name similarity".to_string());
        } else if name < NAME_LOW {
            warnings.push("Low name similarity".to_string());
        }
        if type_ >= 1.0 {
            reasons.push("Types compatible".to_string());
        } else {
            warnings.push("Type mismatch".to_string());
        }
        if overlap >= OVERLAP_HIGH {
            reasons.push("High value overlap".to_string());
        } else if overlap >= OVERLAP_MODERATE {
            reasons.push("Moderate value overlap".to_string());
        } else if overlap < OVERLAP_LOW {
            warnings.push("Low value overlap".to_string());
        }
        if self.caps.embeddings.is_enabled() && embedding >= EMBEDDING_MATCH {
            reasons.push("Semantic match".to_string());
        }

        let gate = self.settings.family_gate;
        if gate.enabled && !left.family.is_compatible_with(right.family) {
            confidence = confidence.min(gate.cap);
            warnings.push("Cross-family pair".to_string());
        }

        let confidence = round_score(confidence);
        CandidateMapping {
            left_column: left.column.name.clone(),
            right_column: right.column.name.clone(),
            scores: SignalScores {
                name: round_score(name),
                type_: round_score(type_),
                value_overlap: round_score(overlap),
                embedding: round_score(embedding),
            },
            confidence,
            decision: Decision::at_least(confidence, threshold),
            reasons,
            warnings,
            explain: MatchExplain {
                left_examples: left.examples.clone(),
                right_examples: right.examples.clone(),
            },
            best_pick: None,
        }
    }
}

/// Per-column data computed once per call.
struct PreparedColumn<'a> {
    column: &'a SourceColumn,
    kind: DataType,
    family: ColumnFamily,
    values: BTreeSet<&'a str>,
    examples: Vec<String>,
    embedding: Vec<f32>,
}

/// Scores two tables' columns with default capabilities for `settings`.
pub fn suggest_mappings(
    left: &SourceTable,
    right: &SourceTable,
    sample_n: usize,
    threshold: Option<f64>,
    settings: &MatchSettings,
) -> MatchResult {
    ColumnMatcher::new(settings.clone(), Capabilities::detect(settings))
        .suggest(left, right, sample_n, threshold)
}

/// Flags the first candidate of each left column. Expects sorted input.
pub fn mark_best_picks(candidates: &mut [CandidateMapping]) {
    let mut seen = BTreeSet::new();
    for candidate in candidates.iter_mut() {
        let first = seen.insert(candidate.left_column.clone());
        candidate.best_pick = Some(first);
    }
}

/// Auto/review counts over best picks.
pub fn match_stats(candidates: &[CandidateMapping], minutes_per_auto: f64) -> MatchStats {
    let (auto_count, review_count) = candidates
        .iter()
        .filter(|c| c.is_best_pick())
        .fold((0, 0), |(auto, review), c| {
            if c.decision.is_auto() {
                (auto + 1, review)
            } else {
                (auto, review + 1)
            }
        });
    let total = auto_count + review_count;
    let auto_pct = if total == 0 {
        0.0
    } else {
        round_to(auto_count as f64 * 100.0 / total as f64, 100.0)
    };
    MatchStats {
        auto_count,
        review_count,
        auto_pct,
        estimated_minutes_saved: round_to(auto_count as f64 * minutes_per_auto / 60.0, 100.0),
    }
}

fn candidate_order(a: &CandidateMapping, b: &CandidateMapping) -> Ordering {
    a.left_column
        .to_lowercase()
        .cmp(&b.left_column.to_lowercase())
        .then_with(|| a.left_column.cmp(&b.left_column))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.right_column.to_lowercase().cmp(&b.right_column.to_lowercase()))
        .then_with(|| a.right_column.cmp(&b.right_column))
}

fn resolve_threshold(requested: Option<f64>, default: f64) -> f64 {
    match requested {
        Some(t) if t.is_finite() => t.clamp(0.0, 1.0),
        _ => default,
    }
}

fn round_score(score: f64) -> f64 {
    round_to(score.clamp(0.0, 1.0), SCORE_PRECISION)
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, columns: Vec<SourceColumn>) -> SourceTable {
        SourceTable::new(name, columns)
    }

    fn matcher() -> ColumnMatcher {
        let settings = MatchSettings::default().with_regulated_mode(false);
        let caps = Capabilities::detect(&settings);
        ColumnMatcher::new(settings, caps)
    }

    #[test]
    fn empty_side_yields_nothing() {
        let left = table("l", vec![SourceColumn::with_values("a", "int64", ["1"])]);
        let right = table("r", Vec::new());
        let result = matcher().suggest(&left, &right, 10, None);
        assert!(result.candidates.is_empty());
        assert_eq!(result.stats, MatchStats::default());
        assert_eq!(result.threshold, 0.70);
    }

    #[test]
    fn threshold_override_is_reported() {
        let left = table("l", vec![SourceColumn::with_values("a", "int64", ["1"])]);
        let right = table("r", vec![SourceColumn::with_values("a", "int64", ["1"])]);
        let result = matcher().suggest(&left, &right, 10, Some(0.6));
        assert_eq!(result.threshold, 0.6);
        assert_eq!(resolve_threshold(Some(f64::NAN), 0.7), 0.7);
        assert_eq!(resolve_threshold(Some(3.0), 0.7), 1.0);
    }

    #[test]
    fn configured_threshold_is_the_default() {
        let settings = MatchSettings::default().with_auto_threshold(0.55);
        let matcher = ColumnMatcher::new(settings.clone(), Capabilities::fallback());
        assert_eq!(matcher.settings(), &settings);
        let left = table("l", vec![SourceColumn::with_values("a", "int64", ["1"])]);
        let right = table("r", vec![SourceColumn::with_values("a", "int64", ["1"])]);
        let result = matcher.suggest(&left, &right, 10, None);
        assert_eq!(result.threshold, matcher.settings().auto_threshold);
        assert_eq!(result.threshold, 0.55);
    }

    #[test]
    fn best_pick_is_first_per_left_column() {
        let left = table(
            "l",
            vec![
                SourceColumn::with_values("email", "object", ["a@b.com", "c@d.com"]),
                SourceColumn::with_values("amount", "float64", ["1.5", "2.5"]),
            ],
        );
        let right = table(
            "r",
            vec![
                SourceColumn::with_values("amount", "float64", ["1.5", "9.0"]),
                SourceColumn::with_values("email", "object", ["a@b.com"]),
            ],
        );
        let result = matcher().suggest(&left, &right, 100, None);
        assert_eq!(result.candidates.len(), 4);
        let picks: Vec<(&str, &str)> = result
            .best_picks()
            .map(|c| (c.left_column.as_str(), c.right_column.as_str()))
            .collect();
        assert_eq!(picks, vec![("amount", "amount"), ("email", "email")]);
        assert_eq!(result.candidates[0].left_column, "amount");
        assert!(!result.candidates[1].is_best_pick());
    }

    #[test]
    fn stats_count_best_picks_only() {
        let mut candidates = vec![
            candidate("a", "x", Decision::Auto),
            candidate("a", "y", Decision::Review),
            candidate("b", "x", Decision::Review),
        ];
        mark_best_picks(&mut candidates);
        let stats = match_stats(&candidates, 12.0);
        assert_eq!(stats.auto_count, 1);
        assert_eq!(stats.review_count, 1);
        assert_eq!(stats.auto_pct, 50.0);
        assert!((stats.estimated_minutes_saved - 0.2).abs() < 1e-9);
    }

    fn candidate(left: &str, right: &str, decision: Decision) -> CandidateMapping {
        CandidateMapping {
            left_column: left.to_string(),
            right_column: right.to_string(),
            scores: SignalScores::default(),
            confidence: 0.5,
            decision,
            reasons: Vec::new(),
            warnings: Vec::new(),
            explain: MatchExplain::default(),
            best_pick: None,
        }
    }
}
