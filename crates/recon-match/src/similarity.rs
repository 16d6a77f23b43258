//! Pairwise similarity primitives.
//!
//! Every function here is pure and returns a score in `[0, 1]`.

use std::collections::BTreeSet;

use recon_model::{DataType, SemanticTag, SourceColumn, TableProfile};

use crate::capability::NameMatcher;
use crate::mask::Masker;

/// Number of example values kept per side for explainability.
pub const EXAMPLE_COUNT: usize = 3;

/// Row-count gap above which the ratio is penalized.
const ROW_GAP_LIMIT: f64 = 50.0;
const ROW_GAP_PENALTY: f64 = 0.8;

/// Header abbreviations expanded before comparison.
const SYNONYMS: &[(&str, &str)] = &[
    ("acct", "account"),
    ("acc", "account"),
    ("cust", "customer"),
    ("num", "number"),
    ("no", "number"),
    ("nbr", "number"),
    ("fname", "first name"),
    ("lname", "last name"),
    ("dob", "date of birth"),
    ("addr", "address"),
    ("amt", "amount"),
    ("bal", "balance"),
    ("txn", "transaction"),
    ("trx", "transaction"),
    ("ccy", "currency"),
];

/// Lowercases, folds `_`, `-` and `.` to spaces and expands abbreviations.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-', '.'], " ")
        .split_whitespace()
        .map(|token| {
            SYNONYMS
                .iter()
                .find(|(short, _)| *short == token)
                .map_or(token, |(_, long)| *long)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Name similarity: best matcher score over raw and normalized forms.
pub fn sim_name(matcher: NameMatcher, a: &str, b: &str) -> f64 {
    let raw = matcher.score(a, b);
    let normalized = matcher.score(&normalize_name(a), &normalize_name(b));
    raw.max(normalized).clamp(0.0, 1.0)
}

/// 1.0 when simplified kinds agree, else 0.5. Type alone never disqualifies.
pub fn type_score(a: DataType, b: DataType) -> f64 {
    if a == b { 1.0 } else { 0.5 }
}

/// Jaccard overlap of sampled values with masked examples.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueOverlap {
    pub score: f64,
    pub left_examples: Vec<String>,
    pub right_examples: Vec<String>,
}

/// Distinct non-null values among the first `sample_n` non-null cells.
pub fn sampled_values(column: &SourceColumn, sample_n: usize) -> BTreeSet<&str> {
    column.non_null().take(sample_n).collect()
}

/// Up to [`EXAMPLE_COUNT`] distinct non-null values in row order.
pub fn examples(column: &SourceColumn) -> Vec<String> {
    let mut seen = BTreeSet::new();
    column
        .non_null()
        .filter(|v| seen.insert(*v))
        .take(EXAMPLE_COUNT)
        .map(str::to_string)
        .collect()
}

/// `|A ∩ B| / max(1, |A ∪ B|)` over sampled values.
pub fn jaccard(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> f64 {
    let inter = a.intersection(b).count();
    let union = a.union(b).count().max(1);
    inter as f64 / union as f64
}

pub fn value_overlap(
    left: &SourceColumn,
    right: &SourceColumn,
    sample_n: usize,
    masker: &dyn Masker,
) -> ValueOverlap {
    let score = jaccard(&sampled_values(left, sample_n), &sampled_values(right, sample_n));
    ValueOverlap {
        score,
        left_examples: masker.mask_all(&examples(left)),
        right_examples: masker.mask_all(&examples(right)),
    }
}

/// Cosine similarity clamped to `[0, 1]`; zero vectors score 0.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Cosine of two header embeddings.
pub fn embedding_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let a: Vec<f64> = a.iter().map(|x| f64::from(*x)).collect();
    let b: Vec<f64> = b.iter().map(|x| f64::from(*x)).collect();
    cosine(&a, &b)
}

/// Normalized frequency of each vocabulary tag across a table's columns.
pub fn tag_distribution(table: &TableProfile) -> Vec<f64> {
    let mut counts = [0_usize; SemanticTag::VOCABULARY.len()];
    for tag in table.column_profiles.iter().flat_map(|c| c.known_tags()) {
        if let Some(idx) = SemanticTag::VOCABULARY.iter().position(|t| *t == tag) {
            counts[idx] += 1;
        }
    }
    frequencies(&counts)
}

/// Normalized frequency of each simplified dtype across a table's columns.
pub fn dtype_histogram(table: &TableProfile) -> Vec<f64> {
    let mut counts = [0_usize; DataType::ALL.len()];
    for column in &table.column_profiles {
        if let Some(idx) = DataType::ALL.iter().position(|k| *k == column.dtype) {
            counts[idx] += 1;
        }
    }
    frequencies(&counts)
}

fn frequencies(counts: &[usize]) -> Vec<f64> {
    let total = counts.iter().sum::<usize>().max(1) as f64;
    counts.iter().map(|c| *c as f64 / total).collect()
}

/// Row-count ratio with the scale-gap penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowRatio {
    pub score: f64,
    /// The larger table exceeds the smaller by more than 50x.
    pub penalized: bool,
}

/// `min / max` of two row counts, times 0.8 when the gap exceeds 50x.
///
/// Empty tables count as one row.
pub fn row_ratio(a: u64, b: u64) -> RowRatio {
    let a = a.max(1) as f64;
    let b = b.max(1) as f64;
    let (small, large) = if a <= b { (a, b) } else { (b, a) };
    let mut score = small / large;
    let penalized = large / small > ROW_GAP_LIMIT;
    if penalized {
        score *= ROW_GAP_PENALTY;
    }
    RowRatio { score, penalized }
}

/// 1.0 when both tables have a candidate key, 0.5 when one does, else 0.
pub fn pk_score(left: &TableProfile, right: &TableProfile) -> f64 {
    match (left.has_candidate_key(), right.has_candidate_key()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    }
}
