//! Optional capabilities and their fallbacks.
//!
//! Fuzzy name scoring, header embeddings and the optimal assignment solver
//! each come in a full and a fallback variant. [`Capabilities::detect`] picks
//! the variants once; the scoring code only sees the chosen value.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assign;
use crate::config::MatchSettings;
use crate::error::EmbeddingError;

/// Width of the zero vectors produced when embeddings are unavailable.
pub const ZERO_EMBEDDING_DIM: usize = 3;

/// Pairwise string scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatcher {
    /// Max of token-sort and partial ratios.
    Fuzzy,
    /// Case-insensitive equality, 1.0 or 0.0.
    Exact,
}

impl NameMatcher {
    /// `Fuzzy` when the crate was built with the `fuzzy` feature.
    pub fn detect() -> Self {
        if cfg!(feature = "fuzzy") {
            Self::Fuzzy
        } else {
            debug!("fuzzy name scoring not compiled in, using exact comparison");
            Self::Exact
        }
    }

    /// Similarity of two strings in `[0, 1]`.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            Self::Fuzzy => fuzzy::best_ratio(a, b),
            Self::Exact => exact(a, b),
        }
    }
}

fn exact(a: &str, b: &str) -> f64 {
    if a.trim().eq_ignore_ascii_case(b.trim()) {
        1.0
    } else {
        0.0
    }
}

#[cfg(feature = "fuzzy")]
mod fuzzy {
    use rapidfuzz::fuzz;

    pub(super) fn best_ratio(a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        token_sort_ratio(a, b).max(partial_ratio(a, b)).clamp(0.0, 1.0)
    }

    fn ratio(a: &str, b: &str) -> f64 {
        fuzz::ratio(a.chars(), b.chars())
    }

    fn token_sort_ratio(a: &str, b: &str) -> f64 {
        ratio(&sorted_tokens(a), &sorted_tokens(b))
    }

    fn sorted_tokens(s: &str) -> String {
        let mut tokens: Vec<&str> = s.split_whitespace().collect();
        tokens.sort_unstable();
        tokens.join(" ")
    }

    /// Best ratio of the shorter string against equally long windows of the
    /// longer one.
    fn partial_ratio(a: &str, b: &str) -> f64 {
        let a_chars: Vec<char> = a.chars().collect();
        let b_chars: Vec<char> = b.chars().collect();
        let (short, long) = if a_chars.len() <= b_chars.len() {
            (a_chars, b_chars)
        } else {
            (b_chars, a_chars)
        };
        if short.is_empty() {
            return 0.0;
        }
        let mut best = 0.0_f64;
        for window in long.windows(short.len()) {
            let score = fuzz::ratio(short.iter().copied(), window.iter().copied());
            if score > best {
                best = score;
                if best >= 1.0 {
                    break;
                }
            }
        }
        best
    }

}

#[cfg(not(feature = "fuzzy"))]
mod fuzzy {
    pub(super) fn best_ratio(a: &str, b: &str) -> f64 {
        super::exact(a, b)
    }
}

/// A backend that turns header text into vectors.
pub trait HeaderEmbedder: Send + Sync + fmt::Debug {
    /// One vector per header, in input order.
    fn embed(&self, headers: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Header embeddings, or the zero-vector fallback.
#[derive(Debug, Clone, Default)]
pub enum EmbeddingBackend {
    #[default]
    Disabled,
    Model(Arc<dyn HeaderEmbedder>),
}

impl EmbeddingBackend {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Embeds headers. Any backend failure yields zero vectors.
    pub fn embed_headers(&self, headers: &[&str]) -> Vec<Vec<f32>> {
        let Self::Model(model) = self else {
            return zero_vectors(headers.len());
        };
        match model.embed(headers) {
            Ok(vectors) if vectors.len() == headers.len() => vectors,
            Ok(vectors) => {
                let err = EmbeddingError::LengthMismatch {
                    expected: headers.len(),
                    got: vectors.len(),
                };
                debug!(error = %err, "embedding backend failed, using zero vectors");
                zero_vectors(headers.len())
            }
            Err(err) => {
                debug!(error = %err, "embedding backend failed, using zero vectors");
                zero_vectors(headers.len())
            }
        }
    }
}

fn zero_vectors(n: usize) -> Vec<Vec<f32>> {
    vec![vec![0.0; ZERO_EMBEDDING_DIM]; n]
}

/// Offline embedder built from hashed character n-grams.
///
/// Headers are lowercased with separators folded to spaces, then unigram,
/// bigram and trigram counts are hashed into a fixed-width vector and
/// normalized to unit length.
#[derive(Debug, Clone, Copy)]
pub struct CharNgramEmbedder {
    dim: usize,
}

impl Default for CharNgramEmbedder {
    fn default() -> Self {
        Self { dim: 128 }
    }
}

impl CharNgramEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    fn embed_one(&self, header: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        let text: Vec<char> = format!(
            " {} ",
            header
                .to_lowercase()
                .replace(['_', '-', '.'], " ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        )
        .chars()
        .collect();

        for (n, weight) in [(1_usize, 0.5_f32), (2, 1.0), (3, 1.5)] {
            for gram in text.windows(n) {
                let idx = (fnv1a(gram) % self.dim as u64) as usize;
                vector[idx] += weight;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl HeaderEmbedder for CharNgramEmbedder {
    fn embed(&self, headers: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(headers.iter().map(|h| self.embed_one(h)).collect())
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for ch in chars {
        for byte in (*ch as u32).to_le_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

/// Bipartite assignment strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSolver {
    /// Exact maximum-weight assignment.
    #[default]
    Hungarian,
    /// Highest score first.
    Greedy,
}

impl AssignmentSolver {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "hungarian" | "optimal" => Some(Self::Hungarian),
            "greedy" => Some(Self::Greedy),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hungarian => "hungarian",
            Self::Greedy => "greedy",
        }
    }

    /// Assigns rows to columns of a score matrix.
    ///
    /// Rows and columns must already be in tie-break order. Returns
    /// `(row, column)` pairs sorted by row.
    pub fn solve(&self, scores: &[Vec<f64>]) -> Vec<(usize, usize)> {
        match self {
            Self::Hungarian => assign::hungarian(scores),
            Self::Greedy => assign::greedy(scores),
        }
    }
}

/// Capability variants selected for a run.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub names: NameMatcher,
    pub embeddings: EmbeddingBackend,
    pub solver: AssignmentSolver,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect(&MatchSettings::default())
    }
}

impl Capabilities {
    /// Selects the best available variant of each capability.
    pub fn detect(settings: &MatchSettings) -> Self {
        let embeddings = if settings.embeddings_enabled {
            EmbeddingBackend::Model(Arc::new(CharNgramEmbedder::default()))
        } else {
            EmbeddingBackend::Disabled
        };
        Self {
            names: NameMatcher::detect(),
            embeddings,
            solver: settings.table.solver,
        }
    }

    /// Every capability in its fallback variant.
    pub fn fallback() -> Self {
        Self {
            names: NameMatcher::Exact,
            embeddings: EmbeddingBackend::Disabled,
            solver: AssignmentSolver::Greedy,
        }
    }

    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn HeaderEmbedder>) -> Self {
        self.embeddings = EmbeddingBackend::Model(embedder);
        self
    }

    #[must_use]
    pub fn with_names(mut self, names: NameMatcher) -> Self {
        self.names = names;
        self
    }

    #[must_use]
    pub fn with_solver(mut self, solver: AssignmentSolver) -> Self {
        self.solver = solver;
        self
    }
}
