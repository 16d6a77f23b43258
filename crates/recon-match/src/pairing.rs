//! Table-level one-to-one pairing.
//!
//! Pairs are accepted in stages, each removing both tables from later
//! stages:
//!
//! 1. canonical-name lock-in
//! 2. mutual-top lock-in for near-identical names
//! 3. per-entity assignment (optimal or greedy)
//! 4. cross-entity leftovers, lenient mode only
//!
//! Ties always resolve by table name, never by input order.

use std::collections::BTreeMap;

use tracing::{debug, info};

use recon_model::{
    AppliedPairingSettings, Decision, EntityType, PairSuggestion, PairingMatrix, PairingMode,
    PairingOutcome, TableProfile,
};

use crate::assign::by_score_then_names;
use crate::capability::{AssignmentSolver, Capabilities};
use crate::config::{MatchSettings, TablePairSettings, TableWeights};
use crate::entity::infer_entity;
use crate::similarity::{cosine, dtype_histogram, pk_score, row_ratio, sim_name, tag_distribution};

/// Name similarity required for mutual-top lock-in without a canonical match.
const MUTUAL_TOP_NAME_MIN: f64 = 0.8;
const NAME_OVERLAP_REASON: f64 = 0.8;
const TAGS_SIMILAR_REASON: f64 = 0.6;
const ROWS_ALIGNED_REASON: f64 = 0.7;

/// File extensions stripped from table names before canonicalization.
const TABLE_EXTENSIONS: &[&str] = &[".csv", ".tsv", ".txt", ".xlsx", ".xls", ".json", ".parquet"];

/// Tokens that carry no meaning for pairing.
const NOISE_TOKENS: &[&str] = &["bank1", "bank2", "mock", "schema"];

/// Canonical key of a table name.
///
/// Lowercases, strips a known file extension, folds punctuation to `_` and
/// drops noise tokens: `CurSav_Accounts.csv` and `bank2-cursav accounts.xlsx`
/// both become `cursav_accounts`.
pub fn canonical_key(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let stem = TABLE_EXTENSIONS
        .iter()
        .find_map(|ext| lower.strip_suffix(ext))
        .unwrap_or(lower.as_str());
    stem.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !NOISE_TOKENS.contains(t))
        .collect::<Vec<_>>()
        .join("_")
}

/// Scores and pairs two lists of table profiles.
#[derive(Debug, Clone)]
pub struct TablePairer {
    settings: TablePairSettings,
    caps: Capabilities,
}

/// Stage that accepted a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Canonical,
    MutualTop,
    EntityBlock(AssignmentSolver),
    Leftover,
}

impl Stage {
    fn reason(&self) -> &'static str {
        match self {
            Self::Canonical => "Canonical name match",
            Self::MutualTop => "Mutual top by score",
            Self::EntityBlock(AssignmentSolver::Hungarian) => "Optimal assignment in entity block",
            Self::EntityBlock(AssignmentSolver::Greedy) => "Greedy assignment in entity block",
            Self::Leftover => "Cross-entity leftover",
        }
    }
}

struct PreparedTable<'a> {
    profile: &'a TableProfile,
    entity: EntityType,
    key: String,
    tags: Vec<f64>,
    dtypes: Vec<f64>,
}

/// Score and explanation of one `(left, right)` cell.
struct CellScore {
    score: f64,
    name: f64,
    entity: EntityType,
    reasons: Vec<String>,
    warnings: Vec<String>,
}

/// Mutable bookkeeping shared by the stages of one call.
struct PairingRun<'a> {
    left: Vec<PreparedTable<'a>>,
    right: Vec<PreparedTable<'a>>,
    cells: Vec<Vec<CellScore>>,
    left_open: Vec<bool>,
    right_open: Vec<bool>,
    accepted: Vec<(usize, usize, Stage)>,
    min_score: f64,
}

impl TablePairer {
    pub fn new(settings: TablePairSettings, caps: Capabilities) -> Self {
        Self { settings, caps }
    }

    /// Pairs `left` tables with `right` tables one-to-one.
    ///
    /// `min_score` and `mode` override the configured values for this call.
    pub fn pair(
        &self,
        left: &[TableProfile],
        right: &[TableProfile],
        min_score: Option<f64>,
        mode: Option<PairingMode>,
    ) -> PairingOutcome {
        let weights = self.settings.weights.normalized();
        let min_score = match min_score {
            Some(s) if s.is_finite() => s.clamp(0.0, 1.0),
            _ => self.settings.min_score,
        };
        let mode = mode.unwrap_or(self.settings.mode);
        let auto_threshold = self.settings.auto_threshold;

        let left_tables: Vec<PreparedTable<'_>> = left.iter().map(prepare).collect();
        let right_tables: Vec<PreparedTable<'_>> = right.iter().map(prepare).collect();
        let cells: Vec<Vec<CellScore>> = left_tables
            .iter()
            .map(|l| {
                right_tables
                    .iter()
                    .map(|r| self.score_cell(l, r, &weights))
                    .collect()
            })
            .collect();

        // Strict mode keeps unknown-entity tables out of every stage.
        let open = |t: &PreparedTable<'_>| mode != PairingMode::Strict || t.entity.is_known();
        let mut run = PairingRun {
            left_open: left_tables.iter().map(open).collect(),
            right_open: right_tables.iter().map(open).collect(),
            left: left_tables,
            right: right_tables,
            cells,
            accepted: Vec::new(),
            min_score,
        };

        run.canonical_lock_in();
        run.mutual_top_lock_in();
        run.entity_blocks(mode, self.caps.solver);
        if mode == PairingMode::Lenient {
            run.leftovers();
        }

        let outcome = run.finish(&weights, min_score, auto_threshold, mode);
        info!(
            pairs = outcome.pairs.len(),
            unpaired_left = outcome.unpaired_left.len(),
            unpaired_right = outcome.unpaired_right.len(),
            mode = mode.as_str(),
            "table pairing complete"
        );
        outcome
    }

    fn score_cell(
        &self,
        left: &PreparedTable<'_>,
        right: &PreparedTable<'_>,
        weights: &TableWeights,
    ) -> CellScore {
        let name = sim_name(self.caps.names, &left.profile.table, &right.profile.table);
        let tags = cosine(&left.tags, &right.tags);
        let dtypes = cosine(&left.dtypes, &right.dtypes);
        let rows = row_ratio(left.profile.rows, right.profile.rows);
        let keys = pk_score(left.profile, right.profile);
        let same_entity = left.entity == right.entity && left.entity.is_known();
        let entity_score = if same_entity {
            self.settings.entity_match
        } else {
            0.0
        };

        let score = weights.name * name
            + weights.tags * tags
            + weights.dtype * dtypes
            + weights.rows * rows.score
            + weights.keys * keys
            + weights.entity * entity_score;

        let mut reasons = Vec::new();
        let mut warnings = Vec::new();
        if name >= NAME_OVERLAP_REASON {
            reasons.push("Name tokens overlap".to_string());
        }
        if tags >= TAGS_SIMILAR_REASON {
            reasons.push("Semantic tags similar".to_string());
        }
        if rows.score >= ROWS_ALIGNED_REASON {
            reasons.push("Rowcount aligned".to_string());
        }
        if same_entity {
            reasons.push(format!("Same entity: {}", left.entity));
        }
        if left.entity.is_known() && right.entity.is_known() && left.entity != right.entity {
            warnings.push("Entity mismatch".to_string());
        }
        if rows.penalized {
            warnings.push("Row count scale gap".to_string());
        }

        let entity = if left.entity == right.entity || left.entity.is_known() {
            left.entity
        } else {
            right.entity
        };
        CellScore {
            score: round_score(score),
            name,
            entity,
            reasons,
            warnings,
        }
    }
}

fn prepare(profile: &TableProfile) -> PreparedTable<'_> {
    PreparedTable {
        profile,
        entity: infer_entity(profile),
        key: canonical_key(&profile.table),
        tags: tag_distribution(profile),
        dtypes: dtype_histogram(profile),
    }
}

impl PairingRun<'_> {
    fn score(&self, i: usize, j: usize) -> f64 {
        self.cells[i][j].score
    }

    fn accept(&mut self, i: usize, j: usize, stage: Stage) {
        self.left_open[i] = false;
        self.right_open[j] = false;
        self.accepted.push((i, j, stage));
    }

    fn open_left(&self) -> Vec<usize> {
        sorted_open(&self.left, &self.left_open)
    }

    fn open_right(&self) -> Vec<usize> {
        sorted_open(&self.right, &self.right_open)
    }

    /// Locks in tables whose canonical key is unique on both sides.
    fn canonical_lock_in(&mut self) {
        let mut by_key: BTreeMap<&str, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
        for i in self.open_left() {
            by_key.entry(self.left[i].key.as_str()).or_default().0.push(i);
        }
        for j in self.open_right() {
            by_key.entry(self.right[j].key.as_str()).or_default().1.push(j);
        }
        let locked: Vec<(usize, usize)> = by_key
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .filter_map(|(_, sides)| match sides {
                (l, r) if l.len() == 1 && r.len() == 1 => Some((l[0], r[0])),
                _ => None,
            })
            .filter(|&(i, j)| self.score(i, j) >= self.min_score)
            .collect();

        debug!(pairs = locked.len(), "canonical name lock-in");
        for (i, j) in locked {
            self.accept(i, j, Stage::Canonical);
        }
    }

    /// Locks in mutual best choices with near-identical names.
    fn mutual_top_lock_in(&mut self) {
        let lefts = self.open_left();
        let rights = self.open_right();
        if lefts.is_empty() || rights.is_empty() {
            return;
        }
        let top_right = |i: usize| -> usize {
            rights
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    self.score(i, b)
                        .total_cmp(&self.score(i, a))
                        .then_with(|| name_order(&self.right[a], &self.right[b]))
                })
                .unwrap_or(rights[0])
        };
        let top_left = |j: usize| -> usize {
            lefts
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    self.score(b, j)
                        .total_cmp(&self.score(a, j))
                        .then_with(|| name_order(&self.left[a], &self.left[b]))
                })
                .unwrap_or(lefts[0])
        };

        let locked: Vec<(usize, usize)> = lefts
            .iter()
            .map(|&i| (i, top_right(i)))
            .filter(|&(i, j)| top_left(j) == i)
            .filter(|&(i, j)| {
                let cell = &self.cells[i][j];
                let similar = cell.name >= MUTUAL_TOP_NAME_MIN
                    || (!self.left[i].key.is_empty() && self.left[i].key == self.right[j].key);
                similar && cell.score >= self.min_score
            })
            .collect();

        debug!(pairs = locked.len(), "mutual top lock-in");
        for (i, j) in locked {
            self.accept(i, j, Stage::MutualTop);
        }
    }

    /// Solves one assignment per entity block.
    fn entity_blocks(&mut self, mode: PairingMode, solver: AssignmentSolver) {
        for entity in EntityType::ALL {
            if entity == EntityType::Unknown && mode == PairingMode::Strict {
                continue;
            }
            let lefts: Vec<usize> = self
                .open_left()
                .into_iter()
                .filter(|&i| self.left[i].entity == entity)
                .collect();
            let rights: Vec<usize> = self
                .open_right()
                .into_iter()
                .filter(|&j| self.right[j].entity == entity)
                .collect();
            if lefts.is_empty() || rights.is_empty() {
                continue;
            }

            let block: Vec<Vec<f64>> = lefts
                .iter()
                .map(|&i| rights.iter().map(|&j| self.score(i, j)).collect())
                .collect();
            let assigned: Vec<(usize, usize)> = solver
                .solve(&block)
                .into_iter()
                .map(|(a, b)| (lefts[a], rights[b]))
                .filter(|&(i, j)| self.score(i, j) >= self.min_score)
                .collect();

            debug!(
                entity = entity.as_str(),
                solver = solver.as_str(),
                left = lefts.len(),
                right = rights.len(),
                pairs = assigned.len(),
                "entity block assignment"
            );
            for (i, j) in assigned {
                self.accept(i, j, Stage::EntityBlock(solver));
            }
        }
    }

    /// Greedily pairs whatever is left, across entities.
    fn leftovers(&mut self) {
        let lefts = self.open_left();
        let rights = self.open_right();
        let mut cells: Vec<(usize, usize)> = lefts
            .iter()
            .flat_map(|&i| rights.iter().map(move |&j| (i, j)))
            .filter(|&(i, j)| self.score(i, j) >= self.min_score)
            .collect();
        cells.sort_by(|&(ai, aj), &(bi, bj)| {
            by_score_then_names(
                (
                    self.score(ai, aj),
                    self.left[ai].profile.table.as_str(),
                    self.right[aj].profile.table.as_str(),
                ),
                (
                    self.score(bi, bj),
                    self.left[bi].profile.table.as_str(),
                    self.right[bj].profile.table.as_str(),
                ),
            )
        });

        let mut count = 0;
        for (i, j) in cells {
            if self.left_open[i] && self.right_open[j] {
                self.accept(i, j, Stage::Leftover);
                count += 1;
            }
        }
        debug!(pairs = count, "cross-entity leftovers");
    }

    fn finish(
        self,
        weights: &TableWeights,
        min_score: f64,
        auto_threshold: f64,
        mode: PairingMode,
    ) -> PairingOutcome {
        let mut pairs: Vec<PairSuggestion> = self
            .accepted
            .iter()
            .map(|&(i, j, stage)| {
                let cell = &self.cells[i][j];
                let decision = match stage {
                    // Cross-entity leftovers need to clear the threshold strictly.
                    Stage::Leftover if cell.score > auto_threshold => Decision::Auto,
                    Stage::Leftover => Decision::Review,
                    _ => Decision::at_least(cell.score, auto_threshold),
                };
                let mut reasons = vec![stage.reason().to_string()];
                reasons.extend(cell.reasons.iter().cloned());
                let mut warnings = cell.warnings.clone();
                if stage == Stage::Leftover && self.left[i].entity != self.right[j].entity {
                    warnings.push("Cross-entity pair".to_string());
                }
                PairSuggestion {
                    left_table: self.left[i].profile.table.clone(),
                    right_table: self.right[j].profile.table.clone(),
                    score: cell.score,
                    decision,
                    entity_type: cell.entity,
                    reasons,
                    warnings,
                }
            })
            .collect();
        pairs.sort_by(|a, b| {
            a.left_table
                .to_lowercase()
                .cmp(&b.left_table.to_lowercase())
                .then_with(|| a.left_table.cmp(&b.left_table))
                .then_with(|| a.right_table.cmp(&b.right_table))
        });

        let mut left_paired = vec![false; self.left.len()];
        let mut right_paired = vec![false; self.right.len()];
        for &(i, j, _) in &self.accepted {
            left_paired[i] = true;
            right_paired[j] = true;
        }
        let unpaired = |tables: &[PreparedTable<'_>], paired: &[bool]| -> Vec<String> {
            tables
                .iter()
                .zip(paired)
                .filter(|(_, p)| !**p)
                .map(|(t, _)| t.profile.table.clone())
                .collect()
        };

        PairingOutcome {
            settings: AppliedPairingSettings {
                weights: weights.to_map(),
                min_score,
                auto_threshold,
                mode,
            },
            unpaired_left: unpaired(&self.left, &left_paired),
            unpaired_right: unpaired(&self.right, &right_paired),
            matrix: PairingMatrix {
                left: self.left.iter().map(|t| t.profile.table.clone()).collect(),
                right: self.right.iter().map(|t| t.profile.table.clone()).collect(),
                scores: self
                    .cells
                    .iter()
                    .map(|row| row.iter().map(|c| c.score).collect())
                    .collect(),
            },
            pairs,
        }
    }
}

/// Pairs two lists of table profiles with default capabilities for
/// `settings`.
pub fn pair_tables(
    left: &[TableProfile],
    right: &[TableProfile],
    min_score: Option<f64>,
    mode: Option<PairingMode>,
    settings: &MatchSettings,
) -> PairingOutcome {
    TablePairer::new(settings.table, Capabilities::detect(settings)).pair(
        left,
        right,
        min_score,
        mode,
    )
}

/// Open indices in name order.
fn sorted_open(tables: &[PreparedTable<'_>], open: &[bool]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..tables.len()).filter(|&i| open[i]).collect();
    idx.sort_by(|&a, &b| name_order(&tables[a], &tables[b]).then_with(|| a.cmp(&b)));
    idx
}

fn name_order(a: &PreparedTable<'_>, b: &PreparedTable<'_>) -> std::cmp::Ordering {
    let (a, b) = (&a.profile.table, &b.profile.table);
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn round_score(score: f64) -> f64 {
    let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
    (score * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use recon_model::{ColumnProfile, DataType, SemanticTag};

    use super::*;

    fn profile(name: &str, rows: u64, tags: &[SemanticTag]) -> TableProfile {
        let mut columns: Vec<ColumnProfile> = tags
            .iter()
            .map(|t| ColumnProfile::new(t.as_str(), DataType::String).with_tag(*t))
            .collect();
        columns.push(ColumnProfile::new("seq", DataType::Integer));
        TableProfile::new(name, rows, columns)
    }

    #[test]
    fn canonical_keys_drop_noise() {
        assert_eq!(canonical_key("CurSav_Accounts.csv"), "cursav_accounts");
        assert_eq!(canonical_key("cursav_accounts.xlsx"), "cursav_accounts");
        assert_eq!(canonical_key("bank2-CurSav Accounts"), "cursav_accounts");
        assert_eq!(canonical_key("Mock_Schema.json"), "");
    }

    #[test]
    fn stage_reasons_name_the_solver() {
        assert_eq!(
            Stage::EntityBlock(AssignmentSolver::Greedy).reason(),
            "Greedy assignment in entity block"
        );
        assert_eq!(Stage::Canonical.reason(), "Canonical name match");
    }

    #[test]
    fn strict_mode_excludes_unknown_tables() {
        let left = [profile("alpha", 10, &[]), profile("beta", 10, &[])];
        let right = [profile("alpha", 10, &[]), profile("beta", 10, &[])];
        let pairer = TablePairer::new(TablePairSettings::default(), Capabilities::default());
        let strict = pairer.pair(&left, &right, None, Some(PairingMode::Strict));
        assert!(strict.pairs.is_empty());
        assert_eq!(strict.unpaired_left, vec!["alpha", "beta"]);

        let balanced = pairer.pair(&left, &right, None, Some(PairingMode::Balanced));
        assert!(balanced.contains("alpha", "alpha"));
        assert!(balanced.contains("beta", "beta"));
    }

    #[test]
    fn empty_sides_produce_empty_outcome() {
        let pairer = TablePairer::new(TablePairSettings::default(), Capabilities::default());
        let outcome = pairer.pair(&[], &[profile("customers", 1, &[])], None, None);
        assert!(outcome.pairs.is_empty());
        assert!(outcome.unpaired_left.is_empty());
        assert_eq!(outcome.unpaired_right, vec!["customers"]);
        assert!(outcome.matrix.scores.is_empty());
    }

    #[test]
    fn scale_gap_is_warned() {
        let left = [profile("customers", 10, &[SemanticTag::EmailLike])];
        let right = [profile("customers", 10_000, &[SemanticTag::EmailLike])];
        let pairer = TablePairer::new(TablePairSettings::default(), Capabilities::default());
        let outcome = pairer.pair(&left, &right, None, None);
        let pair = outcome.pair_for_left("customers").unwrap();
        assert!(pair.warnings.contains(&"Row count scale gap".to_string()));
        assert_eq!(pair.reasons[0], "Canonical name match");
        assert!(pair.reasons.contains(&"Same entity: customers".to_string()));
    }
}
