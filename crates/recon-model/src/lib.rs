//! Data model for dataset reconciliation.
//!
//! Inputs are [`TableProfile`]s and [`SourceTable`]s produced by the profiling
//! and parsing stages. Outputs are [`CandidateMapping`]s for columns and
//! [`PairSuggestion`]s for tables. Everything here is plain data.

pub mod mapping;
pub mod pairing;
pub mod profile;
pub mod source;

pub use mapping::{CandidateMapping, Decision, MatchExplain, MatchResult, MatchStats, SignalScores};
pub use pairing::{
    AppliedPairingSettings, EntityType, PairSuggestion, PairingMatrix, PairingMode,
    PairingOutcome, UnknownMode,
};
pub use profile::{ColumnProfile, DataType, SemanticTag, TableProfile};
pub use source::{SourceColumn, SourceTable};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_threshold_is_inclusive() {
        assert_eq!(Decision::at_least(0.7, 0.7), Decision::Auto);
        assert_eq!(Decision::at_least(0.699_999, 0.7), Decision::Review);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Strict".parse::<PairingMode>(), Ok(PairingMode::Strict));
        assert_eq!(" lenient ".parse::<PairingMode>(), Ok(PairingMode::Lenient));
        let err = "loose".parse::<PairingMode>().unwrap_err();
        assert_eq!(err, UnknownMode("loose".to_string()));
        assert_eq!(
            err.to_string(),
            "unknown pairing mode 'loose' (expected strict, balanced or lenient)"
        );
    }

    #[test]
    fn matrix_lookup_by_name() {
        let matrix = PairingMatrix {
            left: vec!["a".into(), "b".into()],
            right: vec!["x".into()],
            scores: vec![vec![0.25], vec![0.75]],
        };
        assert_eq!(matrix.get("b", "x"), Some(0.75));
        assert_eq!(matrix.get("c", "x"), None);
    }
}
