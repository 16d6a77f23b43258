#![deny(unsafe_code)]

//! Matching and pairing engine for dataset reconciliation.
//!
//! Two operations:
//!
//! - [`suggest_mappings`] / [`ColumnMatcher`] score every left column against
//!   every right column and decide `auto` or `review` per candidate.
//! - [`pair_tables`] / [`TablePairer`] pair left tables with right tables
//!   one-to-one using canonical-name and mutual-top lock-in followed by
//!   per-entity assignment.
//!
//! Both are pure and synchronous. Settings are passed explicitly, so callers
//! with different configurations can run concurrently.

pub mod assign;
pub mod capability;
pub mod column;
pub mod config;
pub mod entity;
pub mod error;
pub mod family;
pub mod mask;
pub mod pairing;
pub mod similarity;

pub use capability::{
    AssignmentSolver, Capabilities, CharNgramEmbedder, EmbeddingBackend, HeaderEmbedder,
    NameMatcher,
};
pub use column::{ColumnMatcher, suggest_mappings};
pub use config::{FamilyGateSettings, MatchSettings, SignalWeights, TablePairSettings, TableWeights};
pub use entity::infer_entity;
pub use error::{ConfigError, EmbeddingError, Result};
pub use family::{ColumnFamily, column_family, infer_family};
pub use mask::{Masker, NoMasking, PiiMasker};
pub use pairing::{TablePairer, canonical_key, pair_tables};
