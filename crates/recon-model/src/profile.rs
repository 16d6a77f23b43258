//! Column and table profiles produced by the profiling stage.
//!
//! Profiles are read-only inputs to the matching engine. They carry sampled
//! statistics and the semantic tags assigned by regex-majority matching.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Simplified column kind.
///
/// Physical type labels coming from readers (`int64`, `float32`, `date`, ...)
/// collapse into one of these five kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Datetime,
}

impl DataType {
    /// All kinds in histogram order.
    pub const ALL: [DataType; 5] = [
        DataType::String,
        DataType::Number,
        DataType::Integer,
        DataType::Boolean,
        DataType::Datetime,
    ];

    /// Maps a physical type label to its simplified kind.
    ///
    /// Unrecognised labels are treated as strings.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_ascii_lowercase();
        let lower = lower.as_str();
        if lower == "integer" || lower.starts_with("int") || lower.starts_with("uint") {
            Self::Integer
        } else if lower == "number"
            || lower.starts_with("float")
            || lower.starts_with("double")
            || lower.starts_with("decimal")
            || lower == "numeric"
        {
            Self::Number
        } else if lower.starts_with("bool") {
            Self::Boolean
        } else if lower.starts_with("date") || lower.starts_with("timestamp") || lower == "time" {
            Self::Datetime
        } else {
            Self::String
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

/// Semantic tag vocabulary shared by the profiler and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SemanticTag {
    EmailLike,
    PhoneLike,
    IbanLike,
    DateIso,
    CurrencyAmountLike,
    AddressLike,
    IdLike,
    NameLike,
    CodeLike,
    CanadianPostalCode,
}

impl SemanticTag {
    /// Fixed vocabulary used for table-level tag distributions.
    pub const VOCABULARY: [SemanticTag; 9] = [
        SemanticTag::EmailLike,
        SemanticTag::PhoneLike,
        SemanticTag::IbanLike,
        SemanticTag::DateIso,
        SemanticTag::CurrencyAmountLike,
        SemanticTag::AddressLike,
        SemanticTag::IdLike,
        SemanticTag::NameLike,
        SemanticTag::CodeLike,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EmailLike => "email_like",
            Self::PhoneLike => "phone_like",
            Self::IbanLike => "iban_like",
            Self::DateIso => "date_iso",
            Self::CurrencyAmountLike => "currency_amount_like",
            Self::AddressLike => "address_like",
            Self::IdLike => "id_like",
            Self::NameLike => "name_like",
            Self::CodeLike => "code_like",
            Self::CanadianPostalCode => "canadian_postal_code",
        }
    }

    /// Parses a tag identifier. Unknown identifiers yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let tag = match raw.trim() {
            "email_like" => Self::EmailLike,
            "phone_like" => Self::PhoneLike,
            "iban_like" => Self::IbanLike,
            "date_iso" => Self::DateIso,
            "currency_amount_like" => Self::CurrencyAmountLike,
            "address_like" => Self::AddressLike,
            "id_like" => Self::IdLike,
            "name_like" => Self::NameLike,
            "code_like" => Self::CodeLike,
            "canadian_postal_code" => Self::CanadianPostalCode,
            _ => return None,
        };
        Some(tag)
    }
}

impl fmt::Display for SemanticTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of one column, computed over a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: DataType,
    #[serde(default)]
    pub null_count: u64,
    #[serde(default)]
    pub unique_count_sampled: u64,
    /// Uniqueness ratio met within the sample (decided by the profiler).
    #[serde(default)]
    pub candidate_primary_key_sampled: bool,
    /// Sampled values, already masked per policy.
    #[serde(default)]
    pub examples: Vec<String>,
    /// Tag identifiers; unknown identifiers are kept but ignored by scoring.
    #[serde(default)]
    pub semantic_tags: BTreeSet<String>,
}

impl ColumnProfile {
    /// Creates a profile with empty statistics.
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            null_count: 0,
            unique_count_sampled: 0,
            candidate_primary_key_sampled: false,
            examples: Vec::new(),
            semantic_tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: SemanticTag) -> Self {
        self.semantic_tags.insert(tag.as_str().to_string());
        self
    }

    #[must_use]
    pub fn with_primary_key(mut self, candidate: bool) -> Self {
        self.candidate_primary_key_sampled = candidate;
        self
    }

    /// Tags that belong to the known vocabulary.
    pub fn known_tags(&self) -> impl Iterator<Item = SemanticTag> + '_ {
        self.semantic_tags.iter().filter_map(|t| SemanticTag::parse(t))
    }

    pub fn has_tag(&self, tag: SemanticTag) -> bool {
        self.semantic_tags.contains(tag.as_str())
    }
}

/// Profile of one source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub table: String,
    pub rows: u64,
    pub columns: u64,
    pub sample_n: u64,
    #[serde(rename = "columns_profile")]
    pub column_profiles: Vec<ColumnProfile>,
}

impl TableProfile {
    /// Builds a profile, deriving the column count from the column list.
    pub fn new(table: impl Into<String>, rows: u64, column_profiles: Vec<ColumnProfile>) -> Self {
        Self {
            table: table.into(),
            rows,
            columns: column_profiles.len() as u64,
            sample_n: rows,
            column_profiles,
        }
    }

    /// True if any column is a sampled candidate primary key.
    pub fn has_candidate_key(&self) -> bool {
        self.column_profiles
            .iter()
            .any(|c| c.candidate_primary_key_sampled)
    }

    /// Union of known semantic tags across all columns.
    pub fn tags(&self) -> BTreeSet<SemanticTag> {
        self.column_profiles
            .iter()
            .flat_map(ColumnProfile::known_tags)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_labels_collapse() {
        assert_eq!(DataType::from_label("int64"), DataType::Integer);
        assert_eq!(DataType::from_label("UInt8"), DataType::Integer);
        assert_eq!(DataType::from_label("float32"), DataType::Number);
        assert_eq!(DataType::from_label("datetime64[ns]"), DataType::Datetime);
        assert_eq!(DataType::from_label("bool"), DataType::Boolean);
        assert_eq!(DataType::from_label("object"), DataType::String);
        assert_eq!(DataType::from_label(""), DataType::String);
    }

    #[test]
    fn tag_identifiers_round_trip() {
        for tag in SemanticTag::VOCABULARY {
            assert_eq!(SemanticTag::parse(tag.as_str()), Some(tag));
        }
        assert_eq!(SemanticTag::parse("not_a_tag"), None);
    }

    #[test]
    fn table_helpers() {
        let table = TableProfile::new(
            "Customers",
            10,
            vec![
                ColumnProfile::new("id", DataType::Integer).with_primary_key(true),
                ColumnProfile::new("email", DataType::String).with_tag(SemanticTag::EmailLike),
            ],
        );
        assert_eq!(table.columns, 2);
        assert!(table.has_candidate_key());
        assert!(table.tags().contains(&SemanticTag::EmailLike));
    }
}
