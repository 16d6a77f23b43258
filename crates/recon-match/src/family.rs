//! Coarse semantic families for columns and the cross-family gate.
//!
//! A column's family comes from the first rule in [`FAMILY_RULES`] that
//! matches its header or one of its semantic tags. Rule order is priority:
//! `phone_number` is a phone before it is an identifier.

use std::fmt;

use recon_model::{SemanticTag, SourceColumn};

/// Coarse semantic category of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamily {
    Id,
    Name,
    Date,
    Amount,
    Address,
    Phone,
    Email,
    Code,
    Other,
}

impl ColumnFamily {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Address => "address",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Code => "code",
            Self::Other => "other",
        }
    }

    /// Families a column of this family may be mapped onto without capping.
    pub fn compatible(&self) -> &'static [ColumnFamily] {
        match self {
            Self::Id | Self::Code => &[Self::Id, Self::Code],
            Self::Name => &[Self::Name],
            Self::Date => &[Self::Date],
            Self::Amount => &[Self::Amount],
            Self::Address => &[Self::Address],
            Self::Phone => &[Self::Phone],
            Self::Email => &[Self::Email],
            Self::Other => &[],
        }
    }

    /// Symmetric compatibility. `Other` is compatible with everything.
    pub fn is_compatible_with(&self, other: ColumnFamily) -> bool {
        if *self == Self::Other || other == Self::Other {
            return true;
        }
        self.compatible().contains(&other) && other.compatible().contains(self)
    }
}

impl fmt::Display for ColumnFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the family cascade.
///
/// Short keywords that also occur inside unrelated words (`date` in
/// `candidate`, `city` in `capacity`) belong in `tokens`, never in
/// `contains`.
#[derive(Debug)]
pub struct FamilyRule {
    pub family: ColumnFamily,
    /// Substrings of the lowercased header with separators removed.
    pub contains: &'static [&'static str],
    /// Whole header tokens, split on separators and camelCase boundaries.
    pub tokens: &'static [&'static str],
    /// Headers starting with one of these (after separators are removed).
    pub prefixes: &'static [&'static str],
    /// Headers ending with one of these (after separators are removed).
    pub suffixes: &'static [&'static str],
    pub tags: &'static [SemanticTag],
}

impl FamilyRule {
    fn matches(&self, header: &HeaderForms, tags: &[SemanticTag]) -> bool {
        self.contains.iter().any(|k| header.compact.contains(k))
            || self
                .tokens
                .iter()
                .any(|k| header.tokens.iter().any(|t| t == k))
            || self.prefixes.iter().any(|p| header.compact.starts_with(p))
            || self.suffixes.iter().any(|s| header.compact.ends_with(s))
            || self.tags.iter().any(|t| tags.contains(t))
    }
}

/// Family cascade, evaluated top to bottom. [`ColumnFamily::Other`] is the
/// fallback when nothing matches.
pub const FAMILY_RULES: &[FamilyRule] = &[
    FamilyRule {
        family: ColumnFamily::Email,
        contains: &["email"],
        tokens: &["mail"],
        prefixes: &[],
        suffixes: &[],
        tags: &[SemanticTag::EmailLike],
    },
    FamilyRule {
        family: ColumnFamily::Phone,
        contains: &["phone", "mobile"],
        tokens: &["tel", "fax", "cell", "cellular"],
        prefixes: &[],
        suffixes: &[],
        tags: &[SemanticTag::PhoneLike],
    },
    FamilyRule {
        family: ColumnFamily::Date,
        contains: &["birth", "timestamp"],
        tokens: &["date", "dt", "dob", "time", "created", "updated"],
        prefixes: &["date"],
        suffixes: &[],
        tags: &[SemanticTag::DateIso],
    },
    FamilyRule {
        family: ColumnFamily::Amount,
        contains: &["amount", "balance", "price", "salary", "total"],
        tokens: &["amt", "bal", "sum", "value", "fee", "fees"],
        prefixes: &[],
        suffixes: &["amt"],
        tags: &[SemanticTag::CurrencyAmountLike],
    },
    FamilyRule {
        family: ColumnFamily::Address,
        contains: &[
            "address", "street", "country", "postal", "postcode", "province", "line1", "line2",
        ],
        tokens: &["addr", "city", "town", "state", "region", "zip", "zipcode"],
        prefixes: &[],
        suffixes: &[],
        tags: &[SemanticTag::AddressLike, SemanticTag::CanadianPostalCode],
    },
    FamilyRule {
        family: ColumnFamily::Id,
        contains: &["iban", "uuid", "guid"],
        tokens: &["id", "number", "no", "num", "nbr", "key", "ref"],
        prefixes: &[],
        suffixes: &["id"],
        tags: &[SemanticTag::IdLike, SemanticTag::IbanLike],
    },
    FamilyRule {
        family: ColumnFamily::Name,
        contains: &["name"],
        tokens: &["first", "last", "fname", "lname"],
        prefixes: &[],
        suffixes: &[],
        tags: &[SemanticTag::NameLike],
    },
    FamilyRule {
        family: ColumnFamily::Code,
        contains: &["code", "type", "category", "status", "currency"],
        tokens: &["cd", "ccy"],
        prefixes: &[],
        suffixes: &[],
        tags: &[SemanticTag::CodeLike],
    },
];

struct HeaderForms {
    compact: String,
    tokens: Vec<String>,
}

impl HeaderForms {
    fn new(header: &str) -> Self {
        let header = header.trim();
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut prev_lower = false;
        for c in header.chars() {
            if !c.is_alphanumeric() {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                prev_lower = false;
                continue;
            }
            // camelCase boundary: openDate -> open, date
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase() || c.is_numeric();
            current.extend(c.to_lowercase());
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        let compact = tokens.concat();
        Self { compact, tokens }
    }
}

/// Family of a header with the given tags.
pub fn infer_family(header: &str, tags: &[SemanticTag]) -> ColumnFamily {
    let forms = HeaderForms::new(header);
    FAMILY_RULES
        .iter()
        .find(|rule| rule.matches(&forms, tags))
        .map_or(ColumnFamily::Other, |rule| rule.family)
}

pub fn column_family(column: &SourceColumn) -> ColumnFamily {
    let tags: Vec<SemanticTag> = column.known_tags().collect();
    infer_family(&column.name, &tags)
}
