//! Business entity inference for tables.

use recon_model::{EntityType, SemanticTag, TableProfile};

/// One row of the entity cascade: a table belongs to `entity` when its
/// lowercased name contains any keyword or any column carries any tag.
#[derive(Debug)]
pub struct EntityRule {
    pub entity: EntityType,
    pub keywords: &'static [&'static str],
    pub tags: &'static [SemanticTag],
}

/// Entity cascade, evaluated top to bottom.
///
/// Specific domains come before generic ones so `loan_accounts` is a loan
/// table, not an account table. Tables matching nothing are
/// [`EntityType::Unknown`].
pub const ENTITY_RULES: &[EntityRule] = &[
    EntityRule {
        entity: EntityType::Loans,
        keywords: &["loan", "mortgage", "interest", "principal"],
        tags: &[],
    },
    EntityRule {
        entity: EntityType::Customers,
        keywords: &["customer", "client", "fname", "lname", "email", "phone", "dob"],
        tags: &[SemanticTag::EmailLike, SemanticTag::PhoneLike],
    },
    EntityRule {
        entity: EntityType::Transactions,
        keywords: &["txn", "transaction", "posted_date", "merchant"],
        tags: &[],
    },
    EntityRule {
        entity: EntityType::Addresses,
        keywords: &["address", "line1", "city", "postcode", "zip", "country"],
        tags: &[SemanticTag::AddressLike, SemanticTag::CanadianPostalCode],
    },
    EntityRule {
        entity: EntityType::Identifications,
        keywords: &["identification", "passport", "national_id"],
        tags: &[],
    },
    EntityRule {
        entity: EntityType::Accounts,
        keywords: &["account", "acct", "iban", "balance", "currency", "open_date"],
        tags: &[SemanticTag::IbanLike, SemanticTag::CurrencyAmountLike],
    },
];

pub fn infer_entity(table: &TableProfile) -> EntityType {
    let name = table.table.to_lowercase();
    let tags = table.tags();
    ENTITY_RULES
        .iter()
        .find(|rule| {
            rule.keywords.iter().any(|k| name.contains(k))
                || rule.tags.iter().any(|t| tags.contains(t))
        })
        .map_or(EntityType::Unknown, |rule| rule.entity)
}
