use recon_model::{
    CandidateMapping, ColumnProfile, DataType, Decision, EntityType, MatchExplain, PairSuggestion,
    SemanticTag, SignalScores, SourceTable, TableProfile,
};

#[test]
fn table_profile_reads_profiler_json() {
    let json = r#"{
        "table": "Customers",
        "rows": 5000,
        "columns": 2,
        "sample_n": 200,
        "columns_profile": [
            {
                "name": "email",
                "dtype": "string",
                "null_count": 0,
                "unique_count_sampled": 200,
                "candidate_primary_key_sampled": true,
                "examples": ["a***@***.com"],
                "semantic_tags": ["email_like", "custom_tag"]
            },
            {
                "name": "dob",
                "dtype": "datetime",
                "null_count": 3,
                "unique_count_sampled": 180,
                "candidate_primary_key_sampled": false
            }
        ]
    }"#;
    let profile: TableProfile = serde_json::from_str(json).expect("parse profile");
    assert_eq!(profile.table, "Customers");
    assert_eq!(profile.column_profiles.len(), 2);
    assert_eq!(profile.column_profiles[1].dtype, DataType::Datetime);
    assert!(profile.column_profiles[1].semantic_tags.is_empty());
    assert!(profile.has_candidate_key());

    let known: Vec<SemanticTag> = profile.column_profiles[0].known_tags().collect();
    assert_eq!(known, vec![SemanticTag::EmailLike]);
    assert!(profile.column_profiles[0].has_tag(SemanticTag::EmailLike));
    assert!(!profile.column_profiles[0].has_tag(SemanticTag::PhoneLike));
    assert!(!profile.column_profiles[1].has_tag(SemanticTag::DateIso));
}

#[test]
fn unknown_dtype_label_reads_as_string() {
    let json = r#"{"name": "blob", "dtype": "object"}"#;
    let column: ColumnProfile = serde_json::from_str(json).expect("parse column");
    assert_eq!(column.dtype, DataType::String);
    let out = serde_json::to_value(&column).expect("serialize column");
    assert_eq!(out["dtype"], "string");
}

#[test]
fn candidate_mapping_serializes_wire_names() {
    let candidate = CandidateMapping {
        left_column: "acct_id".to_string(),
        right_column: "account_number".to_string(),
        scores: SignalScores {
            name: 0.8,
            type_: 1.0,
            value_overlap: 1.0,
            embedding: 0.0,
        },
        confidence: 0.76,
        decision: Decision::Auto,
        reasons: vec!["Types compatible".to_string()],
        warnings: Vec::new(),
        explain: MatchExplain::default(),
        best_pick: None,
    };
    let value = serde_json::to_value(&candidate).expect("serialize candidate");
    assert_eq!(value["decision"], "auto");
    assert_eq!(value["scores"]["type"], 1.0);
    assert!(value.get("best_pick").is_none());
}

#[test]
fn pair_suggestion_entity_is_snake_case() {
    let pair = PairSuggestion {
        left_table: "Customers".to_string(),
        right_table: "Clients".to_string(),
        score: 0.81,
        decision: Decision::Auto,
        entity_type: EntityType::Customers,
        reasons: vec![],
        warnings: vec![],
    };
    let json = serde_json::to_string(&pair).expect("serialize pair");
    assert!(json.contains(r#""entity_type":"customers""#));
    let back: PairSuggestion = serde_json::from_str(&json).expect("deserialize pair");
    assert_eq!(back, pair);
}

#[test]
fn source_table_accepts_null_cells() {
    let json = r#"{
        "name": "left.csv",
        "columns": [
            {"name": "amount", "dtype": "float64", "values": ["1.5", null, "2.0"]}
        ]
    }"#;
    let table: SourceTable = serde_json::from_str(json).expect("parse source table");
    let column = table.column("amount").expect("amount column");
    assert_eq!(column.kind(), DataType::Number);
    assert_eq!(column.non_null().collect::<Vec<_>>(), vec!["1.5", "2.0"]);
}
