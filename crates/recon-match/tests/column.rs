//! End-to-end column matching scenarios.

use recon_match::{
    Capabilities, ColumnMatcher, MatchSettings, NameMatcher, SignalWeights, suggest_mappings,
};
use recon_model::{CandidateMapping, Decision, MatchResult, SourceColumn, SourceTable};

fn table(name: &str, columns: Vec<SourceColumn>) -> SourceTable {
    SourceTable::new(name, columns)
}

fn find<'a>(result: &'a MatchResult, left: &str, right: &str) -> &'a CandidateMapping {
    result
        .candidates
        .iter()
        .find(|c| c.left_column == left && c.right_column == right)
        .expect("candidate present")
}

fn customers() -> (SourceTable, SourceTable) {
    let left = table(
        "bank1_customers",
        vec![
            SourceColumn::with_values("customer_id", "object", ["C1", "C2", "C3", "C4"]),
            SourceColumn::with_values("email", "object", ["a@b.com", "b@b.com", "c@b.com", "d@b.com"]),
            SourceColumn::with_values(
                "dob",
                "object",
                ["1990-01-01", "1990-02-02", "1991-03-03", "1992-04-04"],
            ),
        ],
    );
    let right = table(
        "bank2_customers",
        vec![
            SourceColumn::with_values("customer_number", "object", ["C1", "C2", "C999", "C4"]),
            SourceColumn::with_values("e_mail", "object", ["a@b.com", "b@b.com", "x@y.com", "z@w.com"]),
            SourceColumn::with_values(
                "date_of_birth",
                "object",
                ["1990-01-01", "1990-02-02", "1991-03-03", "1992-04-04"],
            ),
        ],
    );
    (left, right)
}

#[test]
fn top_candidates_follow_meaning() {
    let (left, right) = customers();
    let result = suggest_mappings(&left, &right, 1000, None, &MatchSettings::default());
    assert_eq!(result.candidates.len(), 9);

    let cust: Vec<_> = result.for_left("customer_id").collect();
    assert_eq!(cust[0].right_column, "customer_number");
    assert!(cust[0].confidence >= 0.60);
    assert!(cust[0].is_best_pick());

    let dob: Vec<_> = result.for_left("dob").collect();
    assert_eq!(dob[0].right_column, "date_of_birth");
    assert_eq!(dob[0].decision, Decision::Auto);
}

#[test]
fn exact_identifier_columns_auto_match() {
    let left = table(
        "l",
        vec![SourceColumn::with_values("acct_id", "int64", ["1", "2", "3", "4", "5", "6"])],
    );
    let right = table(
        "r",
        vec![SourceColumn::with_values("account_number", "int64", ["1", "2", "3", "4", "5", "6"])],
    );
    let result = suggest_mappings(&left, &right, 1000, Some(0.6), &MatchSettings::default());
    let c = &result.candidates[0];
    assert_eq!(c.decision, Decision::Auto);
    assert!(c.reasons.contains(&"Types compatible".to_string()));
    assert!(c.reasons.contains(&"High value overlap".to_string()));
    assert!(
        c.reasons.iter().any(|r| r.ends_with("name similarity")),
        "{:?}",
        c.reasons
    );
    assert!(c.warnings.is_empty(), "{:?}", c.warnings);

    assert_eq!(result.threshold, 0.6);
    assert_eq!(result.stats.auto_count, 1);
    assert_eq!(result.stats.auto_pct, 100.0);
    assert!((result.stats.estimated_minutes_saved - 0.2).abs() < 1e-9);
}

#[test]
fn unrelated_columns_collect_warnings() {
    let left = table("l", vec![SourceColumn::with_values("amount", "int64", ["1", "2", "3"])]);
    let right = table("r", vec![SourceColumn::with_values("code", "object", ["X", "Y", "Z"])]);
    let result = suggest_mappings(&left, &right, 1000, Some(0.8), &MatchSettings::default());
    let c = &result.candidates[0];
    for warning in ["Low name similarity", "Type mismatch", "Low value overlap"] {
        assert!(c.warnings.contains(&warning.to_string()), "missing {warning}");
    }
    assert_eq!(c.decision, Decision::Review);
    assert_eq!(result.stats.auto_count, 0);
    assert_eq!(result.stats.review_count, 1);
    assert_eq!(result.stats.auto_pct, 0.0);
    assert_eq!(result.stats.estimated_minutes_saved, 0.0);
}

#[test]
fn family_gate_caps_cross_domain_pairs() {
    let left = table("l", vec![SourceColumn::with_values("accountid", "object", ["A1", "A2", "A3"])]);
    let right = table("r", vec![SourceColumn::with_values("country", "object", ["US", "CA", "GB"])]);
    let settings = MatchSettings::default();
    let result = suggest_mappings(&left, &right, 10, Some(0.0), &settings);
    let c = find(&result, "accountid", "country");
    assert!(c.confidence <= settings.family_gate.cap);
    assert!(c.warnings.contains(&"Cross-family pair".to_string()));

    // Identical values would otherwise push the score well past the cap.
    let right = table("r", vec![SourceColumn::with_values("country", "object", ["A1", "A2", "A3"])]);
    let result = suggest_mappings(&left, &right, 10, Some(0.0), &settings);
    assert!(result.candidates[0].confidence <= 0.49);

    let ungated = settings.with_family_gate(false, 0.49);
    let result = suggest_mappings(&left, &right, 10, Some(0.0), &ungated);
    assert!(result.candidates[0].confidence > 0.49);
    assert!(!result.candidates[0].warnings.contains(&"Cross-family pair".to_string()));
}

#[test]
fn identifier_headers_with_embedded_keywords_are_not_gated() {
    let left = table(
        "l",
        vec![SourceColumn::with_values("candidate_id", "int64", ["1", "2", "3", "4"])],
    );
    let right = table(
        "r",
        vec![SourceColumn::with_values("applicant_id", "int64", ["1", "2", "3", "4"])],
    );
    let result = suggest_mappings(&left, &right, 10, Some(0.0), &MatchSettings::default());
    let c = find(&result, "candidate_id", "applicant_id");
    assert!(!c.warnings.contains(&"Cross-family pair".to_string()));
    assert!(c.confidence > 0.49, "confidence {}", c.confidence);
}

#[test]
fn confidence_uses_renormalized_weights() {
    let left = table("l", vec![SourceColumn::with_values("acct_id", "int64", ["1", "2", "3"])]);
    let right = table("r", vec![SourceColumn::with_values("account_id", "int64", ["4", "5", "6"])]);
    for raw in [
        SignalWeights::new(0.90, 0.05, 0.05, 0.0),
        SignalWeights::new(9.0, 0.5, 0.5, 0.0),
        SignalWeights::default(),
    ] {
        let settings = MatchSettings::default().with_weights(raw);
        let result = suggest_mappings(&left, &right, 3, Some(0.0), &settings);
        let c = find(&result, "acct_id", "account_id");
        let w = raw.normalized();
        let expected = w.name * c.scores.name
            + w.type_ * c.scores.type_
            + w.overlap * c.scores.value_overlap
            + w.embedding * c.scores.embedding;
        assert!((c.confidence - expected).abs() < 1e-5, "{raw:?}");
    }
}

#[test]
fn weight_ratio_changes_the_winner() {
    // "account_no" wins on name, "ref" wins on values.
    let left = table(
        "l",
        vec![SourceColumn::with_values("account_no", "object", ["K1", "K2", "K3", "K4"])],
    );
    let right = table(
        "r",
        vec![
            SourceColumn::with_values("account_number", "object", ["Z9", "Z8", "Z7", "Z6"]),
            SourceColumn::with_values("ref", "object", ["K1", "K2", "K3", "K4"]),
        ],
    );
    let top = |weights: SignalWeights| {
        let settings = MatchSettings::default().with_weights(weights);
        let result = suggest_mappings(&left, &right, 100, None, &settings);
        result.best_picks().next().map(|c| c.right_column.clone())
    };
    assert_eq!(top(SignalWeights::new(0.90, 0.05, 0.05, 0.0)).as_deref(), Some("account_number"));
    assert_eq!(top(SignalWeights::new(0.10, 0.10, 0.80, 0.0)).as_deref(), Some("ref"));
}

#[test]
fn examples_are_masked_in_regulated_mode() {
    let left = table("l", vec![SourceColumn::with_values("email", "object", ["a@b.com"])]);
    let right = table("r", vec![SourceColumn::with_values("email", "object", ["a@b.com"])]);

    let masked = suggest_mappings(&left, &right, 10, None, &MatchSettings::default());
    assert_eq!(masked.candidates[0].explain.left_examples, vec!["a***@***.com"]);

    let plain = suggest_mappings(
        &left,
        &right,
        10,
        None,
        &MatchSettings::default().with_regulated_mode(false),
    );
    assert_eq!(plain.candidates[0].explain.right_examples, vec!["a@b.com"]);
}

#[test]
fn explain_keeps_three_distinct_values() {
    let left = table(
        "l",
        vec![SourceColumn {
            values: vec![None, Some("1".into()), Some("1".into()), Some("2".into()), Some("3".into()), Some("4".into())],
            ..SourceColumn::new("n", "int64")
        }],
    );
    let result = ColumnMatcher::new(
        MatchSettings::default().with_regulated_mode(false),
        Capabilities::default(),
    )
    .suggest(&left, &left, 10, None);
    assert_eq!(result.candidates[0].explain.left_examples, vec!["1", "2", "3"]);
    assert_eq!(result.candidates[0].scores.value_overlap, 1.0);
}

#[test]
fn embeddings_add_semantic_reason_when_enabled() {
    let left = table("l", vec![SourceColumn::new("customer_name", "object")]);
    let right = table("r", vec![SourceColumn::new("customer_name", "object")]);

    let settings = MatchSettings::default().with_embeddings(true);
    let result = suggest_mappings(&left, &right, 10, None, &settings);
    let c = &result.candidates[0];
    assert!(c.scores.embedding > 0.99);
    assert!(c.reasons.contains(&"Semantic match".to_string()));

    let result = suggest_mappings(&left, &right, 10, None, &MatchSettings::default());
    assert_eq!(result.candidates[0].scores.embedding, 0.0);
    assert!(!result.candidates[0].reasons.contains(&"Semantic match".to_string()));
}

#[test]
fn fallback_capabilities_still_match_exact_names() {
    let left = table("l", vec![SourceColumn::with_values("Email", "object", ["a@b.com"])]);
    let right = table(
        "r",
        vec![
            SourceColumn::with_values("phone", "object", ["555"]),
            SourceColumn::with_values("email", "object", ["a@b.com"]),
        ],
    );
    let settings = MatchSettings::default();
    let caps = Capabilities::fallback();
    assert_eq!(caps.names, NameMatcher::Exact);
    let result = ColumnMatcher::new(settings, caps).suggest(&left, &right, 10, None);
    let best = result.best_picks().next().expect("best pick");
    assert_eq!(best.right_column, "email");
    assert_eq!(best.scores.name, 1.0);
    assert_eq!(result.candidates[1].scores.name, 0.0);
}

#[test]
fn scores_are_bounded_and_output_is_sorted() {
    let (left, right) = customers();
    let result = suggest_mappings(&left, &right, 1000, None, &MatchSettings::default());
    for c in &result.candidates {
        for s in [c.scores.name, c.scores.type_, c.scores.value_overlap, c.scores.embedding, c.confidence] {
            assert!((0.0..=1.0).contains(&s));
        }
    }
    let keys: Vec<(String, f64)> = result
        .candidates
        .iter()
        .map(|c| (c.left_column.to_lowercase(), -c.confidence))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    assert_eq!(keys, sorted);
}
