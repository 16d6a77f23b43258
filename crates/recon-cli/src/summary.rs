use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use recon_model::{CandidateMapping, Decision, MatchResult, PairingOutcome};

pub fn print_match_summary(left: &str, right: &str, result: &MatchResult, all: bool) {
    println!("Left: {left}");
    println!("Right: {right}");
    println!("Threshold: {:.2}", result.threshold);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Left column"),
        header_cell("Right column"),
        header_cell("Confidence"),
        header_cell("Decision"),
        header_cell("Name"),
        header_cell("Type"),
        header_cell("Overlap"),
        header_cell("Embed"),
        header_cell("Reasons"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 3, CellAlignment::Center);
    let rows: Vec<&CandidateMapping> = if all {
        result.candidates.iter().collect()
    } else {
        result.best_picks().collect()
    };
    for candidate in rows {
        table.add_row(vec![
            Cell::new(&candidate.left_column).add_attribute(Attribute::Bold),
            Cell::new(&candidate.right_column),
            score_cell(candidate.confidence).add_attribute(Attribute::Bold),
            decision_cell(candidate.decision),
            score_cell(candidate.scores.name),
            score_cell(candidate.scores.type_),
            score_cell(candidate.scores.value_overlap),
            score_cell(candidate.scores.embedding),
            list_cell(&candidate.reasons),
            warning_cell(&candidate.warnings),
        ]);
    }
    println!("{table}");
    let stats = &result.stats;
    println!(
        "Auto: {} ({:.2}%)  Review: {}  Estimated minutes saved: {:.2}",
        stats.auto_count, stats.auto_pct, stats.review_count, stats.estimated_minutes_saved
    );
}

pub fn print_pairing_summary(outcome: &PairingOutcome) {
    println!(
        "Mode: {}  Min score: {:.2}  Auto threshold: {:.2}",
        outcome.settings.mode, outcome.settings.min_score, outcome.settings.auto_threshold
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Left table"),
        header_cell("Right table"),
        header_cell("Entity"),
        header_cell("Score"),
        header_cell("Decision"),
        header_cell("Reasons"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for pair in &outcome.pairs {
        table.add_row(vec![
            Cell::new(&pair.left_table).add_attribute(Attribute::Bold),
            Cell::new(&pair.right_table),
            Cell::new(pair.entity_type).fg(Color::Cyan),
            score_cell(pair.score).add_attribute(Attribute::Bold),
            decision_cell(pair.decision),
            list_cell(&pair.reasons),
            warning_cell(&pair.warnings),
        ]);
    }
    println!("{table}");
    if outcome.unpaired_left.is_empty() && outcome.unpaired_right.is_empty() {
        return;
    }
    let mut unpaired = Table::new();
    unpaired.set_header(vec![header_cell("Side"), header_cell("Unpaired tables")]);
    apply_list_table_style(&mut unpaired);
    for (side, names) in [
        ("left", &outcome.unpaired_left),
        ("right", &outcome.unpaired_right),
    ] {
        if names.is_empty() {
            continue;
        }
        unpaired.add_row(vec![Cell::new(side), list_cell(names)]);
    }
    println!();
    println!("{unpaired}");
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn apply_list_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn score_cell(score: f64) -> Cell {
    Cell::new(format!("{score:.2}"))
}

fn decision_cell(decision: Decision) -> Cell {
    match decision {
        Decision::Auto => Cell::new(decision)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        Decision::Review => Cell::new(decision).fg(Color::Yellow),
    }
}

fn list_cell(items: &[String]) -> Cell {
    if items.is_empty() {
        return dim_cell("-");
    }
    Cell::new(items.join("\n"))
}

fn warning_cell(items: &[String]) -> Cell {
    if items.is_empty() {
        return dim_cell("-");
    }
    Cell::new(items.join("\n")).fg(Color::Yellow)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).add_attribute(Attribute::Dim)
}
