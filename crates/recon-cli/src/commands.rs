use anyhow::{Context, Result};
use recon_cli::inputs::{load_schema, load_settings, load_source_table};
use recon_match::{pair_tables, suggest_mappings};
use serde::Serialize;
use tracing::info_span;

use crate::cli::{MatchArgs, PairArgs};
use crate::summary::{print_match_summary, print_pairing_summary};

pub fn run_match(args: &MatchArgs) -> Result<()> {
    let _span = info_span!("match").entered();
    let settings = load_settings(args.common.config.as_deref())?;
    let left = load_source_table(&args.left)?;
    let right = load_source_table(&args.right)?;
    let sample_n = args.sample_n.unwrap_or(settings.sample_n);
    let result = suggest_mappings(&left, &right, sample_n, args.threshold, &settings);
    if args.common.json {
        print_json(&result)?;
    } else {
        print_match_summary(&left.name, &right.name, &result, args.all);
    }
    Ok(())
}

pub fn run_pair(args: &PairArgs) -> Result<()> {
    let _span = info_span!("pair").entered();
    let settings = load_settings(args.common.config.as_deref())?;
    let left = load_schema(&args.left)?;
    let right = load_schema(&args.right)?;
    let outcome = pair_tables(
        &left,
        &right,
        args.min_score,
        args.mode.map(Into::into),
        &settings,
    );
    if args.common.json {
        print_json(&outcome)?;
    } else {
        print_pairing_summary(&outcome);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    println!("{text}");
    Ok(())
}
