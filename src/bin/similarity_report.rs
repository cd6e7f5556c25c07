use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};

use alw_scout::artifact::read_artifact;
use alw_scout::config::{ScoutConfig, parse_list};
use alw_scout::report::{build_report, export_report_xlsx};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = ScoutConfig::from_env();

    let artifact_path = parse_str_arg("--artifact")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.artifact_path.clone());
    let out_path = parse_str_arg("--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("similarity_report.xlsx"));

    let table = read_artifact(&artifact_path, &config.consolidation)
        .with_context(|| format!("load artifact {}", artifact_path.display()))?;
    let features = parse_str_arg("--features")
        .map(|raw| parse_list(&raw))
        .unwrap_or_else(|| table.feature_names().to_vec());
    let dims = parse_str_arg("--dims")
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(config.default_dimensions);
    let k = parse_str_arg("--k")
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(config.neighbors);

    let started = Instant::now();
    let report = build_report(&table, &features, dims, k)?;
    for err in &report.errors {
        eprintln!("[WARN] {err}");
    }
    export_report_xlsx(&out_path, &report)?;

    println!("Similarity report complete");
    println!("Workbook: {}", out_path.display());
    println!("Players: {}", report.results.len());
    println!(
        "PCA: {} dims over {} stats, {:.1}% of variance",
        report.dimensions,
        report.features.len(),
        report.explained_variance_ratio * 100.0
    );
    println!("Elapsed: {:.2?}", started.elapsed());
    Ok(())
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
