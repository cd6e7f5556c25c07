use std::path::PathBuf;

use anyhow::{Context, Result};

use alw_scout::artifact::{ArtifactMeta, write_artifact};
use alw_scout::config::ScoutConfig;
use alw_scout::consolidate::consolidate_workbook;
use alw_scout::stat_table::Workbook;
use alw_scout::synthetic::synthetic_workbook;

const SYNTHETIC_SEED: u64 = 2024;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = ScoutConfig::from_env();

    let out_path = parse_path_arg("--out").unwrap_or_else(|| config.artifact_path.clone());
    let (workbook, source) = match parse_usize_arg("--synthetic") {
        Some(players) => (
            synthetic_workbook(players, SYNTHETIC_SEED),
            format!("synthetic:{players}:{SYNTHETIC_SEED}"),
        ),
        None => {
            let data_dir = parse_path_arg("--data").unwrap_or_else(|| config.data_dir.clone());
            let workbook = Workbook::load_dir(&data_dir)
                .with_context(|| format!("read workbook from {}", data_dir.display()))?;
            (workbook, data_dir.display().to_string())
        }
    };
    println!(
        "Sheets: {}",
        workbook.sheet_names().collect::<Vec<_>>().join(", ")
    );

    let consolidation = consolidate_workbook(&workbook, &config.consolidation)
        .context("consolidation failed, no artifact written")?;
    let report = &consolidation.report;
    for warning in &report.warnings {
        eprintln!("[WARN] {warning}");
    }

    let meta = ArtifactMeta::from_report(report, Some(source));
    write_artifact(&out_path, &consolidation.table, &meta)?;

    println!("Consolidation complete");
    println!("Artifact: {}", out_path.display());
    println!("Players: {}", report.players);
    println!("Merged columns: {}", report.merged_columns);
    println!("Features: {}", report.features);
    println!("Dropped: {}", report.dropped_columns.len());
    if !meta.degenerate_columns.is_empty() {
        println!("Zero variance: {}", meta.degenerate_columns.join(", "));
    }
    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<usize>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<usize>()
        {
            return Some(v);
        }
    }
    None
}
