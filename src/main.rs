use std::path::PathBuf;

use anyhow::{Context, Result};

use alw_scout::artifact::{read_artifact, read_meta};
use alw_scout::config::{ScoutConfig, parse_list};
use alw_scout::error::QueryError;
use alw_scout::feature_table::StandardizedFeatureTable;
use alw_scout::similarity::{SimilarityQuery, SimilarityResult, find_similar};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = ScoutConfig::from_env();

    let artifact_path = parse_path_arg("--artifact").unwrap_or_else(|| config.artifact_path.clone());
    let table = read_artifact(&artifact_path, &config.consolidation)
        .with_context(|| format!("load artifact {}", artifact_path.display()))?;
    match read_meta(&artifact_path) {
        Ok(Some(meta)) => println!(
            "Loaded {} players x {} features (generated {})",
            table.len(),
            table.feature_names().len(),
            meta.generated_at
        ),
        Ok(None) => println!(
            "Loaded {} players x {} features",
            table.len(),
            table.feature_names().len()
        ),
        Err(err) => eprintln!("[WARN] {err}"),
    }

    if has_flag("--list-features") {
        for name in table.feature_names() {
            println!("{name}");
        }
        return Ok(());
    }
    if has_flag("--list-players") {
        print_players(&table, "");
        return Ok(());
    }
    if let Some(needle) = parse_str_arg("--search") {
        print_players(&table, &needle);
        return Ok(());
    }

    let Some(player) = parse_str_arg("--player") else {
        println!("[INFO] Please select a player and at least one stat to begin.");
        return Ok(());
    };
    let mut query = match parse_str_arg("--features") {
        Some(raw) => SimilarityQuery::new(player, parse_list(&raw)),
        None => SimilarityQuery::all_features(&table, player),
    };
    query = query
        .with_dimensions(parse_usize_arg("--dims").unwrap_or(config.default_dimensions))
        .with_neighbors(parse_usize_arg("--k").unwrap_or(config.neighbors));

    match find_similar(&table, &query) {
        Ok(result) => print_result(&result, query.dimensions),
        Err(QueryError::EmptySelection) => {
            println!("[INFO] Please select a player and at least one stat to begin.");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn print_players(table: &StandardizedFeatureTable, needle: &str) {
    for id in table.search_players(needle) {
        println!(
            "{:<28} {:<8} {}",
            id.player,
            id.position.as_deref().unwrap_or("-"),
            id.minutes_played
                .map(|m| format!("{m:.0}"))
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_result(result: &SimilarityResult, requested_dims: usize) {
    if result.dimensions != requested_dims {
        println!(
            "[INFO] Using {} PCA dimensions (requested {requested_dims})",
            result.dimensions
        );
    }
    println!(
        "PCA captures {:.1}% of variance",
        result.explained_variance_ratio * 100.0
    );
    println!(
        "Players most similar to {} ({} stats):",
        result.player,
        result.features.len()
    );
    println!(
        "{:>4}  {:<28} {:<8} {:>8} {:>10}",
        "#", "Player", "Position", "Minutes", "Distance"
    );
    for (rank, similar) in result.neighbors.iter().enumerate() {
        println!(
            "{:>4}  {:<28} {:<8} {:>8} {:>10.4}",
            rank + 1,
            similar.player,
            similar.position.as_deref().unwrap_or("-"),
            similar
                .minutes_played
                .map(|m| format!("{m:.0}"))
                .unwrap_or_else(|| "-".to_string()),
            similar.distance
        );
    }
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

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_str_arg(name).map(PathBuf::from)
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    parse_str_arg(name).and_then(|raw| raw.parse::<usize>().ok())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
