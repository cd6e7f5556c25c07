use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::error::QueryError;
use crate::feature_table::StandardizedFeatureTable;
use crate::similarity::{ReducedSpace, SimilarityResult};

#[derive(Debug, Clone)]
pub struct SimilarityReport {
    pub features: Vec<String>,
    pub dimensions: usize,
    pub neighbors: usize,
    pub explained_variance_ratio: f64,
    pub results: Vec<SimilarityResult>,
    pub errors: Vec<String>,
}

/// Neighbours of every player for one feature selection. The projection is
/// fitted once; the per-player lookups run on the rayon pool and come back in
/// table order.
pub fn build_report(
    table: &StandardizedFeatureTable,
    features: &[String],
    dimensions: usize,
    neighbors: usize,
) -> Result<SimilarityReport, QueryError> {
    let space = ReducedSpace::fit(table, features, dimensions)?;

    let outcomes = table
        .identities()
        .par_iter()
        .enumerate()
        // Later rows with a repeated name resolve to the first one anyway.
        .filter(|(row, id)| table.row_of(&id.player) == Some(*row))
        .map(|(_, id)| space.neighbors_of(&id.player, neighbors))
        .collect::<Vec<_>>();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => errors.push(err.to_string()),
        }
    }

    Ok(SimilarityReport {
        features: space.feature_names(),
        dimensions: space.dimensions(),
        neighbors,
        explained_variance_ratio: space.explained_variance_ratio(),
        results,
        errors,
    })
}

pub fn export_report_xlsx(path: &Path, report: &SimilarityReport) -> Result<()> {
    let mut similar_rows = vec![vec![
        "Player".to_string(),
        "Position".to_string(),
        "Minutes Played".to_string(),
        "Rank".to_string(),
        "Similar Player".to_string(),
        "Similar Position".to_string(),
        "Similar Minutes Played".to_string(),
        "Distance".to_string(),
    ]];
    for result in &report.results {
        let position = result.position.clone().unwrap_or_default();
        let minutes = opt_to_string(result.minutes_played);
        for (rank, similar) in result.neighbors.iter().enumerate() {
            similar_rows.push(vec![
                result.player.clone(),
                position.clone(),
                minutes.clone(),
                (rank + 1).to_string(),
                similar.player.clone(),
                similar.position.clone().unwrap_or_default(),
                opt_to_string(similar.minutes_played),
                format!("{:.4}", similar.distance),
            ]);
        }
    }

    let summary_rows = vec![
        vec!["Players".to_string(), report.results.len().to_string()],
        vec!["Features".to_string(), report.features.len().to_string()],
        vec!["PCA dimensions".to_string(), report.dimensions.to_string()],
        vec!["Neighbours".to_string(), report.neighbors.to_string()],
        vec![
            "Variance captured".to_string(),
            format!("{:.1}%", report.explained_variance_ratio * 100.0),
        ],
        vec!["Errors".to_string(), report.errors.len().to_string()],
    ];
    let feature_rows = std::iter::once(vec!["Feature".to_string()])
        .chain(report.features.iter().map(|f| vec![f.clone()]))
        .collect::<Vec<_>>();

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Similar")?;
        write_rows(sheet, &similar_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Features")?;
        write_rows(sheet, &feature_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
