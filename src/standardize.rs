use ndarray::{ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::ConsolidationWarning;
use crate::feature_table::{FeatureTable, StandardizedFeatureTable};

/// Value written for every player in a column that is constant across the
/// population. Zero reads as "average" in standardized units, and keeps
/// NaN/inf out of the distance computation.
pub const DEGENERATE_COLUMN_FALLBACK: f64 = 0.0;

/// Relative to `max(1, |mean|)`.
const DEGENERATE_STD_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub feature: String,
    pub mean: f64,
    pub std_dev: f64,
    pub degenerate: bool,
}

#[derive(Debug, Clone)]
pub struct Standardized {
    pub table: StandardizedFeatureTable,
    pub stats: Vec<ColumnStats>,
    pub warnings: Vec<ConsolidationWarning>,
}

/// Population mean and standard deviation (ddof = 0). Values are scaled by
/// the largest magnitude first so squares of large stats cannot overflow.
pub fn mean_std(values: ArrayView1<'_, f64>) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|v| v / scale).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|v| {
            let d = v / scale - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean * scale, var.sqrt() * scale)
}

pub fn is_degenerate(mean: f64, std_dev: f64) -> bool {
    std_dev.is_nan() || std_dev <= DEGENERATE_STD_EPSILON * mean.abs().max(1.0)
}

/// Z-scores every column in place: `(v - mean) / std_dev`.
pub fn standardize(mut table: FeatureTable) -> Standardized {
    let feature_names = table.feature_names().to_vec();
    let mut stats = Vec::with_capacity(feature_names.len());
    let mut warnings = Vec::new();

    let mut values = table.values_mut();
    for (mut column, name) in values.axis_iter_mut(Axis(1)).zip(&feature_names) {
        let (mean, std_dev) = mean_std(column.view());
        let degenerate = is_degenerate(mean, std_dev);
        if degenerate {
            column.fill(DEGENERATE_COLUMN_FALLBACK);
            warnings.push(ConsolidationWarning::DegenerateColumn(name.clone()));
        } else {
            column.mapv_inplace(|v| (v - mean) / std_dev);
        }
        stats.push(ColumnStats {
            feature: name.clone(),
            mean,
            std_dev,
            degenerate,
        });
    }

    Standardized {
        table: StandardizedFeatureTable::from_standardized(table),
        stats,
        warnings,
    }
}
