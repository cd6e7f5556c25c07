use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::{ConsolidationConfig, MINUTES_COLUMN, PLAYER_COLUMN, POSITION_COLUMN};
use crate::consolidate::{ConsolidationReport, coerce_numeric};
use crate::error::{ArtifactError, ConsolidationWarning};
use crate::feature_table::{FeatureTable, PlayerIdentity, StandardizedFeatureTable};
use crate::standardize::ColumnStats;

pub const ARTIFACT_VERSION: u32 = 1;

/// Sidecar written next to the standardized CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub version: u32,
    pub generated_at: String,
    #[serde(default)]
    pub source: Option<String>,
    pub players: usize,
    #[serde(default)]
    pub features: Vec<ColumnStats>,
    #[serde(default)]
    pub degenerate_columns: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ArtifactMeta {
    pub fn from_report(report: &ConsolidationReport, source: Option<String>) -> Self {
        let degenerate_columns = report
            .warnings
            .iter()
            .filter_map(|w| match w {
                ConsolidationWarning::DegenerateColumn(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        Self {
            version: ARTIFACT_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            source,
            players: report.players,
            features: report.column_stats.clone(),
            degenerate_columns,
            warnings: report.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// `standardized_players.csv` → `standardized_players.meta.json`.
pub fn meta_path(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("meta.json")
}

/// Writes the CSV and its sidecar. Both are staged under temp names and
/// renamed into place, CSV first. If the sidecar cannot follow, the previous
/// sidecar is removed so it never describes the new CSV.
pub fn write_artifact(
    path: &Path,
    table: &StandardizedFeatureTable,
    meta: &ArtifactMeta,
) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }

    let csv_tmp = path.with_extension("csv.tmp");
    let meta_final = meta_path(path);
    let meta_tmp = meta_final.with_extension("json.tmp");

    let staged =
        write_csv(&csv_tmp, table).and_then(|()| write_meta(&meta_tmp, &meta_final, meta));
    if let Err(err) = staged {
        discard(&[&csv_tmp, &meta_tmp]);
        return Err(err);
    }
    if let Err(source) = fs::rename(&csv_tmp, path) {
        discard(&[&csv_tmp, &meta_tmp]);
        return Err(io_error(path, source));
    }
    if let Err(source) = fs::rename(&meta_tmp, &meta_final) {
        discard(&[&meta_tmp, &meta_final]);
        return Err(io_error(&meta_final, source));
    }
    Ok(())
}

fn write_meta(tmp: &Path, label: &Path, meta: &ArtifactMeta) -> Result<(), ArtifactError> {
    let json = serde_json::to_string_pretty(meta).map_err(|source| ArtifactError::Json {
        path: label.display().to_string(),
        source,
    })?;
    fs::write(tmp, json).map_err(|source| io_error(tmp, source))
}

fn discard(paths: &[&Path]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

fn write_csv(path: &Path, table: &FeatureTable) -> Result<(), ArtifactError> {
    let csv_err = |source: csv::Error| ArtifactError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

    let mut header = vec![
        PLAYER_COLUMN.to_string(),
        POSITION_COLUMN.to_string(),
        MINUTES_COLUMN.to_string(),
    ];
    header.extend(table.feature_names().iter().cloned());
    writer.write_record(&header).map_err(csv_err)?;

    for (identity, values) in table.identities().iter().zip(table.values().rows()) {
        let mut record = Vec::with_capacity(values.len() + 3);
        record.push(identity.player.clone());
        record.push(identity.position.clone().unwrap_or_default());
        record.push(
            identity
                .minutes_played
                .map(|m| m.to_string())
                .unwrap_or_default(),
        );
        record.extend(values.iter().map(|v| v.to_string()));
        writer.write_record(&record).map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|source| io_error(path, source))?;
    Ok(())
}

pub fn read_artifact(
    path: &Path,
    config: &ConsolidationConfig,
) -> Result<StandardizedFeatureTable, ArtifactError> {
    let file = fs::File::open(path).map_err(|source| io_error(path, source))?;
    read_artifact_from(file, &path.display().to_string(), config)
}

/// The first three columns are player, position and minutes played, either
/// exactly or with merge suffixes; everything after is a feature. Blank or
/// non-numeric feature cells read as 0.
pub fn read_artifact_from<R: Read>(
    rdr: R,
    label: &str,
    config: &ConsolidationConfig,
) -> Result<StandardizedFeatureTable, ArtifactError> {
    let csv_err = |source: csv::Error| ArtifactError::Csv {
        path: label.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let header = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();

    for (idx, expected) in [PLAYER_COLUMN, POSITION_COLUMN, MINUTES_COLUMN]
        .into_iter()
        .enumerate()
    {
        let ok = header
            .get(idx)
            .is_some_and(|h| config.is_variant_of(h, expected));
        if !ok {
            return Err(ArtifactError::MissingIdentityColumn {
                path: label.to_string(),
                column: expected.to_string(),
            });
        }
    }

    let feature_names = header[3..].to_vec();
    let mut identities = Vec::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let cell = |idx: usize| record.get(idx).map(str::trim).filter(|s| !s.is_empty());
        let Some(player) = cell(0) else {
            continue;
        };
        identities.push(PlayerIdentity {
            player: player.to_string(),
            position: cell(1).map(|s| s.to_string()),
            minutes_played: cell(2)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite()),
        });
        rows.push(
            (0..feature_names.len())
                .map(|i| coerce_numeric(cell(i + 3)))
                .collect::<Vec<_>>(),
        );
    }

    let values = Array2::from_shape_fn((rows.len(), feature_names.len()), |(r, c)| rows[r][c]);
    Ok(StandardizedFeatureTable::from_standardized(
        FeatureTable::from_aligned(identities, feature_names, values),
    ))
}

pub fn read_meta(csv_path: &Path) -> Result<Option<ArtifactMeta>, ArtifactError> {
    let path = meta_path(csv_path);
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| ArtifactError::Json {
            path: path.display().to_string(),
            source,
        })
}

fn io_error(path: &Path, source: std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_suffixed_identity_columns_and_fills_gaps() {
        let raw = "Player,Position_y,Minutes played_y,Goals,Tackles\n\
                   Ana,CF,900,1.5,\n\
                   Bea,,,-1.5,abc\n";
        let table =
            read_artifact_from(raw.as_bytes(), "mem", &ConsolidationConfig::default()).unwrap();
        assert_eq!(table.feature_names(), ["Goals", "Tackles"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.identity(0).unwrap().position.as_deref(), Some("CF"));
        assert_eq!(table.identity(0).unwrap().minutes_played, Some(900.0));
        assert_eq!(table.identity(1).unwrap().position, None);
        assert_eq!(table.column("Tackles").unwrap().to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn identity_header_must_match_by_name() {
        let raw = "Player,Positional play,Minutes played,Goals\nAna,3,900,1\n";
        let err = read_artifact_from(raw.as_bytes(), "mem", &ConsolidationConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::MissingIdentityColumn { ref column, .. } if column == POSITION_COLUMN
        ));
    }

    #[test]
    fn missing_identity_header_is_rejected() {
        let raw = "Player,Goals\nAna,1\n";
        let err = read_artifact_from(raw.as_bytes(), "mem", &ConsolidationConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::MissingIdentityColumn { ref column, .. } if column == POSITION_COLUMN
        ));
    }
}
