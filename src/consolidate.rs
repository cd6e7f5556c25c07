use std::collections::{BTreeMap, HashMap, HashSet};

use ndarray::Array2;

use crate::config::{ConsolidationConfig, MINUTES_COLUMN, PLAYER_COLUMN, POSITION_COLUMN};
use crate::error::{ConsolidationError, ConsolidationWarning};
use crate::feature_table::{FeatureTable, PlayerIdentity, StandardizedFeatureTable};
use crate::standardize::{self, ColumnStats};
use crate::stat_table::{Category, RawStatTable, Workbook};

/// Wide table after the joins, before any column is dropped. Rows are sorted
/// by player name; `cells[row][col]` is `None` where a sheet had no value.
#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    pub players: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Option<String>>>,
}

impl MergedTable {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsolidationReport {
    pub players: usize,
    pub merged_columns: usize,
    pub features: usize,
    pub dropped_columns: Vec<String>,
    pub column_stats: Vec<ColumnStats>,
    pub warnings: Vec<ConsolidationWarning>,
}

#[derive(Debug, Clone)]
pub struct Consolidation {
    pub table: StandardizedFeatureTable,
    pub report: ConsolidationReport,
}

/// Looks the six sheets up by name, then runs [`consolidate`].
pub fn consolidate_workbook(
    workbook: &Workbook,
    config: &ConsolidationConfig,
) -> Result<Consolidation, ConsolidationError> {
    let mut categories = HashMap::new();
    for category in Category::PERFORMANCE {
        let table = workbook
            .category(category)
            .ok_or_else(|| ConsolidationError::MissingCategory(category.sheet_name().to_string()))?;
        categories.insert(category, table.clone());
    }
    let general = workbook.category(Category::General).ok_or_else(|| {
        ConsolidationError::MissingCategory(Category::General.sheet_name().to_string())
    })?;
    consolidate(&categories, general, config)
}

pub fn consolidate(
    categories: &HashMap<Category, RawStatTable>,
    general: &RawStatTable,
    config: &ConsolidationConfig,
) -> Result<Consolidation, ConsolidationError> {
    let mut warnings = Vec::new();
    let (merged, identity_columns) = merge_tables(categories, general, config, &mut warnings)?;
    let (table, dropped_columns) = build_feature_table(&merged, &identity_columns, config);

    let merged_columns = merged.columns.len();
    let features = table.feature_names().len();
    let standardized = standardize::standardize(table);
    warnings.extend(standardized.warnings);

    let report = ConsolidationReport {
        players: standardized.table.len(),
        merged_columns,
        features,
        dropped_columns,
        column_stats: standardized.stats,
        warnings,
    };
    Ok(Consolidation {
        table: standardized.table,
        report,
    })
}

/// Final names the General identity columns received in the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityColumns {
    pub position: String,
    pub minutes_played: String,
}

/// Outer-joins the performance sheets on `Player`, then left-joins the
/// identity columns of General.
pub fn merge_tables(
    categories: &HashMap<Category, RawStatTable>,
    general: &RawStatTable,
    config: &ConsolidationConfig,
    warnings: &mut Vec<ConsolidationWarning>,
) -> Result<(MergedTable, IdentityColumns), ConsolidationError> {
    let mut columns: Vec<String> = Vec::new();
    let mut rows: BTreeMap<String, Vec<Option<String>>> = BTreeMap::new();

    for category in Category::PERFORMANCE {
        let table = categories
            .get(&category)
            .ok_or_else(|| ConsolidationError::MissingCategory(category.sheet_name().to_string()))?;
        let keyed = keyed_rows(table, category.sheet_name(), None, warnings)?;
        join(&mut columns, &mut rows, keyed, config, JoinKind::Outer);
    }

    let general_keep = [POSITION_COLUMN, MINUTES_COLUMN];
    let keyed = keyed_rows(
        general,
        Category::General.sheet_name(),
        Some(general_keep.as_slice()),
        warnings,
    )?;
    let renamed = join(&mut columns, &mut rows, keyed, config, JoinKind::Left);
    let identity = IdentityColumns {
        position: renamed[0].clone(),
        minutes_played: renamed[1].clone(),
    };

    let mut merged = MergedTable {
        players: Vec::with_capacity(rows.len()),
        columns,
        cells: Vec::with_capacity(rows.len()),
    };
    for (player, cells) in rows {
        merged.players.push(player);
        merged.cells.push(cells);
    }
    Ok((merged, identity))
}

/// Drops excluded columns and coerces the rest to numbers.
/// Returns the unstandardized table and the names of dropped columns.
pub fn build_feature_table(
    merged: &MergedTable,
    identity: &IdentityColumns,
    config: &ConsolidationConfig,
) -> (FeatureTable, Vec<String>) {
    let position_idx = merged.column_index(&identity.position);
    let minutes_idx = merged.column_index(&identity.minutes_played);

    let mut feature_cols = Vec::new();
    let mut dropped = Vec::new();
    for (idx, name) in merged.columns.iter().enumerate() {
        if Some(idx) == position_idx || Some(idx) == minutes_idx {
            continue;
        }
        if config.excludes(name) {
            dropped.push(name.clone());
        } else {
            feature_cols.push(idx);
        }
    }

    let identities = merged
        .players
        .iter()
        .zip(&merged.cells)
        .map(|(player, cells)| PlayerIdentity {
            player: player.clone(),
            position: position_idx
                .and_then(|i| cells[i].as_deref())
                .map(|s| s.trim().to_string()),
            minutes_played: minutes_idx
                .and_then(|i| cells[i].as_deref())
                .and_then(parse_finite),
        })
        .collect::<Vec<_>>();

    let feature_names = feature_cols
        .iter()
        .map(|&idx| merged.columns[idx].clone())
        .collect::<Vec<_>>();
    let values = Array2::from_shape_fn((merged.players.len(), feature_cols.len()), |(r, c)| {
        coerce_numeric(merged.cells[r][feature_cols[c]].as_deref())
    });

    (
        FeatureTable::from_aligned(identities, feature_names, values),
        dropped,
    )
}

/// Anything that does not parse as a finite number becomes `0.0`.
pub fn coerce_numeric(raw: Option<&str>) -> f64 {
    raw.and_then(parse_finite).unwrap_or(0.0)
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinKind {
    Outer,
    Left,
}

struct KeyedRows {
    columns: Vec<String>,
    rows: HashMap<String, Vec<Option<String>>>,
}

fn keyed_rows(
    table: &RawStatTable,
    category: &str,
    keep: Option<&[&str]>,
    warnings: &mut Vec<ConsolidationWarning>,
) -> Result<KeyedRows, ConsolidationError> {
    let missing = |column: &str| ConsolidationError::MissingColumn {
        category: category.to_string(),
        column: column.to_string(),
    };
    let key_idx = table
        .column_index(PLAYER_COLUMN)
        .ok_or_else(|| missing(PLAYER_COLUMN))?;

    let value_cols: Vec<usize> = match keep {
        Some(keep) => keep
            .iter()
            .map(|&name| table.column_index(name).ok_or_else(|| missing(name)))
            .collect::<Result<_, _>>()?,
        None => (0..table.headers.len()).filter(|&i| i != key_idx).collect(),
    };

    let columns = unique_headers(value_cols.iter().map(|&i| table.headers[i].as_str()));
    let mut rows = HashMap::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let Some(player) = table.cell(row, key_idx).map(|p| p.trim().to_string()) else {
            warnings.push(ConsolidationWarning::BlankPlayer {
                category: category.to_string(),
            });
            continue;
        };
        if rows.contains_key(&player) {
            warnings.push(ConsolidationWarning::DuplicatePlayer {
                category: category.to_string(),
                player,
            });
            continue;
        }
        let cells = value_cols
            .iter()
            .map(|&col| table.cell(row, col).map(|s| s.to_string()))
            .collect();
        rows.insert(player, cells);
    }
    Ok(KeyedRows { columns, rows })
}

/// Joins `right` into the accumulated table and returns the final names of
/// the right-hand columns. On a name clash both sides get a suffix, repeated
/// until the name is free.
fn join(
    columns: &mut Vec<String>,
    rows: &mut BTreeMap<String, Vec<Option<String>>>,
    right: KeyedRows,
    config: &ConsolidationConfig,
    kind: JoinKind,
) -> Vec<String> {
    let mut taken: HashSet<String> = columns.iter().cloned().collect();
    taken.extend(right.columns.iter().cloned());

    let mut right_names = Vec::with_capacity(right.columns.len());
    for name in &right.columns {
        match columns.iter().position(|c| c == name) {
            Some(left_idx) => {
                let left_name = free_name(name, &config.left_suffix, &mut taken);
                let right_name = free_name(name, &config.right_suffix, &mut taken);
                columns[left_idx] = left_name;
                right_names.push(right_name);
            }
            None => right_names.push(name.clone()),
        }
    }

    let left_width = columns.len();
    let right_width = right_names.len();
    let KeyedRows {
        rows: mut right_rows,
        ..
    } = right;

    for (player, cells) in rows.iter_mut() {
        match right_rows.remove(player) {
            Some(extra) => cells.extend(extra),
            None => cells.extend(std::iter::repeat_n(None, right_width)),
        }
    }
    if kind == JoinKind::Outer {
        for (player, extra) in right_rows {
            let mut cells = vec![None; left_width];
            cells.extend(extra);
            rows.insert(player, cells);
        }
    }

    columns.extend(right_names.iter().cloned());
    right_names
}

/// Repeats of a header within one sheet become `name.1`, `name.2`, ...
fn unique_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::from([PLAYER_COLUMN.to_string()]);
    let mut out = Vec::new();
    for name in headers {
        let mut candidate = name.to_string();
        let mut n = 0;
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{name}.{n}");
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

fn free_name(base: &str, suffix: &str, taken: &mut HashSet<String>) -> String {
    let mut name = format!("{base}{suffix}");
    while taken.contains(&name) {
        name.push_str(suffix);
    }
    taken.insert(name.clone());
    name
}
