use std::collections::HashMap;
use std::ops::Deref;

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2, ErrorKind, ShapeError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub player: String,
    pub position: Option<String>,
    pub minutes_played: Option<f64>,
}

impl PlayerIdentity {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            position: None,
            minutes_played: None,
        }
    }
}

/// Players × features. Row order never changes after construction.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    identities: Vec<PlayerIdentity>,
    feature_names: Vec<String>,
    values: Array2<f64>,
    row_by_player: HashMap<String, usize>,
    col_by_feature: HashMap<String, usize>,
}

impl FeatureTable {
    pub fn new(
        identities: Vec<PlayerIdentity>,
        feature_names: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self, ShapeError> {
        if values.nrows() != identities.len() || values.ncols() != feature_names.len() {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape));
        }
        Ok(Self::from_aligned(identities, feature_names, values))
    }

    /// Caller guarantees `values` is `identities.len() × feature_names.len()`.
    pub(crate) fn from_aligned(
        identities: Vec<PlayerIdentity>,
        feature_names: Vec<String>,
        values: Array2<f64>,
    ) -> Self {
        debug_assert_eq!(values.dim(), (identities.len(), feature_names.len()));
        let mut row_by_player = HashMap::with_capacity(identities.len());
        for (row, identity) in identities.iter().enumerate() {
            row_by_player.entry(identity.player.clone()).or_insert(row);
        }
        let mut col_by_feature = HashMap::with_capacity(feature_names.len());
        for (col, name) in feature_names.iter().enumerate() {
            col_by_feature.entry(name.clone()).or_insert(col);
        }
        Self {
            identities,
            feature_names,
            values,
            row_by_player,
            col_by_feature,
        }
    }

    pub fn from_rows(
        identities: Vec<PlayerIdentity>,
        feature_names: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, ShapeError> {
        let width = feature_names.len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape));
        }
        let flat = rows.into_iter().flatten().collect::<Vec<_>>();
        let values = Array2::from_shape_vec((identities.len(), width), flat)?;
        Self::new(identities, feature_names, values)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn identities(&self) -> &[PlayerIdentity] {
        &self.identities
    }

    pub fn identity(&self, row: usize) -> Option<&PlayerIdentity> {
        self.identities.get(row)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Exact, case-sensitive. With duplicate names the first row wins.
    pub fn row_of(&self, player: &str) -> Option<usize> {
        self.row_by_player.get(player).copied()
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.col_by_feature.get(name).copied()
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.feature_index(name)
            .map(|col| self.values.column(col))
    }

    pub fn search_players(&self, query: &str) -> Vec<&PlayerIdentity> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.identities.iter().collect();
        }
        self.identities
            .iter()
            .filter(|id| id.player.to_lowercase().contains(&needle))
            .collect()
    }

    pub(crate) fn values_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.values.view_mut()
    }
}

#[derive(Debug, Clone)]
pub struct StandardizedFeatureTable {
    table: FeatureTable,
}

impl StandardizedFeatureTable {
    pub fn from_standardized(table: FeatureTable) -> Self {
        Self { table }
    }
}

impl Deref for StandardizedFeatureTable {
    type Target = FeatureTable;

    fn deref(&self) -> &Self::Target {
        &self.table
    }
}
