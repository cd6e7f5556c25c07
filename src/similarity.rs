use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ndarray::Axis;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::{DEFAULT_DIMENSIONS, DEFAULT_NEIGHBORS};
use crate::error::QueryError;
use crate::feature_table::StandardizedFeatureTable;
use crate::neighbors::NeighborIndex;
use crate::pca::PcaProjection;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimilarityQuery {
    pub player: String,
    pub features: Vec<String>,
    pub dimensions: usize,
    pub neighbors: usize,
}

impl SimilarityQuery {
    pub fn new<I, S>(player: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            player: player.into(),
            features: features.into_iter().map(Into::into).collect(),
            dimensions: DEFAULT_DIMENSIONS,
            neighbors: DEFAULT_NEIGHBORS,
        }
    }

    /// Every feature column in the table is selected.
    pub fn all_features(table: &StandardizedFeatureTable, player: impl Into<String>) -> Self {
        Self::new(player, table.feature_names().iter().cloned())
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Stable fingerprint of the query for callers that memoize results.
    /// Feature order and duplicates do not change the key.
    pub fn cache_key(&self) -> String {
        let features: BTreeSet<&str> = self.features.iter().map(|f| f.as_str()).collect();
        let mut hasher = Sha256::new();
        hasher.update(self.player.as_bytes());
        for feature in features {
            hasher.update([0u8]);
            hasher.update(feature.as_bytes());
        }
        hasher.update([0u8]);
        hasher.update((self.dimensions as u64).to_le_bytes());
        hasher.update((self.neighbors as u64).to_le_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPlayer {
    pub row: usize,
    pub player: String,
    pub position: Option<String>,
    pub minutes_played: Option<f64>,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub query_row: usize,
    pub player: String,
    pub position: Option<String>,
    pub minutes_played: Option<f64>,
    /// Selected features in table order.
    pub features: Vec<String>,
    /// Dimensions actually used after clamping.
    pub dimensions: usize,
    pub explained_variance_ratio: f64,
    pub neighbors: Vec<SimilarPlayer>,
}

/// Upper bound for the dimension control: `min(selected, population)`, never
/// below 1.
pub fn max_dimensions(selected: usize, population: usize) -> usize {
    selected.min(population).max(1)
}

pub fn clamp_dimensions(requested: usize, selected: usize, population: usize) -> usize {
    requested.clamp(1, max_dimensions(selected, population))
}

/// Nearest players to `query.player` in the PCA space of the selected
/// features. The query player is never part of the result.
pub fn find_similar(
    table: &StandardizedFeatureTable,
    query: &SimilarityQuery,
) -> Result<SimilarityResult, QueryError> {
    ReducedSpace::fit(table, &query.features, query.dimensions)?
        .neighbors_of(&query.player, query.neighbors)
}

/// The selected features of every player projected onto their principal
/// components, with a neighbour index over the result. Owned by one query
/// (or one batch of queries sharing the same selection) and then dropped.
#[derive(Debug, Clone)]
pub struct ReducedSpace<'t> {
    table: &'t StandardizedFeatureTable,
    columns: Vec<usize>,
    dimensions: usize,
    explained_variance_ratio: f64,
    index: NeighborIndex,
}

impl<'t> ReducedSpace<'t> {
    /// `dimensions` is clamped into `[1, min(selected, population)]`.
    pub fn fit(
        table: &'t StandardizedFeatureTable,
        features: &[String],
        dimensions: usize,
    ) -> Result<Self, QueryError> {
        if features.is_empty() {
            return Err(QueryError::EmptySelection);
        }
        let mut columns = BTreeSet::new();
        for name in features {
            let col = table
                .feature_index(name)
                .ok_or_else(|| QueryError::UnknownFeature(name.clone()))?;
            columns.insert(col);
        }
        let columns = columns.into_iter().collect::<Vec<_>>();

        let selected = table
            .values()
            .select(Axis(1), &columns)
            .mapv(|v| if v.is_finite() { v } else { 0.0 });
        let dimensions = clamp_dimensions(dimensions, columns.len(), table.len());
        let pca = PcaProjection::fit_transform(selected.view(), dimensions);
        let explained_variance_ratio = pca.total_explained_ratio();

        Ok(Self {
            table,
            columns,
            dimensions,
            explained_variance_ratio,
            index: NeighborIndex::new(pca.projected),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn explained_variance_ratio(&self) -> f64 {
        self.explained_variance_ratio
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|&c| self.table.feature_names()[c].clone())
            .collect()
    }

    /// Asks the index for `k + 1` points, since the player is always its own
    /// nearest point, then drops the player's own row.
    pub fn neighbors_of(&self, player: &str, k: usize) -> Result<SimilarityResult, QueryError> {
        let query_row = self
            .table
            .row_of(player)
            .ok_or_else(|| QueryError::PlayerNotFound(player.to_string()))?;

        let neighbors = match self.index.point(query_row) {
            Some(point) => self
                .index
                .nearest(point, k.saturating_add(1))
                .into_iter()
                .filter(|hit| hit.row != query_row)
                .take(k)
                .filter_map(|hit| {
                    self.table.identity(hit.row).map(|id| SimilarPlayer {
                        row: hit.row,
                        player: id.player.clone(),
                        position: id.position.clone(),
                        minutes_played: id.minutes_played,
                        distance: hit.distance,
                    })
                })
                .collect(),
            None => Vec::new(),
        };

        let identity = self.table.identity(query_row);
        Ok(SimilarityResult {
            query_row,
            player: player.to_string(),
            position: identity.and_then(|id| id.position.clone()),
            minutes_played: identity.and_then(|id| id.minutes_played),
            features: self.feature_names(),
            dimensions: self.dimensions,
            explained_variance_ratio: self.explained_variance_ratio,
            neighbors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_stays_in_range() {
        assert_eq!(clamp_dimensions(0, 4, 10), 1);
        assert_eq!(clamp_dimensions(3, 4, 10), 3);
        assert_eq!(clamp_dimensions(9, 4, 10), 4);
        assert_eq!(clamp_dimensions(9, 40, 3), 3);
        assert_eq!(max_dimensions(0, 0), 1);
    }

    #[test]
    fn cache_key_ignores_feature_order_and_duplicates() {
        let a = SimilarityQuery::new("Ana", ["Goals", "Tackles"]);
        let b = SimilarityQuery::new("Ana", ["Tackles", "Goals", "Goals"]);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), a.clone().with_dimensions(2).cache_key());
        assert_ne!(
            a.cache_key(),
            SimilarityQuery::new("Bea", ["Goals", "Tackles"]).cache_key()
        );
    }
}
