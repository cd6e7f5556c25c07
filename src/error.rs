use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsolidationError {
    #[error("missing required category sheet: {0}")]
    MissingCategory(String),

    #[error("sheet {category} has no {column} column")]
    MissingColumn { category: String, column: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("player not found: {0}")]
    PlayerNotFound(String),

    /// Nothing selected, so there is nothing to compare on. Callers treat this
    /// as an idle state rather than a failure.
    #[error("no features selected")]
    EmptySelection,

    #[error("unknown feature: {0}")]
    UnknownFeature(String),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("metadata error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("artifact {path} is missing identity column {column}")]
    MissingIdentityColumn { path: String, column: String },
}

/// Non-fatal problems found while consolidating. They never stop the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsolidationWarning {
    /// Constant column; every standardized value was set to the fallback.
    DegenerateColumn(String),
    DuplicatePlayer { category: String, player: String },
    BlankPlayer { category: String },
}

impl fmt::Display for ConsolidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateColumn(name) => {
                write!(f, "zero-variance column {name} standardized to fallback")
            }
            Self::DuplicatePlayer { category, player } => {
                write!(f, "{category}: duplicate row for {player} ignored")
            }
            Self::BlankPlayer { category } => write!(f, "{category}: row without player skipped"),
        }
    }
}
