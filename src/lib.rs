pub mod artifact;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod feature_table;
pub mod neighbors;
pub mod pca;
pub mod report;
pub mod similarity;
pub mod standardize;
pub mod stat_table;
pub mod synthetic;
