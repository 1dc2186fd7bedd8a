//! Data ingestion and storage
//!
//! Schema-tolerant CSV standardization and SQLite store management.

pub mod bundle;
pub mod cells;
pub mod columns;
pub mod database;
pub mod dataset;
pub mod matchup;
pub mod season;
pub mod standardize;

pub use bundle::{build_standard_tables, PlayerTables, StandardTables, TablePaths};
pub use columns::RawTable;
pub use database::{Database, DatabaseStats, PipelineRun};
pub use dataset::{FeatureDataset, FeatureMatrix, FeatureRow};
pub use matchup::Matchup;
pub use standardize::BoxScore;
