//! Basketball box-score standardization and win prediction
//!
//! Normalizes loosely-schematized box-score CSV exports into canonical tables,
//! rebuilds a SQLite feature store from them, and trains a binary win/loss
//! classifier over a strictly chronological train/validation/test split.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a franchise
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Unique identifier for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player({})", self.0)
    }
}

/// Result of a game from one participant's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    /// Parse a W/L cell, case and whitespace insensitive
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "W" => Some(Outcome::Win),
            "L" => Some(Outcome::Loss),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Loss => "L",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum HoopsError {
    #[error(
        "Could not find a {field} column in the {table} table. Expected one of: {}",
        aliases.join("/")
    )]
    MissingColumn {
        table: &'static str,
        field: &'static str,
        aliases: Vec<&'static str>,
    },

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store has no completed rebuild: {0}")]
    IncompleteStore(String),

    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    #[error("The {0} partition is empty")]
    EmptyPartition(&'static str),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Model not trained - run `hoops train` first")]
    NoModel,

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, HoopsError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub split: SplitConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_dir: String,
    pub database_path: String,
    pub artifacts_dir: String,
    pub teams_file: String,
    pub games_file: String,
    pub players_file: String,
    pub player_games_file: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub val_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub seed: u64,
    pub logistic: LogisticConfig,
    pub mlp: MlpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticConfig {
    pub epochs: usize,
    pub learning_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    pub hidden_dims: Vec<usize>,
    pub dropout: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                data_dir: "data".to_string(),
                database_path: "data/hoops.db".to_string(),
                artifacts_dir: "artifacts".to_string(),
                teams_file: "NBA_TEAMS.csv".to_string(),
                games_file: "NBA_GAMES.csv".to_string(),
                players_file: "NBA_PLAYERS.csv".to_string(),
                player_games_file: "NBA_PLAYER_GAMES.csv".to_string(),
            },
            split: SplitConfig {
                test_fraction: 0.2,
                val_fraction: 0.1,
            },
            training: TrainingConfig {
                seed: 42,
                logistic: LogisticConfig {
                    epochs: 500,
                    learning_rate: 0.1,
                },
                mlp: MlpConfig {
                    hidden_dims: vec![32, 16],
                    dropout: 0.1,
                    epochs: 60,
                    batch_size: 256,
                    learning_rate: 1e-3,
                },
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HoopsError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| HoopsError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HoopsError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
