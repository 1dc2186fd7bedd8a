//! Rolling-window feature views
//!
//! SQL views over the canonical tables that turn box scores into pre-game
//! features. They are recreated inside every store rebuild.

pub mod player_form;
pub mod team_form;

use rusqlite::Connection;

/// Base training dataset view name
pub const BASE_DATASET: &str = "v_training_dataset";
/// Training dataset with player enrichment
pub const ENRICHED_DATASET: &str = "v_training_dataset_enriched";

/// Every view this crate creates, dependents first (drop order)
pub const ALL_VIEWS: &[&str] = &[
    "v_training_dataset_enriched",
    "v_player_team_features",
    "v_player_form",
    "v_training_dataset",
    "v_team_form",
    "v_games",
    "v_teams",
];

const NAMED_VIEWS: &str = r#"
CREATE VIEW v_teams AS
SELECT team_id, full_name, abbreviation, city, state, year_founded FROM teams;

CREATE VIEW v_games AS
SELECT game_id, game_date, season, team_id, opponent_team_id, is_home, wl FROM games;
"#;

/// Drop every feature view
pub fn drop_views(conn: &Connection) -> rusqlite::Result<()> {
    for view in ALL_VIEWS {
        conn.execute_batch(&format!("DROP VIEW IF EXISTS {};", view))?;
    }
    Ok(())
}

/// Create the feature views for the tables present in this run
pub fn create_views(conn: &Connection, has_players: bool) -> rusqlite::Result<()> {
    conn.execute_batch(NAMED_VIEWS)?;
    conn.execute_batch(team_form::TEAM_FORM_VIEW)?;
    conn.execute_batch(team_form::TRAINING_DATASET_VIEW)?;

    if has_players {
        conn.execute_batch(player_form::PLAYER_FORM_VIEW)?;
        conn.execute_batch(player_form::PLAYER_TEAM_FEATURES_VIEW)?;
        conn.execute_batch(player_form::ENRICHED_DATASET_VIEW)?;
    }
    Ok(())
}

/// Dataset view to train on for a run
pub fn dataset_view(has_players: bool) -> &'static str {
    if has_players {
        ENRICHED_DATASET
    } else {
        BASE_DATASET
    }
}
