//! Standard table bundle
//!
//! Reads the raw exports, runs the standardizers in dependency order
//! (teams → games → players → player-games) and returns the canonical tables.

use std::path::{Path, PathBuf};

use crate::data::columns::RawTable;
use crate::data::standardize::{
    standardize_games, standardize_player_games, standardize_players, standardize_teams,
    GameTeamRow, Player, PlayerGameRow, Team, TeamAbbreviations,
};
use crate::{DataConfig, Result};

/// Player enrichment tables; present as a pair or not at all
#[derive(Debug, Clone)]
pub struct PlayerTables {
    pub players: Vec<Player>,
    pub player_games: Vec<PlayerGameRow>,
}

/// Canonical tables produced by one pipeline run
#[derive(Debug, Clone)]
pub struct StandardTables {
    pub teams: Vec<Team>,
    pub games: Vec<GameTeamRow>,
    pub player_enrichment: Option<PlayerTables>,
}

impl StandardTables {
    pub fn has_players(&self) -> bool {
        self.player_enrichment.is_some()
    }
}

/// Raw input files for one run
#[derive(Debug, Clone)]
pub struct TablePaths {
    pub teams: PathBuf,
    pub games: PathBuf,
    pub players: Option<PathBuf>,
    pub player_games: Option<PathBuf>,
}

impl TablePaths {
    /// Locate the raw exports inside the configured data directory
    ///
    /// Player files are included only when they exist on disk.
    pub fn from_config(data: &DataConfig) -> Self {
        let dir = Path::new(&data.data_dir);
        let existing = |name: &str| Some(dir.join(name)).filter(|p| p.exists());
        TablePaths {
            teams: dir.join(&data.teams_file),
            games: dir.join(&data.games_file),
            players: existing(&data.players_file),
            player_games: existing(&data.player_games_file),
        }
    }
}

/// Build the canonical tables from raw CSV exports
///
/// Teams and games are mandatory. Players and player-games are used only when
/// both are supplied; a lone one is ignored and the run proceeds without
/// player enrichment.
pub fn build_standard_tables(paths: &TablePaths) -> Result<StandardTables> {
    let teams_raw = RawTable::from_path("teams", &paths.teams)?;
    let games_raw = RawTable::from_path("games", &paths.games)?;

    let player_raw = match (&paths.players, &paths.player_games) {
        (Some(players), Some(player_games)) => Some((
            RawTable::from_path("players", players)?,
            RawTable::from_path("player_games", player_games)?,
        )),
        (None, None) => None,
        (Some(_), None) | (None, Some(_)) => {
            log::warn!("Only one of players/player_games supplied; skipping player enrichment");
            None
        }
    };

    standardize_all(&teams_raw, &games_raw, player_raw.as_ref().map(|(p, pg)| (p, pg)))
}

/// Run every standardizer over already-read raw tables
pub fn standardize_all(
    teams_raw: &RawTable,
    games_raw: &RawTable,
    player_raw: Option<(&RawTable, &RawTable)>,
) -> Result<StandardTables> {
    let teams = standardize_teams(teams_raw)?.rows;
    let abbreviations = TeamAbbreviations::from_teams(&teams);

    let games = standardize_games(games_raw, Some(&abbreviations))?.rows;

    let player_enrichment = match player_raw {
        Some((players_raw, player_games_raw)) => Some(PlayerTables {
            players: standardize_players(players_raw)?.rows,
            player_games: standardize_player_games(player_games_raw, &abbreviations)?.rows,
        }),
        None => None,
    };

    Ok(StandardTables {
        teams,
        games,
        player_enrichment,
    })
}
