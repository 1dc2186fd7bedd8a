//! Entity standardizers
//!
//! Each standardizer is a pure function from a [`RawTable`] (plus, for
//! game-level tables, the team abbreviation map) to a canonical table.
//! Required columns that cannot be resolved are schema errors; rows missing a
//! required value after coercion are dropped and counted.
//!
//! Ordering: teams must be standardized first, since the abbreviation map is
//! built from the canonical teams table and feeds games and player-games.

pub mod games;
pub mod player_games;
pub mod players;
pub mod teams;

pub use games::{standardize_games, GameTeamRow};
pub use player_games::{standardize_player_games, PlayerGameRow};
pub use players::{standardize_players, Player};
pub use teams::{standardize_teams, Team, TeamAbbreviations};

use serde::{Deserialize, Serialize};

use crate::data::cells::{parse_bool, parse_float, parse_int};
use crate::data::columns::{Column, RawTable};
use crate::data::matchup::Matchup;
use crate::{HoopsError, Result, TeamId};

/// Output of a standardizer: the canonical rows and how many raw rows were
/// dropped for missing required values
#[derive(Debug, Clone)]
pub struct Standardized<T> {
    pub rows: Vec<T>,
    pub dropped: usize,
}

impl<T> Standardized<T> {
    pub(crate) fn log_summary(&self, table: &str) {
        if self.dropped > 0 {
            log::info!(
                "{}: kept {} rows, dropped {} incomplete rows",
                table,
                self.rows.len(),
                self.dropped
            );
        } else {
            log::info!("{}: kept {} rows", table, self.rows.len());
        }
    }
}

/// Box-score numerics shared by team and player rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub pts: Option<f64>,
    pub fg_pct: Option<f64>,
    pub fg3_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub reb: Option<f64>,
    pub ast: Option<f64>,
    pub tov: Option<f64>,
}

/// Resolved (optional) box-score columns of a raw table
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoxScoreColumns {
    pts: Option<Column>,
    fg_pct: Option<Column>,
    fg3_pct: Option<Column>,
    ft_pct: Option<Column>,
    reb: Option<Column>,
    ast: Option<Column>,
    tov: Option<Column>,
}

impl BoxScoreColumns {
    pub(crate) fn resolve(table: &RawTable) -> Self {
        BoxScoreColumns {
            pts: table.resolve(&["pts", "points"]),
            fg_pct: table.resolve(&["fg_pct", "fg%"]),
            fg3_pct: table.resolve(&["fg3_pct", "fg3%", "3p%"]),
            ft_pct: table.resolve(&["ft_pct", "ft%"]),
            reb: table.resolve(&["reb", "trb"]),
            ast: table.resolve(&["ast"]),
            tov: table.resolve(&["tov", "to"]),
        }
    }

    pub(crate) fn read(&self, table: &RawTable, row: usize) -> BoxScore {
        BoxScore {
            pts: float_cell(table, row, self.pts),
            fg_pct: float_cell(table, row, self.fg_pct),
            fg3_pct: float_cell(table, row, self.fg3_pct),
            ft_pct: float_cell(table, row, self.ft_pct),
            reb: float_cell(table, row, self.reb),
            ast: float_cell(table, row, self.ast),
            tov: float_cell(table, row, self.tov),
        }
    }
}

pub(crate) fn float_cell(table: &RawTable, row: usize, column: Option<Column>) -> Option<f64> {
    table.optional_cell(row, column).and_then(parse_float)
}

pub(crate) fn int_cell(table: &RawTable, row: usize, column: Option<Column>) -> Option<i64> {
    table.optional_cell(row, column).and_then(parse_int)
}

/// How a game-level table identifies each row's opponent and venue
pub(crate) enum OpponentColumns<'a> {
    /// An explicit opponent id column, with an optional home flag column
    Explicit {
        opponent: Column,
        home: Option<Column>,
    },
    /// Parsed from matchup text and mapped through team abbreviations
    Matchup {
        matchup: Column,
        abbreviations: &'a TeamAbbreviations,
    },
}

/// Opponent identity and venue for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Opponent {
    pub team_id: Option<TeamId>,
    /// `None` only when the venue itself could not be determined
    pub is_home: Option<bool>,
}

impl<'a> OpponentColumns<'a> {
    pub(crate) fn resolve(
        table: &RawTable,
        abbreviations: Option<&'a TeamAbbreviations>,
    ) -> Result<Self> {
        if let Some(opponent) = table.resolve(&["opponent_team_id", "opp_team_id"]) {
            return Ok(OpponentColumns::Explicit {
                opponent,
                home: table.resolve(&["is_home", "home"]),
            });
        }

        let matchup = table.resolve(&["matchup"]).ok_or(HoopsError::MissingColumn {
            table: table.name(),
            field: "opponent",
            aliases: vec!["opponent_team_id", "opp_team_id", "matchup"],
        })?;

        let abbreviations = abbreviations.ok_or_else(|| {
            HoopsError::MissingPrerequisite(format!(
                "{} has no opponent id column; standardize teams first to map matchup abbreviations",
                table.name()
            ))
        })?;
        if abbreviations.is_empty() {
            return Err(HoopsError::MissingPrerequisite(format!(
                "{} resolves opponents from matchup text but no team abbreviations are loaded",
                table.name()
            )));
        }

        Ok(OpponentColumns::Matchup {
            matchup,
            abbreviations,
        })
    }

    pub(crate) fn read(&self, table: &RawTable, row: usize) -> Opponent {
        match self {
            OpponentColumns::Explicit { opponent, home } => Opponent {
                team_id: table.cell(row, *opponent).and_then(parse_int).map(TeamId),
                is_home: table.optional_cell(row, *home).and_then(parse_bool),
            },
            OpponentColumns::Matchup {
                matchup,
                abbreviations,
            } => {
                let parsed = Matchup::parse(table.cell(row, *matchup));
                Opponent {
                    team_id: parsed.opponent().and_then(|a| abbreviations.get(a)),
                    is_home: parsed.is_home(),
                }
            }
        }
    }
}
