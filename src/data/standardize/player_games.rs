//! Player-games standardizer
//!
//! One canonical row per (player, game) appearance. Team, opponent and venue
//! are resolved the same way as for games; when the export has no team id
//! column the team comes from the matchup's first token.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::games::GAME_DATE_ALIASES;
use super::{
    float_cell, BoxScore, BoxScoreColumns, OpponentColumns, Standardized, TeamAbbreviations,
};
use crate::data::cells::{parse_date, parse_int, parse_minutes};
use crate::data::columns::RawTable;
use crate::data::matchup::Matchup;
use crate::data::season::{parse_season, resolve_seasons, SeasonSource};
use crate::{HoopsError, Outcome, PlayerId, Result, TeamId};

/// A player's appearance in a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameRow {
    pub player_id: PlayerId,
    pub game_id: String,
    pub game_date: NaiveDate,
    pub season: i32,
    pub team_id: TeamId,
    pub opponent_team_id: TeamId,
    pub is_home: bool,
    pub wl: Option<Outcome>,
    /// Minutes played, from numeric or `MM:SS` text
    pub minutes: Option<f64>,
    pub plus_minus: Option<f64>,
    pub stl: Option<f64>,
    pub blk: Option<f64>,
    pub pf: Option<f64>,
    pub box_score: BoxScore,
}

/// Standardize a raw player-games table
///
/// Takes the abbreviation map built from standardized teams. Resolving
/// matchup text against an empty map is a `MissingPrerequisite` error.
pub fn standardize_player_games(
    raw: &RawTable,
    abbreviations: &TeamAbbreviations,
) -> Result<Standardized<PlayerGameRow>> {
    let player_col = raw.require("player id", &["player_id", "playerid", "person_id"])?;
    let game_id_col = raw.require("game id", &["game_id", "id"])?;
    let date_col = raw.require("game date", GAME_DATE_ALIASES)?;
    let wl_col = raw.require("win/loss", &["wl", "w_l"])?;
    let season_col = raw.resolve(&["season_id", "season"]);
    let team_col = raw.resolve(&["team_id"]);
    let matchup_col = raw.resolve(&["matchup"]);
    let opponent_cols = OpponentColumns::resolve(raw, Some(abbreviations))?;

    if team_col.is_none() && matchup_col.is_none() {
        return Err(HoopsError::MissingColumn {
            table: raw.name(),
            field: "team",
            aliases: vec!["team_id", "matchup"],
        });
    }

    let min_col = raw.resolve(&["min", "minutes"]);
    let pm_col = raw.resolve(&["plus_minus", "+/-"]);
    let stl_col = raw.resolve(&["stl"]);
    let blk_col = raw.resolve(&["blk"]);
    let pf_col = raw.resolve(&["pf"]);
    let stat_cols = BoxScoreColumns::resolve(raw);

    let dates: Vec<Option<NaiveDate>> = (0..raw.len())
        .map(|i| raw.cell(i, date_col).and_then(parse_date))
        .collect();
    let explicit = season_col.map(|c| {
        (0..raw.len())
            .map(|i| raw.cell(i, c).and_then(parse_season))
            .collect()
    });
    let (seasons, source) = resolve_seasons(explicit, &dates);
    if season_col.is_some() && source == SeasonSource::Inferred {
        log::warn!("player_games: season column unusable, inferring every season from game dates");
    }

    let mut rows = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for i in 0..raw.len() {
        let player_id = raw.cell(i, player_col).and_then(parse_int).map(PlayerId);
        let game_id = raw.cell(i, game_id_col).map(str::to_string);
        let team_id = match team_col {
            Some(c) => raw.cell(i, c).and_then(parse_int).map(TeamId),
            None => {
                let matchup = Matchup::parse(raw.optional_cell(i, matchup_col));
                matchup.team().and_then(|a| abbreviations.get(a))
            }
        };
        let opponent = opponent_cols.read(raw, i);

        let (
            Some(player_id),
            Some(game_id),
            Some(game_date),
            Some(team_id),
            Some(opponent_team_id),
            Some(season),
        ) = (
            player_id,
            game_id,
            dates[i],
            team_id,
            opponent.team_id,
            seasons[i],
        )
        else {
            dropped += 1;
            continue;
        };
        if team_id == opponent_team_id {
            dropped += 1;
            continue;
        }

        rows.push(PlayerGameRow {
            player_id,
            game_id,
            game_date,
            season,
            team_id,
            opponent_team_id,
            is_home: opponent.is_home.unwrap_or(false),
            wl: raw.cell(i, wl_col).and_then(Outcome::from_code),
            minutes: raw.optional_cell(i, min_col).and_then(parse_minutes),
            plus_minus: float_cell(raw, i, pm_col),
            stl: float_cell(raw, i, stl_col),
            blk: float_cell(raw, i, blk_col),
            pf: float_cell(raw, i, pf_col),
            box_score: stat_cols.read(raw, i),
        });
    }

    let out = Standardized { rows, dropped };
    out.log_summary("player_games");
    Ok(out)
}
