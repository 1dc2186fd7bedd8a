//! Games standardizer
//!
//! One canonical row per (game, team). A real game appears twice, once from
//! each participant's side, sharing the same `game_id`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BoxScore, BoxScoreColumns, OpponentColumns, Standardized, TeamAbbreviations};
use crate::data::cells::{parse_date, parse_int};
use crate::data::columns::RawTable;
use crate::data::season::{parse_season, resolve_seasons, SeasonSource};
use crate::{Outcome, Result, TeamId};

pub(crate) const GAME_DATE_ALIASES: &[&str] =
    &["game_date_real", "game_date_est", "game_date", "date"];

/// A game from one team's perspective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTeamRow {
    pub game_id: String,
    pub game_date: NaiveDate,
    pub team_id: TeamId,
    pub opponent_team_id: TeamId,
    pub is_home: bool,
    /// Start year of the season
    pub season: i32,
    pub wl: Option<Outcome>,
    pub box_score: BoxScore,
}

/// Standardize a raw games table
///
/// The opponent comes from an explicit opponent id column when present,
/// otherwise from the matchup text mapped through `abbreviations` (in which
/// case the map is a hard prerequisite). Rows missing game id, date, team,
/// opponent or season are dropped, as are rows naming a team as its own
/// opponent.
pub fn standardize_games(
    raw: &RawTable,
    abbreviations: Option<&TeamAbbreviations>,
) -> Result<Standardized<GameTeamRow>> {
    let team_col = raw.require("team id", &["team_id"])?;
    let wl_col = raw.require("win/loss", &["wl", "w_l"])?;
    let date_col = raw.require("game date", GAME_DATE_ALIASES)?;
    let game_id_col = raw.resolve(&["game_id", "id"]);
    let season_col = raw.resolve(&["season", "season_id", "year"]);
    let opponent_cols = OpponentColumns::resolve(raw, abbreviations)?;
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
        log::warn!("games: season column unusable, inferring every season from game dates");
    }

    let mut rows = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for i in 0..raw.len() {
        let game_id = match game_id_col {
            Some(c) => raw.cell(i, c).map(str::to_string),
            None => Some(i.to_string()),
        };
        let team_id = raw.cell(i, team_col).and_then(parse_int).map(TeamId);
        let opponent = opponent_cols.read(raw, i);

        let (Some(game_id), Some(game_date), Some(team_id), Some(opponent_team_id), Some(season)) =
            (game_id, dates[i], team_id, opponent.team_id, seasons[i])
        else {
            dropped += 1;
            continue;
        };
        if team_id == opponent_team_id {
            dropped += 1;
            continue;
        }

        rows.push(GameTeamRow {
            game_id,
            game_date,
            team_id,
            opponent_team_id,
            is_home: opponent.is_home.unwrap_or(false),
            season,
            wl: raw.cell(i, wl_col).and_then(Outcome::from_code),
            box_score: stat_cols.read(raw, i),
        });
    }

    let out = Standardized { rows, dropped };
    out.log_summary("games");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::standardize::teams::standardize_teams;
    use crate::HoopsError;

    fn raw(csv_data: &str) -> RawTable {
        RawTable::from_reader("games", csv_data.as_bytes()).unwrap()
    }

    fn abbreviations() -> TeamAbbreviations {
        let teams = RawTable::from_reader("teams", "team_id,abbreviation\n1,AAA\n2,BBB\n".as_bytes())
            .unwrap();
        TeamAbbreviations::from_teams(&standardize_teams(&teams).unwrap().rows)
    }

    #[test]
    fn test_head_to_head_from_matchups() {
        let t = raw("GAME_ID,GAME_DATE,TEAM_ID,MATCHUP,WL,PTS,FG3%\n\
                     0022100001,2021-11-01,1,AAA vs. BBB,W,110,0.35\n\
                     0022100001,2021-11-01,2,BBB @ AAA,L,99,0.31\n");
        let out = standardize_games(&t, Some(&abbreviations())).unwrap();

        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.dropped, 0);

        let home = &out.rows[0];
        assert_eq!(home.game_id, "0022100001");
        assert_eq!(home.team_id, TeamId(1));
        assert_eq!(home.opponent_team_id, TeamId(2));
        assert!(home.is_home);
        assert_eq!(home.wl, Some(Outcome::Win));
        assert_eq!(home.season, 2021);
        assert_eq!(home.box_score.pts, Some(110.0));
        assert_eq!(home.box_score.fg3_pct, Some(0.35));

        let away = &out.rows[1];
        assert_eq!(away.game_id, home.game_id);
        assert_eq!(away.team_id, TeamId(2));
        assert_eq!(away.opponent_team_id, TeamId(1));
        assert!(!away.is_home);
        assert_eq!(away.wl, Some(Outcome::Loss));
        assert_eq!(away.season, 2021);
    }

    #[test]
    fn test_explicit_opponent_column_skips_matchup() {
        let t = raw("game_id,date,team_id,opp_team_id,home,wl,season\n\
                     g1,2022-03-01,1,2,1,W,2021\n\
                     g2,2022-03-03,1,2,,L,2021\n");
        let out = standardize_games(&t, None).unwrap();
        assert_eq!(out.rows.len(), 2);
        assert!(out.rows[0].is_home);
        // Unknown venue with a known opponent defaults to away
        assert!(!out.rows[1].is_home);
    }

    #[test]
    fn test_unparseable_matchup_rows_are_dropped() {
        let t = raw("game_id,game_date,team_id,matchup,wl\n\
                     g1,2021-11-01,1,AAA vs. BBB,W\n\
                     g2,2021-11-02,1,garbage,W\n\
                     g3,2021-11-03,1,AAA @ ZZZ,L\n\
                     g4,not-a-date,1,AAA @ BBB,L\n\
                     g5,2021-11-05,1,AAA vs. AAA,W\n");
        let out = standardize_games(&t, Some(&abbreviations())).unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.dropped, 4);
    }

    #[test]
    fn test_every_row_respects_invariants() {
        let t = raw("game_id,game_date,team_id,matchup,wl\n\
                     g1,2021-11-01,1,AAA vs. BBB,W\n\
                     g1,2021-11-01,2,BBB @ AAA,L\n\
                     g2,2022-01-10,2,BBB vs. AAA,W\n\
                     g2,2022-01-10,1,AAA @ BBB,L\n");
        let out = standardize_games(&t, Some(&abbreviations())).unwrap();
        for row in &out.rows {
            assert_ne!(row.team_id, row.opponent_team_id);
            assert!((1000..=9999).contains(&row.season));
        }
        assert_eq!(out.rows[2].season, 2021);
    }

    #[test]
    fn test_season_column_all_or_nothing() {
        // Unusable column: every season inferred from dates
        let t = raw("game_id,game_date,team_id,opponent_team_id,wl,season\n\
                     g1,2021-11-01,1,2,W,n/a\n\
                     g2,2022-02-01,1,2,W,\n");
        let out = standardize_games(&t, None).unwrap();
        assert_eq!(out.rows.len(), 2);
        assert!(out.rows.iter().all(|r| r.season == 2021));

        // Partially populated column: explicit values trusted, blanks dropped
        let t = raw("game_id,game_date,team_id,opponent_team_id,wl,season\n\
                     g1,2021-11-01,1,2,W,2021\n\
                     g2,2022-02-01,1,2,W,\n");
        let out = standardize_games(&t, None).unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn test_missing_game_id_column_uses_row_position() {
        let t = raw("game_date,team_id,opponent_team_id,wl\n2021-11-01,1,2,W\n");
        let out = standardize_games(&t, None).unwrap();
        assert_eq!(out.rows[0].game_id, "0");
    }

    #[test]
    fn test_schema_errors() {
        let no_wl = raw("game_date,team_id,opponent_team_id\n2021-11-01,1,2\n");
        assert!(matches!(
            standardize_games(&no_wl, None),
            Err(HoopsError::MissingColumn { field: "win/loss", .. })
        ));

        let no_opponent = raw("game_date,team_id,wl\n2021-11-01,1,W\n");
        assert!(matches!(
            standardize_games(&no_opponent, None),
            Err(HoopsError::MissingColumn { field: "opponent", .. })
        ));
    }

    #[test]
    fn test_matchup_without_abbreviations_is_ordering_error() {
        let t = raw("game_date,team_id,matchup,wl\n2021-11-01,1,AAA vs. BBB,W\n");
        assert!(matches!(
            standardize_games(&t, None),
            Err(HoopsError::MissingPrerequisite(_))
        ));
    }
}
