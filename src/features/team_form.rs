//! Team form views
//!
//! Pre-game aggregates over each team's five previous games. The current
//! game is always excluded from its own window.

/// Per (game_id, team_id) trailing form, plus the `y_win` target
pub const TEAM_FORM_VIEW: &str = r#"
CREATE VIEW v_team_form AS
SELECT
    g.game_id,
    g.season,
    g.game_date,
    g.team_id,
    g.opponent_team_id,
    g.is_home,
    g.wl,
    CASE g.wl WHEN 'W' THEN 1 ELSE 0 END AS y_win,
    AVG(CASE g.wl WHEN 'W' THEN 1.0 WHEN 'L' THEN 0.0 END) OVER last5 AS winrate_l5,
    AVG(g.pts) OVER last5 AS pts_avg_l5,
    AVG(g.fg_pct) OVER last5 AS fg_pct_avg_l5,
    AVG(g.fg3_pct) OVER last5 AS fg3_pct_avg_l5,
    AVG(g.ft_pct) OVER last5 AS ft_pct_avg_l5,
    AVG(g.reb) OVER last5 AS reb_avg_l5,
    AVG(g.ast) OVER last5 AS ast_avg_l5,
    AVG(g.tov) OVER last5 AS tov_avg_l5,
    julianday(g.game_date) - julianday(LAG(g.game_date) OVER by_team) AS rest_days
FROM games g
WINDOW
    by_team AS (PARTITION BY g.team_id ORDER BY g.game_date, g.game_id),
    last5 AS (
        PARTITION BY g.team_id ORDER BY g.game_date, g.game_id
        ROWS BETWEEN 5 PRECEDING AND 1 PRECEDING
    );
"#;

/// Team form joined with the opponent's form for the same game
///
/// Only games with a known result are included.
pub const TRAINING_DATASET_VIEW: &str = r#"
CREATE VIEW v_training_dataset AS
SELECT
    t.game_id,
    t.season,
    t.game_date,
    t.team_id,
    t.opponent_team_id,
    t.is_home,
    t.winrate_l5,
    t.pts_avg_l5,
    t.fg_pct_avg_l5,
    t.fg3_pct_avg_l5,
    t.ft_pct_avg_l5,
    t.reb_avg_l5,
    t.ast_avg_l5,
    t.tov_avg_l5,
    t.rest_days,
    o.winrate_l5 AS opp_winrate_l5,
    o.pts_avg_l5 AS opp_pts_avg_l5,
    o.fg_pct_avg_l5 AS opp_fg_pct_avg_l5,
    o.fg3_pct_avg_l5 AS opp_fg3_pct_avg_l5,
    o.ft_pct_avg_l5 AS opp_ft_pct_avg_l5,
    o.reb_avg_l5 AS opp_reb_avg_l5,
    o.ast_avg_l5 AS opp_ast_avg_l5,
    o.tov_avg_l5 AS opp_tov_avg_l5,
    o.rest_days AS opp_rest_days,
    t.y_win
FROM v_team_form t
JOIN v_team_form o
    ON o.game_id = t.game_id
   AND o.team_id = t.opponent_team_id
WHERE t.wl IN ('W', 'L');
"#;

#[cfg(test)]
mod tests {
    use crate::data::bundle::StandardTables;
    use crate::data::standardize::{GameTeamRow, Team};
    use crate::data::{BoxScore, Database};
    use crate::{Outcome, TeamId};
    use chrono::NaiveDate;

    fn game(id: &str, day: u32, team: i64, opp: i64, home: bool, win: bool, pts: f64) -> GameTeamRow {
        GameTeamRow {
            game_id: id.to_string(),
            game_date: NaiveDate::from_ymd_opt(2021, 11, day).unwrap(),
            team_id: TeamId(team),
            opponent_team_id: TeamId(opp),
            is_home: home,
            season: 2021,
            wl: Some(if win { Outcome::Win } else { Outcome::Loss }),
            box_score: BoxScore {
                pts: Some(pts),
                ..BoxScore::default()
            },
        }
    }

    fn team(id: i64, abbr: &str) -> Team {
        Team {
            team_id: TeamId(id),
            full_name: None,
            abbreviation: Some(abbr.to_string()),
            city: None,
            state: None,
            year_founded: None,
        }
    }

    #[test]
    fn test_form_excludes_current_game() {
        let mut games = Vec::new();
        // Team 1 beats team 2 three times, two days apart
        for (i, day) in [1u32, 3, 5].iter().enumerate() {
            let id = format!("g{}", i);
            games.push(game(&id, *day, 1, 2, true, true, 100.0 + i as f64 * 10.0));
            games.push(game(&id, *day, 2, 1, false, false, 90.0));
        }
        let tables = StandardTables {
            teams: vec![team(1, "AAA"), team(2, "BBB")],
            games,
            player_enrichment: None,
        };

        let mut db = Database::in_memory().unwrap();
        db.replace_standard_tables(&tables).unwrap();
        let ds = db.load_dataset("v_training_dataset").unwrap();

        assert_eq!(ds.rows.len(), 6);
        let col = |name: &str| ds.feature_cols.iter().position(|c| c == name).unwrap();

        let last_for_team1 = ds
            .rows
            .iter()
            .find(|r| r.game_id == "g2" && r.team_id == TeamId(1))
            .unwrap();
        // Previous two games only: (100 + 110) / 2
        assert_eq!(last_for_team1.features[col("pts_avg_l5")], Some(105.0));
        assert_eq!(last_for_team1.features[col("winrate_l5")], Some(1.0));
        assert_eq!(last_for_team1.features[col("opp_winrate_l5")], Some(0.0));
        assert_eq!(last_for_team1.features[col("rest_days")], Some(2.0));
        assert_eq!(last_for_team1.y_win, 1);

        let first_for_team2 = ds
            .rows
            .iter()
            .find(|r| r.game_id == "g0" && r.team_id == TeamId(2))
            .unwrap();
        assert_eq!(first_for_team2.features[col("pts_avg_l5")], None);
        assert_eq!(first_for_team2.features[col("rest_days")], None);
        assert_eq!(first_for_team2.y_win, 0);
    }
}
