//! Player enrichment views
//!
//! Star-player form: for each (game, team), the three appearing players with
//! the highest trailing points average, summarized into team-level columns.

/// Per-appearance trailing averages over the player's five previous games
pub const PLAYER_FORM_VIEW: &str = r#"
CREATE VIEW v_player_form AS
SELECT
    pg.player_id,
    pg.game_id,
    pg.team_id,
    pg.game_date,
    AVG(pg.pts) OVER last5 AS pts_avg_l5,
    AVG(pg.minutes) OVER last5 AS min_avg_l5,
    AVG(pg.plus_minus) OVER last5 AS pm_avg_l5
FROM player_games pg
WINDOW last5 AS (
    PARTITION BY pg.player_id ORDER BY pg.game_date, pg.game_id
    ROWS BETWEEN 5 PRECEDING AND 1 PRECEDING
);
"#;

pub const PLAYER_TEAM_FEATURES_VIEW: &str = r#"
CREATE VIEW v_player_team_features AS
WITH ranked AS (
    SELECT
        pf.*,
        ROW_NUMBER() OVER (
            PARTITION BY pf.game_id, pf.team_id
            ORDER BY pf.pts_avg_l5 DESC, pf.player_id
        ) AS star_rank
    FROM v_player_form pf
    WHERE pf.pts_avg_l5 IS NOT NULL
)
SELECT
    game_id,
    team_id,
    SUM(pts_avg_l5) AS star_pts_avg_l5_sum,
    AVG(min_avg_l5) AS star_min_avg_l5_avg,
    AVG(pm_avg_l5) AS star_pm_avg_l5_avg
FROM ranked
WHERE star_rank <= 3
GROUP BY game_id, team_id;
"#;

/// Team training rows with star form for both sides
pub const ENRICHED_DATASET_VIEW: &str = r#"
CREATE VIEW v_training_dataset_enriched AS
SELECT
    d.*,
    p.star_pts_avg_l5_sum,
    p.star_min_avg_l5_avg,
    p.star_pm_avg_l5_avg,
    op.star_pts_avg_l5_sum AS opp_star_pts_avg_l5_sum,
    op.star_min_avg_l5_avg AS opp_star_min_avg_l5_avg,
    op.star_pm_avg_l5_avg AS opp_star_pm_avg_l5_avg
FROM v_training_dataset d
LEFT JOIN v_player_team_features p
    ON p.game_id = d.game_id
   AND p.team_id = d.team_id
LEFT JOIN v_player_team_features op
    ON op.game_id = d.game_id
   AND op.team_id = d.opponent_team_id;
"#;
