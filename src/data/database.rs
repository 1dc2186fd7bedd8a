//! SQLite store for the canonical tables and their feature views
//!
//! Each pipeline run replaces the store's tables wholesale inside a single
//! transaction and finishes by recording a completed-run marker. Readers
//! refuse a store without that marker.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;

use crate::data::bundle::StandardTables;
use crate::data::dataset::{FeatureDataset, FeatureRow};
use crate::data::standardize::Team;
use crate::features;
use crate::{HoopsError, Outcome, Result, TeamId};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

/// Marker written by a completed rebuild
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub completed_at: String,
    pub has_players: bool,
    pub team_count: usize,
    pub game_count: usize,
    pub player_game_count: usize,
}

impl PipelineRun {
    /// Dataset view this run's training should read
    pub fn dataset_view(&self) -> &'static str {
        features::dataset_view(self.has_players)
    }
}

/// A game between two teams, from the first team's side
#[derive(Debug, Clone)]
pub struct HeadToHeadGame {
    pub game_id: String,
    pub game_date: NaiveDate,
    pub is_home: bool,
    pub wl: Option<Outcome>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS pipeline_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                completed_at TEXT NOT NULL DEFAULT (datetime('now')),
                has_players INTEGER NOT NULL,
                team_count INTEGER NOT NULL,
                game_count INTEGER NOT NULL,
                player_game_count INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    // ==================== Rebuild ====================

    /// Atomically replace every pipeline table and view with this run's output
    ///
    /// Tables are dropped and recreated, never patched. Any failure rolls the
    /// store back to its previous state.
    pub fn replace_standard_tables(&mut self, tables: &StandardTables) -> Result<PipelineRun> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM pipeline_runs", [])?;
        features::drop_views(&tx)?;
        tx.execute_batch(
            r#"
            DROP TABLE IF EXISTS player_games;
            DROP TABLE IF EXISTS players;
            DROP TABLE IF EXISTS games;
            DROP TABLE IF EXISTS teams;

            CREATE TABLE teams (
                team_id INTEGER PRIMARY KEY,
                full_name TEXT,
                abbreviation TEXT,
                city TEXT,
                state TEXT,
                year_founded INTEGER
            );

            CREATE TABLE games (
                game_id TEXT NOT NULL,
                game_date TEXT NOT NULL,
                team_id INTEGER NOT NULL,
                opponent_team_id INTEGER NOT NULL,
                is_home INTEGER NOT NULL,
                season INTEGER NOT NULL,
                wl TEXT,
                pts REAL,
                fg_pct REAL,
                fg3_pct REAL,
                ft_pct REAL,
                reb REAL,
                ast REAL,
                tov REAL,
                UNIQUE(game_id, team_id)
            );

            CREATE INDEX idx_games_team_date ON games(team_id, game_date);
            "#,
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO teams (team_id, full_name, abbreviation, city, state, year_founded)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for t in &tables.teams {
                stmt.execute(params![
                    t.team_id.0,
                    t.full_name,
                    t.abbreviation,
                    t.city,
                    t.state,
                    t.year_founded
                ])?;
            }
        }

        let mut game_count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO games (game_id, game_date, team_id, opponent_team_id, is_home,
                                              season, wl, pts, fg_pct, fg3_pct, ft_pct, reb, ast, tov)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            for g in &tables.games {
                let b = &g.box_score;
                game_count += stmt.execute(params![
                    g.game_id,
                    g.game_date.format(DATE_FORMAT).to_string(),
                    g.team_id.0,
                    g.opponent_team_id.0,
                    g.is_home,
                    g.season,
                    g.wl.map(|o| o.code()),
                    b.pts,
                    b.fg_pct,
                    b.fg3_pct,
                    b.ft_pct,
                    b.reb,
                    b.ast,
                    b.tov
                ])?;
            }
        }
        if game_count < tables.games.len() {
            log::warn!(
                "games: ignored {} duplicate (game_id, team_id) rows",
                tables.games.len() - game_count
            );
        }

        let mut player_game_count = 0;
        if let Some(players) = &tables.player_enrichment {
            tx.execute_batch(
                r#"
                CREATE TABLE players (
                    player_id INTEGER PRIMARY KEY,
                    full_name TEXT,
                    first_name TEXT,
                    last_name TEXT,
                    is_active INTEGER
                );

                CREATE TABLE player_games (
                    player_id INTEGER NOT NULL,
                    game_id TEXT NOT NULL,
                    game_date TEXT NOT NULL,
                    season INTEGER NOT NULL,
                    team_id INTEGER NOT NULL,
                    opponent_team_id INTEGER NOT NULL,
                    is_home INTEGER NOT NULL,
                    wl TEXT,
                    minutes REAL,
                    plus_minus REAL,
                    stl REAL,
                    blk REAL,
                    pf REAL,
                    pts REAL,
                    fg_pct REAL,
                    fg3_pct REAL,
                    ft_pct REAL,
                    reb REAL,
                    ast REAL,
                    tov REAL,
                    UNIQUE(player_id, game_id)
                );

                CREATE INDEX idx_player_games_player_date ON player_games(player_id, game_date);
                "#,
            )?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO players (player_id, full_name, first_name, last_name, is_active)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for p in &players.players {
                    stmt.execute(params![
                        p.player_id.0,
                        p.full_name,
                        p.first_name,
                        p.last_name,
                        p.is_active
                    ])?;
                }
            }

            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO player_games (player_id, game_id, game_date, season, team_id,
                                                         opponent_team_id, is_home, wl, minutes, plus_minus,
                                                         stl, blk, pf, pts, fg_pct, fg3_pct, ft_pct,
                                                         reb, ast, tov)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                             ?17, ?18, ?19, ?20)",
                )?;
                for pg in &players.player_games {
                    let b = &pg.box_score;
                    player_game_count += stmt.execute(params![
                        pg.player_id.0,
                        pg.game_id,
                        pg.game_date.format(DATE_FORMAT).to_string(),
                        pg.season,
                        pg.team_id.0,
                        pg.opponent_team_id.0,
                        pg.is_home,
                        pg.wl.map(|o| o.code()),
                        pg.minutes,
                        pg.plus_minus,
                        pg.stl,
                        pg.blk,
                        pg.pf,
                        b.pts,
                        b.fg_pct,
                        b.fg3_pct,
                        b.ft_pct,
                        b.reb,
                        b.ast,
                        b.tov
                    ])?;
                }
            }
        }

        features::create_views(&tx, tables.has_players())?;

        tx.execute(
            "INSERT INTO pipeline_runs (has_players, team_count, game_count, player_game_count)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                tables.has_players(),
                tables.teams.len() as i64,
                game_count as i64,
                player_game_count as i64
            ],
        )?;

        tx.commit()?;

        let run = self
            .latest_run()?
            .ok_or_else(|| HoopsError::IncompleteStore("rebuild marker missing".to_string()))?;
        log::info!(
            "Rebuilt store: {} teams, {} games, {} player games",
            run.team_count,
            run.game_count,
            run.player_game_count
        );
        Ok(run)
    }

    /// Most recent completed rebuild, if any
    pub fn latest_run(&self) -> Result<Option<PipelineRun>> {
        let run = self
            .conn
            .query_row(
                "SELECT completed_at, has_players, team_count, game_count, player_game_count
                 FROM pipeline_runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(PipelineRun {
                        completed_at: row.get(0)?,
                        has_players: row.get(1)?,
                        team_count: row.get::<_, i64>(2)? as usize,
                        game_count: row.get::<_, i64>(3)? as usize,
                        player_game_count: row.get::<_, i64>(4)? as usize,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }

    /// Completed rebuild, or an error naming what is missing
    pub fn require_run(&self) -> Result<PipelineRun> {
        self.latest_run()?.ok_or_else(|| {
            HoopsError::IncompleteStore("run `hoops ingest` to rebuild the store".to_string())
        })
    }

    /// Names of the views currently in the store
    pub fn list_views(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'view'")?;
        let views = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(views)
    }

    // ==================== Datasets ====================

    /// Load a training dataset view
    ///
    /// Identity columns are split out; every other column becomes a feature,
    /// in view order.
    pub fn load_dataset(&self, view: &str) -> Result<FeatureDataset> {
        self.require_run()?;
        if !self.list_views()?.contains(view) {
            return Err(HoopsError::IncompleteStore(format!("view {} does not exist", view)));
        }

        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {}", view))?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let position = |name: &str| {
            names.iter().position(|n| n == name).ok_or_else(|| {
                HoopsError::Parse(format!("view {} has no {} column", view, name))
            })
        };
        let game_id_idx = position("game_id")?;
        let season_idx = position("season")?;
        let date_idx = position("game_date")?;
        let team_idx = position("team_id")?;
        let opp_idx = position("opponent_team_id")?;
        let home_idx = position("is_home")?;
        let target_idx = position("y_win")?;

        let feature_idx: Vec<usize> = (0..names.len())
            .filter(|i| !FeatureDataset::IDENTITY_COLUMNS.contains(&names[*i].as_str()))
            .collect();
        let feature_cols: Vec<String> = feature_idx.iter().map(|i| names[*i].clone()).collect();

        let rows = stmt
            .query_map([], |row| {
                let date_str: String = row.get(date_idx)?;
                let game_date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_idx,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;

                let mut values = Vec::with_capacity(feature_idx.len());
                for i in &feature_idx {
                    values.push(row.get::<_, Option<f64>>(*i)?.map(|v| v as f32));
                }

                Ok(FeatureRow {
                    game_id: row.get(game_id_idx)?,
                    season: row.get(season_idx)?,
                    game_date,
                    team_id: TeamId(row.get(team_idx)?),
                    opponent_team_id: TeamId(row.get(opp_idx)?),
                    is_home: row.get(home_idx)?,
                    y_win: row.get(target_idx)?,
                    features: values,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        log::info!(
            "Loaded {} rows with {} features from {}",
            rows.len(),
            feature_cols.len(),
            view
        );

        Ok(FeatureDataset {
            view: view.to_string(),
            feature_cols,
            rows,
        })
    }

    // ==================== Teams & games ====================

    /// All teams ordered by name
    pub fn get_all_teams(&self) -> Result<Vec<Team>> {
        self.require_run()?;
        let mut stmt = self.conn.prepare(
            "SELECT team_id, full_name, abbreviation, city, state, year_founded
             FROM v_teams ORDER BY full_name, team_id",
        )?;
        let teams = stmt
            .query_map([], |row| {
                Ok(Team {
                    team_id: TeamId(row.get(0)?),
                    full_name: row.get(1)?,
                    abbreviation: row.get(2)?,
                    city: row.get(3)?,
                    state: row.get(4)?,
                    year_founded: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    /// Find a team by abbreviation or numeric id
    pub fn find_team(&self, query: &str) -> Result<Team> {
        let query = query.trim();
        let id = query.parse::<i64>().ok();
        self.get_all_teams()?
            .into_iter()
            .find(|t| {
                Some(t.team_id.0) == id
                    || t.abbreviation
                        .as_deref()
                        .is_some_and(|a| a.eq_ignore_ascii_case(query))
            })
            .ok_or_else(|| HoopsError::UnknownTeam(query.to_string()))
    }

    /// Games between two teams, most recent first, from `team`'s side
    pub fn head_to_head_games(&self, team: TeamId, opponent: TeamId) -> Result<Vec<HeadToHeadGame>> {
        self.require_run()?;
        let mut stmt = self.conn.prepare(
            "SELECT game_id, game_date, is_home, wl
             FROM v_games
             WHERE team_id = ?1 AND opponent_team_id = ?2
             ORDER BY game_date DESC, game_id DESC",
        )?;
        let games = stmt
            .query_map(params![team.0, opponent.0], |row| {
                let date_str: String = row.get(1)?;
                let wl: Option<String> = row.get(3)?;
                Ok((row.get::<_, String>(0)?, date_str, row.get::<_, bool>(2)?, wl))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|(game_id, date_str, is_home, wl)| {
                NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                    .ok()
                    .map(|game_date| HeadToHeadGame {
                        game_id,
                        game_date,
                        is_home,
                        wl: wl.as_deref().and_then(Outcome::from_code),
                    })
            })
            .collect();
        Ok(games)
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let run = self.latest_run()?;
        let (earliest, latest) = match &run {
            Some(_) => {
                let (min_date, max_date): (Option<String>, Option<String>) = self.conn.query_row(
                    "SELECT MIN(game_date), MAX(game_date) FROM games",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                let parse = |s: Option<String>| {
                    s.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
                };
                (parse(min_date), parse(max_date))
            }
            None => (None, None),
        };

        Ok(DatabaseStats {
            run,
            earliest_game: earliest,
            latest_game: latest,
            views: self.list_views()?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub run: Option<PipelineRun>,
    pub earliest_game: Option<NaiveDate>,
    pub latest_game: Option<NaiveDate>,
    pub views: BTreeSet<String>,
}
