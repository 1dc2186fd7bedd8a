//! Teams standardizer and the abbreviation map built from it

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{int_cell, Standardized};
use crate::data::cells::{parse_int, parse_text};
use crate::data::columns::RawTable;
use crate::{Result, TeamId};

/// A franchise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: TeamId,
    pub full_name: Option<String>,
    /// Upper-cased; join key for matchup opponent resolution
    pub abbreviation: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub year_founded: Option<i32>,
}

/// Standardize a raw teams table
///
/// Rows with an unparseable team id are dropped. A repeated team id keeps its
/// first row.
pub fn standardize_teams(raw: &RawTable) -> Result<Standardized<Team>> {
    let id_col = raw.require("team id", &["id", "team_id"])?;
    let name_col = raw.resolve(&["full_name", "team_name", "nickname"]);
    let abbr_col = raw.resolve(&["abbreviation", "abbr"]);
    let city_col = raw.resolve(&["city"]);
    let state_col = raw.resolve(&["state"]);
    let year_col = raw.resolve(&["year_founded", "founded"]);

    let mut rows = Vec::with_capacity(raw.len());
    let mut seen = HashSet::new();
    let mut dropped = 0;

    for i in 0..raw.len() {
        let Some(team_id) = raw.cell(i, id_col).and_then(parse_int).map(TeamId) else {
            dropped += 1;
            continue;
        };
        if !seen.insert(team_id) {
            log::warn!("teams: duplicate {} ignored", team_id);
            dropped += 1;
            continue;
        }

        rows.push(Team {
            team_id,
            full_name: raw.optional_cell(i, name_col).and_then(parse_text),
            abbreviation: raw
                .optional_cell(i, abbr_col)
                .and_then(parse_text)
                .map(|a| a.to_uppercase()),
            city: raw.optional_cell(i, city_col).and_then(parse_text),
            state: raw.optional_cell(i, state_col).and_then(parse_text),
            year_founded: int_cell(raw, i, year_col).map(|y| y as i32),
        });
    }

    let out = Standardized { rows, dropped };
    out.log_summary("teams");
    Ok(out)
}

/// Abbreviation → team id lookup
///
/// Only constructible from standardized teams. A map with no entries is
/// rejected wherever matchup text needs resolving.
#[derive(Debug, Clone)]
pub struct TeamAbbreviations {
    map: HashMap<String, TeamId>,
}

impl TeamAbbreviations {
    /// Build the map from a canonical teams table
    ///
    /// Teams without an abbreviation are skipped. When two teams share an
    /// abbreviation the later row wins.
    pub fn from_teams(teams: &[Team]) -> Self {
        let mut map = HashMap::new();
        for team in teams {
            if let Some(abbr) = &team.abbreviation {
                if let Some(previous) = map.insert(abbr.to_uppercase(), team.team_id) {
                    log::warn!(
                        "abbreviation {} maps to both {} and {}; keeping {}",
                        abbr,
                        previous,
                        team.team_id,
                        team.team_id
                    );
                }
            }
        }
        TeamAbbreviations { map }
    }

    pub fn get(&self, abbreviation: &str) -> Option<TeamId> {
        self.map.get(&abbreviation.trim().to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
