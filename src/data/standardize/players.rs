//! Players standardizer

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Standardized;
use crate::data::cells::{parse_bool, parse_int, parse_text};
use crate::data::columns::RawTable;
use crate::{PlayerId, Result};

/// A player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: PlayerId,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
}

/// Standardize a raw players table
///
/// When only first/last names are present the full name is composed from them.
pub fn standardize_players(raw: &RawTable) -> Result<Standardized<Player>> {
    let id_col = raw.require("player id", &["id", "player_id", "person_id"])?;
    let full_col = raw.resolve(&["full_name", "display_first_last"]);
    let first_col = raw.resolve(&["first_name"]);
    let last_col = raw.resolve(&["last_name"]);
    let active_col = raw.resolve(&["is_active"]);

    let mut rows = Vec::with_capacity(raw.len());
    let mut seen = HashSet::new();
    let mut dropped = 0;

    for i in 0..raw.len() {
        let Some(player_id) = raw.cell(i, id_col).and_then(parse_int).map(PlayerId) else {
            dropped += 1;
            continue;
        };
        if !seen.insert(player_id) {
            dropped += 1;
            continue;
        }

        let first_name = raw.optional_cell(i, first_col).and_then(parse_text);
        let last_name = raw.optional_cell(i, last_col).and_then(parse_text);
        let full_name = raw
            .optional_cell(i, full_col)
            .and_then(parse_text)
            .or_else(|| match (&first_name, &last_name) {
                (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
                _ => None,
            });

        rows.push(Player {
            player_id,
            full_name,
            first_name,
            last_name,
            is_active: raw.optional_cell(i, active_col).and_then(parse_bool),
        });
    }

    let out = Standardized { rows, dropped };
    out.log_summary("players");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(csv_data: &str) -> RawTable {
        RawTable::from_reader("players", csv_data.as_bytes()).unwrap()
    }

    #[test]
    fn test_standardize_players() {
        let t = raw("id,full_name,first_name,last_name,is_active\n\
                     2544,LeBron James,LeBron,James,true\n\
                     977,,Kobe,Bryant,0\n\
                     bad,Nobody,,,\n");
        let out = standardize_players(&t).unwrap();

        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.dropped, 1);
        assert_eq!(out.rows[0].is_active, Some(true));
        assert_eq!(out.rows[1].full_name.as_deref(), Some("Kobe Bryant"));
        assert_eq!(out.rows[1].is_active, Some(false));
    }

    #[test]
    fn test_missing_player_id_is_schema_error() {
        assert!(standardize_players(&raw("full_name\nX\n")).is_err());
    }
}
