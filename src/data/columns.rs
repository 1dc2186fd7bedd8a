//! Raw CSV tables with alias-tolerant column lookup
//!
//! Upstream exports disagree on column naming (`TEAM_ID` vs `team_id`,
//! `FG3_PCT` vs `FG3%`). Headers are normalized once on load (trimmed,
//! lower-cased) and every standardizer resolves a canonical field through an
//! ordered list of candidate names.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::{HoopsError, Result};

/// Index of a resolved column in a [`RawTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column(usize);

/// A raw delimited table with normalized headers
#[derive(Debug, Clone)]
pub struct RawTable {
    name: &'static str,
    index: HashMap<String, usize>,
    records: Vec<csv::StringRecord>,
}

/// Normalize a header the way every lookup expects it
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

impl RawTable {
    /// Read a table from a CSV file
    pub fn from_path<P: AsRef<Path>>(name: &'static str, path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref()).map_err(|e| {
            HoopsError::Io(std::io::Error::new(
                e.kind(),
                format!("{} ({})", e, path.as_ref().display()),
            ))
        })?;
        Self::from_reader(name, file)
    }

    /// Read a table from any CSV source
    pub fn from_reader<R: Read>(name: &'static str, rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);

        let mut index = HashMap::new();
        for (i, header) in reader.headers()?.iter().enumerate() {
            // First occurrence wins on normalized duplicates
            index.entry(normalize_header(header)).or_insert(i);
        }

        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        log::debug!("Read {} rows from {} table", records.len(), name);

        Ok(RawTable {
            name,
            index,
            records,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the first candidate present among the normalized headers
    ///
    /// Matching is exact after trimming and lower-casing; candidate order is
    /// the only priority rule.
    pub fn resolve(&self, candidates: &[&str]) -> Option<Column> {
        candidates
            .iter()
            .find_map(|c| self.index.get(&normalize_header(c)).copied())
            .map(Column)
    }

    /// Resolve a required column, failing with the accepted aliases
    pub fn require(&self, field: &'static str, candidates: &[&'static str]) -> Result<Column> {
        self.resolve(candidates)
            .ok_or_else(|| HoopsError::MissingColumn {
                table: self.name,
                field,
                aliases: candidates.to_vec(),
            })
    }

    /// Cell text, `None` when the column is absent from the row or blank
    pub fn cell(&self, row: usize, column: Column) -> Option<&str> {
        self.records
            .get(row)
            .and_then(|r| r.get(column.0))
            .filter(|s| !s.is_empty())
    }

    /// Cell text for an optional column
    pub fn optional_cell(&self, row: usize, column: Option<Column>) -> Option<&str> {
        column.and_then(|c| self.cell(row, c))
    }
}
