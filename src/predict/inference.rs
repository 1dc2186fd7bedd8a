//! Scoring with a saved model bundle

use serde::Serialize;
use std::path::Path;

use crate::data::{Database, FeatureDataset, FeatureRow};
use crate::predict::artifact::ModelBundle;
use crate::{HoopsError, Result, TeamId};

pub const PREDICTIONS_FILE: &str = "predictions_full.csv";

/// One scored (game, team) row as written to CSV
#[derive(Debug, Serialize)]
struct PredictionRecord<'a> {
    game_id: &'a str,
    game_date: String,
    team_id: i64,
    opponent_team_id: i64,
    is_home: u8,
    y_win: u8,
    pred_win_proba: f64,
}

/// Write scored rows as CSV
pub fn write_predictions<P: AsRef<Path>>(path: P, rows: &[FeatureRow], probs: &[f64]) -> Result<()> {
    if rows.len() != probs.len() {
        return Err(HoopsError::Model(format!(
            "{} predictions for {} rows",
            probs.len(),
            rows.len()
        )));
    }

    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for (row, p) in rows.iter().zip(probs) {
        writer.serialize(PredictionRecord {
            game_id: &row.game_id,
            game_date: row.game_date.format("%Y-%m-%d").to_string(),
            team_id: row.team_id.0,
            opponent_team_id: row.opponent_team_id.0,
            is_home: u8::from(row.is_home),
            y_win: row.y_win,
            pred_win_proba: *p,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Head-to-head win probabilities for one game
#[derive(Debug, Clone)]
pub struct MatchupPrediction {
    pub game_id: String,
    pub game_date: chrono::NaiveDate,
    pub team_a: TeamId,
    pub team_b: TeamId,
    /// Raw model outputs from each side's row
    pub raw_a: f64,
    pub raw_b: f64,
    /// Normalized so that `prob_a + prob_b == 1`
    pub prob_a: f64,
    pub prob_b: f64,
}

/// Predictor for scoring the store with a saved bundle
pub struct Predictor {
    bundle: ModelBundle,
}

impl Predictor {
    pub fn new(bundle: ModelBundle) -> Self {
        Predictor { bundle }
    }

    /// Load predictor from the artifacts directory
    pub fn load<P: AsRef<Path>>(artifacts_dir: P) -> Result<Self> {
        Ok(Self::new(ModelBundle::load(artifacts_dir)?))
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Load the view the bundle was trained on
    pub fn load_dataset(&self, db: &Database) -> Result<FeatureDataset> {
        db.load_dataset(&self.bundle.dataset_view)
    }

    /// Score every row of the bundle's view and write `predictions_full.csv`
    pub fn score_all<P: AsRef<Path>>(&self, db: &Database, artifacts_dir: P) -> Result<usize> {
        let dataset = self.load_dataset(db)?;
        let probs = self.bundle.predict_dataset(&dataset)?;
        let path = artifacts_dir.as_ref().join(PREDICTIONS_FILE);
        write_predictions(&path, &dataset.rows, &probs)?;
        log::info!("Wrote {} predictions to {}", probs.len(), path.display());
        Ok(probs.len())
    }

    /// Score both sides of a head-to-head game
    ///
    /// Uses `game_id` when given, else the most recent game between the two
    /// teams present in the bundle's view.
    pub fn matchup(
        &self,
        db: &Database,
        team_a: TeamId,
        team_b: TeamId,
        game_id: Option<&str>,
    ) -> Result<MatchupPrediction> {
        let dataset = self.load_dataset(db)?;

        let side = |team: TeamId, opp: TeamId, game: &str| {
            dataset
                .rows
                .iter()
                .position(|r| r.game_id == game && r.team_id == team && r.opponent_team_id == opp)
        };

        let game = match game_id {
            Some(g) => g.to_string(),
            None => dataset
                .rows
                .iter()
                .filter(|r| r.team_id == team_a && r.opponent_team_id == team_b)
                .max_by(|a, b| {
                    (a.game_date, &a.game_id).cmp(&(b.game_date, &b.game_id))
                })
                .map(|r| r.game_id.clone())
                .ok_or_else(|| {
                    HoopsError::Model(format!("no games between {} and {}", team_a, team_b))
                })?,
        };

        let (ia, ib) = match (side(team_a, team_b, &game), side(team_b, team_a, &game)) {
            (Some(ia), Some(ib)) => (ia, ib),
            _ => {
                return Err(HoopsError::Model(format!(
                    "game {} has no rows for both {} and {}",
                    game, team_a, team_b
                )))
            }
        };

        let rows = vec![dataset.rows[ia].clone(), dataset.rows[ib].clone()];
        let features = crate::data::dataset::select_columns(
            &dataset.feature_cols,
            &self.bundle.feature_cols,
            &rows,
        )?;
        let probs = crate::training::Classifier::predict_proba(&self.bundle.estimator, &features)?;
        let (raw_a, raw_b) = (probs[0], probs[1]);
        let (prob_a, prob_b) = normalize_pair(raw_a, raw_b);

        Ok(MatchupPrediction {
            game_id: game,
            game_date: rows[0].game_date,
            team_a,
            team_b,
            raw_a,
            raw_b,
            prob_a,
            prob_b,
        })
    }
}

/// Rescale two independent win probabilities to sum to one
pub fn normalize_pair(a: f64, b: f64) -> (f64, f64) {
    let total = a + b;
    if total > 0.0 {
        (a / total, b / total)
    } else {
        (0.5, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_normalize_pair() {
        let (a, b) = normalize_pair(0.6, 0.2);
        assert!((a - 0.75).abs() < 1e-12);
        assert!((b - 0.25).abs() < 1e-12);
        assert_eq!(normalize_pair(0.0, 0.0), (0.5, 0.5));
    }

    #[test]
    fn test_write_predictions() {
        let rows = vec![FeatureRow {
            game_id: "g1".to_string(),
            season: 2021,
            game_date: NaiveDate::from_ymd_opt(2021, 11, 1).unwrap(),
            team_id: TeamId(1),
            opponent_team_id: TeamId(2),
            is_home: true,
            y_win: 1,
            features: vec![],
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_predictions(&path, &rows, &[0.25]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("game_id,game_date,team_id,opponent_team_id,is_home,y_win,pred_win_proba")
        );
        assert_eq!(lines.next(), Some("g1,2021-11-01,1,2,1,1,0.25"));

        assert!(write_predictions(&path, &rows, &[]).is_err());
    }
}
