//! End-to-end training run
//!
//! Rebuilds the store from the raw exports, loads the dataset view for this
//! run, splits it chronologically, selects a model and writes the artifacts.

use std::path::{Path, PathBuf};

use crate::data::dataset::labels;
use crate::data::{build_standard_tables, Database, FeatureDataset, FeatureMatrix, TablePaths};
use crate::predict::inference::write_predictions;
use crate::predict::ModelBundle;
use crate::training::estimator::{Classifier, Estimator};
use crate::training::metrics::{EvalMetrics, MetricsReport};
use crate::training::selection::{evaluate_candidates, Partition};
use crate::training::split::{temporal_split, SplitRatios};
use crate::{Config, HoopsError, Result};

pub const METRICS_FILE: &str = "metrics.json";
pub const TEST_PREDICTIONS_FILE: &str = "test_predictions.csv";

/// Summary of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub dataset_view: String,
    pub train_rows: usize,
    pub val_rows: usize,
    pub test_rows: usize,
    pub feature_count: usize,
    pub selected: String,
    pub selected_val: EvalMetrics,
    pub selected_test: EvalMetrics,
    pub report: MetricsReport,
    pub artifacts_dir: PathBuf,
}

/// Rebuild the store, then train on this run's dataset view
pub fn run_training(config: &Config) -> Result<TrainingOutcome> {
    let tables = build_standard_tables(&TablePaths::from_config(&config.data))?;
    let mut db = Database::open(&config.data.database_path)?;
    let run = db.replace_standard_tables(&tables)?;
    let dataset = db.load_dataset(run.dataset_view())?;
    train_on_dataset(dataset, config, Path::new(&config.data.artifacts_dir))
}

/// Split, fit every candidate, select and persist
pub fn train_on_dataset(
    dataset: FeatureDataset,
    config: &Config,
    artifacts_dir: &Path,
) -> Result<TrainingOutcome> {
    let FeatureDataset {
        view,
        feature_cols,
        rows,
    } = dataset;

    let split = temporal_split(rows, SplitRatios::from(config.split))?;
    if split.train.is_empty() {
        return Err(HoopsError::EmptyPartition("train"));
    }

    let train_x = FeatureMatrix::from_rows(feature_cols.clone(), &split.train);
    let val_x = FeatureMatrix::from_rows(feature_cols.clone(), &split.val);
    let test_x = FeatureMatrix::from_rows(feature_cols.clone(), &split.test);
    let train_y = labels(&split.train);
    let val_y = labels(&split.val);
    let test_y = labels(&split.test);

    let selection = evaluate_candidates(
        Estimator::candidates(&config.training),
        Partition {
            features: &train_x,
            labels: &train_y,
        },
        Partition {
            features: &val_x,
            labels: &val_y,
        },
        Partition {
            features: &test_x,
            labels: &test_y,
        },
    )?;

    let report = selection.report();
    let best = selection.into_best();
    let test_probs = best.classifier.predict_proba(&test_x)?;

    std::fs::create_dir_all(artifacts_dir)?;
    report.save(artifacts_dir.join(METRICS_FILE))?;
    write_predictions(
        artifacts_dir.join(TEST_PREDICTIONS_FILE),
        &split.test,
        &test_probs,
    )?;

    let selected = best.classifier.name().to_string();
    let bundle = ModelBundle::new(best.classifier, feature_cols.clone(), &view);
    bundle.save(artifacts_dir)?;

    Ok(TrainingOutcome {
        dataset_view: view,
        train_rows: split.train.len(),
        val_rows: split.val.len(),
        test_rows: split.test.len(),
        feature_count: feature_cols.len(),
        selected,
        selected_val: best.val,
        selected_test: best.test,
        report,
        artifacts_dir: artifacts_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::Predictor;
    use crate::TeamId;
    use std::fmt::Write as _;

    fn small_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.data.data_dir = root.join("data").to_string_lossy().into_owned();
        config.data.database_path = root.join("data/hoops.db").to_string_lossy().into_owned();
        config.data.artifacts_dir = root.join("artifacts").to_string_lossy().into_owned();
        config.training.logistic.epochs = 30;
        config.training.mlp.epochs = 3;
        config.training.mlp.hidden_dims = vec![4];
        config.training.mlp.batch_size = 16;
        config
    }

    /// A three-team league where team 1 wins most games
    fn write_league(data_dir: &Path) {
        std::fs::create_dir_all(data_dir).unwrap();
        std::fs::write(
            data_dir.join("NBA_TEAMS.csv"),
            "id,full_name,abbreviation\n1,Alpha,AAA\n2,Beta,BBB\n3,Gamma,CCC\n",
        )
        .unwrap();

        let abbr = ["AAA", "BBB", "CCC"];
        let mut games = String::from("GAME_ID,GAME_DATE,TEAM_ID,MATCHUP,WL,PTS,REB\n");
        let start = chrono::NaiveDate::from_ymd_opt(2021, 10, 20).unwrap();
        for i in 0..45usize {
            let home = i % 3;
            let away = (i + 1) % 3;
            let date = start + chrono::Duration::days(i as i64 * 2);
            let home_wins = home == 0 || (away != 0 && i % 2 == 0);
            let (hw, aw) = if home_wins { ("W", "L") } else { ("L", "W") };
            let (hp, ap) = if home_wins { (110, 100) } else { (98, 105) };
            writeln!(
                games,
                "{id},{date},{t},{a} vs. {b},{w},{p},{r}",
                id = format!("00{}", 1000 + i),
                t = home + 1,
                a = abbr[home],
                b = abbr[away],
                w = hw,
                p = hp,
                r = 40 + i % 7,
            )
            .unwrap();
            writeln!(
                games,
                "{id},{date},{t},{a} @ {b},{w},{p},{r}",
                id = format!("00{}", 1000 + i),
                t = away + 1,
                a = abbr[away],
                b = abbr[home],
                w = aw,
                p = ap,
                r = 38 + i % 5,
            )
            .unwrap();
        }
        std::fs::write(data_dir.join("NBA_GAMES.csv"), games).unwrap();
    }

    #[test]
    fn test_full_run_writes_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let config = small_config(root.path());
        write_league(Path::new(&config.data.data_dir));

        let outcome = run_training(&config).unwrap();
        assert_eq!(outcome.dataset_view, "v_training_dataset");
        // 45 games, two rows each
        assert_eq!(outcome.train_rows + outcome.val_rows + outcome.test_rows, 90);
        assert_eq!(outcome.test_rows, 18);
        assert_eq!(outcome.val_rows, 9);
        assert!(["lr", "mlp"].contains(&outcome.selected.as_str()));

        let artifacts = Path::new(&config.data.artifacts_dir);
        for file in [METRICS_FILE, TEST_PREDICTIONS_FILE, "model.json", "model.mpk"] {
            assert!(artifacts.join(file).exists(), "missing {}", file);
        }

        let report = MetricsReport::load(artifacts.join(METRICS_FILE)).unwrap();
        for model in ["lr", "mlp"] {
            for split in ["val", "test"] {
                for metric in ["roc_auc", "logloss", "accuracy"] {
                    assert!(report.0.contains_key(&format!("{}_{}_{}", model, split, metric)));
                }
            }
        }

        let test_csv = std::fs::read_to_string(artifacts.join(TEST_PREDICTIONS_FILE)).unwrap();
        assert_eq!(test_csv.lines().count(), 1 + 18);

        // Score the whole view with the saved bundle
        let db = Database::open(&config.data.database_path).unwrap();
        let predictor = Predictor::load(artifacts).unwrap();
        assert_eq!(predictor.bundle().model_name, outcome.selected);
        assert_eq!(predictor.score_all(&db, artifacts).unwrap(), 90);

        let matchup = predictor.matchup(&db, TeamId(1), TeamId(2), None).unwrap();
        assert!((matchup.prob_a + matchup.prob_b - 1.0).abs() < 1e-9);
        assert_eq!(matchup.team_a, TeamId(1));
    }

    #[test]
    fn test_empty_training_partition_fails() {
        let root = tempfile::tempdir().unwrap();
        let mut config = small_config(root.path());
        config.split.test_fraction = 0.5;
        config.split.val_fraction = 0.5;

        let dataset = FeatureDataset {
            view: "v_training_dataset".to_string(),
            feature_cols: vec![],
            rows: vec![],
        };
        assert!(matches!(
            train_on_dataset(dataset, &config, &root.path().join("artifacts")),
            Err(HoopsError::EmptyPartition("train"))
        ));
    }
}
