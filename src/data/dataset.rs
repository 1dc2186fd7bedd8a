//! Feature datasets loaded from the store's training views
//!
//! Also provides the burn `Dataset`/`Batcher` adapters used by the
//! mini-batch trainers.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use chrono::NaiveDate;

use crate::{HoopsError, Result, TeamId};

/// One (game, team) row of a training view
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub game_id: String,
    pub season: i32,
    pub game_date: NaiveDate,
    pub team_id: TeamId,
    pub opponent_team_id: TeamId,
    pub is_home: bool,
    pub y_win: u8,
    /// Feature cells in `FeatureDataset::feature_cols` order
    pub features: Vec<Option<f32>>,
}

/// A training view split into identity columns, target and features
#[derive(Debug, Clone)]
pub struct FeatureDataset {
    pub view: String,
    pub feature_cols: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureDataset {
    /// Columns that identify a row or hold the target; never used as features
    pub const IDENTITY_COLUMNS: [&'static str; 6] = [
        "game_id",
        "season",
        "game_date",
        "team_id",
        "opponent_team_id",
        "y_win",
    ];

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature matrix with columns in this dataset's order
    pub fn matrix(&self) -> FeatureMatrix {
        FeatureMatrix::from_rows(self.feature_cols.clone(), &self.rows)
    }

    /// Feature matrix restricted and reordered to `columns`
    ///
    /// Fails when a requested column is not in this dataset.
    pub fn select_features(&self, columns: &[String]) -> Result<FeatureMatrix> {
        select_columns(&self.feature_cols, columns, &self.rows)
    }
}

/// Select named feature columns out of `rows`
pub fn select_columns(
    available: &[String],
    columns: &[String],
    rows: &[FeatureRow],
) -> Result<FeatureMatrix> {
    let positions = columns
        .iter()
        .map(|c| {
            available.iter().position(|a| a == c).ok_or_else(|| {
                HoopsError::Model(format!("feature column {} is not in the dataset", c))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let values = rows
        .iter()
        .map(|r| positions.iter().map(|p| r.features[*p]).collect())
        .collect();

    Ok(FeatureMatrix {
        columns: columns.to_vec(),
        rows: values,
    })
}

/// Row-major feature cells, possibly missing
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f32>>>,
}

impl FeatureMatrix {
    pub fn from_rows(columns: Vec<String>, rows: &[FeatureRow]) -> Self {
        FeatureMatrix {
            columns,
            rows: rows.iter().map(|r| r.features.clone()).collect(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }
}

/// Targets of `rows` in order
pub fn labels(rows: &[FeatureRow]) -> Vec<u8> {
    rows.iter().map(|r| r.y_win).collect()
}

/// A dense, preprocessed training example
#[derive(Debug, Clone)]
pub struct FeatureSample {
    pub inputs: Vec<f32>,
    pub target: f32,
}

/// In-memory dataset of preprocessed samples
#[derive(Debug, Clone)]
pub struct SampleDataset {
    samples: Vec<FeatureSample>,
}

impl SampleDataset {
    /// Pair dense row-major `inputs` of width `dim` with their labels
    pub fn new(inputs: &[f32], dim: usize, labels: &[u8]) -> Self {
        let samples = inputs
            .chunks(dim.max(1))
            .zip(labels)
            .map(|(row, y)| FeatureSample {
                inputs: row.to_vec(),
                target: f32::from(*y),
            })
            .collect();
        SampleDataset { samples }
    }
}

impl Dataset<FeatureSample> for SampleDataset {
    fn get(&self, index: usize) -> Option<FeatureSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Batch of samples: inputs `[batch, dim]`, targets `[batch, 1]`
#[derive(Debug, Clone)]
pub struct FeatureBatch<B: Backend> {
    pub inputs: Tensor<B, 2>,
    pub targets: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct FeatureBatcher {
    dim: usize,
}

impl FeatureBatcher {
    pub fn new(dim: usize) -> Self {
        FeatureBatcher { dim }
    }
}

impl<B: Backend> Batcher<B, FeatureSample, FeatureBatch<B>> for FeatureBatcher {
    fn batch(&self, items: Vec<FeatureSample>, device: &B::Device) -> FeatureBatch<B> {
        let batch_size = items.len();
        let mut inputs = Vec::with_capacity(batch_size * self.dim);
        let mut targets = Vec::with_capacity(batch_size);
        for item in items {
            inputs.extend(item.inputs);
            targets.push(item.target);
        }

        FeatureBatch {
            inputs: Tensor::from_data(TensorData::new(inputs, [batch_size, self.dim]), device),
            targets: Tensor::from_data(TensorData::new(targets, [batch_size, 1]), device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn row(game: &str, features: Vec<Option<f32>>) -> FeatureRow {
        FeatureRow {
            game_id: game.to_string(),
            season: 2021,
            game_date: NaiveDate::from_ymd_opt(2021, 11, 1).unwrap(),
            team_id: TeamId(1),
            opponent_team_id: TeamId(2),
            is_home: true,
            y_win: 1,
            features,
        }
    }

    fn dataset() -> FeatureDataset {
        FeatureDataset {
            view: "v_training_dataset".to_string(),
            feature_cols: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            rows: vec![
                row("g1", vec![Some(1.0), None, Some(3.0)]),
                row("g2", vec![Some(4.0), Some(5.0), Some(6.0)]),
            ],
        }
    }

    #[test]
    fn test_select_features_reorders() {
        let ds = dataset();
        let m = ds
            .select_features(&["c".to_string(), "a".to_string()])
            .unwrap();
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.rows[0], vec![Some(3.0), Some(1.0)]);
        assert_eq!(m.rows[1], vec![Some(6.0), Some(4.0)]);
    }

    #[test]
    fn test_select_missing_feature_fails() {
        let ds = dataset();
        assert!(ds.select_features(&["zzz".to_string()]).is_err());
    }

    #[test]
    fn test_batcher_shapes() {
        let samples = SampleDataset::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, &[1, 0]);
        assert_eq!(samples.len(), 2);

        let items: Vec<_> = (0..samples.len()).filter_map(|i| samples.get(i)).collect();
        let device = Default::default();
        let batch: FeatureBatch<TestBackend> = FeatureBatcher::new(3).batch(items, &device);

        assert_eq!(batch.inputs.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2, 1]);
        let targets = batch.targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(targets, vec![1.0, 0.0]);
    }
}
