//! Classifier capability and the shared preprocessing step
//!
//! Every candidate exposes `fit` and `predict_proba`; the selector never
//! looks further than that. The concrete candidates are wrapped in
//! [`Estimator`] so they can be persisted and restored.

use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::FeatureMatrix;
use crate::model::MlpArchitecture;
use crate::training::logistic_trainer::LogisticClassifier;
use crate::training::mlp_trainer::MlpClassifier;
use crate::{HoopsError, Result, TrainingConfig};

/// A binary classifier producing P(win)
pub trait Classifier {
    /// Short tag used in metric keys and the model bundle
    fn name(&self) -> &str;

    fn fit(&mut self, features: &FeatureMatrix, labels: &[u8]) -> Result<()>;

    /// Probability of the positive class for each row
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;
}

/// Median imputation followed by z-score scaling
///
/// Fitted on training rows only and applied unchanged to every other
/// partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub medians: Vec<f32>,
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Preprocessor {
    pub fn fit(features: &FeatureMatrix) -> Self {
        let dim = features.n_cols();
        let mut medians = Vec::with_capacity(dim);
        let mut mean = Vec::with_capacity(dim);
        let mut std = Vec::with_capacity(dim);

        for j in 0..dim {
            let mut present: Vec<f32> = features.rows.iter().filter_map(|r| r[j]).collect();
            present.sort_by(|a, b| a.total_cmp(b));
            let median = median(&present).unwrap_or(0.0);

            let n = features.n_rows().max(1) as f64;
            let imputed = features.rows.iter().map(|r| r[j].unwrap_or(median) as f64);
            let m = imputed.clone().sum::<f64>() / n;
            let var = imputed.map(|v| (v - m) * (v - m)).sum::<f64>() / n;
            let s = var.sqrt();

            medians.push(median);
            mean.push(m as f32);
            // Constant columns are centered but left unscaled
            std.push(if s < 1e-6 { 1.0 } else { s as f32 });
        }

        Preprocessor { medians, mean, std }
    }

    pub fn dim(&self) -> usize {
        self.medians.len()
    }

    /// Dense row-major values ready for the network
    pub fn transform(&self, features: &FeatureMatrix) -> Result<Vec<f32>> {
        if features.n_cols() != self.dim() {
            return Err(HoopsError::Model(format!(
                "expected {} feature columns, got {}",
                self.dim(),
                features.n_cols()
            )));
        }

        let mut out = Vec::with_capacity(features.n_rows() * self.dim());
        for row in &features.rows {
            for (j, cell) in row.iter().enumerate() {
                let v = cell.unwrap_or(self.medians[j]);
                out.push((v - self.mean[j]) / self.std[j]);
            }
        }
        Ok(out)
    }

    pub fn to_tensor<B: Backend>(
        &self,
        features: &FeatureMatrix,
        device: &B::Device,
    ) -> Result<Tensor<B, 2>> {
        let values = self.transform(features)?;
        Ok(Tensor::from_data(
            TensorData::new(values, [features.n_rows(), self.dim()]),
            device,
        ))
    }
}

fn median(sorted: &[f32]) -> Option<f32> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

/// A non-empty training set with one label per row
pub(crate) fn check_training_input(features: &FeatureMatrix, labels: &[u8]) -> Result<()> {
    if features.n_rows() == 0 {
        return Err(HoopsError::EmptyPartition("train"));
    }
    if features.n_cols() == 0 {
        return Err(HoopsError::Model("no feature columns".to_string()));
    }
    if labels.len() != features.n_rows() {
        return Err(HoopsError::Model(format!(
            "{} labels for {} training rows",
            labels.len(),
            features.n_rows()
        )));
    }
    Ok(())
}

/// Labels as a `[n, 1]` float tensor
pub(crate) fn targets_tensor<B: Backend>(labels: &[u8], device: &B::Device) -> Tensor<B, 2> {
    let values: Vec<f32> = labels.iter().map(|y| f32::from(*y)).collect();
    Tensor::from_data(TensorData::new(values, [labels.len(), 1]), device)
}

/// Binary cross-entropy on probabilities, clamped away from 0 and 1
pub(crate) fn binary_cross_entropy<B: Backend>(
    probs: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs_clamped = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs_clamped.clone().log()
        - (targets.neg() + 1.0) * (probs_clamped.neg() + 1.0).log();
    loss.mean()
}

/// Win probabilities from logits
pub(crate) fn probabilities<B: Backend>(logits: Tensor<B, 2>) -> Result<Vec<f64>> {
    let data = sigmoid(logits).into_data();
    let values = data
        .to_vec::<f32>()
        .map_err(|e| HoopsError::Model(format!("failed to read predictions: {:?}", e)))?;
    Ok(values.into_iter().map(f64::from).collect())
}

/// Persisted description of a fitted estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    Logistic {
        preprocessor: Preprocessor,
    },
    Mlp {
        preprocessor: Preprocessor,
        architecture: MlpArchitecture,
    },
}

/// The candidate estimators, in evaluation order
pub enum Estimator {
    Logistic(LogisticClassifier),
    Mlp(MlpClassifier),
}

impl Estimator {
    /// Unfitted candidates: `lr` then `mlp`
    ///
    /// This order is also the tie-break order during selection.
    pub fn candidates(config: &TrainingConfig) -> Vec<Estimator> {
        vec![
            Estimator::Logistic(LogisticClassifier::new(config.logistic.clone(), config.seed)),
            Estimator::Mlp(MlpClassifier::new(config.mlp.clone(), config.seed)),
        ]
    }

    /// Description of the fitted estimator, without weights
    pub fn spec(&self) -> Result<EstimatorSpec> {
        match self {
            Estimator::Logistic(lr) => Ok(EstimatorSpec::Logistic {
                preprocessor: lr.fitted()?.preprocessor.clone(),
            }),
            Estimator::Mlp(mlp) => {
                let fitted = mlp.fitted()?;
                Ok(EstimatorSpec::Mlp {
                    preprocessor: fitted.preprocessor.clone(),
                    architecture: fitted.architecture.clone(),
                })
            }
        }
    }

    /// Write the fitted weights to `<path>.mpk`
    pub fn save_weights(&self, path: &Path) -> Result<()> {
        match self {
            Estimator::Logistic(lr) => lr.save_weights(path),
            Estimator::Mlp(mlp) => mlp.save_weights(path),
        }
    }

    /// Rebuild a fitted estimator from its spec and saved weights
    pub fn restore(spec: EstimatorSpec, path: &Path) -> Result<Self> {
        match spec {
            EstimatorSpec::Logistic { preprocessor } => Ok(Estimator::Logistic(
                LogisticClassifier::restore(preprocessor, path)?,
            )),
            EstimatorSpec::Mlp {
                preprocessor,
                architecture,
            } => Ok(Estimator::Mlp(MlpClassifier::restore(
                preprocessor,
                architecture,
                path,
            )?)),
        }
    }
}

impl Classifier for Estimator {
    fn name(&self) -> &str {
        match self {
            Estimator::Logistic(lr) => lr.name(),
            Estimator::Mlp(mlp) => mlp.name(),
        }
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &[u8]) -> Result<()> {
        match self {
            Estimator::Logistic(lr) => lr.fit(features, labels),
            Estimator::Mlp(mlp) => mlp.fit(features, labels),
        }
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        match self {
            Estimator::Logistic(lr) => lr.predict_proba(features),
            Estimator::Mlp(mlp) => mlp.predict_proba(features),
        }
    }
}
