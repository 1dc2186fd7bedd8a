//! Persisted model bundle
//!
//! `model.json` carries the model name, the ordered feature columns, the
//! source view and the fitted preprocessing; `model.mpk` carries the burn
//! weights.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::FeatureDataset;
use crate::training::{Classifier, Estimator, EstimatorSpec};
use crate::{HoopsError, Result};

pub const MANIFEST_FILE: &str = "model.json";
/// Weights are written as `<stem>.mpk`
pub const WEIGHTS_STEM: &str = "model";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    pub model_name: String,
    pub feature_cols: Vec<String>,
    pub dataset_view: String,
    pub estimator: EstimatorSpec,
}

/// The selected estimator plus what it needs to score new rows
pub struct ModelBundle {
    pub model_name: String,
    pub feature_cols: Vec<String>,
    pub dataset_view: String,
    pub estimator: Estimator,
}

impl ModelBundle {
    pub fn new(estimator: Estimator, feature_cols: Vec<String>, dataset_view: &str) -> Self {
        ModelBundle {
            model_name: estimator.name().to_string(),
            feature_cols,
            dataset_view: dataset_view.to_string(),
            estimator,
        }
    }

    fn weights_path(dir: &Path) -> PathBuf {
        dir.join(WEIGHTS_STEM)
    }

    /// Write manifest and weights into `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let manifest = BundleManifest {
            model_name: self.model_name.clone(),
            feature_cols: self.feature_cols.clone(),
            dataset_view: self.dataset_view.clone(),
            estimator: self.estimator.spec()?,
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| HoopsError::Model(format!("failed to serialize bundle: {}", e)))?;
        std::fs::write(dir.join(MANIFEST_FILE), json)?;
        self.estimator.save_weights(&Self::weights_path(dir))?;

        log::info!("Saved {} bundle to {}", self.model_name, dir.display());
        Ok(())
    }

    /// Load a bundle saved by [`ModelBundle::save`]
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(HoopsError::NoModel);
        }

        let content = std::fs::read_to_string(&manifest_path)?;
        let manifest: BundleManifest = serde_json::from_str(&content)
            .map_err(|e| HoopsError::Model(format!("invalid {}: {}", MANIFEST_FILE, e)))?;
        let estimator = Estimator::restore(manifest.estimator, &Self::weights_path(dir))?;

        Ok(ModelBundle {
            model_name: manifest.model_name,
            feature_cols: manifest.feature_cols,
            dataset_view: manifest.dataset_view,
            estimator,
        })
    }

    /// P(win) for every row of `dataset`, using the recorded feature columns
    pub fn predict_dataset(&self, dataset: &FeatureDataset) -> Result<Vec<f64>> {
        let features = dataset.select_features(&self.feature_cols)?;
        self.estimator.predict_proba(&features)
    }
}
