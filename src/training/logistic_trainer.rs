//! Logistic regression candidate (`lr`)
//!
//! Full-batch SGD on binary cross-entropy over the preprocessed features.

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend as BurnBackend;
use burn::tensor::ElementConversion;
use std::path::Path;

use crate::data::FeatureMatrix;
use crate::model::{self, Backend, LogisticModel, TrainBackend};
use crate::training::estimator::{
    binary_cross_entropy, check_training_input, probabilities, targets_tensor, Classifier,
    Preprocessor,
};
use crate::{HoopsError, LogisticConfig, Result};

/// A fitted logistic model with its preprocessing
pub struct FittedLogistic {
    pub preprocessor: Preprocessor,
    pub model: LogisticModel<Backend>,
}

pub struct LogisticClassifier {
    config: LogisticConfig,
    seed: u64,
    fitted: Option<FittedLogistic>,
}

impl LogisticClassifier {
    pub const NAME: &'static str = "lr";

    pub fn new(config: LogisticConfig, seed: u64) -> Self {
        LogisticClassifier {
            config,
            seed,
            fitted: None,
        }
    }

    pub fn fitted(&self) -> Result<&FittedLogistic> {
        self.fitted
            .as_ref()
            .ok_or_else(|| HoopsError::Model(format!("{} is not fitted", Self::NAME)))
    }

    pub fn save_weights(&self, path: &Path) -> Result<()> {
        model::save_record(self.fitted()?.model.clone(), path)
    }

    pub fn restore(preprocessor: Preprocessor, path: &Path) -> Result<Self> {
        let device = Default::default();
        let model = model::load_record(
            LogisticModel::<Backend>::new(&device, preprocessor.dim()),
            path,
        )?;
        Ok(LogisticClassifier {
            config: LogisticConfig {
                epochs: 0,
                learning_rate: 0.0,
            },
            seed: 0,
            fitted: Some(FittedLogistic {
                preprocessor,
                model,
            }),
        })
    }
}

impl Classifier for LogisticClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &[u8]) -> Result<()> {
        check_training_input(features, labels)?;

        TrainBackend::seed(&Default::default(), self.seed);
        let device = Default::default();
        let preprocessor = Preprocessor::fit(features);
        let x = preprocessor.to_tensor::<TrainBackend>(features, &device)?;
        let y = targets_tensor::<TrainBackend>(labels, &device);

        let mut model = LogisticModel::<TrainBackend>::new(&device, preprocessor.dim());
        let mut optimizer = SgdConfig::new().init::<TrainBackend, LogisticModel<TrainBackend>>();

        let epochs = self.config.epochs;
        log::info!(
            "Training {} on {} rows x {} features for {} epochs",
            Self::NAME,
            features.n_rows(),
            preprocessor.dim(),
            epochs
        );

        for epoch in 0..epochs {
            let probs = sigmoid(model.forward(x.clone()));
            let loss = binary_cross_entropy(probs, y.clone());

            if epoch % 100 == 0 || epoch + 1 == epochs {
                let loss_val: f32 = loss.clone().into_scalar().elem();
                log::debug!("{} epoch {}/{}: loss={:.4}", Self::NAME, epoch + 1, epochs, loss_val);
            }

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(self.config.learning_rate, model, grads);
        }

        self.fitted = Some(FittedLogistic {
            preprocessor,
            model: model.valid(),
        });
        Ok(())
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let fitted = self.fitted()?;
        if features.n_rows() == 0 {
            return Ok(Vec::new());
        }
        let device = Default::default();
        let x = fitted.preprocessor.to_tensor::<Backend>(features, &device)?;
        probabilities(fitted.model.forward(x))
    }
}
