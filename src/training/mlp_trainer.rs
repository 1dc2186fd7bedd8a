//! Multi-layer perceptron candidate (`mlp`)
//!
//! Mini-batch Adam on binary cross-entropy. Each epoch visits the training
//! rows in an order drawn from a seeded RNG.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend as BurnBackend;
use burn::tensor::ElementConversion;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

use crate::data::dataset::{FeatureBatch, FeatureBatcher, FeatureSample, SampleDataset};
use crate::data::FeatureMatrix;
use crate::model::{self, Backend, MlpArchitecture, MlpModel, TrainBackend};
use crate::training::estimator::{
    binary_cross_entropy, check_training_input, probabilities, Classifier, Preprocessor,
};
use crate::{HoopsError, MlpConfig, Result};

/// A fitted MLP with its preprocessing and shape
pub struct FittedMlp {
    pub preprocessor: Preprocessor,
    pub architecture: MlpArchitecture,
    pub model: MlpModel<Backend>,
}

pub struct MlpClassifier {
    config: MlpConfig,
    seed: u64,
    fitted: Option<FittedMlp>,
}

impl MlpClassifier {
    pub const NAME: &'static str = "mlp";

    pub fn new(config: MlpConfig, seed: u64) -> Self {
        MlpClassifier {
            config,
            seed,
            fitted: None,
        }
    }

    pub fn fitted(&self) -> Result<&FittedMlp> {
        self.fitted
            .as_ref()
            .ok_or_else(|| HoopsError::Model(format!("{} is not fitted", Self::NAME)))
    }

    pub fn save_weights(&self, path: &Path) -> Result<()> {
        model::save_record(self.fitted()?.model.clone(), path)
    }

    pub fn restore(
        preprocessor: Preprocessor,
        architecture: MlpArchitecture,
        path: &Path,
    ) -> Result<Self> {
        let device = Default::default();
        let model = model::load_record(MlpModel::<Backend>::new(&device, &architecture), path)?;
        Ok(MlpClassifier {
            config: MlpConfig {
                hidden_dims: architecture.hidden_dims.clone(),
                dropout: architecture.dropout,
                epochs: 0,
                batch_size: 0,
                learning_rate: 0.0,
            },
            seed: 0,
            fitted: Some(FittedMlp {
                preprocessor,
                architecture,
                model,
            }),
        })
    }
}

impl Classifier for MlpClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &[u8]) -> Result<()> {
        check_training_input(features, labels)?;

        TrainBackend::seed(&Default::default(), self.seed);
        let device = Default::default();
        let preprocessor = Preprocessor::fit(features);
        let dim = preprocessor.dim();
        let inputs = preprocessor.transform(features)?;

        let dataset = SampleDataset::new(&inputs, dim, labels);
        let batcher = FeatureBatcher::new(dim);
        let batch_size = self.config.batch_size.clamp(1, dataset.len());

        let architecture = MlpArchitecture {
            input_dim: dim,
            hidden_dims: self.config.hidden_dims.clone(),
            dropout: self.config.dropout,
        };
        let mut model = MlpModel::<TrainBackend>::new(&device, &architecture);
        let mut optimizer = AdamConfig::new().init::<TrainBackend, MlpModel<TrainBackend>>();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..dataset.len()).collect();

        let epochs = self.config.epochs;
        log::info!(
            "Training {} {:?} on {} rows x {} features for {} epochs (batch size {})",
            Self::NAME,
            architecture.hidden_dims,
            dataset.len(),
            dim,
            epochs,
            batch_size
        );

        for epoch in 0..epochs {
            order.shuffle(&mut rng);
            let mut total_loss = 0.0f64;
            let mut batches = 0usize;

            for chunk in order.chunks(batch_size) {
                let items: Vec<FeatureSample> =
                    chunk.iter().filter_map(|i| dataset.get(*i)).collect();
                let batch: FeatureBatch<TrainBackend> = batcher.batch(items, &device);

                let probs = sigmoid(model.forward(batch.inputs));
                let loss = binary_cross_entropy(probs, batch.targets);
                let loss_val: f32 = loss.clone().into_scalar().elem();
                total_loss += f64::from(loss_val);
                batches += 1;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optimizer.step(self.config.learning_rate, model, grads);
            }

            if epoch % 10 == 0 || epoch + 1 == epochs {
                log::debug!(
                    "{} epoch {}/{}: loss={:.4}",
                    Self::NAME,
                    epoch + 1,
                    epochs,
                    total_loss / batches.max(1) as f64
                );
            }
        }

        self.fitted = Some(FittedMlp {
            preprocessor,
            architecture,
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
