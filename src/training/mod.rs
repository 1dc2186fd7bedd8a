//! Model training
//!
//! Chronological splitting, candidate estimators, evaluation metrics and
//! model selection.

pub mod estimator;
pub mod logistic_trainer;
pub mod metrics;
pub mod mlp_trainer;
pub mod run;
pub mod selection;
pub mod split;

pub use estimator::{Classifier, Estimator, EstimatorSpec, Preprocessor};
pub use logistic_trainer::LogisticClassifier;
pub use metrics::{EvalMetrics, MetricsReport};
pub use mlp_trainer::MlpClassifier;
pub use run::{run_training, train_on_dataset, TrainingOutcome};
pub use selection::{evaluate_candidates, select_best, Selection};
pub use split::{temporal_split, Dated, SplitRatios, TemporalSplit};
