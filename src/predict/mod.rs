//! Prediction and inference
//!
//! Persist the selected model and score the store with it.

pub mod artifact;
pub mod inference;

pub use artifact::ModelBundle;
pub use inference::{MatchupPrediction, Predictor};
