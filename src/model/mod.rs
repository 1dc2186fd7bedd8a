//! Neural network architectures
//!
//! Two win classifiers over the same dense feature vector:
//! - Logistic: a single linear unit
//! - MLP: hidden ReLU blocks with dropout

pub mod logistic;
pub mod mlp;

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use std::path::Path;

pub use logistic::LogisticModel;
pub use mlp::{MlpArchitecture, MlpModel};

use crate::{HoopsError, Result};

/// Inference backend
pub type Backend = NdArray<f32>;
/// Training backend
pub type TrainBackend = Autodiff<Backend>;

/// Save a module's record as `<path>.mpk`
pub fn save_record<M: burn::module::Module<Backend>>(module: M, path: &Path) -> Result<()> {
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    Recorder::<Backend>::record(&recorder, module.into_record(), path.to_path_buf())
        .map_err(|e| HoopsError::Model(format!("failed to save {}: {}", path.display(), e)))
}

/// Load a record saved by [`save_record`] into a freshly built module
pub fn load_record<M: burn::module::Module<Backend>>(module: M, path: &Path) -> Result<M> {
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let device = NdArrayDevice::default();
    let record: M::Record = Recorder::<Backend>::load(&recorder, path.to_path_buf(), &device)
        .map_err(|e| HoopsError::Model(format!("failed to load {}: {}", path.display(), e)))?;
    Ok(module.load_record(record))
}
