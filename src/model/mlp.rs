//! Multi-layer perceptron win classifier
//!
//! Architecture: Input(d) → [Linear → ReLU → Dropout] × len(hidden_dims)
//!                        → win_head(1)

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Configuration for the MLP model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpArchitecture {
    /// Number of input features
    pub input_dim: usize,
    /// Hidden layer widths, applied in order (empty for a linear model)
    pub hidden_dims: Vec<usize>,
    /// Dropout rate after each hidden layer
    pub dropout: f64,
}

/// A single hidden layer block: Linear → ReLU → Dropout
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize, dropout: f64) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = relu(x);
        self.dropout.forward(x)
    }
}

/// Stack of hidden blocks feeding a single win-logit head
#[derive(Module, Debug)]
pub struct MlpModel<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    win_head: Linear<B>,
}

impl<B: Backend> MlpModel<B> {
    pub fn new(device: &B::Device, arch: &MlpArchitecture) -> Self {
        let mut hidden = Vec::with_capacity(arch.hidden_dims.len());
        let mut in_dim = arch.input_dim;
        for &width in &arch.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, width, arch.dropout));
            in_dim = width;
        }

        MlpModel {
            hidden,
            win_head: LinearConfig::new(in_dim, 1).init(device),
        }
    }

    /// Win logits `[batch, 1]` for inputs `[batch, input_dim]`
    pub fn forward(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(inputs, |x, block| block.forward(x));
        self.win_head.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_mlp_model() {
        let device = Default::default();
        let arch = MlpArchitecture {
            input_dim: 6,
            hidden_dims: vec![8, 4],
            dropout: 0.1,
        };
        let model = MlpModel::<TestBackend>::new(&device, &arch);

        let inputs = Tensor::random(
            [4, 6],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        let logits = model.forward(inputs);
        assert_eq!(logits.dims(), [4, 1]);
        assert_eq!(model.hidden.len(), 2);
    }

    #[test]
    fn test_no_hidden_layers() {
        let device = Default::default();
        let arch = MlpArchitecture {
            input_dim: 3,
            hidden_dims: vec![],
            dropout: 0.0,
        };
        let model = MlpModel::<TestBackend>::new(&device, &arch);
        let logits = model.forward(Tensor::zeros([2, 3], &device));
        assert_eq!(logits.dims(), [2, 1]);
    }
}
