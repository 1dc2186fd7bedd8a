//! Logistic regression as a single linear unit

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

#[derive(Module, Debug)]
pub struct LogisticModel<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> LogisticModel<B> {
    pub fn new(device: &B::Device, input_dim: usize) -> Self {
        LogisticModel {
            linear: LinearConfig::new(input_dim, 1).init(device),
        }
    }

    /// Win logits `[batch, 1]`
    pub fn forward(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(inputs)
    }
}
