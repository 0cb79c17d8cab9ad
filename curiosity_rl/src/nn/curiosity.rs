//! Intrinsic Curiosity Module.
//!
//! A shared encoder maps observation stacks to features `φ(s)`. The inverse
//! head predicts the taken action from `(φ(s), φ(s'))`; the forward head
//! predicts `φ(s')` from `(φ(s), a)`. The forward head's error is the
//! curiosity reward.
//!
//! Pathak et al., "Curiosity-driven Exploration by Self-supervised
//! Prediction" (2017)

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::tensor::activation::{leaky_relu, relu};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::conv_stack_output;

const LEAKY_SLOPE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CuriosityModelConfig {
    pub history: usize,
    pub height: usize,
    pub width: usize,
    pub n_actions: usize,
    pub feature_dim: usize,
}

impl CuriosityModelConfig {
    pub fn new(history: usize, height: usize, width: usize, n_actions: usize) -> Self {
        Self {
            history,
            height,
            width,
            n_actions,
            feature_dim: 512,
        }
    }

    pub fn with_feature_dim(mut self, feature_dim: usize) -> Self {
        self.feature_dim = feature_dim;
        self
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> CuriosityModel<B> {
        let init = Initializer::KaimingUniform {
            gain: 1.0,
            fan_out_only: false,
        };
        let [h, w] = conv_stack_output(self.height, self.width);
        let f = self.feature_dim;
        let linear = |d_in: usize, d_out: usize| {
            LinearConfig::new(d_in, d_out)
                .with_initializer(init.clone())
                .init(device)
        };

        CuriosityModel {
            conv1: Conv2dConfig::new([self.history, 32], [8, 8])
                .with_stride([4, 4])
                .with_initializer(init.clone())
                .init(device),
            conv2: Conv2dConfig::new([32, 64], [4, 4])
                .with_stride([2, 2])
                .with_initializer(init.clone())
                .init(device),
            conv3: Conv2dConfig::new([64, 64], [3, 3])
                .with_initializer(init.clone())
                .init(device),
            feature: linear(64 * h * w, f),
            inverse_hidden: linear(2 * f, f),
            inverse_out: linear(f, self.n_actions),
            forward_hidden: linear(f + self.n_actions, f),
            forward_out: linear(f, f),
            n_actions: self.n_actions,
        }
    }
}

/// Everything the agent needs from one curiosity pass.
#[derive(Debug, Clone)]
pub struct CuriosityOutput<B: Backend> {
    /// `φ(s')` [N, F]
    pub real_next_feature: Tensor<B, 2>,
    /// Forward-head prediction of `φ(s')` [N, F]
    pub pred_next_feature: Tensor<B, 2>,
    /// Inverse-head action logits [N, A]
    pub pred_action_logits: Tensor<B, 2>,
}

#[derive(Module, Debug)]
pub struct CuriosityModel<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    feature: Linear<B>,
    inverse_hidden: Linear<B>,
    inverse_out: Linear<B>,
    forward_hidden: Linear<B>,
    forward_out: Linear<B>,
    n_actions: usize,
}

impl<B: Backend> CuriosityModel<B> {
    /// `φ(s)` for a batch of observation stacks.
    pub fn encode(&self, obs: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = leaky_relu(self.conv1.forward(obs), LEAKY_SLOPE);
        let x = leaky_relu(self.conv2.forward(x), LEAKY_SLOPE);
        let x = leaky_relu(self.conv3.forward(x), LEAKY_SLOPE);
        self.feature.forward(x.flatten(1, 3))
    }

    pub fn forward(
        &self,
        state: Tensor<B, 4>,
        next_state: Tensor<B, 4>,
        action_one_hot: Tensor<B, 2>,
    ) -> CuriosityOutput<B> {
        let phi = self.encode(state);
        let phi_next = self.encode(next_state);

        let inverse_in = Tensor::cat(vec![phi.clone(), phi_next.clone()], 1);
        let pred_action_logits = self
            .inverse_out
            .forward(relu(self.inverse_hidden.forward(inverse_in)));

        let forward_in = Tensor::cat(vec![phi, action_one_hot], 1);
        let pred_next_feature = self.forward_out.forward(leaky_relu(
            self.forward_hidden.forward(forward_in),
            LEAKY_SLOPE,
        ));

        CuriosityOutput {
            real_next_feature: phi_next,
            pred_next_feature,
            pred_action_logits,
        }
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::one_hot;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_output_shapes() {
        let device = Default::default();
        let icm = CuriosityModelConfig::new(2, 36, 36, 3)
            .with_feature_dim(8)
            .init::<TestBackend>(&device);
        let s = Tensor::<TestBackend, 4>::zeros([2, 2, 36, 36], &device);
        let out = icm.forward(s.clone(), s, one_hot::<TestBackend>(&[0, 2], 3, &device));
        assert_eq!(out.real_next_feature.dims(), [2, 8]);
        assert_eq!(out.pred_next_feature.dims(), [2, 8]);
        assert_eq!(out.pred_action_logits.dims(), [2, 3]);
    }
}
