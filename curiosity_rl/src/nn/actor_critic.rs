//! Convolutional actor-critic over stacked grayscale frames.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::conv_stack_output;

/// Shape of the actor-critic network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CnnActorCriticConfig {
    pub history: usize,
    pub height: usize,
    pub width: usize,
    pub n_actions: usize,
    pub hidden: usize,
}

impl CnnActorCriticConfig {
    pub fn new(history: usize, height: usize, width: usize, n_actions: usize) -> Self {
        Self {
            history,
            height,
            width,
            n_actions,
            hidden: 512,
        }
    }

    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> CnnActorCritic<B> {
        let relu_gain = Initializer::KaimingUniform {
            gain: 2.0f64.sqrt(),
            fan_out_only: false,
        };
        let [h, w] = conv_stack_output(self.height, self.width);

        CnnActorCritic {
            conv1: Conv2dConfig::new([self.history, 32], [8, 8])
                .with_stride([4, 4])
                .with_initializer(relu_gain.clone())
                .init(device),
            conv2: Conv2dConfig::new([32, 64], [4, 4])
                .with_stride([2, 2])
                .with_initializer(relu_gain.clone())
                .init(device),
            conv3: Conv2dConfig::new([64, 64], [3, 3])
                .with_initializer(relu_gain.clone())
                .init(device),
            fc: LinearConfig::new(64 * h * w, self.hidden)
                .with_initializer(relu_gain)
                .init(device),
            actor: LinearConfig::new(self.hidden, self.n_actions)
                .with_initializer(Initializer::KaimingUniform {
                    gain: 0.01,
                    fan_out_only: false,
                })
                .init(device),
            critic: LinearConfig::new(self.hidden, 1).init(device),
            n_actions: self.n_actions,
        }
    }
}

/// Shared conv trunk with separate policy and value heads.
#[derive(Module, Debug)]
pub struct CnnActorCritic<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    fc: Linear<B>,
    actor: Linear<B>,
    critic: Linear<B>,
    n_actions: usize,
}

impl<B: Backend> CnnActorCritic<B> {
    /// `obs [N, history, h, w]` → `(logits [N, A], value [N, 1])`.
    pub fn forward(&self, obs: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let x = relu(self.conv1.forward(obs));
        let x = relu(self.conv2.forward(x));
        let x = relu(self.conv3.forward(x));
        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = relu(self.fc.forward(x));
        (self.actor.forward(x.clone()), self.critic.forward(x))
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }
}
