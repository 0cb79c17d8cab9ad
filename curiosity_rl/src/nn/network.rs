//! The network seam between the agent and its function approximators.
//!
//! The agent only needs policy logits, state values and (optionally) the
//! curiosity triple. [`IcmPpoModel`] bundles the default CNNs into one
//! module so a single optimizer updates every trainable parameter.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::actor_critic::{CnnActorCritic, CnnActorCriticConfig};
use super::curiosity::{CuriosityModel, CuriosityModelConfig, CuriosityOutput};

/// Policy/value network with an optional curiosity module.
///
/// Implement for any `B: Backend`: the agent evaluates the inner-backend copy
/// (`model.valid()`) for rollouts and the autodiff copy for updates.
pub trait IcmPpoNetwork<B: Backend>: Module<B> {
    /// `obs [N, H, h, w]` → `(logits [N, A], value [N, 1])`.
    fn policy_value(&self, obs: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>);

    /// Curiosity pass, or `None` when the network has no curiosity module.
    fn curiosity(
        &self,
        state: Tensor<B, 4>,
        next_state: Tensor<B, 4>,
        action_one_hot: Tensor<B, 2>,
    ) -> Option<CuriosityOutput<B>>;

    fn n_actions(&self) -> usize;

    fn has_curiosity(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmPpoModelConfig {
    pub history: usize,
    pub height: usize,
    pub width: usize,
    pub n_actions: usize,
    pub hidden: usize,
    pub feature_dim: usize,
    pub use_icm: bool,
}

impl IcmPpoModelConfig {
    pub fn new(history: usize, height: usize, width: usize, n_actions: usize) -> Self {
        Self {
            history,
            height,
            width,
            n_actions,
            hidden: 512,
            feature_dim: 512,
            use_icm: true,
        }
    }

    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_feature_dim(mut self, feature_dim: usize) -> Self {
        self.feature_dim = feature_dim;
        self
    }

    pub fn with_icm(mut self, use_icm: bool) -> Self {
        self.use_icm = use_icm;
        self
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> IcmPpoModel<B> {
        let policy = CnnActorCriticConfig::new(self.history, self.height, self.width, self.n_actions)
            .with_hidden(self.hidden)
            .init(device);
        let curiosity = self.use_icm.then(|| {
            CuriosityModelConfig::new(self.history, self.height, self.width, self.n_actions)
                .with_feature_dim(self.feature_dim)
                .init(device)
        });
        IcmPpoModel { policy, curiosity }
    }
}

/// Actor-critic plus optional ICM, trained as one module.
#[derive(Module, Debug)]
pub struct IcmPpoModel<B: Backend> {
    pub policy: CnnActorCritic<B>,
    pub curiosity: Option<CuriosityModel<B>>,
}

impl<B: Backend> IcmPpoNetwork<B> for IcmPpoModel<B> {
    fn policy_value(&self, obs: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        self.policy.forward(obs)
    }

    fn curiosity(
        &self,
        state: Tensor<B, 4>,
        next_state: Tensor<B, 4>,
        action_one_hot: Tensor<B, 2>,
    ) -> Option<CuriosityOutput<B>> {
        self.curiosity
            .as_ref()
            .map(|icm| icm.forward(state, next_state, action_one_hot))
    }

    fn n_actions(&self) -> usize {
        self.policy.n_actions()
    }

    fn has_curiosity(&self) -> bool {
        self.curiosity.is_some()
    }
}
