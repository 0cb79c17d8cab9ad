//! Default function approximators and gradient utilities.
//!
//! # Modules
//!
//! - [`actor_critic`]: convolutional policy/value network
//! - [`curiosity`]: ICM feature encoder with inverse and forward heads
//! - [`network`]: the [`IcmPpoNetwork`] seam the agent trains through
//! - [`grad_clip`]: global gradient-norm clipping across a whole module

pub mod actor_critic;
pub mod curiosity;
pub mod grad_clip;
pub mod network;

pub use actor_critic::{CnnActorCritic, CnnActorCriticConfig};
pub use curiosity::{CuriosityModel, CuriosityModelConfig, CuriosityOutput};
pub use grad_clip::{clip_grad_norm, grad_norm};
pub use network::{IcmPpoModel, IcmPpoModelConfig, IcmPpoNetwork};

/// Output size of a valid (unpadded) convolution.
pub(crate) fn conv_out(size: usize, kernel: usize, stride: usize) -> usize {
    if size < kernel {
        0
    } else {
        (size - kernel) / stride + 1
    }
}

/// Spatial size after the standard 8/4, 4/2, 3/1 convolution stack.
pub fn conv_stack_output(height: usize, width: usize) -> [usize; 2] {
    let h = conv_out(conv_out(conv_out(height, 8, 4), 4, 2), 3, 1);
    let w = conv_out(conv_out(conv_out(width, 8, 4), 4, 2), 3, 1);
    [h, w]
}
