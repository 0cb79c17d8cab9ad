//! Global gradient-norm clipping.
//!
//! Burn's built-in clipping works per parameter tensor. PPO clips the norm
//! of all gradients concatenated, so we walk the module twice: once to sum
//! squared gradients, once to rescale them when the total exceeds the cap.

use std::marker::PhantomData;

use burn::module::{AutodiffModule, ModuleMapper, Param};
use burn::optim::GradientsParams;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};

struct SquaredNormAccumulator<'a, B: AutodiffBackend> {
    grads: &'a GradientsParams,
    sum: f64,
    _backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleMapper<B> for SquaredNormAccumulator<'_, B> {
    fn map_float<const D: usize>(&mut self, param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(param.id.clone()) {
            let sq: f32 = grad.powf_scalar(2.0).sum().into_scalar().elem();
            self.sum += sq as f64;
        }
        param
    }
}

struct GradScaler<'a, B: AutodiffBackend> {
    grads: &'a mut GradientsParams,
    factor: f32,
    _backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleMapper<B> for GradScaler<'_, B> {
    fn map_float<const D: usize>(&mut self, param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
        let id = param.id.clone();
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id.clone()) {
            self.grads.register(id, grad.mul_scalar(self.factor));
        }
        param
    }
}

/// L2 norm of every gradient registered for `model`'s parameters.
///
/// Returns the model unchanged; mapping consumes it.
pub fn grad_norm<B, M>(model: M, grads: &GradientsParams) -> (M, f32)
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut acc = SquaredNormAccumulator::<B> {
        grads,
        sum: 0.0,
        _backend: PhantomData,
    };
    let model = model.map(&mut acc);
    (model, acc.sum.sqrt() as f32)
}

/// Rescales `grads` in place so their global norm is at most `max_norm`.
///
/// Returns the model and the norm measured before clipping.
pub fn clip_grad_norm<B, M>(model: M, grads: &mut GradientsParams, max_norm: f32) -> (M, f32)
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let (model, total) = grad_norm::<B, M>(model, grads);
    let coef = max_norm / (total + 1e-6);
    if coef >= 1.0 || !total.is_finite() {
        return (model, total);
    }
    let mut scaler = GradScaler::<B> {
        grads,
        factor: coef,
        _backend: PhantomData,
    };
    (model.map(&mut scaler), total)
}
