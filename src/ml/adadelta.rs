// ============================================================
// Layer 5 — Adadelta Optimiser
// ============================================================
// Burn ships Adam, AdamW and SGD but not Adadelta, so we add it
// as a SimpleOptimizer. OptimizerAdaptor then handles gradient
// lookup per parameter exactly as it does for the built-ins.
//
// Per parameter, with decay ρ and stability term ε:
//
//   E[g²]  = ρ·E[g²]  + (1-ρ)·g²
//   Δ      = √(E[Δ²] + ε) / √(E[g²] + ε) · g
//   E[Δ²]  = ρ·E[Δ²]  + (1-ρ)·Δ²
//   θ      = θ - lr·Δ
//
// Reference: Zeiler (2012) ADADELTA: An Adaptive Learning Rate Method

use burn::{
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, SimpleOptimizer},
    prelude::*,
    record::Record,
    tensor::backend::AutodiffBackend,
};

#[derive(Config, Debug)]
pub struct AdadeltaConfig {
    /// Decay rate of both running averages.
    #[config(default = 0.9)]
    pub rho: f64,
    #[config(default = 1e-6)]
    pub epsilon: f64,
}

impl AdadeltaConfig {
    pub fn init<B: AutodiffBackend, M: AutodiffModule<B>>(&self) -> OptimizerAdaptor<Adadelta, M, B> {
        OptimizerAdaptor::from(Adadelta { rho: self.rho, epsilon: self.epsilon })
    }
}

#[derive(Clone, Debug)]
pub struct Adadelta {
    rho:     f64,
    epsilon: f64,
}

/// Running averages for one parameter tensor.
#[derive(Record, Clone)]
pub struct AdadeltaState<B: Backend, const D: usize> {
    pub square_avg: Tensor<B, D>,
    pub acc_delta:  Tensor<B, D>,
}

impl<B: Backend> SimpleOptimizer<B> for Adadelta {
    type State<const D: usize> = AdadeltaState<B, D>;

    fn step<const D: usize>(
        &self,
        lr:     f64,
        tensor: Tensor<B, D>,
        grad:   Tensor<B, D>,
        state:  Option<Self::State<D>>,
    ) -> (Tensor<B, D>, Option<Self::State<D>>) {
        let (square_avg, acc_delta) = match state {
            Some(state) => (state.square_avg, state.acc_delta),
            None        => (grad.zeros_like(), grad.zeros_like()),
        };

        let square_avg = square_avg
            .mul_scalar(self.rho)
            .add(grad.clone().powf_scalar(2.0).mul_scalar(1.0 - self.rho));
        let std   = square_avg.clone().add_scalar(self.epsilon).sqrt();
        let delta = acc_delta.clone().add_scalar(self.epsilon).sqrt().div(std).mul(grad);
        let acc_delta = acc_delta
            .mul_scalar(self.rho)
            .add(delta.clone().powf_scalar(2.0).mul_scalar(1.0 - self.rho));

        let tensor = tensor.sub(delta.mul_scalar(lr));
        (tensor, Some(AdadeltaState { square_avg, acc_delta }))
    }

    fn to_device<const D: usize>(state: Self::State<D>, device: &B::Device) -> Self::State<D> {
        AdadeltaState {
            square_avg: state.square_avg.to_device(device),
            acc_delta:  state.acc_delta.to_device(device),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_first_step_moves_against_gradient() {
        let device = Default::default();
        let optim = Adadelta { rho: 0.9, epsilon: 1e-6 };
        let param = Tensor::<TestBackend, 1>::from_floats([1.0, -2.0], &device);
        let grad  = Tensor::<TestBackend, 1>::from_floats([0.5, -0.5], &device);

        let (param, state) = SimpleOptimizer::<TestBackend>::step(&optim, 1.0, param, grad, None);
        let values = param.into_data().convert::<f32>().to_vec::<f32>().unwrap();

        // E[g²] = 0.1 · 0.25, Δ = √ε / √(E[g²] + ε) · g
        let step = (0.5 * 1e-6f64.sqrt() / (0.025f64 + 1e-6).sqrt()) as f32;
        assert!((values[0] - (1.0 - step)).abs() < 1e-6);
        assert!((values[1] - (-2.0 + step)).abs() < 1e-6);
        assert!(state.is_some());
    }

    #[test]
    fn test_state_accumulates() {
        let device = Default::default();
        let optim = Adadelta { rho: 0.5, epsilon: 1e-6 };
        let grad  = Tensor::<TestBackend, 1>::from_floats([1.0], &device);

        let (param, state) =
            SimpleOptimizer::<TestBackend>::step(&optim, 1.0, Tensor::zeros([1], &device), grad.clone(), None);
        let (_, state) = SimpleOptimizer::<TestBackend>::step(&optim, 1.0, param, grad, state);

        let square_avg = state.unwrap().square_avg.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        // 0.5 · (0.5 · 1) + 0.5 · 1
        assert!((square_avg[0] - 0.75).abs() < 1e-6);
    }
}
