// ============================================================
// Layer 5 — Optimisation Configurator
// ============================================================
// Turns a flat bag of hyperparameters into an optimiser and,
// optionally, a learning-rate scheduler for one trainable module.
//
//   optimizer:  adadelta | adam | adamw | sgd
//   scheduler:  none | reduceonplateau | warmupinvsqrt
//
// Names are parsed into closed enums, so a typo fails when the
// config is read, long before the first forward pass.
//
// The result is handed to the training loop as
//
//   { optimizer, lr_scheduler?: { scheduler, monitor: "val_loss" } }
//
// and this module never drives a training step itself.
//
// Coefficients: adam/adamw use beta1 and beta2; sgd uses beta1
// as its momentum; adadelta uses beta1 as its decay rate. adamw
// also takes weight_decay, 1e-2 unless set.
//
// Reference: Burn Book §5 (Optimizers)
//            Kingma & Ba (2015) Adam
//            Loshchilov & Hutter (2019) AdamW

use std::{fmt, str::FromStr};

use burn::{
    module::AutodiffModule,
    optim::{momentum::MomentumConfig, AdamConfig, AdamWConfig, GradientsParams, Optimizer, SgdConfig},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ml::adadelta::AdadeltaConfig;
use crate::ml::scheduler::{LearningRateScheduler, ReduceOnPlateau, WarmupInverseSquareRoot};

/// Backend optimisers are built for outside of tests.
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Metric the external loop must report for plateau scheduling.
pub const MONITOR_METRIC: &str = "val_loss";

const ADADELTA_EPSILON: f64 = 1e-6;

// ─── Kinds ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adadelta,
    #[default]
    Adam,
    AdamW,
    Sgd,
}

impl OptimizerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Adadelta => "adadelta",
            Self::Adam     => "adam",
            Self::AdamW    => "adamw",
            Self::Sgd      => "sgd",
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adadelta" => Ok(Self::Adadelta),
            "adam"     => Ok(Self::Adam),
            "adamw"    => Ok(Self::AdamW),
            "sgd"      => Ok(Self::Sgd),
            other      => Err(ConfigError::UnknownOptimizer(other.to_string())),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchedulerKind {
    #[default]
    #[serde(rename = "none", alias = "")]
    None,
    #[serde(rename = "reduceonplateau")]
    ReduceOnPlateau,
    #[serde(rename = "warmupinvsqrt")]
    WarmupInverseSquareRoot,
}

impl SchedulerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None                    => "none",
            Self::ReduceOnPlateau         => "reduceonplateau",
            Self::WarmupInverseSquareRoot => "warmupinvsqrt",
        }
    }
}

impl FromStr for SchedulerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none"       => Ok(Self::None),
            "reduceonplateau" => Ok(Self::ReduceOnPlateau),
            "warmupinvsqrt"   => Ok(Self::WarmupInverseSquareRoot),
            other             => Err(ConfigError::UnknownScheduler(other.to_string())),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── OptimizationConfig ───────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub optimizer:                OptimizerKind,
    pub learning_rate:            f64,
    pub beta1:                    f64,
    pub beta2:                    f64,
    /// Decoupled weight decay, used by adamw only.
    pub weight_decay:             f64,
    pub scheduler:                SchedulerKind,
    pub reduceonplateau_factor:   f64,
    pub reduceonplateau_patience: usize,
    pub min_learning_rate:        f64,
    pub warmup_steps:             usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            optimizer:                OptimizerKind::Adam,
            learning_rate:            1e-3,
            beta1:                    0.9,
            beta2:                    0.999,
            weight_decay:             1e-2,
            scheduler:                SchedulerKind::None,
            reduceonplateau_factor:   0.1,
            reduceonplateau_patience: 10,
            min_learning_rate:        0.0,
            warmup_steps:             1,
        }
    }
}

/// Optimiser family plus the coefficients it was given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptimizerSettings {
    Adadelta { rho: f64, epsilon: f64 },
    Adam     { beta_1: f32, beta_2: f32 },
    AdamW    { beta_1: f32, beta_2: f32, weight_decay: f32 },
    Sgd      { momentum: f64 },
}

impl OptimizationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::invalid("learning_rate", format!("{} is not a positive number", self.learning_rate)));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(ConfigError::invalid(name, format!("{beta} is not in [0, 1)")));
            }
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(ConfigError::invalid("weight_decay", format!("{} is not a non-negative number", self.weight_decay)));
        }
        if !(self.reduceonplateau_factor > 0.0 && self.reduceonplateau_factor < 1.0) {
            return Err(ConfigError::invalid(
                "reduceonplateau_factor",
                format!("{} is not in (0, 1)", self.reduceonplateau_factor),
            ));
        }
        if !(self.min_learning_rate >= 0.0) {
            return Err(ConfigError::invalid("min_learning_rate", "must not be negative"));
        }
        if self.warmup_steps == 0 {
            return Err(ConfigError::invalid("warmup_steps", "must be at least 1"));
        }
        Ok(())
    }

    pub fn settings(&self) -> OptimizerSettings {
        match self.optimizer {
            OptimizerKind::Adadelta => OptimizerSettings::Adadelta { rho: self.beta1, epsilon: ADADELTA_EPSILON },
            OptimizerKind::Adam     => OptimizerSettings::Adam  { beta_1: self.beta1 as f32, beta_2: self.beta2 as f32 },
            OptimizerKind::AdamW    => OptimizerSettings::AdamW {
                beta_1:       self.beta1 as f32,
                beta_2:       self.beta2 as f32,
                weight_decay: self.weight_decay as f32,
            },
            OptimizerKind::Sgd      => OptimizerSettings::Sgd { momentum: self.beta1 },
        }
    }

    pub fn scheduler(&self) -> Option<LearningRateScheduler> {
        match self.scheduler {
            SchedulerKind::None => None,
            SchedulerKind::ReduceOnPlateau => Some(LearningRateScheduler::ReduceOnPlateau(
                ReduceOnPlateau::new(
                    self.learning_rate,
                    self.reduceonplateau_factor,
                    self.reduceonplateau_patience,
                    self.min_learning_rate,
                ),
            )),
            SchedulerKind::WarmupInverseSquareRoot => Some(LearningRateScheduler::WarmupInverseSquareRoot(
                WarmupInverseSquareRoot::new(self.learning_rate, self.warmup_steps),
            )),
        }
    }

    /// Build the optimiser/scheduler bundle for module type `M`.
    pub fn configure<B, M>(&self) -> Result<OptimizationBundle<M, B>, ConfigError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + 'static,
    {
        self.validate()?;
        let settings = self.settings();

        let inner: Box<dyn ModuleOptimizer<M, B>> = match settings {
            OptimizerSettings::Adadelta { rho, epsilon } => Box::new(
                AdadeltaConfig::new().with_rho(rho).with_epsilon(epsilon).init::<B, M>(),
            ),
            OptimizerSettings::Adam { beta_1, beta_2 } => Box::new(
                AdamConfig::new().with_beta_1(beta_1).with_beta_2(beta_2).init::<B, M>(),
            ),
            OptimizerSettings::AdamW { beta_1, beta_2, weight_decay } => Box::new(
                AdamWConfig::new()
                    .with_beta_1(beta_1)
                    .with_beta_2(beta_2)
                    .with_weight_decay(weight_decay)
                    .init::<B, M>(),
            ),
            OptimizerSettings::Sgd { momentum } => Box::new(
                SgdConfig::new()
                    .with_momentum(Some(MomentumConfig::new().with_momentum(momentum).with_dampening(0.0)))
                    .init::<B, M>(),
            ),
        };

        let lr_scheduler = self.scheduler().map(|scheduler| ScheduledLr {
            scheduler,
            monitor: MONITOR_METRIC,
        });

        tracing::debug!(
            "Configured {} (lr={:.3e}) with scheduler {}",
            self.optimizer, self.learning_rate, self.scheduler
        );

        Ok(OptimizationBundle {
            optimizer: ConfiguredOptimizer {
                kind: self.optimizer,
                learning_rate: self.learning_rate,
                settings,
                inner,
            },
            lr_scheduler,
        })
    }
}

// ─── Bundle ───────────────────────────────────────────────────────────────────

/// Object-safe view of a burn optimiser for one module type.
pub trait ModuleOptimizer<M, B>: Send
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    fn step(&mut self, lr: f64, module: M, grads: GradientsParams) -> M;
}

impl<M, B, O> ModuleOptimizer<M, B> for O
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    fn step(&mut self, lr: f64, module: M, grads: GradientsParams) -> M {
        Optimizer::step(self, lr, module, grads)
    }
}

pub struct ConfiguredOptimizer<M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    pub kind:          OptimizerKind,
    pub learning_rate: f64,
    pub settings:      OptimizerSettings,
    inner:             Box<dyn ModuleOptimizer<M, B>>,
}

impl<M, B> ConfiguredOptimizer<M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    pub fn step(&mut self, lr: f64, module: M, grads: GradientsParams) -> M {
        self.inner.step(lr, module, grads)
    }
}

impl<M, B> fmt::Debug for ConfiguredOptimizer<M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredOptimizer")
            .field("kind", &self.kind)
            .field("learning_rate", &self.learning_rate)
            .field("settings", &self.settings)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledLr {
    pub scheduler: LearningRateScheduler,
    pub monitor:   &'static str,
}

#[derive(Debug)]
pub struct OptimizationBundle<M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    pub optimizer:    ConfiguredOptimizer<M, B>,
    pub lr_scheduler: Option<ScheduledLr>,
}

impl<M, B> OptimizationBundle<M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    /// One-line summary, e.g. `sgd lr=1e-3 (momentum=0.9), scheduler none`.
    pub fn describe(&self) -> String {
        let coefficients = match self.optimizer.settings {
            OptimizerSettings::Adadelta { rho, epsilon } => format!("rho={rho}, eps={epsilon:e}"),
            OptimizerSettings::Adam { beta_1, beta_2 } => format!("beta1={beta_1}, beta2={beta_2}"),
            OptimizerSettings::AdamW { beta_1, beta_2, weight_decay } => {
                format!("beta1={beta_1}, beta2={beta_2}, weight_decay={weight_decay}")
            }
            OptimizerSettings::Sgd { momentum } => format!("momentum={momentum}"),
        };
        let scheduler = match &self.lr_scheduler {
            None => "scheduler none".to_string(),
            Some(ScheduledLr { scheduler, monitor }) => {
                let name = match scheduler {
                    LearningRateScheduler::ReduceOnPlateau(_)         => SchedulerKind::ReduceOnPlateau,
                    LearningRateScheduler::WarmupInverseSquareRoot(_) => SchedulerKind::WarmupInverseSquareRoot,
                };
                format!("scheduler {name} monitoring '{monitor}'")
            }
        };
        format!(
            "{} lr={:e} ({}), {}",
            self.optimizer.kind, self.optimizer.learning_rate, coefficients, scheduler
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::prelude::*;

    use crate::ml::classifier::{Classifier, ClassifierConfig};
    use crate::ml::scheduler::LrSchedule;

    type TestAutodiffBackend = Autodiff<NdArray>;
    type TestModule = Classifier<TestAutodiffBackend>;

    fn config(optimizer: &str, scheduler: &str) -> OptimizationConfig {
        OptimizationConfig {
            optimizer: optimizer.parse().unwrap(),
            scheduler: scheduler.parse().unwrap(),
            ..OptimizationConfig::default()
        }
    }

    #[test]
    fn test_parses_closed_name_sets() {
        assert_eq!("adamw".parse::<OptimizerKind>(), Ok(OptimizerKind::AdamW));
        assert_eq!("".parse::<SchedulerKind>(), Ok(SchedulerKind::None));
        assert_eq!(
            "rmsprop".parse::<OptimizerKind>(),
            Err(ConfigError::UnknownOptimizer("rmsprop".into()))
        );
        assert_eq!(
            "cosine".parse::<SchedulerKind>(),
            Err(ConfigError::UnknownScheduler("cosine".into()))
        );
    }

    #[test]
    fn test_json_names() {
        let cfg: OptimizationConfig =
            serde_json::from_str(r#"{"optimizer": "sgd", "scheduler": "warmupinvsqrt", "warmup_steps": 100}"#).unwrap();
        assert_eq!(cfg.optimizer, OptimizerKind::Sgd);
        assert_eq!(cfg.scheduler, SchedulerKind::WarmupInverseSquareRoot);
        assert_eq!(cfg.learning_rate, 1e-3);

        assert!(serde_json::from_str::<OptimizationConfig>(r#"{"optimizer": "lamb"}"#).is_err());
    }

    #[test]
    fn test_adam_carries_lr_and_betas() {
        let cfg = OptimizationConfig { learning_rate: 5e-4, beta1: 0.8, beta2: 0.99, ..config("adam", "none") };
        let bundle = cfg.configure::<TestAutodiffBackend, TestModule>().unwrap();

        assert_eq!(bundle.optimizer.kind, OptimizerKind::Adam);
        assert_eq!(bundle.optimizer.learning_rate, 5e-4);
        assert_eq!(bundle.optimizer.settings, OptimizerSettings::Adam { beta_1: 0.8, beta_2: 0.99 });
        assert!(bundle.lr_scheduler.is_none());
    }

    #[test]
    fn test_coefficient_mapping() {
        assert_eq!(config("sgd", "none").settings(), OptimizerSettings::Sgd { momentum: 0.9 });
        assert_eq!(
            config("adadelta", "none").settings(),
            OptimizerSettings::Adadelta { rho: 0.9, epsilon: ADADELTA_EPSILON }
        );
    }

    #[test]
    fn test_scheduler_entry_monitors_val_loss() {
        let bundle = config("adamw", "reduceonplateau")
            .configure::<TestAutodiffBackend, TestModule>()
            .unwrap();
        let scheduled = bundle.lr_scheduler.unwrap();
        assert_eq!(scheduled.monitor, "val_loss");
        assert_eq!(scheduled.scheduler.current_lr(), 1e-3);
    }

    #[test]
    fn test_describe_names_optimizer_and_monitor() {
        let bundle = config("sgd", "reduceonplateau").configure::<TestAutodiffBackend, TestModule>().unwrap();
        assert_eq!(
            bundle.describe(),
            "sgd lr=1e-3 (momentum=0.9), scheduler reduceonplateau monitoring 'val_loss'"
        );
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let cfg = OptimizationConfig { learning_rate: 0.0, ..OptimizationConfig::default() };
        assert!(matches!(
            cfg.configure::<TestAutodiffBackend, TestModule>(),
            Err(ConfigError::InvalidValue { name: "learning_rate", .. })
        ));
        let cfg = OptimizationConfig { reduceonplateau_factor: 1.5, ..OptimizationConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = OptimizationConfig { weight_decay: -0.1, ..OptimizationConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidValue { name: "weight_decay", .. })));
    }

    #[test]
    fn test_adamw_decays_weights_by_default() {
        let bundle = config("adamw", "none").configure::<TestAutodiffBackend, TestModule>().unwrap();
        assert_eq!(
            bundle.optimizer.settings,
            OptimizerSettings::AdamW { beta_1: 0.9, beta_2: 0.999, weight_decay: 0.01 }
        );
        assert_eq!(bundle.describe(), "adamw lr=1e-3 (beta1=0.9, beta2=0.999, weight_decay=0.01), scheduler none");

        let cfg = OptimizationConfig { weight_decay: 0.0, ..config("adamw", "none") };
        assert_eq!(cfg.settings(), OptimizerSettings::AdamW { beta_1: 0.9, beta_2: 0.999, weight_decay: 0.0 });
    }

    #[test]
    fn test_every_optimizer_updates_parameters() {
        let device = Default::default();
        for name in ["adadelta", "adam", "adamw", "sgd"] {
            let model: TestModule = ClassifierConfig::new(4)
                .with_use_xpos(false)
                .with_use_lemma(false)
                .with_use_feats(false)
                .init(&device);
            let before = model.upos.as_ref().unwrap().linear.weight.val()
                .into_data().convert::<f32>().to_vec::<f32>().unwrap();

            let mut bundle = config(name, "none").configure::<TestAutodiffBackend, TestModule>().unwrap();
            let logits = model.forward(Tensor::ones([2, 3, 4], &device));
            let grads  = logits.upos.unwrap().sum().backward();
            let grads  = GradientsParams::from_grads(grads, &model);
            let model  = bundle.optimizer.step(0.1, model, grads);

            let after = model.upos.as_ref().unwrap().linear.weight.val()
                .into_data().convert::<f32>().to_vec::<f32>().unwrap();
            assert_ne!(before, after, "{name} left the weights unchanged");
        }
    }
}
