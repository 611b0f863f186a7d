// ============================================================
// Layer 5 — Learning-Rate Schedulers
// ============================================================
// Two schedules, both driven by the external training loop:
//
//   ReduceOnPlateau          - stepped once per validation pass
//                              with the monitored metric; cuts the
//                              rate when the metric stops falling
//
//   WarmupInverseSquareRoot  - stepped once per optimiser update;
//                              linear warmup, then decay ∝ 1/√t
//
// Each `step` returns the rate to pass to the next optimiser
// update.

/// Relative improvement a metric must show to count as progress.
const PLATEAU_THRESHOLD: f64 = 1e-4;
/// Rate changes smaller than this are ignored.
const MIN_LR_CHANGE: f64 = 1e-8;

pub trait LrSchedule {
    fn current_lr(&self) -> f64;

    /// Advance the schedule. Metric-driven schedules read `monitored`.
    fn step(&mut self, monitored: Option<f64>) -> f64;
}

// ─── ReduceOnPlateau ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ReduceOnPlateau {
    lr:        f64,
    factor:    f64,
    patience:  usize,
    min_lr:    f64,
    best:      f64,
    bad_steps: usize,
}

impl ReduceOnPlateau {
    pub fn new(lr: f64, factor: f64, patience: usize, min_lr: f64) -> Self {
        Self { lr, factor, patience, min_lr, best: f64::INFINITY, bad_steps: 0 }
    }

    pub fn best(&self) -> f64 {
        self.best
    }
}

impl LrSchedule for ReduceOnPlateau {
    fn current_lr(&self) -> f64 {
        self.lr
    }

    fn step(&mut self, monitored: Option<f64>) -> f64 {
        let Some(metric) = monitored else {
            tracing::debug!("ReduceOnPlateau stepped without a metric; keeping lr={}", self.lr);
            return self.lr;
        };

        if metric < self.best * (1.0 - PLATEAU_THRESHOLD) {
            self.best      = metric;
            self.bad_steps = 0;
        } else {
            self.bad_steps += 1;
        }

        if self.bad_steps > self.patience {
            let reduced = (self.lr * self.factor).max(self.min_lr);
            if self.lr - reduced > MIN_LR_CHANGE {
                tracing::info!("Reducing learning rate from {:.3e} to {:.3e}", self.lr, reduced);
                self.lr = reduced;
            }
            self.bad_steps = 0;
        }
        self.lr
    }
}

// ─── WarmupInverseSquareRoot ──────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct WarmupInverseSquareRoot {
    base_lr:      f64,
    warmup_steps: usize,
    step:         usize,
}

impl WarmupInverseSquareRoot {
    pub fn new(base_lr: f64, warmup_steps: usize) -> Self {
        Self { base_lr, warmup_steps: warmup_steps.max(1), step: 0 }
    }

    fn lr_at(&self, step: usize) -> f64 {
        let warmup = self.warmup_steps as f64;
        if step < self.warmup_steps {
            self.base_lr * step as f64 / warmup
        } else {
            self.base_lr * warmup.sqrt() / (step as f64).sqrt()
        }
    }
}

impl LrSchedule for WarmupInverseSquareRoot {
    fn current_lr(&self) -> f64 {
        self.lr_at(self.step)
    }

    fn step(&mut self, _monitored: Option<f64>) -> f64 {
        self.step += 1;
        self.current_lr()
    }
}

// ─── LearningRateScheduler ────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub enum LearningRateScheduler {
    ReduceOnPlateau(ReduceOnPlateau),
    WarmupInverseSquareRoot(WarmupInverseSquareRoot),
}

impl LrSchedule for LearningRateScheduler {
    fn current_lr(&self) -> f64 {
        match self {
            Self::ReduceOnPlateau(s)         => s.current_lr(),
            Self::WarmupInverseSquareRoot(s) => s.current_lr(),
        }
    }

    fn step(&mut self, monitored: Option<f64>) -> f64 {
        match self {
            Self::ReduceOnPlateau(s)         => s.step(monitored),
            Self::WarmupInverseSquareRoot(s) => s.step(monitored),
        }
    }
}
