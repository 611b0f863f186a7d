// ============================================================
// Layer 2 — ConfigureUseCase
// ============================================================
// Checks a tagger configuration without touching any data:
//
//   Step 1: Validate encoder and optimisation settings
//   Step 2: Build both optimiser bundles   (Layer 5 - ml)
//   Step 3: Save the config, if asked      (Layer 6 - infra)
//
// Building the bundles is what a training loop would do first,
// so a config that passes here is ready to train with.

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use std::path::PathBuf;

use crate::infra::config_store::ConfigStore;
use crate::ml::{model::TaggerConfig, optim::TrainBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureReport {
    pub encoder:    String,
    pub classifier: String,
    pub saved_to:   Option<PathBuf>,
}

pub struct ConfigureUseCase {
    tagger:   TaggerConfig,
    save_dir: Option<PathBuf>,
}

impl ConfigureUseCase {
    pub fn new(tagger: TaggerConfig, save_dir: Option<PathBuf>) -> Self {
        Self { tagger, save_dir }
    }

    pub fn execute(&self) -> Result<ConfigureReport> {
        self.execute_with::<TrainBackend>()
    }

    pub fn execute_with<B: AutodiffBackend>(&self) -> Result<ConfigureReport> {
        // ── Step 1 + 2: Validate and build ────────────────────────────────────
        self.tagger.validate().context("Invalid tagger configuration")?;
        let optim = self
            .tagger
            .configure_optimizers::<B>()
            .context("Cannot configure optimizers")?;

        let report_encoder    = optim.encoder.describe();
        let report_classifier = optim.classifier.describe();
        tracing::info!("Encoder optimizer: {}", report_encoder);
        tracing::info!("Classifier optimizer: {}", report_classifier);

        // ── Step 3: Save ──────────────────────────────────────────────────────
        let saved_to = match &self.save_dir {
            Some(dir) => {
                let store = ConfigStore::new(dir);
                store.save(&self.tagger)?;
                Some(store.path())
            }
            None => None,
        };

        Ok(ConfigureReport { encoder: report_encoder, classifier: report_classifier, saved_to })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::ml::encoder::TaggingEncoderConfig;
    use crate::ml::optim::{OptimizerKind, SchedulerKind};

    type TestAutodiffBackend = Autodiff<NdArray>;

    fn tagger() -> TaggerConfig {
        TaggerConfig::new(TaggingEncoderConfig::new("bert-base".into()))
    }

    #[test]
    fn test_reports_both_modules() {
        let mut cfg = tagger();
        cfg.encoder_optimization.learning_rate = 1e-5;
        cfg.classifier_optimization.optimizer = OptimizerKind::Adadelta;
        cfg.classifier_optimization.scheduler = SchedulerKind::WarmupInverseSquareRoot;

        let report = ConfigureUseCase::new(cfg, None).execute_with::<TestAutodiffBackend>().unwrap();
        assert_eq!(report.encoder, "adam lr=1e-5 (beta1=0.9, beta2=0.999), scheduler none");
        assert_eq!(
            report.classifier,
            "adadelta lr=1e-3 (rho=0.9, eps=1e-6), scheduler warmupinvsqrt monitoring 'val_loss'"
        );
        assert!(report.saved_to.is_none());
    }

    #[test]
    fn test_unknown_encoder_fails_before_saving() {
        let dir = std::env::temp_dir().join(format!("morphotag-configure-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let cfg = TaggerConfig::new(TaggingEncoderConfig::new("roberta".into()));
        let err = ConfigureUseCase::new(cfg, Some(dir.clone()))
            .execute_with::<TestAutodiffBackend>()
            .unwrap_err();

        assert!(format!("{err:#}").contains("unknown encoder 'roberta'"));
        assert!(!dir.exists());
    }

    #[test]
    fn test_saves_when_asked() {
        let dir = std::env::temp_dir().join(format!("morphotag-configure-save-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let report = ConfigureUseCase::new(tagger(), Some(dir.clone()))
            .execute_with::<TestAutodiffBackend>()
            .unwrap();
        assert!(report.saved_to.unwrap().exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
