// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `forward` and `configure`, and
// their flags. Model and optimiser flags are shared by both.
//
// Optimiser and scheduler names arrive as strings and are parsed
// into closed enums on conversion, so a typo is reported as a
// configuration error naming the accepted values.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::forward_use_case::ForwardConfig;
use crate::error::ConfigError;
use crate::ml::{
    encoder::TaggingEncoderConfig,
    model::TaggerConfig,
    optim::OptimizationConfig,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the tagger over a CoNLL-U file and report logits shapes
    Forward(ForwardArgs),

    /// Validate a tagger configuration and show the optimisers it builds
    Configure(ConfigureArgs),
}

// ─── Shared model flags ───────────────────────────────────────────────────────
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Encoder preset: bert-tiny, bert-mini, bert-small, bert-medium, bert-base
    #[arg(long, default_value = "bert-base")]
    pub encoder: String,

    /// Dropout applied to the pooled encoder output
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Number of final encoder layers averaged together
    #[arg(long, default_value_t = 4)]
    pub pooling_layers: usize,

    #[arg(long)]
    pub no_upos: bool,

    #[arg(long)]
    pub no_xpos: bool,

    #[arg(long)]
    pub no_lemma: bool,

    #[arg(long)]
    pub no_feats: bool,

    /// Lemma edit classes rewrite the start of each form
    #[arg(long)]
    pub reverse_edits: bool,

    #[command(flatten)]
    pub optim: OptimArgs,
}

// ─── Optimisation flags ───────────────────────────────────────────────────────
#[derive(Args, Debug, Clone)]
pub struct OptimArgs {
    /// adadelta, adam, adamw or sgd
    #[arg(long, default_value = "adam")]
    pub encoder_optimizer: String,

    #[arg(long, default_value_t = 1e-5)]
    pub encoder_learning_rate: f64,

    /// none, reduceonplateau or warmupinvsqrt
    #[arg(long, default_value = "none")]
    pub encoder_scheduler: String,

    #[arg(long, default_value = "adam")]
    pub classifier_optimizer: String,

    #[arg(long, default_value_t = 1e-3)]
    pub classifier_learning_rate: f64,

    #[arg(long, default_value = "none")]
    pub classifier_scheduler: String,

    /// Adam beta1, SGD momentum, or Adadelta decay rate
    #[arg(long, default_value_t = 0.9)]
    pub beta1: f64,

    #[arg(long, default_value_t = 0.999)]
    pub beta2: f64,

    /// Decoupled weight decay for adamw
    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    #[arg(long, default_value_t = 0.1)]
    pub reduceonplateau_factor: f64,

    #[arg(long, default_value_t = 10)]
    pub reduceonplateau_patience: usize,

    #[arg(long, default_value_t = 0.0)]
    pub min_learning_rate: f64,

    #[arg(long, default_value_t = 1)]
    pub warmup_steps: usize,
}

impl OptimArgs {
    fn module(&self, optimizer: &str, learning_rate: f64, scheduler: &str) -> Result<OptimizationConfig, ConfigError> {
        Ok(OptimizationConfig {
            optimizer:                optimizer.parse()?,
            learning_rate,
            beta1:                    self.beta1,
            beta2:                    self.beta2,
            weight_decay:             self.weight_decay,
            scheduler:                scheduler.parse()?,
            reduceonplateau_factor:   self.reduceonplateau_factor,
            reduceonplateau_patience: self.reduceonplateau_patience,
            min_learning_rate:        self.min_learning_rate,
            warmup_steps:             self.warmup_steps,
        })
    }
}

/// Convert CLI flags into the model-layer TaggerConfig.
/// Tagset sizes stay at their placeholders until data is read.
impl TryFrom<ModelArgs> for TaggerConfig {
    type Error = ConfigError;

    fn try_from(a: ModelArgs) -> Result<Self, Self::Error> {
        let o = &a.optim;
        let encoder_optimization    = o.module(&o.encoder_optimizer, o.encoder_learning_rate, &o.encoder_scheduler)?;
        let classifier_optimization =
            o.module(&o.classifier_optimizer, o.classifier_learning_rate, &o.classifier_scheduler)?;

        Ok(TaggerConfig::new(
            TaggingEncoderConfig::new(a.encoder)
                .with_dropout(a.dropout)
                .with_pooling_layers(a.pooling_layers),
        )
        .with_use_upos(!a.no_upos)
        .with_use_xpos(!a.no_xpos)
        .with_use_lemma(!a.no_lemma)
        .with_use_feats(!a.no_feats)
        .with_reverse_edits(a.reverse_edits)
        .with_encoder_optimization(encoder_optimization)
        .with_classifier_optimization(classifier_optimization))
    }
}

// ─── forward ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ForwardArgs {
    /// CoNLL-U file to read
    #[arg(long)]
    pub input: PathBuf,

    /// Directory holding (or receiving) tokenizer.json
    #[arg(long, default_value = "model")]
    pub tokenizer_dir: PathBuf,

    /// Directory with a saved tagger_config.json; overrides the model flags
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Vocabulary cap when a new tokenizer is built
    #[arg(long, default_value_t = 30522)]
    pub max_vocab: usize,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl TryFrom<ForwardArgs> for ForwardConfig {
    type Error = ConfigError;

    fn try_from(a: ForwardArgs) -> Result<Self, Self::Error> {
        Ok(ForwardConfig {
            input:         a.input,
            tokenizer_dir: a.tokenizer_dir,
            config_dir:    a.config_dir,
            tagger:        a.model.try_into()?,
            batch_size:    a.batch_size,
            max_vocab:     a.max_vocab,
        })
    }
}

// ─── configure ────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Save the resolved config to <DIR>/tagger_config.json
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::ml::optim::{OptimizerKind, SchedulerKind};
    use clap::Parser;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(std::iter::once("morphotag").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_configure_flags_reach_tagger_config() {
        let Commands::Configure(args) = parse(&[
            "configure",
            "--encoder", "bert-mini",
            "--no-xpos",
            "--classifier-optimizer", "sgd",
            "--classifier-scheduler", "reduceonplateau",
            "--reduceonplateau-patience", "3",
            "--reverse-edits",
            "--weight-decay", "0.05",
        ]) else {
            panic!("expected configure");
        };

        let cfg = TaggerConfig::try_from(args.model).unwrap();
        assert_eq!(cfg.encoder.encoder, "bert-mini");
        assert!(!cfg.use_xpos && cfg.use_upos);
        assert_eq!(cfg.encoder_optimization.learning_rate, 1e-5);
        assert_eq!(cfg.classifier_optimization.optimizer, OptimizerKind::Sgd);
        assert_eq!(cfg.classifier_optimization.scheduler, SchedulerKind::ReduceOnPlateau);
        assert_eq!(cfg.classifier_optimization.reduceonplateau_patience, 3);
        assert!(cfg.reverse_edits);
        assert_eq!(cfg.encoder_optimization.weight_decay, 0.05);
    }

    #[test]
    fn test_defaults_keep_suffix_edits_and_adamw_decay() {
        let Commands::Configure(args) = parse(&["configure"]) else {
            panic!("expected configure");
        };
        let cfg = TaggerConfig::try_from(args.model).unwrap();
        assert!(!cfg.reverse_edits);
        assert_eq!(cfg.classifier_optimization.weight_decay, 1e-2);
    }

    #[test]
    fn test_unknown_optimizer_name_is_a_config_error() {
        let Commands::Forward(args) = parse(&["forward", "--input", "x.conllu", "--encoder-optimizer", "lion"]) else {
            panic!("expected forward");
        };
        assert_eq!(
            ForwardConfig::try_from(args).unwrap_err(),
            ConfigError::UnknownOptimizer("lion".into())
        );
    }
}
