// ============================================================
// Layer 5 — Tagger Model
// ============================================================
// Wires the pipeline together:
//
//   TokenizedBatch ─► TaggingEncoder ─► subword embeddings
//                                          │
//                          aggregate_words ▼
//                                     word embeddings
//                                          │
//                              Classifier  ▼
//                                       Logits
//
// Optimiser configuration lives on TaggerConfig, not on the
// model: it only needs the module types, never a forward pass.
// The encoder and the classifier get separate bundles so they
// can train with different rates.

use burn::{prelude::*, tensor::backend::AutodiffBackend};

use crate::data::batcher::TokenizedBatch;
use crate::domain::task::{TagsetSizes, Task};
use crate::error::ConfigError;
use crate::ml::{
    aggregator::{aggregate_words, WordEmbeddings},
    classifier::{Classifier, ClassifierConfig, Logits},
    encoder::{TaggingEncoder, TaggingEncoderConfig, TransformerEncoderConfig},
    optim::{OptimizationBundle, OptimizationConfig},
};

#[derive(Config, Debug)]
pub struct TaggerConfig {
    pub encoder: TaggingEncoderConfig,
    #[config(default = true)]
    pub use_upos: bool,
    #[config(default = true)]
    pub use_xpos: bool,
    #[config(default = true)]
    pub use_lemma: bool,
    #[config(default = true)]
    pub use_feats: bool,
    /// Lemma edit classes rewrite the start of the form instead of its end.
    #[config(default = false)]
    pub reverse_edits: bool,
    #[config(default = "TagsetSizes::default()")]
    pub tagset_sizes: TagsetSizes,
    #[config(default = "OptimizationConfig::default()")]
    pub encoder_optimization: OptimizationConfig,
    #[config(default = "OptimizationConfig::default()")]
    pub classifier_optimization: OptimizationConfig,
}

/// One optimiser bundle per trainable module.
#[derive(Debug)]
pub struct TaggerOptimization<B: AutodiffBackend> {
    pub encoder:    OptimizationBundle<TaggingEncoder<B>, B>,
    pub classifier: OptimizationBundle<Classifier<B>, B>,
}

impl TaggerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.encoder.validate()?;
        self.encoder_optimization.validate()?;
        self.classifier_optimization.validate()
    }

    pub fn classifier_config(&self, hidden_size: usize) -> ClassifierConfig {
        ClassifierConfig::new(hidden_size)
            .with_use_upos(self.use_upos)
            .with_use_xpos(self.use_xpos)
            .with_use_lemma(self.use_lemma)
            .with_use_feats(self.use_feats)
            .with_tagset_sizes(self.tagset_sizes)
    }

    pub fn init<B: Backend>(&self, vocab_size: usize, device: &B::Device) -> Result<Tagger<B>, ConfigError> {
        self.validate()?;
        let encoder    = self.encoder.init(vocab_size, device)?;
        let classifier = self.classifier_config(encoder.hidden_size()).init(device);
        Ok(Tagger { encoder, classifier })
    }

    /// Build around an explicit encoder architecture instead of a preset.
    pub fn init_with<B: Backend>(&self, encoder: &TransformerEncoderConfig, device: &B::Device) -> Tagger<B> {
        let encoder    = self.encoder.init_with(encoder, device);
        let classifier = self.classifier_config(encoder.hidden_size()).init(device);
        Tagger { encoder, classifier }
    }

    pub fn configure_optimizers<B: AutodiffBackend>(&self) -> Result<TaggerOptimization<B>, ConfigError> {
        Ok(TaggerOptimization {
            encoder:    self.encoder_optimization.configure()?,
            classifier: self.classifier_optimization.configure()?,
        })
    }
}

#[derive(Module, Debug)]
pub struct Tagger<B: Backend> {
    pub encoder:    TaggingEncoder<B>,
    pub classifier: Classifier<B>,
}

impl<B: Backend> Tagger<B> {
    pub fn uses(&self, task: Task) -> bool {
        self.classifier.uses(task)
    }

    /// Subword encoding followed by word pooling.
    pub fn embed(&self, batch: TokenizedBatch<B>) -> WordEmbeddings<B> {
        let subwords = self.encoder.forward(batch);
        aggregate_words(subwords.embeddings, &subwords.word_ids)
    }

    pub fn forward(&self, batch: TokenizedBatch<B>) -> Logits<B> {
        self.classifier.forward(self.embed(batch).embeddings)
    }
}
