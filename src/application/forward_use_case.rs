// ============================================================
// Layer 2 — ForwardUseCase
// ============================================================
// Runs the tagging model over a CoNLL-U file:
//
//   Step 1: Read sentences                (Layer 4 - data)
//   Step 2: Resolve the tagger config     (Layer 6 - infra)
//   Step 3: Count tagset sizes            (Layer 3 - domain)
//   Step 4: Load / build tokenizer        (Layer 6 - infra)
//   Step 5: Build the model               (Layer 5 - ml)
//   Step 6: Forward every batch           (Layer 5 - ml)
//
// Weights are freshly initialised; the result is the shape of
// each batch's logits, not tag predictions.

use anyhow::{Context, Result};
use burn::prelude::Backend;
use std::path::PathBuf;

use crate::data::{conllu::ConlluReader, preprocessor::Preprocessor};
use crate::domain::task::TagsetSizes;
use crate::infra::{config_store::ConfigStore, tokenizer_store::TokenizerStore};
use crate::ml::{
    inferencer::{BatchReport, InferBackend, Inferencer},
    model::TaggerConfig,
};

// ─── Forward Configuration ────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ForwardConfig {
    pub input:         PathBuf,
    pub tokenizer_dir: PathBuf,
    /// Directory holding a saved tagger config; overrides `tagger`.
    pub config_dir:    Option<PathBuf>,
    pub tagger:        TaggerConfig,
    pub batch_size:    usize,
    pub max_vocab:     usize,
}

#[derive(Debug, Clone)]
pub struct ForwardSummary {
    pub sentences:    usize,
    pub words:        usize,
    pub vocab_size:   usize,
    pub tagset_sizes: TagsetSizes,
    pub batches:      Vec<BatchReport>,
}

// ─── ForwardUseCase ───────────────────────────────────────────────────────────
pub struct ForwardUseCase {
    config: ForwardConfig,
}

impl ForwardUseCase {
    pub fn new(config: ForwardConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ForwardSummary> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        self.execute_on::<InferBackend>(&device)
    }

    pub fn execute_on<B: Backend>(&self, device: &B::Device) -> Result<ForwardSummary> {
        let cfg = &self.config;

        // ── Step 1: Read sentences ────────────────────────────────────────────
        let sentences = ConlluReader::new(&cfg.input).read_all()?;
        let prep = Preprocessor::new();
        let words: Vec<Vec<String>> = sentences
            .iter()
            .map(|s| s.forms().into_iter().map(|f| prep.clean(f)).collect())
            .collect();

        // ── Step 2: Tagger config ─────────────────────────────────────────────
        let tagger_cfg = match &cfg.config_dir {
            Some(dir) => ConfigStore::new(dir).load()?,
            None      => cfg.tagger.clone(),
        };

        // ── Step 3: Tagset sizes ──────────────────────────────────────────────
        let tagset_sizes = TagsetSizes::from_sentences(&sentences, tagger_cfg.reverse_edits);
        tracing::info!("Tagset sizes: {:?}", tagset_sizes);
        let tagger_cfg = tagger_cfg.with_tagset_sizes(tagset_sizes);

        // ── Step 4: Tokenizer ─────────────────────────────────────────────────
        let forms: Vec<String> = words.iter().flatten().cloned().collect();
        let tokenizer  = TokenizerStore::new(&cfg.tokenizer_dir).load_or_build(&forms, cfg.max_vocab)?;
        let vocab_size = tokenizer.get_vocab_size(true);

        // ── Step 5: Model ─────────────────────────────────────────────────────
        let model = tagger_cfg
            .init::<B>(vocab_size, device)
            .context("Cannot build the tagging model")?;

        // ── Step 6: Forward passes ────────────────────────────────────────────
        let batches = Inferencer::new(model, tokenizer, cfg.batch_size).run(&words)?;
        tracing::info!("Ran {} batch(es)", batches.len());

        Ok(ForwardSummary {
            sentences: sentences.len(),
            words: forms.len(),
            vocab_size,
            tagset_sizes,
            batches,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::domain::task::Task;
    use crate::ml::encoder::TaggingEncoderConfig;

    const CORPUS: &str = "\
# sent_id = 1
1\tDogs\tdog\tNOUN\tNNS\tNumber=Plur\t2\tnsubj\t_\t_
2\tbark\tbark\tVERB\tVBP\tMood=Ind\t0\troot\t_\t_

# sent_id = 2
1-2\tdon't\t_\t_\t_\t_\t_\t_\t_\t_
1\tdo\tdo\tAUX\tVBP\tMood=Ind\t3\taux\t_\t_
2\tn't\tnot\tPART\tRB\t_\t3\tadvmod\t_\t_
3\tstop\tstop\tVERB\tVB\tVerbForm=Inf\t0\troot\t_\t_

";

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("morphotag-fwd-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_forward_over_small_corpus() {
        let dir   = temp_dir("corpus");
        let input = dir.join("train.conllu");
        std::fs::write(&input, CORPUS).unwrap();

        let use_case = ForwardUseCase::new(ForwardConfig {
            input,
            tokenizer_dir: dir.join("tok"),
            config_dir:    None,
            tagger:        TaggerConfig::new(TaggingEncoderConfig::new("bert-tiny".into()))
                .with_use_xpos(false),
            batch_size:    8,
            max_vocab:     1000,
        });
        let summary = use_case.execute_on::<NdArray>(&Default::default()).unwrap();

        assert_eq!(summary.sentences, 2);
        assert_eq!(summary.words, 5);
        assert_eq!(summary.tagset_sizes.upos, 4);
        assert_eq!(summary.batches.len(), 1);

        let batch = &summary.batches[0];
        assert_eq!(batch.max_words, 3);
        // n't → n ' t
        assert_eq!(batch.subwords, 5);
        assert_eq!(batch.logits[0], (Task::Upos, [2, 4, 3]));
        assert!(batch.logits.iter().all(|(t, _)| *t != Task::Xpos));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_input_is_reported() {
        let dir = temp_dir("missing");
        let use_case = ForwardUseCase::new(ForwardConfig {
            input:         dir.join("nope.conllu"),
            tokenizer_dir: dir.clone(),
            config_dir:    None,
            tagger:        TaggerConfig::new(TaggingEncoderConfig::new("bert-tiny".into())),
            batch_size:    8,
            max_vocab:     1000,
        });
        let err = use_case.execute_on::<NdArray>(&Default::default()).unwrap_err();
        assert!(format!("{err:#}").contains("nope.conllu"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
