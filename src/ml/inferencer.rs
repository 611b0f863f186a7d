// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs a Tagger over pre-split sentences, one batch at a time,
// and reports what came out of each forward pass. Turning
// logits into tag strings is left to the caller.

use anyhow::Result;
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::data::batcher::SentenceBatcher;
use crate::domain::task::Task;
use crate::ml::model::Tagger;

pub type InferBackend = burn::backend::Wgpu;

/// Shapes produced by one forward pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub sentences: usize,
    pub subwords:  usize,
    /// Word axis of the pooled batch, as the heads saw it
    pub max_words: usize,
    /// `[batch, classes, words]` for every enabled task
    pub logits:    Vec<(Task, [usize; 3])>,
}

pub struct Inferencer<B: Backend> {
    model:      Tagger<B>,
    batcher:    SentenceBatcher<B>,
    batch_size: usize,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: Tagger<B>, tokenizer: Tokenizer, batch_size: usize) -> Self {
        let device  = model.encoder.encoder.device();
        let batcher = SentenceBatcher::new(tokenizer, device);
        Self { model, batcher, batch_size: batch_size.max(1) }
    }

    pub fn run(&self, sentences: &[Vec<String>]) -> Result<Vec<BatchReport>> {
        let mut reports = Vec::with_capacity(sentences.len().div_ceil(self.batch_size));

        for (i, chunk) in sentences.chunks(self.batch_size).enumerate() {
            let batch    = self.batcher.batch(chunk)?;
            let subwords = batch.seq_len();
            let words    = self.model.embed(batch);

            for (sentence, (input, pooled)) in chunk.iter().zip(&words.word_counts).enumerate() {
                if input.len() != *pooled {
                    tracing::warn!(
                        "Batch {} sentence {}: {} words in, {} word embeddings out",
                        i, sentence, input.len(), pooled
                    );
                }
            }

            let max_words = words.max_words();
            let logits    = self.model.classifier.forward(words.embeddings);

            let report = BatchReport {
                sentences: chunk.len(),
                subwords,
                max_words,
                logits:    logits
                    .present_tasks()
                    .into_iter()
                    .filter_map(|t| logits.get(t).map(|x| (t, x.dims())))
                    .collect(),
            };
            tracing::debug!("Batch {}: {:?}", i, report);
            reports.push(report);
        }
        Ok(reports)
    }
}
