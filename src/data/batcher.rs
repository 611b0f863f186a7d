// ============================================================
// Layer 4 — Sentence Batcher
// ============================================================
// Converts a list of pre-split sentences into one tensor batch.
//
// Each word can become several subwords, so sentences of equal
// word count can still have different subword lengths. We pad
// every sentence to the longest one in the batch:
//
//   sentence 0: "Dogs bark"      → Dogs ##s bark      (word ids 0 0 1)
//   sentence 1: "Yes"            → Yes [PAD] [PAD]    (word ids 0 - -)
//
//   input_ids       [batch, max_subwords]
//   attention_mask  [batch, max_subwords]  1 = real, 0 = padding
//   word_ids        one Vec<Option<usize>> per sentence, kept on
//                   the host because only the aggregator reads it
//
// Special tokens are not added, so the first subword of every
// sentence belongs to word 0.
//
// Reference: Burn Book §4 (Batcher)
//            tokenizers crate documentation (Encoding::get_word_ids)

use anyhow::{bail, Result};
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::data::preprocessor::{Preprocessor, EMPTY_FORM};
use crate::domain::word_spans::WordIds;

const PAD_ID: u32 = 0;

// ─── TokenizedBatch ───────────────────────────────────────────────────────────
/// A batch of tokenized sentences ready for the encoder.
#[derive(Debug, Clone)]
pub struct TokenizedBatch<B: Backend> {
    /// Subword ids - shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention mask - shape: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Word index of every subword position, `None` for padding
    pub word_ids: Vec<WordIds>,
}

impl<B: Backend> TokenizedBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.word_ids.len()
    }

    pub fn seq_len(&self) -> usize {
        self.input_ids.dims()[1]
    }
}

/// One sentence after tokenisation, before padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSentence {
    pub ids:      Vec<u32>,
    pub word_ids: WordIds,
}

// ─── SentenceBatcher ──────────────────────────────────────────────────────────
pub struct SentenceBatcher<B: Backend> {
    tokenizer:    Tokenizer,
    preprocessor: Preprocessor,
    device:       B::Device,
}

impl<B: Backend> SentenceBatcher<B> {
    pub fn new(tokenizer: Tokenizer, device: B::Device) -> Self {
        Self { tokenizer, preprocessor: Preprocessor::new(), device }
    }

    /// Tokenize one sentence given as a list of words.
    ///
    /// Every word is guaranteed at least one subword: a form the
    /// tokenizer normalises away entirely is re-encoded as
    /// `EMPTY_FORM`, so word ids always run 0..words.len().
    pub fn encode(&self, words: &[String]) -> Result<EncodedSentence> {
        let mut cleaned: Vec<String> = words.iter().map(|w| self.preprocessor.clean(w)).collect();
        let mut encoded = self.encode_cleaned(&cleaned)?;

        let vanished = words_without_subwords(&encoded.word_ids, cleaned.len());
        if !vanished.is_empty() {
            tracing::warn!(
                "{} form(s) produced no subwords, encoding them as '{}': {:?}",
                vanished.len(),
                EMPTY_FORM,
                vanished.iter().map(|&w| &words[w]).collect::<Vec<_>>()
            );
            for &w in &vanished {
                cleaned[w] = EMPTY_FORM.to_string();
            }
            encoded = self.encode_cleaned(&cleaned)?;

            let still = words_without_subwords(&encoded.word_ids, cleaned.len());
            if !still.is_empty() {
                bail!("word(s) at {:?} produce no subwords even as '{}'", still, EMPTY_FORM);
            }
        }
        Ok(encoded)
    }

    fn encode_cleaned(&self, cleaned: &[String]) -> Result<EncodedSentence> {
        let words: Vec<&str> = cleaned.iter().map(String::as_str).collect();

        let enc = self.tokenizer
            .encode(words.as_slice(), false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        Ok(EncodedSentence {
            ids:      enc.get_ids().to_vec(),
            word_ids: enc.get_word_ids().iter().map(|w| w.map(|w| w as usize)).collect(),
        })
    }

    pub fn batch(&self, sentences: &[Vec<String>]) -> Result<TokenizedBatch<B>> {
        let encoded = sentences
            .iter()
            .map(|words| self.encode(words))
            .collect::<Result<Vec<_>>>()?;
        Ok(pad_batch(encoded, &self.device))
    }
}

/// Indices in `0..num_words` that own no subword position.
fn words_without_subwords(word_ids: &[Option<usize>], num_words: usize) -> Vec<usize> {
    let mut seen = vec![false; num_words];
    for &w in word_ids.iter().flatten() {
        if let Some(slot) = seen.get_mut(w) {
            *slot = true;
        }
    }
    seen.iter().enumerate().filter(|(_, s)| !**s).map(|(w, _)| w).collect()
}

/// Pad encoded sentences to a common length and stack them.
pub fn pad_batch<B: Backend>(encoded: Vec<EncodedSentence>, device: &B::Device) -> TokenizedBatch<B> {
    let batch_size = encoded.len();
    // Never build a zero-width tensor, even for a batch of empty sentences.
    let seq_len = encoded.iter().map(|s| s.ids.len()).max().unwrap_or(0).max(1);

    let mut input_flat = Vec::with_capacity(batch_size * seq_len);
    let mut mask_flat  = Vec::with_capacity(batch_size * seq_len);
    let mut word_ids   = Vec::with_capacity(batch_size);

    for sentence in encoded {
        let real = sentence.ids.len();
        input_flat.extend(sentence.ids.iter().map(|&x| x as i32));
        input_flat.extend(std::iter::repeat(PAD_ID as i32).take(seq_len - real));
        mask_flat.extend(std::iter::repeat(1i32).take(real));
        mask_flat.extend(std::iter::repeat(0i32).take(seq_len - real));

        let mut ids = sentence.word_ids;
        ids.resize(seq_len, None);
        word_ids.push(ids);
    }

    let input_ids = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), device)
        .reshape([batch_size, seq_len]);
    let attention_mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), device)
        .reshape([batch_size, seq_len]);

    TokenizedBatch { input_ids, attention_mask, word_ids }
}
