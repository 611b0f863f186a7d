// ============================================================
// Layer 5 — Embedding Aggregator
// ============================================================
// The encoder works on subwords; the heads label words. This
// module averages each word's subword vectors and assembles a
// padded word-level batch.
//
// Batches are ragged twice over: words have different subword
// counts, sentences have different word counts. Assembly runs
// in two passes:
//
//   Pass 1 - resolve every sentence's word spans on the host
//            and take the batch maximum word count
//   Pass 2 - allocate one zero tensor [batch, max_words, hidden]
//            and copy each sentence's pooled words into its
//            prefix rows
//
// Slots past a sentence's own word count are never written, so
// they stay exactly zero.

use burn::prelude::*;

use crate::domain::word_spans::{word_spans, WordIds, WordSpan};

/// Word-level output of the aggregator.
#[derive(Debug, Clone)]
pub struct WordEmbeddings<B: Backend> {
    /// [batch, max_words, hidden]
    pub embeddings:  Tensor<B, 3>,
    /// Real word count of each sentence.
    pub word_counts: Vec<usize>,
}

impl<B: Backend> WordEmbeddings<B> {
    pub fn max_words(&self) -> usize {
        self.embeddings.dims()[1]
    }
}

/// Mean-pool subword embeddings into padded word embeddings.
///
/// `embeddings` is [batch, subwords, hidden]; `word_ids` holds one
/// map per sentence. Map entries past the subword axis are ignored.
pub fn aggregate_words<B: Backend>(
    embeddings: Tensor<B, 3>,
    word_ids:   &[WordIds],
) -> WordEmbeddings<B> {
    let [batch_size, seq_len, hidden] = embeddings.dims();
    debug_assert_eq!(batch_size, word_ids.len(), "one word-id map per sentence");

    // ── Pass 1: spans and batch maximum ───────────────────────────────────────
    let spans: Vec<Vec<WordSpan>> = word_ids
        .iter()
        .map(|ids| word_spans(&ids[..ids.len().min(seq_len)]))
        .collect();
    let word_counts: Vec<usize> = spans.iter().map(Vec::len).collect();
    let max_words = word_counts.iter().copied().max().unwrap_or(0);

    // ── Pass 2: fill prefixes of a zeroed output ──────────────────────────────
    let mut output = Tensor::<B, 3>::zeros([batch_size, max_words, hidden], &embeddings.device());
    for (b, sentence_spans) in spans.iter().enumerate() {
        if sentence_spans.is_empty() {
            continue;
        }
        let words: Vec<Tensor<B, 3>> = sentence_spans
            .iter()
            .map(|span| {
                embeddings
                    .clone()
                    .slice([b..b + 1, span.start..span.end, 0..hidden])
                    .mean_dim(1)
            })
            .collect();
        let n = words.len();
        output = output.slice_assign([b..b + 1, 0..n, 0..hidden], Tensor::cat(words, 1));
    }

    tracing::debug!(
        "Aggregated {} sentences: max_words={}, subwords={}",
        batch_size, max_words, seq_len
    );

    WordEmbeddings { embeddings: output, word_counts }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    /// Subword embeddings whose every value is unique: row r of sentence b
    /// holds [100b + 10r, 100b + 10r + 1, ...].
    fn ramp(batch: usize, seq: usize, hidden: usize) -> Tensor<TestBackend, 3> {
        let values: Vec<f32> = (0..batch)
            .flat_map(|b| (0..seq).flat_map(move |r| (0..hidden).map(move |h| (100 * b + 10 * r + h) as f32)))
            .collect();
        Tensor::from_data(TensorData::new(values, [batch, seq, hidden]), &Default::default())
    }

    fn values(t: Tensor<TestBackend, 3>) -> Vec<f32> {
        t.into_data().convert::<f32>().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_word_is_mean_of_its_subwords() {
        // word 0 = subwords 0..3, word 1 = subword 3
        let ids = vec![vec![Some(0), Some(0), Some(0), Some(1), None]];
        let out = aggregate_words(ramp(1, 5, 2), &ids);

        assert_eq!(out.embeddings.dims(), [1, 2, 2]);
        // mean of rows 0, 10, 20 → 10; single subword row 30 → itself
        assert_eq!(values(out.embeddings), vec![10.0, 11.0, 30.0, 31.0]);
    }

    #[test]
    fn test_pads_short_sentences_with_zeros() {
        // word counts {3, 5}, hidden 4
        let ids = vec![
            vec![Some(0), Some(1), Some(1), Some(2), None, None],
            vec![Some(0), Some(1), Some(2), Some(3), Some(3), Some(4)],
        ];
        let out = aggregate_words(ramp(2, 6, 4), &ids);

        assert_eq!(out.embeddings.dims(), [2, 5, 4]);
        assert_eq!(out.word_counts, vec![3, 5]);

        let v = values(out.embeddings);
        let first_sentence = &v[..5 * 4];
        assert!(first_sentence[3 * 4..].iter().all(|x| *x == 0.0));
        // word 1 of sentence 0 spans rows 1..3 → mean(10, 20) = 15
        assert_eq!(&first_sentence[4..8], &[15.0, 16.0, 17.0, 18.0]);
        // sentence 1, word 3 spans rows 3..5 → 100 + mean(30, 40)
        let second_sentence = &v[5 * 4..];
        assert_eq!(&second_sentence[12..16], &[135.0, 136.0, 137.0, 138.0]);
    }

    #[test]
    fn test_sentence_without_words() {
        let ids = vec![
            vec![Some(0), Some(1)],
            vec![None, None],
        ];
        let out = aggregate_words(ramp(2, 2, 3), &ids);
        assert_eq!(out.embeddings.dims(), [2, 2, 3]);
        assert_eq!(out.word_counts, vec![2, 0]);
        assert!(values(out.embeddings)[6..].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_ignores_map_entries_past_subword_axis() {
        // A map left longer than the (truncated) embeddings.
        let ids = vec![vec![Some(0), Some(1), Some(2), Some(3)]];
        let out = aggregate_words(ramp(1, 2, 1), &ids);
        assert_eq!(out.embeddings.dims(), [1, 2, 1]);
        assert_eq!(values(out.embeddings), vec![0.0, 10.0]);
    }
}
