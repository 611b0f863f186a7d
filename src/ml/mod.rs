// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here. The data layer only hands over a
// TokenizedBatch; the application layer only sees shapes and
// configuration results.
//
// What's in this layer:
//
//   encoder.rs    - Transformer encoder producing every layer's
//                   hidden states, plus the tagging wrapper:
//                   • truncation to the position limit
//                   • mean over the last K layers
//                   • dropout
//
//   aggregator.rs - Subword → word mean pooling over ragged
//                   batches, zero-padded to the longest sentence
//
//   classifier.rs - Optional UPOS / XPOS / lemma / FEATS heads,
//                   logits laid out [batch, classes, words]
//
//   model.rs      - Tagger: encoder → aggregator → classifier,
//                   and per-module optimiser configuration
//
//   optim.rs      - Optimiser and scheduler selection
//   adadelta.rs   - Adadelta as a Burn SimpleOptimizer
//   scheduler.rs  - Reduce-on-plateau and warmup/inverse-√ schedules
//
//   inferencer.rs - Runs a loaded Tagger over sentence batches
//
// Reference: Burn Book §3 (Building Blocks)
//            Devlin et al. (2019) BERT

/// Transformer encoder and the tagging wrapper around it
pub mod encoder;

/// Subword-to-word embedding pooling
pub mod aggregator;

/// Per-task classification heads
pub mod classifier;

/// The full tagging model
pub mod model;

/// Optimiser / scheduler configuration bundles
pub mod optim;

pub mod adadelta;

pub mod scheduler;

/// Batch-by-batch forward passes over a corpus
pub mod inferencer;
