// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for one command each:
//
//   forward_use_case.rs   - read a treebank, build the tagger,
//                           run every batch and report shapes
//
//   configure_use_case.rs - validate a tagger config and build
//                           its optimiser bundles
//
// No tensor math here; only workflow coordination.

/// Batch-by-batch forward passes over a CoNLL-U file
pub mod forward_use_case;

/// Optimiser / scheduler validation
pub mod configure_use_case;
