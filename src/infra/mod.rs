// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-backed helpers shared by the use cases:
//
//   tokenizer_store.rs - Loads tokenizer.json, or builds a
//                        word-level tokenizer from corpus forms
//                        and saves it for the next run
//
//   config_store.rs    - Saves / loads the resolved TaggerConfig
//                        as JSON
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Tagger configuration persistence
pub mod config_store;
