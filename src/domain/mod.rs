// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types for the tagging problem. No Burn types,
// no file I/O:
//
//   task.rs       - the four prediction tasks and their
//                   class counts (tagset sizes)
//   sentence.rs   - an annotated sentence read from a treebank,
//                   plus the lemma edit-class derivation
//   word_spans.rs - word-id maps and the subword → word span
//                   scan used by the embedding aggregator
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

pub mod task;

pub mod sentence;

pub mod word_spans;
