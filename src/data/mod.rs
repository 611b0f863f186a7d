// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a treebank file to a tokenized tensor batch:
//
//   .conllu file
//       │
//       ▼
//   ConlluReader      → sentences with form / lemma / tags
//       │
//       ▼
//   Preprocessor      → cleans each word form
//       │
//       ▼
//   SentenceBatcher   → subword ids, attention mask and one
//                       word-id map per sentence
//
// The model only ever sees a TokenizedBatch. Label vocabularies
// (tagset sizes) are counted in the domain layer.
//
// Reference: Universal Dependencies CoNLL-U format
//            Burn Book §4 (Batcher)

/// Reads CoNLL-U treebank files
pub mod conllu;

/// Cleans word forms before tokenisation
pub mod preprocessor;

/// Turns sentences into padded subword batches with word-id maps
pub mod batcher;
