// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads `tokenizer.json` from the store directory, or builds a
// small word-level tokenizer from corpus forms and saves it.
//
// The generated tokenizer lowercases, then splits every word on
// letter/punctuation boundaries before vocabulary lookup, so a
// form such as "don't" becomes three subwords that share one
// word id:
//
//   don  '  t   →   word ids 0 0 0
//
// Accents are kept. The vocabulary is built with the same
// lowercasing, cleaning and split as the saved normalizer and
// pre-tokenizer, so every piece seen in the corpus has its own id.
//
// Reference: tokenizers crate documentation (WordLevel, Whitespace)

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tokenizers::Tokenizer;

const TOKENIZER_FILE: &str = "tokenizer.json";
const SPECIAL_TOKENS: [&str; 5] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load an existing tokenizer or build a new one from `forms`.
    pub fn load_or_build(&self, forms: &[String], max_vocab: usize) -> Result<Tokenizer> {
        if self.path().exists() {
            tracing::info!("Loading existing tokenizer from '{}'", self.path().display());
            self.load()
        } else {
            tracing::info!("Building new tokenizer (max_vocab={})", max_vocab);
            self.build_and_save(forms, max_vocab)
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }

    fn build_and_save(&self, forms: &[String], max_vocab: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Count pieces ──────────────────────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for form in forms {
            for piece in split_pieces(&normalise(form)) {
                *freq.entry(piece).or_insert(0) += 1;
            }
        }

        // Most frequent first, ties alphabetically so the ids are stable.
        let mut pieces: Vec<(String, usize)> = freq.into_iter().collect();
        pieces.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pieces.truncate(max_vocab.saturating_sub(SPECIAL_TOKENS.len()));

        // ── Step 2: Vocabulary, specials first ────────────────────────────────
        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for (piece, _) in pieces {
            let id = vocab.len();
            vocab.entry(piece).or_insert(serde_json::json!(id));
        }

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| serde_json::json!({
                "id": id, "content": token, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let vocab_size = vocab.len();
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": false,
                "strip_accents": false,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let path = self.path();
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write tokenizer to '{}'", path.display()))?;
        tracing::info!("Tokenizer built with {} entries, saved to '{}'", vocab_size, path.display());

        self.load()
    }
}

/// Mirror of the saved BertNormalizer: drop U+0000, U+FFFD and
/// control characters other than whitespace, then lowercase.
fn normalise(form: &str) -> String {
    form.chars()
        .filter(|&c| !(c == '\0' || c == '\u{FFFD}' || (c.is_control() && !c.is_whitespace())))
        .collect::<String>()
        .to_lowercase()
}

/// Split like the `Whitespace` pre-tokenizer: runs of word
/// characters, and runs of anything else that is not a space.
fn split_pieces(text: &str) -> Vec<String> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut pieces  = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(last) = current.chars().last() {
            if is_word(last) != is_word(c) {
                pieces.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
