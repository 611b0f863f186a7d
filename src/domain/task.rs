// ============================================================
// Layer 3 — Tasks and Tagset Sizes
// ============================================================
// The tagger predicts up to four labels per word:
//
//   UPOS  - universal part of speech (NOUN, VERB, ...)
//   XPOS  - language-specific part of speech
//   Lemma - an edit class that turns the form into its lemma
//   Feats - the morphological feature bundle (Case=Nom|Number=Sing)
//
// Class counts are not known until the data layer has seen the
// label vocabulary, so they travel separately as TagsetSizes.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::sentence::Sentence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Upos,
    Xpos,
    Lemma,
    Feats,
}

impl Task {
    /// All tasks in logits-bundle order.
    pub const ALL: [Task; 4] = [Task::Upos, Task::Xpos, Task::Lemma, Task::Feats];

    pub fn name(&self) -> &'static str {
        match self {
            Task::Upos  => "upos",
            Task::Xpos  => "xpos",
            Task::Lemma => "lemma",
            Task::Feats => "feats",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of output classes per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsetSizes {
    pub upos:  usize,
    pub xpos:  usize,
    pub lemma: usize,
    pub feats: usize,
}

impl TagsetSizes {
    pub fn get(&self, task: Task) -> usize {
        match task {
            Task::Upos  => self.upos,
            Task::Xpos  => self.xpos,
            Task::Lemma => self.lemma,
            Task::Feats => self.feats,
        }
    }

    /// Count the distinct labels of every task across a corpus.
    ///
    /// Lemmas are counted as edit classes, not as strings, so
    /// "cats"→"cat" and "dogs"→"dog" share one class. With
    /// `reverse_edits` the classes edit the start of the form.
    pub fn from_sentences(sentences: &[Sentence], reverse_edits: bool) -> Self {
        let mut upos  = HashSet::new();
        let mut xpos  = HashSet::new();
        let mut lemma = HashSet::new();
        let mut feats = HashSet::new();

        for token in sentences.iter().flat_map(|s| s.tokens.iter()) {
            upos.insert(token.upos.as_str());
            xpos.insert(token.xpos.as_str());
            feats.insert(token.feats.as_str());
            lemma.insert(token.lemma_rule(reverse_edits));
        }

        Self {
            upos:  upos.len(),
            xpos:  xpos.len(),
            lemma: lemma.len(),
            feats: feats.len(),
        }
    }
}

impl Default for TagsetSizes {
    /// Placeholder sizes used until the data layer reports real ones.
    fn default() -> Self {
        Self { upos: 2, xpos: 2, lemma: 2, feats: 2 }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentence::Token;

    fn token(form: &str, lemma: &str, upos: &str, feats: &str) -> Token {
        Token::new(form, lemma, upos, "_", feats)
    }

    #[test]
    fn test_counts_distinct_labels() {
        let sentences = vec![
            Sentence::new(vec![
                token("cats", "cat", "NOUN", "Number=Plur"),
                token("sleep", "sleep", "VERB", "_"),
            ]),
            Sentence::new(vec![
                token("dogs", "dog", "NOUN", "Number=Plur"),
                token("bark", "bark", "VERB", "_"),
            ]),
        ];
        let sizes = TagsetSizes::from_sentences(&sentences, false);
        assert_eq!(sizes.upos, 2);
        assert_eq!(sizes.xpos, 1);
        assert_eq!(sizes.feats, 2);
        // "strip one char" and "identity"
        assert_eq!(sizes.lemma, 2);
    }

    #[test]
    fn test_reverse_edits_change_lemma_classes() {
        let sentences = vec![Sentence::new(vec![
            token("unkind", "kind", "ADJ", "_"),
            token("unhappy", "happy", "ADJ", "_"),
            token("cats", "cat", "NOUN", "_"),
        ])];
        // suffix edits: two whole-word rewrites plus "strip one"
        assert_eq!(TagsetSizes::from_sentences(&sentences, false).lemma, 3);
        // prefix edits: "strip two from the front" twice, plus the cats rule
        assert_eq!(TagsetSizes::from_sentences(&sentences, true).lemma, 2);
    }

    #[test]
    fn test_task_order_and_names() {
        let names: Vec<_> = Task::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["upos", "xpos", "lemma", "feats"]);
        assert_eq!(TagsetSizes::default().get(Task::Feats), 2);
    }
}
