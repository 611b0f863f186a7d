// ============================================================
// Layer 3 — Annotated Sentences
// ============================================================
// One word of a treebank sentence with the four labels the
// tagger learns. Lemmas are turned into edit classes: after the
// longest common prefix of form and lemma, strip N characters
// from the end of the form and append a suffix.
//
//   form "running", lemma "run"  → strip 4, append ""
//   form "went",    lemma "go"   → strip 4, append "go"
//   form "cat",     lemma "cat"  → strip 0, append ""
//
// With reverse edits both strings are reversed first, so the
// shared part is the common suffix and the edit rewrites the
// start of the form:
//
//   form "unkind",  lemma "kind" → strip 2 from the front

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub form:  String,
    pub lemma: String,
    pub upos:  String,
    pub xpos:  String,
    pub feats: String,
}

/// Edit that maps a form onto its lemma.
///
/// `append` is stored in working order, i.e. reversed when
/// `reverse` is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LemmaRule {
    pub strip:   usize,
    pub append:  String,
    #[serde(default)]
    pub reverse: bool,
}

impl LemmaRule {
    pub fn derive(form: &str, lemma: &str, reverse: bool) -> Self {
        let form  = oriented(form, reverse);
        let lemma = oriented(lemma, reverse);
        let prefix = form
            .iter()
            .zip(lemma.iter())
            .take_while(|(a, b)| a == b)
            .count();
        Self {
            strip:  form.len() - prefix,
            append: lemma[prefix..].iter().collect(),
            reverse,
        }
    }

    pub fn apply(&self, form: &str) -> String {
        let mut chars = oriented(form, self.reverse);
        chars.truncate(chars.len().saturating_sub(self.strip));
        chars.extend(self.append.chars());
        if self.reverse {
            chars.reverse();
        }
        chars.into_iter().collect()
    }
}

fn oriented(s: &str, reverse: bool) -> Vec<char> {
    let mut chars: Vec<char> = s.chars().collect();
    if reverse {
        chars.reverse();
    }
    chars
}

impl Token {
    pub fn new(
        form:  impl Into<String>,
        lemma: impl Into<String>,
        upos:  impl Into<String>,
        xpos:  impl Into<String>,
        feats: impl Into<String>,
    ) -> Self {
        Self {
            form:  form.into(),
            lemma: lemma.into(),
            upos:  upos.into(),
            xpos:  xpos.into(),
            feats: feats.into(),
        }
    }

    /// Edit class for this token's lemma (case-sensitive).
    pub fn lemma_rule(&self, reverse_edits: bool) -> LemmaRule {
        LemmaRule::derive(&self.form, &self.lemma, reverse_edits)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn forms(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.form.as_str()).collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn rule(form: &str, lemma: &str) -> LemmaRule {
        Token::new(form, lemma, "_", "_", "_").lemma_rule(false)
    }

    fn suffix(strip: usize, append: &str) -> LemmaRule {
        LemmaRule { strip, append: append.into(), reverse: false }
    }

    #[test]
    fn test_suffix_rules() {
        assert_eq!(rule("running", "run"), suffix(4, ""));
        assert_eq!(rule("went", "go"), suffix(4, "go"));
        assert_eq!(rule("cat", "cat"), suffix(0, ""));
    }

    #[test]
    fn test_rule_reconstructs_lemma() {
        for (form, lemma) in [("Häuser", "Haus"), ("mice", "mouse"), ("a", "a"), ("unkind", "kind")] {
            assert_eq!(rule(form, lemma).apply(form), lemma);
            assert_eq!(LemmaRule::derive(form, lemma, true).apply(form), lemma);
        }
    }

    #[test]
    fn test_reverse_edits_work_on_the_front() {
        let unkind  = LemmaRule::derive("unkind", "kind", true);
        let unhappy = LemmaRule::derive("unhappy", "happy", true);
        assert_eq!(unkind, LemmaRule { strip: 2, append: String::new(), reverse: true });
        assert_eq!(unkind, unhappy);
        assert_ne!(rule("unkind", "kind"), rule("unhappy", "happy"));

        // prepending in reverse mode stores the prefix reversed
        let rule = LemmaRule::derive("ging", "gegangen", true);
        assert_eq!(rule.apply("ging"), "gegangen");
    }

    #[test]
    fn test_forms() {
        let s = Sentence::new(vec![
            Token::new("The", "the", "DET", "DT", "_"),
            Token::new("end", "end", "NOUN", "NN", "_"),
        ]);
        assert_eq!(s.forms(), vec!["The", "end"]);
        assert_eq!(s.len(), 2);
    }
}
