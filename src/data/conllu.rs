// ============================================================
// Layer 4 — CoNLL-U Reader
// ============================================================
// Reads Universal Dependencies treebanks.
//
// A CoNLL-U file is a list of sentence blocks separated by blank
// lines. Each word line has ten tab-separated columns:
//
//   ID  FORM  LEMMA  UPOS  XPOS  FEATS  HEAD  DEPREL  DEPS  MISC
//
// We keep columns 2–6. Lines that are not plain words are skipped:
//   # comments              (sentence metadata)
//   1-2  multi-word tokens  (surface tokens spanning two words)
//   1.1  empty nodes        (enhanced-dependency helpers)
//
// Unlabelled input (only ID and FORM) is accepted; missing
// columns read as "_".
//
// Reference: https://universaldependencies.org/format.html

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::sentence::{Sentence, Token};

pub struct ConlluReader {
    path: PathBuf,
}

impl ConlluReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn read_all(&self) -> Result<Vec<Sentence>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read '{}'", self.path.display()))?;
        let sentences = parse(&text)
            .with_context(|| format!("Malformed CoNLL-U in '{}'", self.path.display()))?;
        tracing::info!("Read {} sentences from '{}'", sentences.len(), self.path.display());
        Ok(sentences)
    }
}

pub fn parse(text: &str) -> Result<Vec<Sentence>> {
    let mut sentences = Vec::new();
    let mut tokens    = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !tokens.is_empty() {
                sentences.push(Sentence::new(std::mem::take(&mut tokens)));
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 2 {
            anyhow::bail!("line {}: expected at least ID and FORM columns", number + 1);
        }
        let id = columns[0];
        if id.contains('-') || id.contains('.') {
            continue;
        }
        if id.parse::<usize>().is_err() {
            anyhow::bail!("line {}: invalid word id '{}'", number + 1, id);
        }

        let column = |i: usize| columns.get(i).copied().unwrap_or("_");
        tokens.push(Token::new(column(1), column(2), column(3), column(4), column(5)));
    }

    if !tokens.is_empty() {
        sentences.push(Sentence::new(tokens));
    }
    Ok(sentences)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# sent_id = 1
# text = Don't go.
1-2\tDon't\t_\t_\t_\t_\t_\t_\t_\t_
1\tDo\tdo\tAUX\tVBP\tMood=Imp\t3\taux\t_\t_
2\tn't\tnot\tPART\tRB\t_\t3\tadvmod\t_\t_
3\tgo\tgo\tVERB\tVB\tVerbForm=Inf\t0\troot\t_\t_
3.1\tgo\tgo\tVERB\tVB\t_\t_\t_\t_\t_
4\t.\t.\tPUNCT\t.\t_\t3\tpunct\t_\t_

1\tYes\tyes\tINTJ\tUH\t_\t0\troot\t_\t_
";

    #[test]
    fn test_parses_sentences_and_skips_special_lines() {
        let sentences = parse(SAMPLE).unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].forms(), vec!["Do", "n't", "go", "."]);
        assert_eq!(sentences[0].tokens[2].feats, "VerbForm=Inf");
        assert_eq!(sentences[1].tokens[0].upos, "INTJ");
    }

    #[test]
    fn test_unlabelled_input() {
        let sentences = parse("1\tHello\n2\tworld\n").unwrap();
        assert_eq!(sentences[0].tokens[1].form, "world");
        assert_eq!(sentences[0].tokens[1].upos, "_");
    }

    #[test]
    fn test_rejects_bad_id() {
        assert!(parse("x\tHello\n").is_err());
    }
}
