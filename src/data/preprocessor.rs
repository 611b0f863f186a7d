// ============================================================
// Layer 4 — Word Form Preprocessor
// ============================================================
// Cleans a single word form before it reaches the tokenizer.
//
// Treebank forms occasionally carry:
//   - Non-breaking spaces (U+00A0) inside numbers ("10 000")
//   - Zero-width spaces (U+200B) and byte order marks
//   - Tabs or other control characters from broken exports
//
// Left alone, these either become their own subwords or vanish
// inside the tokenizer, and a word that yields no subword at all
// would silently shift every later word's alignment. So:
//
//   1. Drop invisible format characters (soft hyphen, joiners,
//      direction marks)
//   2. Map Unicode space variants and control chars to ' '
//   3. Collapse runs of spaces, trim the edges
//   4. A form that ends up empty becomes "_"
//
// The batcher still re-checks every word after tokenisation,
// since a tokenizer may delete characters this list keeps.
//
// Reference: Rust Book §8 (Strings in Rust)

/// Stand-in for forms that clean down to nothing.
pub const EMPTY_FORM: &str = "_";

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, form: &str) -> String {
        let mut out        = String::with_capacity(form.len());
        let mut last_space = true;

        for c in form.chars() {
            let c = match c {
                '\u{00AD}' | '\u{200C}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}' => continue,
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            };
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        let trimmed = out.trim_end();
        if trimmed.is_empty() {
            EMPTY_FORM.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
