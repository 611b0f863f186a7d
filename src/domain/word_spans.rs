// ============================================================
// Layer 3 — Word Spans
// ============================================================
// A tokenizer splits words into subwords and records, for every
// subword position, which word it came from:
//
//   words:    "Unbelievable"  "cats"
//   subwords:  Un  ##believ  ##able  cats  [PAD]  [PAD]
//   word ids:  0   0         0       1     None   None
//
// The aggregator needs the half-open span [start, end) of each
// word. Word ids are non-decreasing and contiguous, so a single
// left-to-right scan finds every span: resolve the current word,
// then jump the cursor straight to its end.
//
// The first `None` marks the start of padding; nothing after it
// is read.

/// Per-subword word index within its sentence, `None` for padding.
pub type WordIds = Vec<Option<usize>>;

/// Half-open range of subword positions belonging to one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub end:   usize,
}

/// Resolve the subword span of every word in one sentence.
///
/// Contiguity is an upstream guarantee of the tokenizer. Release
/// builds trust it; debug builds assert that word ids start at 0
/// and grow by exactly one per span.
pub fn word_spans(word_ids: &[Option<usize>]) -> Vec<WordSpan> {
    let mut spans = Vec::new();
    let mut i     = 0usize;

    while i < word_ids.len() {
        let Some(word) = word_ids[i] else {
            // Reached padding.
            break;
        };
        debug_assert_eq!(
            word,
            spans.len(),
            "word ids must be contiguous and start at 0 (position {i})"
        );

        let end = word_ids[i..]
            .iter()
            .position(|w| *w != Some(word))
            .map_or(word_ids.len(), |offset| i + offset);

        spans.push(WordSpan { start: i, end });
        // Fast-forward to the first subword of the next word.
        i = end;
    }

    spans
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_follow_word_ids() {
        let ids = vec![Some(0), Some(0), Some(0), Some(1), Some(2), Some(2)];
        assert_eq!(
            word_spans(&ids),
            vec![
                WordSpan { start: 0, end: 3 },
                WordSpan { start: 3, end: 4 },
                WordSpan { start: 4, end: 6 },
            ]
        );
    }

    #[test]
    fn test_stops_at_padding() {
        let ids = vec![Some(0), Some(1), Some(1), None, None];
        let spans = word_spans(&ids);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1], WordSpan { start: 1, end: 3 });
    }

    #[test]
    fn test_single_subword_words() {
        let ids = vec![Some(0), Some(1), Some(2)];
        assert!(word_spans(&ids).iter().all(|s| s.end - s.start == 1));
    }

    #[test]
    fn test_empty_and_all_padding() {
        assert!(word_spans(&[]).is_empty());
        assert!(word_spans(&[None, None]).is_empty());
    }
}
