//! Sequential fuzzy assignment of a word stream to chunks.
//!
//! The stream is consumed by a single forward cursor. Each expected token
//! either matches the word under the cursor, matches a word at most
//! [`LOOKAHEAD`] positions ahead (the skipped words stay with the chunk as
//! fillers), or is paired with the cursor word's timing so the cursor always
//! advances. Words are never reordered or revisited.
//!
//! The lookahead bound is a heuristic. A misalignment wider than the window
//! degrades to one synthesized word per token until the texts line up again.

use crate::domain::WordTimestamp;

/// How many stream positions past the cursor are searched for a match.
pub const LOOKAHEAD: usize = 5;

const STRIP_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '"', '\'', '(', ')'];

/// Comparison form of a token: punctuation stripped, lower-cased.
#[must_use]
pub fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| !STRIP_CHARS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Counters describing how a stream was assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentStats {
    /// Tokens matched directly or via lookahead.
    pub matched: usize,
    /// Stream words skipped over by lookahead and kept as fillers.
    pub fillers: usize,
    /// Tokens paired with a non-matching word's timing.
    pub synthesized: usize,
    /// Chunks that received no words at all.
    pub unaligned_chunks: usize,
}

/// Result of [`align_words`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentOutcome {
    /// One word list per input chunk, absolute timing.
    pub assignments: Vec<Vec<WordTimestamp>>,
    pub stats: AlignmentStats,
}

/// Assign `stream` to the chunk texts in order.
///
/// Pure and deterministic: identical inputs give identical assignments.
pub fn align_words<S: AsRef<str>>(chunk_texts: &[S], stream: &[WordTimestamp]) -> AlignmentOutcome {
    let normalized_stream: Vec<String> = stream.iter().map(|w| normalize_token(&w.word)).collect();
    let mut cursor = 0usize;
    let mut stats = AlignmentStats::default();
    let mut assignments = Vec::with_capacity(chunk_texts.len());

    for text in chunk_texts {
        let mut words = Vec::new();

        for token in text.as_ref().split_whitespace() {
            if cursor >= stream.len() {
                break;
            }

            let expected = normalize_token(token);
            if expected.is_empty() {
                // Punctuation-only tokens are not spoken.
                continue;
            }

            if normalized_stream[cursor] == expected {
                words.push(WordTimestamp::new(token, stream[cursor].start, stream[cursor].end));
                cursor += 1;
                stats.matched += 1;
                continue;
            }

            let found = (1..=LOOKAHEAD)
                .take_while(|k| cursor + k < stream.len())
                .find(|k| normalized_stream[cursor + k] == expected);

            if let Some(k) = found {
                words.extend_from_slice(&stream[cursor..cursor + k]);
                let hit = &stream[cursor + k];
                words.push(WordTimestamp::new(token, hit.start, hit.end));
                cursor += k + 1;
                stats.matched += 1;
                stats.fillers += k;
            } else {
                let current = &stream[cursor];
                words.push(WordTimestamp::new(token, current.start, current.end));
                cursor += 1;
                stats.synthesized += 1;
            }
        }

        if words.is_empty() {
            stats.unaligned_chunks += 1;
        }
        assignments.push(words);
    }

    if cursor < stream.len() {
        tracing::debug!(
            leftover = stream.len() - cursor,
            "Word stream not fully consumed by chunk texts"
        );
    }

    AlignmentOutcome { assignments, stats }
}
