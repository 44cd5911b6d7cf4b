//! Chunk boundary recalculation from assigned words.
//!
//! Turns absolute word timings into non-overlapping chunk windows and
//! rebases each chunk's words onto its own window.

use crate::domain::{Chunk, WordTimestamp};

/// Lead-in kept before a chunk's first word, in seconds.
pub const LEAD_IN_SECONDS: f64 = 0.1;

/// Summary of a recalculation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryReport {
    /// Indices of chunks without usable words. They keep their estimated
    /// window, moved past the previous chunk.
    pub unaligned: Vec<usize>,
    /// Indices of chunks left with an empty window because everything they
    /// covered was already claimed by earlier chunks.
    pub collapsed: Vec<usize>,
}

/// Spread `total_duration` over chunks in proportion to their text length.
///
/// Gives every chunk a usable window before alignment; chunks the aligner
/// cannot place keep this estimate.
pub fn estimate_timestamps(chunks: &mut [Chunk], total_duration: f64) {
    let total_chars: usize = chunks.iter().map(|c| c.text.chars().count().max(1)).sum();
    if total_chars == 0 || total_duration <= 0.0 {
        return;
    }

    let mut cursor = 0.0;
    for chunk in chunks.iter_mut() {
        let share = chunk.text.chars().count().max(1) as f64 / total_chars as f64;
        chunk.start_time = cursor;
        cursor += share * total_duration;
        chunk.end_time = cursor.min(total_duration);
    }
}

/// Apply assigned words to chunks and derive their windows.
///
/// `assignments[i]` holds the absolute-time words of `chunks[i]`. A chunk with
/// no words keeps its current window, clamped to start at the previous
/// chunk's end, and is reported as unaligned. No two chunks overlap.
///
/// When a chunk's words (or estimate) end before the previous chunk does, its
/// window collapses to the single instant `last_end`. Such chunks lose their
/// words, are reported as both unaligned and collapsed, and slice to an
/// empty clip.
pub fn recalculate_boundaries(
    chunks: &mut [Chunk],
    assignments: Vec<Vec<WordTimestamp>>,
) -> BoundaryReport {
    let mut report = BoundaryReport::default();
    let mut last_end = 0.0_f64;

    for (index, (chunk, words)) in chunks.iter_mut().zip(assignments).enumerate() {
        let (Some(first), Some(last)) = (words.first(), words.last()) else {
            chunk.words.clear();
            chunk.start_time = chunk.start_time.max(last_end);
            chunk.end_time = chunk.end_time.max(chunk.start_time);
            if chunk.end_time <= chunk.start_time {
                report.collapsed.push(index);
            }
            last_end = chunk.end_time;
            report.unaligned.push(index);
            continue;
        };

        let start = (first.start - LEAD_IN_SECONDS).max(0.0).max(last_end);
        let end = last.end.max(start);
        if end <= start {
            chunk.words.clear();
            chunk.start_time = start;
            chunk.end_time = start;
            report.unaligned.push(index);
            report.collapsed.push(index);
            continue;
        }

        chunk.words = words
            .iter()
            .map(|w| {
                let rel_start = (w.start - start).max(0.0);
                WordTimestamp {
                    word: w.word.clone(),
                    start: rel_start,
                    end: (w.end - start).max(rel_start),
                }
            })
            .collect();
        chunk.start_time = start;
        chunk.end_time = end;
        last_end = end;
    }

    if !report.unaligned.is_empty() {
        tracing::debug!(
            unaligned = report.unaligned.len(),
            collapsed = report.collapsed.len(),
            total = chunks.len(),
            "Chunks kept estimated timestamps"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::align_words;

    const EPS: f64 = 1e-9;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts.iter().map(|t| Chunk::new(*t)).collect()
    }

    fn scenario_stream() -> Vec<WordTimestamp> {
        vec![
            WordTimestamp::new("I", 0.0, 0.2),
            WordTimestamp::new("went", 0.2, 0.5),
            WordTimestamp::new("to", 0.5, 0.6),
            WordTimestamp::new("the", 0.6, 0.8),
            WordTimestamp::new("store", 0.8, 1.2),
            WordTimestamp::new("yesterday.", 1.3, 1.8),
        ]
    }

    #[test]
    fn test_three_chunk_scenario() {
        let mut chunks = chunks(&["I went to", "the store", "yesterday."]);
        let outcome = align_words(
            &chunks.iter().map(|c| c.text.clone()).collect::<Vec<_>>(),
            &scenario_stream(),
        );

        let report = recalculate_boundaries(&mut chunks, outcome.assignments);
        assert!(report.unaligned.is_empty());

        assert!((chunks[0].start_time - 0.0).abs() < EPS);
        assert!((chunks[0].end_time - 0.6).abs() < EPS);
        assert!((chunks[1].start_time - 0.6).abs() < EPS);
        assert!((chunks[1].end_time - 1.2).abs() < EPS);
        assert!((chunks[2].start_time - 1.2).abs() < EPS);
        assert!((chunks[2].end_time - 1.8).abs() < EPS);

        let first_words: Vec<&str> = chunks[0].words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(first_words, vec!["I", "went", "to"]);
        assert!(chunks[0].highlighting_enabled());
    }

    #[test]
    fn test_words_fit_inside_chunk_window() {
        let mut chunks = chunks(&["I went to", "the store", "yesterday."]);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let outcome = align_words(&texts, &scenario_stream());
        recalculate_boundaries(&mut chunks, outcome.assignments);

        for chunk in &chunks {
            let first = chunk.words.first().unwrap();
            let last = chunk.words.last().unwrap();
            assert!(first.start >= 0.0);
            assert!(last.end <= chunk.end_time - chunk.start_time + EPS);
        }
    }

    #[test]
    fn test_adjacent_chunks_never_overlap() {
        // Overlapping engine output: second chunk's words start before the
        // first chunk's last word ends.
        let mut chunks = chunks(&["a b", "c d", "e"]);
        let assignments = vec![
            vec![WordTimestamp::new("a", 0.5, 0.9), WordTimestamp::new("b", 0.9, 1.4)],
            vec![WordTimestamp::new("c", 1.1, 1.3), WordTimestamp::new("d", 1.3, 1.35)],
            vec![WordTimestamp::new("e", 1.2, 2.0)],
        ];

        let report = recalculate_boundaries(&mut chunks, assignments);

        for pair in chunks.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time + EPS);
        }
        // Second chunk's last word ended before the clamped start.
        assert_eq!(report.collapsed, vec![1]);
        assert_eq!(report.unaligned, vec![1]);
        assert!((chunks[1].start_time - 1.4).abs() < EPS);
        assert!((chunks[1].end_time - 1.4).abs() < EPS);
        assert!(chunks[1].words.is_empty());
        assert!(chunks[2].end_time > chunks[2].start_time);
    }

    #[test]
    fn test_lead_in_is_applied_when_room() {
        let mut chunks = chunks(&["hi"]);
        recalculate_boundaries(&mut chunks, vec![vec![WordTimestamp::new("hi", 2.0, 2.5)]]);

        assert!((chunks[0].start_time - 1.9).abs() < EPS);
        assert!((chunks[0].words[0].start - 0.1).abs() < EPS);
        assert!((chunks[0].words[0].end - 0.6).abs() < EPS);
    }

    #[test]
    fn test_unaligned_chunk_keeps_estimate() {
        let mut chunks = chunks(&["one", "two"]);
        chunks[1].start_time = 3.0;
        chunks[1].end_time = 4.0;

        let report = recalculate_boundaries(
            &mut chunks,
            vec![vec![WordTimestamp::new("one", 0.0, 0.5)], vec![]],
        );

        assert_eq!(report.unaligned, vec![1]);
        assert!((chunks[1].start_time - 3.0).abs() < EPS);
        assert!((chunks[1].end_time - 4.0).abs() < EPS);
        assert!(chunks[1].words.is_empty());
    }

    #[test]
    fn test_unaligned_tail_starts_after_last_aligned_chunk() {
        let mut chunks = chunks(&["a b c d", "e"]);
        estimate_timestamps(&mut chunks, 2.0);
        let stream = vec![
            WordTimestamp::new("a", 0.0, 0.4),
            WordTimestamp::new("b", 0.4, 0.9),
            WordTimestamp::new("c", 0.9, 1.4),
            WordTimestamp::new("d", 1.4, 1.9),
        ];
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let outcome = align_words(&texts, &stream);

        let report = recalculate_boundaries(&mut chunks, outcome.assignments);

        assert_eq!(report.unaligned, vec![1]);
        assert!(report.collapsed.is_empty());
        assert!((chunks[0].end_time - 1.9).abs() < EPS);
        assert!((chunks[1].start_time - 1.9).abs() < EPS);
        assert!((chunks[1].end_time - 2.0).abs() < EPS);
    }

    #[test]
    fn test_unaligned_chunk_advances_following_starts() {
        let mut chunks = chunks(&["one", "two", "three"]);
        chunks[1].start_time = 0.2;
        chunks[1].end_time = 1.5;

        recalculate_boundaries(
            &mut chunks,
            vec![
                vec![WordTimestamp::new("one", 0.0, 0.5)],
                vec![],
                vec![WordTimestamp::new("three", 1.2, 2.0)],
            ],
        );

        assert!((chunks[1].start_time - 0.5).abs() < EPS);
        assert!((chunks[2].start_time - 1.5).abs() < EPS);
        for pair in chunks.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time + EPS);
        }
    }

    #[test]
    fn test_estimate_is_proportional_and_contiguous() {
        let mut chunks = chunks(&["aaaa", "bb", "cc"]);
        estimate_timestamps(&mut chunks, 8.0);

        assert!((chunks[0].end_time - 4.0).abs() < EPS);
        assert!((chunks[1].start_time - 4.0).abs() < EPS);
        assert!((chunks[2].end_time - 8.0).abs() < EPS);
    }
}
