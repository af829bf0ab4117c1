//! Deterministic overlapping text chunking

use crate::error::SummarizerError;
use readlab_domain::Chunk;

/// Normalize extracted text before chunking
///
/// NUL characters become spaces, whitespace runs collapse to one space and
/// the result is trimmed.
pub fn clean_text(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\0')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split `text` into overlapping chunks of at most `max_chars` characters
///
/// Offsets count characters, not bytes. Consecutive chunks share exactly
/// `overlap` characters and together cover the whole text. A cut prefers
/// to land right after whitespace within the last tenth of the window;
/// without whitespace there it is made at `max_chars`.
///
/// # Examples
///
/// ```
/// use readlab_summarizer::split_text;
///
/// let text = "A".repeat(10_000);
/// let chunks = split_text(&text, 6000, 400).unwrap();
/// assert_eq!((chunks[0].start, chunks[0].end), (0, 6000));
/// assert_eq!((chunks[1].start, chunks[1].end), (5600, 10_000));
/// ```
pub fn split_text(text: &str, max_chars: usize, overlap: usize) -> Result<Vec<Chunk>, SummarizerError> {
    if overlap == 0 || overlap >= max_chars {
        return Err(SummarizerError::Config(format!(
            "chunking requires 0 < overlap < max_chars (got overlap={}, max_chars={})",
            overlap, max_chars
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut chunks = Vec::new();
    if n == 0 {
        return Ok(chunks);
    }

    let mut offset = 0;
    loop {
        let hard_end = (offset + max_chars).min(n);
        let end = if hard_end == n {
            n
        } else {
            cut_point(&chars, offset, hard_end, max_chars, overlap)
        };

        chunks.push(Chunk {
            index: chunks.len(),
            start: offset,
            end,
            text: chars[offset..end].iter().collect(),
        });

        if end == n {
            break;
        }
        offset = end - overlap;
    }

    Ok(chunks)
}

/// Largest `end` in the search window whose preceding char is whitespace
///
/// The window never reaches below `offset + overlap + 1`, so the next
/// chunk always starts after the current one.
fn cut_point(chars: &[char], offset: usize, hard_end: usize, max_chars: usize, overlap: usize) -> usize {
    let floor = (offset + overlap + 1).max(hard_end.saturating_sub(max_chars / 10));
    (floor..=hard_end)
        .rev()
        .find(|&end| chars[end - 1].is_whitespace())
        .unwrap_or(hard_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_chunking_needed_for_small_text() {
        let chunks = split_text("Short text here.", 100, 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Short text here.");
        assert_eq!((chunks[0].start, chunks[0].end), (0, 16));
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(split_text("", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(split_text("abc", 10, 10), Err(SummarizerError::Config(_))));
        assert!(matches!(split_text("abc", 10, 0), Err(SummarizerError::Config(_))));
        assert!(split_text("abc", 10, 20).is_err());
    }

    #[test]
    fn test_hard_cut_without_whitespace() {
        let text = "A".repeat(10_000);
        let chunks = split_text(&text, 6000, 400).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 6000));
        assert_eq!((chunks[1].start, chunks[1].end), (5600, 10_000));
    }

    #[test]
    fn test_cut_prefers_whitespace() {
        // 95 'a', a space, then 'b's: the window [90, 100] contains the space
        let text = format!("{} {}", "a".repeat(95), "b".repeat(60));
        let chunks = split_text(&text, 100, 10).unwrap();
        assert_eq!(chunks[0].end, 96);
        assert!(chunks[0].text.ends_with(' '));
        assert_eq!(chunks[1].start, 86);
    }

    #[test]
    fn test_offsets_count_characters() {
        let text = "é".repeat(25);
        let chunks = split_text(&text, 10, 2).unwrap();
        assert_eq!(chunks[0].text.chars().count(), 10);
        assert_eq!(chunks.last().unwrap().end, 25);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a\u{0}b \n\n\t c  "), "a b c");
        assert_eq!(clean_text("\u{0}\u{0}"), "");
    }

    proptest! {
        #[test]
        fn prop_chunks_cover_and_overlap(
            text in "[a-z \\n]{0,600}",
            max_chars in 2usize..80,
            overlap_seed in 1usize..80,
        ) {
            let overlap = 1 + overlap_seed % (max_chars - 1);
            let chunks = split_text(&text, max_chars, overlap).unwrap();
            let n = text.chars().count();

            if n == 0 {
                prop_assert!(chunks.is_empty());
            } else {
                prop_assert_eq!(chunks[0].start, 0);
                prop_assert_eq!(chunks.last().unwrap().end, n);
                for chunk in &chunks {
                    prop_assert!(chunk.len() <= max_chars);
                    prop_assert!(!chunk.is_empty());
                }
                for pair in chunks.windows(2) {
                    prop_assert_eq!(pair[1].start, pair[0].end - overlap);
                    prop_assert!(pair[1].start > pair[0].start);
                }
            }
        }

        #[test]
        fn prop_reassembly_yields_text(
            text in "\\PC{0,400}",
            max_chars in 2usize..50,
            overlap_seed in 1usize..50,
        ) {
            let overlap = 1 + overlap_seed % (max_chars - 1);
            let chunks = split_text(&text, max_chars, overlap).unwrap();

            let mut rebuilt = String::new();
            for (i, chunk) in chunks.iter().enumerate() {
                if i == 0 {
                    rebuilt.push_str(&chunk.text);
                } else {
                    rebuilt.extend(chunk.text.chars().skip(overlap));
                }
            }
            prop_assert_eq!(rebuilt, text);
        }
    }
}
