//! Merge per-chunk partial summaries into one Summary

use readlab_domain::{PartialSummary, Summary};
use std::path::Path;

/// Merge partials into a summary skeleton
///
/// Pure: the result depends only on the partials (re-ordered by chunk
/// index) and the source path.
///
/// - list fields are concatenated in chunk order and de-duplicated
///   case-insensitively, keeping the first spelling;
/// - `tl_dr` is seeded with the longest chunk tl_dr;
/// - title, authors, year and venue are decided by majority vote, ties
///   going to the value seen first;
/// - without any title the file stem of `source_path` is used.
///
/// `generated_at` and `model` are left for the caller to fill in.
pub fn reduce_partials(partials: &[PartialSummary], source_path: &str) -> Summary {
    let mut ordered: Vec<&PartialSummary> = partials.iter().collect();
    ordered.sort_by_key(|p| p.chunk_index);

    let mut summary = Summary::new(source_path);

    summary.title = vote(ordered.iter().filter_map(|p| p.title.clone()), |t| t.to_lowercase())
        .unwrap_or_else(|| fallback_title(source_path));
    summary.authors = vote(
        ordered.iter().filter(|p| !p.authors.is_empty()).map(|p| p.authors.clone()),
        |a| a.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>(),
    )
    .unwrap_or_default();
    summary.year = vote(ordered.iter().filter_map(|p| p.year), |y| *y);
    summary.venue = vote(ordered.iter().filter_map(|p| p.venue.clone()), |v| v.to_lowercase());

    summary.tl_dr = longest_tl_dr(&ordered);

    summary.contributions = merge_lists(ordered.iter().map(|p| &p.contributions));
    summary.methods = merge_lists(ordered.iter().map(|p| &p.methods));
    summary.results = merge_lists(ordered.iter().map(|p| &p.results));
    summary.limitations = merge_lists(ordered.iter().map(|p| &p.limitations));
    summary.tags = merge_lists(ordered.iter().map(|p| &p.tags));
    summary.quotes = merge_lists(ordered.iter().map(|p| &p.quotes));
    summary.references = merge_lists(ordered.iter().map(|p| &p.references));

    summary
}

/// Cut `text` to at most `max_chars` characters, preferring a word boundary
pub fn trim_to_word_boundary(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let head: String = text.chars().take(max_chars).collect();
    // Keep the whole head when the cut already falls between words
    let next_is_space = text.chars().nth(max_chars).map(char::is_whitespace).unwrap_or(true);
    if next_is_space {
        return head.trim_end().to_string();
    }
    match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => head[..pos].trim_end().to_string(),
        _ => head,
    }
}

/// Majority vote keyed by `key`; ties go to the first value seen
fn vote<T, K, I, F>(values: I, key: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut ballots: Vec<(K, T, usize)> = Vec::new();
    for value in values {
        let k = key(&value);
        match ballots.iter_mut().find(|(existing, _, _)| *existing == k) {
            Some(entry) => entry.2 += 1,
            None => ballots.push((k, value, 1)),
        }
    }

    let mut winner: Option<(T, usize)> = None;
    for (_, value, count) in ballots {
        let better = match &winner {
            Some((_, best)) => count > *best,
            None => true,
        };
        if better {
            winner = Some((value, count));
        }
    }
    winner.map(|(value, _)| value)
}

fn longest_tl_dr(ordered: &[&PartialSummary]) -> String {
    let mut best = "";
    for partial in ordered {
        let candidate = partial.tl_dr.trim();
        if candidate.chars().count() > best.chars().count() {
            best = candidate;
        }
    }
    best.to_string()
}

fn merge_lists<'a, I>(lists: I) -> Vec<String>
where
    I: Iterator<Item = &'a Vec<String>>,
{
    let mut seen: Vec<String> = Vec::new();
    let mut merged = Vec::new();
    for item in lists.flatten() {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            merged.push(trimmed.to_string());
        }
    }
    merged
}

fn fallback_title(source_path: &str) -> String {
    Path::new(source_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| source_path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(index: usize) -> PartialSummary {
        PartialSummary {
            chunk_index: index,
            ..Default::default()
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lists_merge_in_chunk_order_without_duplicates() {
        let mut second = partial(1);
        second.contributions = strings(&["Faster training", "New dataset"]);
        second.tags = strings(&["nlp", "Benchmarks"]);
        let mut first = partial(0);
        first.contributions = strings(&["New dataset", " "]);
        first.tags = strings(&["NLP"]);

        // Input order is scrambled; chunk order wins
        let summary = reduce_partials(&[second, first], "papers/p.pdf");
        assert_eq!(summary.contributions, strings(&["New dataset", "Faster training"]));
        assert_eq!(summary.tags, strings(&["NLP", "Benchmarks"]));
    }

    #[test]
    fn test_title_majority_vote() {
        let mut a = partial(0);
        a.title = Some("Chunk heading".into());
        let mut b = partial(1);
        b.title = Some("Real Title".into());
        let mut c = partial(2);
        c.title = Some("real title".into());

        let summary = reduce_partials(&[a, b, c], "p.pdf");
        assert_eq!(summary.title, "Real Title");
    }

    #[test]
    fn test_vote_tie_goes_to_first_seen() {
        let mut a = partial(0);
        a.year = Some(2020);
        a.authors = strings(&["Ada", "Grace"]);
        let mut b = partial(1);
        b.year = Some(2021);
        b.authors = strings(&["Grace"]);

        let summary = reduce_partials(&[b, a], "p.pdf");
        assert_eq!(summary.year, Some(2020));
        assert_eq!(summary.authors, strings(&["Ada", "Grace"]));
    }

    #[test]
    fn test_fallback_title_is_file_stem() {
        let summary = reduce_partials(&[partial(0)], "papers/attention_is_all.pdf");
        assert_eq!(summary.title, "attention_is_all");
    }

    #[test]
    fn test_longest_tl_dr_seed() {
        let mut a = partial(0);
        a.tl_dr = "Short.".into();
        let mut b = partial(1);
        b.tl_dr = "A much longer chunk takeaway.".into();
        let mut c = partial(2);
        c.tl_dr = "Another long chunk takeaway!!".into();

        let summary = reduce_partials(&[a, b, c], "p.pdf");
        assert_eq!(summary.tl_dr, "A much longer chunk takeaway.");
    }

    #[test]
    fn test_reduce_is_deterministic() {
        let mut a = partial(0);
        a.methods = strings(&["Survey"]);
        let mut b = partial(1);
        b.methods = strings(&["Ablation"]);

        let one = reduce_partials(&[a.clone(), b.clone()], "p.pdf");
        let two = reduce_partials(&[b, a], "p.pdf");
        assert_eq!(one, two);
    }

    #[test]
    fn test_trim_to_word_boundary() {
        assert_eq!(trim_to_word_boundary("short text", 100), "short text");
        assert_eq!(trim_to_word_boundary("hello wonderful world", 12), "hello");
        assert_eq!(trim_to_word_boundary("hello wonderful world", 15), "hello wonderful");
        assert_eq!(trim_to_word_boundary("abcdefghij", 4), "abcd");
    }
}
