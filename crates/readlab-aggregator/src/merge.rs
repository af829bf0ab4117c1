//! Deduplicate, group and order summaries

use chrono::{DateTime, Datelike, Utc};
use readlab_domain::Summary;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Group used for summaries without a usable tag
pub const DEFAULT_GROUP: &str = "General";

const UNDATED_GROUP: &str = "Undated";

/// How summaries are grouped in the digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// First non-blank tag, `General` when none
    #[default]
    PrimaryTag,
    /// `YYYY-MM` of `generated_at` (UTC)
    Month,
    /// ISO week `YYYY-Www` of `generated_at` (UTC)
    Week,
}

impl GroupBy {
    /// Name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::PrimaryTag => "primary_tag",
            GroupBy::Month => "month",
            GroupBy::Week => "week",
        }
    }

    fn key_for(&self, summary: &Summary) -> String {
        match self {
            GroupBy::PrimaryTag => summary.primary_tag().unwrap_or(DEFAULT_GROUP).to_string(),
            GroupBy::Month => timestamp_key(summary.generated_at, |dt| dt.format("%Y-%m").to_string()),
            GroupBy::Week => timestamp_key(summary.generated_at, |dt| {
                let week = dt.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary_tag" | "tag" => Ok(GroupBy::PrimaryTag),
            "month" => Ok(GroupBy::Month),
            "week" => Ok(GroupBy::Week),
            other => Err(format!("unknown grouping '{}' (expected primary_tag, month or week)", other)),
        }
    }
}

fn timestamp_key<F>(millis: u64, format: F) -> String
where
    F: Fn(&DateTime<Utc>) -> String,
{
    if millis == 0 {
        return UNDATED_GROUP.to_string();
    }
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| format(&dt))
        .unwrap_or_else(|| UNDATED_GROUP.to_string())
}

/// A summary placed in the digest
#[derive(Debug, Clone, PartialEq)]
pub struct DigestItem {
    /// Group (section) key
    pub group: String,

    /// Stable order within the group: lower-cased title, then source path
    pub sort_key: (String, String),

    /// The summary itself
    pub summary: Summary,
}

impl DigestItem {
    fn new(group: String, summary: Summary) -> Self {
        let sort_key = (summary.title.to_lowercase(), summary.source_path.clone());
        Self {
            group,
            sort_key,
            summary,
        }
    }
}

/// Merge summaries grouped by primary tag
pub fn merge_summaries<I>(summaries: I) -> Vec<DigestItem>
where
    I: IntoIterator<Item = Summary>,
{
    merge_summaries_by(summaries, GroupBy::PrimaryTag)
}

/// Merge summaries with the given grouping
///
/// Keeps one summary per `source_path`: the newest `generated_at` wins and
/// equal timestamps fall back to comparing the serialized records, so the
/// result never depends on input order. Items come back sorted by group
/// (case-insensitive) and then by `sort_key`.
pub fn merge_summaries_by<I>(summaries: I, group_by: GroupBy) -> Vec<DigestItem>
where
    I: IntoIterator<Item = Summary>,
{
    let mut latest: HashMap<String, Summary> = HashMap::new();
    for summary in summaries {
        match latest.get(&summary.source_path) {
            Some(existing) if !supersedes(&summary, existing) => {}
            _ => {
                latest.insert(summary.source_path.clone(), summary);
            }
        }
    }

    let mut items: Vec<DigestItem> = latest
        .into_values()
        .map(|summary| DigestItem::new(group_by.key_for(&summary), summary))
        .collect();
    sort_items(&mut items);
    items
}

/// Whether `candidate` should replace `existing` for the same source path
fn supersedes(candidate: &Summary, existing: &Summary) -> bool {
    match candidate.generated_at.cmp(&existing.generated_at) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => canonical(candidate) > canonical(existing),
    }
}

pub(crate) fn canonical(summary: &Summary) -> String {
    serde_json::to_string(summary).unwrap_or_default()
}

pub(crate) fn compare_groups(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

pub(crate) fn sort_items(items: &mut [DigestItem]) {
    items.sort_by(|a, b| {
        compare_groups(&a.group, &b.group)
            .then_with(|| a.sort_key.cmp(&b.sort_key))
            .then_with(|| canonical(&a.summary).cmp(&canonical(&b.summary)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(source: &str, title: &str, tags: &[&str], generated_at: u64) -> Summary {
        let mut s = Summary::new(source);
        s.title = title.to_string();
        s.tl_dr = format!("About {}.", title);
        s.tags = tags.iter().map(|t| t.to_string()).collect();
        s.generated_at = generated_at;
        s
    }

    #[test]
    fn test_newer_duplicate_wins() {
        let old = summary("p1.pdf", "Old", &["AI"], 1);
        let new = summary("p1.pdf", "New", &["AI"], 2);

        for input in [vec![old.clone(), new.clone()], vec![new.clone(), old.clone()]] {
            let items = merge_summaries(input);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].summary.title, "New");
        }
    }

    #[test]
    fn test_equal_timestamps_break_ties_deterministically() {
        let a = summary("p1.pdf", "Alpha", &[], 5);
        let b = summary("p1.pdf", "Beta", &[], 5);

        let one = merge_summaries(vec![a.clone(), b.clone()]);
        let two = merge_summaries(vec![b, a]);
        assert_eq!(one, two);
    }

    #[test]
    fn test_grouping_and_ordering() {
        let items = merge_summaries(vec![
            summary("c.pdf", "zeta", &["nlp"], 1),
            summary("a.pdf", "Beta", &["Vision"], 1),
            summary("b.pdf", "alpha", &["NLP"], 1),
            summary("d.pdf", "Gamma", &[], 1),
        ]);

        let order: Vec<(&str, &str)> = items
            .iter()
            .map(|i| (i.group.as_str(), i.summary.title.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("General", "Gamma"), ("NLP", "alpha"), ("nlp", "zeta"), ("Vision", "Beta")]
        );
    }

    #[test]
    fn test_same_title_ordered_by_source_path() {
        let items = merge_summaries(vec![
            summary("b.pdf", "Same", &["X"], 1),
            summary("a.pdf", "same", &["X"], 1),
        ]);
        assert_eq!(items[0].summary.source_path, "a.pdf");
    }

    #[test]
    fn test_group_by_month_and_week() {
        // 2024-01-03T00:00:00Z
        let ts = 1_704_240_000_000;
        let dated = summary("a.pdf", "A", &[], ts);
        let undated = summary("b.pdf", "B", &[], 0);

        let months = merge_summaries_by(vec![dated.clone(), undated.clone()], GroupBy::Month);
        let groups: Vec<&str> = months.iter().map(|i| i.group.as_str()).collect();
        assert_eq!(groups, vec!["2024-01", "Undated"]);

        let weeks = merge_summaries_by(vec![dated], GroupBy::Week);
        assert_eq!(weeks[0].group, "2024-W01");
    }

    #[test]
    fn test_group_by_parsing() {
        assert_eq!("month".parse::<GroupBy>().unwrap(), GroupBy::Month);
        assert_eq!("PRIMARY_TAG".parse::<GroupBy>().unwrap(), GroupBy::PrimaryTag);
        assert!("year".parse::<GroupBy>().is_err());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = vec![
            summary("a.pdf", "A", &["X"], 1),
            summary("a.pdf", "A2", &["X"], 2),
            summary("b.pdf", "B", &["Y"], 3),
        ];
        let once = merge_summaries(input);
        let twice = merge_summaries(once.iter().map(|i| i.summary.clone()));
        assert_eq!(once, twice);
    }
}
