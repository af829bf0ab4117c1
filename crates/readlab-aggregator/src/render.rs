//! Markdown digest rendering

use crate::merge::{compare_groups, sort_items, DigestItem, GroupBy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

/// Options controlling the digest layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestOptions {
    /// Top-level heading
    pub title: String,

    /// Date shown next to the heading; rendering never reads the clock
    pub date: Option<String>,

    /// Grouping applied by `aggregate_store`
    pub group_by: GroupBy,
}

impl Default for DigestOptions {
    fn default() -> Self {
        Self {
            title: "Weekly Digest".to_string(),
            date: None,
            group_by: GroupBy::PrimaryTag,
        }
    }
}

impl DigestOptions {
    /// Set the date shown in the heading
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

const MAX_LIST_ITEMS: usize = 3;
const MAX_LIMITATIONS: usize = 2;
const MAX_QUOTES: usize = 2;
const MAX_AUTHORS: usize = 3;

/// Render items with default options
pub fn render_digest(items: &[DigestItem]) -> String {
    render_digest_with(items, &DigestOptions::default())
}

/// Render items as a Markdown digest
///
/// Items are re-sorted first, so any permutation of the same items renders
/// byte-identical output.
pub fn render_digest_with(items: &[DigestItem], options: &DigestOptions) -> String {
    let mut out = String::new();
    match &options.date {
        Some(date) => {
            let _ = writeln!(out, "# {} ({})", options.title, date);
        }
        None => {
            let _ = writeln!(out, "# {}", options.title);
        }
    }
    out.push('\n');

    if items.is_empty() {
        out.push_str("> No summaries available.\n");
        return out;
    }

    let mut sorted = items.to_vec();
    sort_items(&mut sorted);
    let groups = group(&sorted);
    let anchors = anchors_for(groups.iter().map(|(name, _)| *name));

    let _ = writeln!(
        out,
        "**Summary**: {} papers across {} categories\n",
        sorted.len(),
        groups.len()
    );
    out.push_str("---\n\n");

    out.push_str("## Table of Contents\n\n");
    for ((name, members), anchor) in groups.iter().zip(&anchors) {
        let _ = writeln!(out, "- [{}](#{}) ({} papers)", name, anchor, members.len());
    }
    out.push('\n');

    for ((name, members), anchor) in groups.iter().zip(&anchors) {
        let _ = writeln!(out, "## {} {{#{}}}\n", name, anchor);
        for item in members {
            render_item(&mut out, item);
        }
    }

    out.push_str("---\n");
    let _ = writeln!(
        out,
        "*Total: {} papers in {} categories*",
        sorted.len(),
        groups.len()
    );
    out
}

fn group(sorted: &[DigestItem]) -> Vec<(&str, Vec<&DigestItem>)> {
    let mut groups: Vec<(&str, Vec<&DigestItem>)> = Vec::new();
    for item in sorted {
        match groups.last_mut() {
            Some((name, members)) if compare_groups(name, &item.group).is_eq() => members.push(item),
            _ => groups.push((item.group.as_str(), vec![item])),
        }
    }
    groups
}

fn render_item(out: &mut String, item: &DigestItem) {
    let summary = &item.summary;

    let title = if summary.title.trim().is_empty() {
        "Untitled"
    } else {
        summary.title.trim()
    };
    let mut header = format!("### {}", title);
    if !summary.authors.is_empty() {
        let shown: Vec<&str> = summary.authors.iter().take(MAX_AUTHORS).map(String::as_str).collect();
        let _ = write!(header, " *by {}", shown.join(", "));
        if summary.authors.len() > MAX_AUTHORS {
            header.push_str(" et al.");
        }
        header.push('*');
    }
    if let Some(year) = summary.year {
        let _ = write!(header, " ({})", year);
    }
    if let Some(venue) = summary.venue.as_deref().filter(|v| !v.trim().is_empty()) {
        let _ = write!(header, ", {}", venue.trim());
    }
    let _ = writeln!(out, "{}\n", header);

    let tl_dr = if summary.tl_dr.trim().is_empty() {
        "No summary available"
    } else {
        summary.tl_dr.trim()
    };
    let _ = writeln!(out, "**TL;DR**: {}\n", tl_dr);

    push_field(out, "Contributions", &summary.contributions, MAX_LIST_ITEMS);
    push_field(out, "Methods", &summary.methods, MAX_LIST_ITEMS);
    push_field(out, "Results", &summary.results, MAX_LIST_ITEMS);
    push_field(out, "Limitations", &summary.limitations, MAX_LIMITATIONS);

    if !summary.quotes.is_empty() {
        out.push_str("**Key Quotes**:\n");
        for quote in summary.quotes.iter().take(MAX_QUOTES) {
            let _ = writeln!(out, "- \"{}\"", quote);
        }
    }

    if !summary.tags.is_empty() {
        let tags: Vec<String> = summary.tags.iter().map(|t| format!("`{}`", t)).collect();
        let _ = writeln!(out, "**Tags**: {}", tags.join(", "));
    }

    let _ = writeln!(out, "\n**Source**: `{}`\n", display_source(&summary.source_path));
    out.push_str("---\n\n");
}

fn push_field(out: &mut String, label: &str, items: &[String], max: usize) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "**{}**: {}", label, format_list_items(items, max));
}

/// Absolute paths are shortened to their file name
fn display_source(source_path: &str) -> &str {
    let path = Path::new(source_path);
    if path.is_absolute() {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            return name;
        }
    }
    source_path
}

/// Join up to `max` items with `; `, noting how many were left out
pub fn format_list_items(items: &[String], max: usize) -> String {
    let mut shown: Vec<String> = items.iter().take(max).cloned().collect();
    if items.len() > max {
        shown.push(format!("... and {} more", items.len() - max));
    }
    shown.join("; ")
}

/// Markdown anchor for a heading
///
/// Lower-cases, drops punctuation, and turns whitespace and hyphen runs into
/// single hyphens. Falls back to `section` when nothing is left.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// One unique anchor per group, in order
fn anchors_for<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut used: HashSet<String> = HashSet::new();
    let mut anchors = Vec::new();
    for name in names {
        let base = slugify(name);
        let mut anchor = base.clone();
        let mut n = 1;
        while used.contains(&anchor) {
            anchor = format!("{}-{}", base, n);
            n += 1;
        }
        used.insert(anchor.clone());
        anchors.push(anchor);
    }
    anchors
}
