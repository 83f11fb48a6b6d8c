//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! The primary display for every entity (section, page, manifest entry) is
//! its semantic identity: positional index and title. Slugs follow an arrow,
//! and secondary facts (section label, tags, status, source file) go on
//! indented context lines.
//!
//! # Output Format
//!
//! ## Index
//!
//! ```text
//! Index (generated)
//! 001 General
//!     001 Home → home
//! 002 Guide (guide)
//!     depends_on: basics
//!     001 Intro → guide/intro
//!     002 Draft → guide/draft [draft]
//! ```
//!
//! ## Manifest
//!
//! ```text
//! 001 Home → home
//! 002 Intro → guide/intro
//!
//! 2 pages
//! ```
//!
//! ## Pages
//!
//! ```text
//! 001 Intro → guide/intro
//!     Section: Guide
//!     Tags: rust, setup
//!     Source: guide/intro.md
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::index::Index;
use crate::section::LinkType;
use crate::types::{ManifestEntry, Page};
use crate::wiki::CheckReport;
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Positional index, title, and slug.
///
/// ```text
/// 001 Intro → guide/intro
/// 002 (untitled) → notes/x
/// ```
fn entity_line(index: usize, title: &str, slug: &str) -> String {
    let title = if title.trim().is_empty() {
        "(untitled)"
    } else {
        title
    };
    format!("{} {} → {}", format_index(index), title, slug)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_text(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Index
// ============================================================================

/// Format an index as a section tree.
///
/// Page titles come from `pages`; an index entry without a page is shown
/// with a `[missing]` marker instead of failing.
pub fn format_index_tree(index: &Index, generated: bool, pages: &[Page]) -> Vec<String> {
    let by_slug: HashMap<&str, &Page> = pages.iter().map(|p| (p.slug.as_str(), p)).collect();
    let mut lines = vec![if generated {
        "Index (generated)".to_string()
    } else {
        "Index".to_string()
    }];

    for (i, section) in index.sections.iter().enumerate() {
        let header = if section.is_root() {
            format!("{} {}", format_index(i + 1), section.title)
        } else {
            format!("{} {} ({})", format_index(i + 1), section.title, section.slug)
        };
        lines.push(header);

        if !section.tags.is_empty() {
            lines.push(format!("{}tags: {}", indent(1), section.tags.join(", ")));
        }
        for link_type in LinkType::ALL {
            let targets = link_type.targets(&section.links);
            if !targets.is_empty() {
                lines.push(format!("{}{}: {}", indent(1), link_type, targets.join(", ")));
            }
        }

        for (j, slug) in section.list_pages().iter().enumerate() {
            let line = match by_slug.get(slug.as_str()) {
                Some(page) if page.status.is_publishable() => {
                    entity_line(j + 1, &page.title, slug)
                }
                Some(page) => format!(
                    "{} [{}]",
                    entity_line(j + 1, &page.title, slug),
                    page.status
                ),
                None => format!("{} {} [missing]", format_index(j + 1), slug),
            };
            lines.push(format!("{}{}", indent(1), line));
        }
    }
    lines
}

pub fn print_index_tree(index: &Index, generated: bool, pages: &[Page]) {
    for line in format_index_tree(index, generated, pages) {
        println!("{}", line);
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// Format manifest entries in export order, with a count footer.
pub fn format_manifest(entries: &[ManifestEntry]) -> Vec<String> {
    let mut lines: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| entity_line(i + 1, &e.title, &e.slug))
        .collect();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(plural(entries.len(), "page", "pages"));
    lines
}

pub fn print_manifest(entries: &[ManifestEntry]) {
    for line in format_manifest(entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Format a page listing with context lines.
///
/// `root` is stripped from source paths when possible.
pub fn format_pages(pages: &[Page], root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        lines.push(entity_line(i + 1, &page.title, &page.slug));
        if !page.section.is_empty() {
            lines.push(format!("{}Section: {}", indent(1), page.section));
        }
        if !page.tags.is_empty() {
            let tags: Vec<&str> = page.tags.iter().map(String::as_str).collect();
            lines.push(format!("{}Tags: {}", indent(1), tags.join(", ")));
        }
        if !page.status.is_publishable() {
            lines.push(format!("{}Status: {}", indent(1), page.status));
        }
        if let Some(path) = &page.file_path {
            let shown = path.strip_prefix(root).unwrap_or(path);
            lines.push(format!("{}Source: {}", indent(1), shown.display()));
        }
    }
    if pages.is_empty() {
        lines.push("No pages".to_string());
    }
    lines
}

pub fn print_pages(pages: &[Page], root: &Path) {
    for line in format_pages(pages, root) {
        println!("{}", line);
    }
}

/// Format search hits: each page with the first body line containing a
/// query term, truncated.
pub fn format_search_results(pages: &[Page], query: &str) -> Vec<String> {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    let mut lines = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        lines.push(entity_line(i + 1, &page.title, &page.slug));
        let snippet = page.content.lines().map(str::trim).find(|line| {
            let lower = line.to_lowercase();
            terms.iter().any(|t| lower.contains(t.as_str()))
        });
        if let Some(snippet) = snippet {
            lines.push(format!("{}{}", indent(1), truncate_text(snippet, 60)));
        }
    }
    lines.push(String::new());
    lines.push(format!("{} for {:?}", plural(pages.len(), "match", "matches"), query));
    lines
}

pub fn print_search_results(pages: &[Page], query: &str) {
    for line in format_search_results(pages, query) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check(report: &CheckReport) -> Vec<String> {
    let source = if report.generated {
        "generated index"
    } else {
        "index file"
    };
    let mut lines = vec![format!(
        "{}, {} ({})",
        plural(report.pages, "page", "pages"),
        plural(report.sections, "section", "sections"),
        source
    )];

    if !report.unindexed.is_empty() {
        lines.push(String::new());
        lines.push("Unindexed pages".to_string());
        for slug in &report.unindexed {
            lines.push(format!("{}{}", indent(1), slug));
        }
    }

    lines.push(String::new());
    if report.problems.is_empty() {
        lines.push("No problems found".to_string());
    } else {
        lines.push("Problems".to_string());
        for problem in &report.problems {
            lines.push(format!("{}{}", indent(1), problem));
        }
    }
    lines
}

pub fn print_check(report: &CheckReport) {
    for line in format_check(report) {
        println!("{}", line);
    }
}
