//! Page and manifest filtering.
//!
//! A [`FilterOptions`] combines up to four predicates, all of which must
//! hold for a page to match:
//!
//! | Field     | Match rule |
//! |-----------|------------|
//! | `title`   | substring of the title |
//! | `section` | equals the section label, or the slug's section segment |
//! | `tags`    | any (default) or all of the given tags |
//! | `query`   | every whitespace-separated term occurs somewhere in the page |
//!
//! An empty filter is a strict no-op: the input comes back as-is, in the
//! same order.

use crate::types::{ManifestEntry, Page, normalize_tags};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("duplicate slug: {0}")]
    DuplicateSlug(String),
    #[error("manifest entry {0} has no matching page")]
    PageNotFound(String),
}

/// How multiple filter tags combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagMode {
    #[default]
    Any,
    All,
}

impl FromStr for TagMode {
    type Err = std::convert::Infallible;

    /// `"all"` (any case) selects [`TagMode::All`]; every other value is
    /// [`TagMode::Any`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.trim().eq_ignore_ascii_case("all") {
            TagMode::All
        } else {
            TagMode::Any
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub title: String,
    pub section: String,
    pub tags: Vec<String>,
    pub tag_mode: TagMode,
    pub query: String,
    /// Case-insensitive title matching and looser section matching.
    pub ignore_case: bool,
}

impl FilterOptions {
    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.section.is_empty()
            && normalize_tags(&self.tags).is_empty()
            && self.query.trim().is_empty()
    }

    /// Whether a single page satisfies every set predicate.
    pub fn matches(&self, page: &Page) -> bool {
        self.matches_title(page)
            && self.matches_section(page)
            && self.matches_tags(page)
            && self.matches_query(page)
    }

    fn matches_title(&self, page: &Page) -> bool {
        if self.title.is_empty() {
            return true;
        }
        if self.ignore_case {
            page.title
                .to_lowercase()
                .contains(&self.title.to_lowercase())
        } else {
            page.title.contains(&self.title)
        }
    }

    fn matches_section(&self, page: &Page) -> bool {
        let wanted = self.section.trim();
        if wanted.is_empty() {
            return true;
        }
        let wanted_lower = wanted.to_lowercase();
        let label = page.section.to_lowercase();
        if label == wanted_lower {
            return true;
        }
        let key = page.section_key();
        if self.ignore_case {
            key.to_lowercase() == wanted_lower || label.contains(&wanted_lower)
        } else {
            key == wanted
        }
    }

    fn matches_tags(&self, page: &Page) -> bool {
        let wanted = normalize_tags(&self.tags);
        if wanted.is_empty() {
            return true;
        }
        match self.tag_mode {
            TagMode::All => wanted.iter().all(|t| page.tags.contains(t)),
            TagMode::Any => wanted.iter().any(|t| page.tags.contains(t)),
        }
    }

    fn matches_query(&self, page: &Page) -> bool {
        let terms: Vec<String> = self
            .query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if terms.is_empty() {
            return true;
        }
        let haystack = searchable_text(page);
        terms.iter().all(|term| haystack.contains(term.as_str()))
    }
}

/// Lowercased concatenation of every searchable page field.
fn searchable_text(page: &Page) -> String {
    let tags = page.tags.iter().cloned().collect::<Vec<_>>().join(" ");
    [
        page.title.as_str(),
        page.section.as_str(),
        tags.as_str(),
        page.content.as_str(),
        page.slug.as_str(),
    ]
    .join("\n")
    .to_lowercase()
}

/// Keep the pages matching `opts`, preserving order.
pub fn filter_pages(pages: Vec<Page>, opts: &FilterOptions) -> Vec<Page> {
    if opts.is_empty() {
        return pages;
    }
    pages.into_iter().filter(|p| opts.matches(p)).collect()
}

/// Keep the manifest entries whose pages match `opts`, preserving order.
///
/// Each entry is evaluated against the page with the same slug; an entry
/// without a page is an error, since manifests are only ever built from
/// the same page set.
pub fn filter_manifest(
    entries: Vec<ManifestEntry>,
    pages: &[Page],
    opts: &FilterOptions,
) -> Result<Vec<ManifestEntry>, FilterError> {
    if opts.is_empty() {
        return Ok(entries);
    }
    let by_slug: HashMap<&str, &Page> = pages
        .iter()
        .filter(|p| !p.slug.is_empty())
        .map(|p| (p.slug.as_str(), p))
        .collect();

    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries {
        let page = by_slug
            .get(entry.slug.as_str())
            .ok_or_else(|| FilterError::PageNotFound(entry.slug.clone()))?;
        if opts.matches(page) {
            kept.push(entry);
        }
    }
    Ok(kept)
}

/// Fail on the first non-empty slug that appears twice.
pub fn validate_unique_slugs(pages: &[Page]) -> Result<(), FilterError> {
    let mut seen = HashSet::new();
    for page in pages.iter().filter(|p| !p.slug.is_empty()) {
        if !seen.insert(page.slug.as_str()) {
            return Err(FilterError::DuplicateSlug(page.slug.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn sample_pages() -> Vec<Page> {
        vec![
            page_with("Rust Basics", "guide/rust", |p| {
                p.section = "Guide".into();
                p.set_tags(["rust", "beginner"]);
                p.content = "Ownership and borrowing.".into();
            }),
            page_with("Shell Tricks", "notes/shell", |p| {
                p.section = "Field Notes".into();
                p.set_tags(["shell"]);
                p.content = "Pipes everywhere.".into();
            }),
            page_with("Advanced Rust", "guide/advanced", |p| {
                p.section = "Guide".into();
                p.set_tags(["rust"]);
                p.content = "Lifetimes in depth.".into();
            }),
        ]
    }

    #[test]
    fn empty_filter_returns_input_unchanged() {
        let pages = sample_pages();
        let filtered = filter_pages(pages.clone(), &FilterOptions::default());
        assert_eq!(filtered, pages);
    }

    #[test]
    fn empty_filter_on_manifest_skips_lookup() {
        let entries = vec![entry("ghost", "Ghost")];
        let kept = filter_manifest(entries.clone(), &[], &FilterOptions::default()).unwrap();
        assert_eq!(kept, entries);
    }

    #[test]
    fn title_substring_is_case_sensitive_by_default() {
        let opts = FilterOptions {
            title: "rust".into(),
            ..Default::default()
        };
        assert!(filter_pages(sample_pages(), &opts).is_empty());

        let opts = FilterOptions {
            title: "Rust".into(),
            ..Default::default()
        };
        assert_eq!(page_slugs(&filter_pages(sample_pages(), &opts)), vec![
            "guide/rust",
            "guide/advanced"
        ]);
    }

    #[test]
    fn title_ignore_case() {
        let opts = FilterOptions {
            title: "rust".into(),
            ignore_case: true,
            ..Default::default()
        };
        assert_eq!(filter_pages(sample_pages(), &opts).len(), 2);
    }

    #[test]
    fn section_matches_label_case_insensitively() {
        let opts = FilterOptions {
            section: "guide".into(),
            ..Default::default()
        };
        assert_eq!(filter_pages(sample_pages(), &opts).len(), 2);
    }

    #[test]
    fn section_label_folds_non_ascii_case() {
        let pages = vec![page_with("Lieder", "musik/lieder", |p| p.section = "Über".into())];
        let opts = FilterOptions {
            section: "über".into(),
            ..Default::default()
        };
        assert_eq!(page_slugs(&filter_pages(pages, &opts)), vec!["musik/lieder"]);
    }

    #[test]
    fn section_matches_structural_slug() {
        let opts = FilterOptions {
            section: "notes".into(),
            ..Default::default()
        };
        assert_eq!(page_slugs(&filter_pages(sample_pages(), &opts)), vec![
            "notes/shell"
        ]);
    }

    #[test]
    fn section_substring_only_when_ignoring_case() {
        let opts = FilterOptions {
            section: "field".into(),
            ..Default::default()
        };
        assert!(filter_pages(sample_pages(), &opts).is_empty());

        let opts = FilterOptions {
            section: "field".into(),
            ignore_case: true,
            ..Default::default()
        };
        assert_eq!(filter_pages(sample_pages(), &opts).len(), 1);
    }

    #[test]
    fn tags_any_mode() {
        let opts = FilterOptions {
            tags: vec!["Shell".into(), "beginner".into()],
            ..Default::default()
        };
        assert_eq!(page_slugs(&filter_pages(sample_pages(), &opts)), vec![
            "guide/rust",
            "notes/shell"
        ]);
    }

    #[test]
    fn tags_all_mode() {
        let opts = FilterOptions {
            tags: vec![" rust ".into(), "beginner".into()],
            tag_mode: TagMode::All,
            ..Default::default()
        };
        assert_eq!(page_slugs(&filter_pages(sample_pages(), &opts)), vec![
            "guide/rust"
        ]);
    }

    #[test]
    fn tag_mode_parsing() {
        assert_eq!("ALL".parse::<TagMode>().unwrap(), TagMode::All);
        assert_eq!("any".parse::<TagMode>().unwrap(), TagMode::Any);
        assert_eq!("whatever".parse::<TagMode>().unwrap(), TagMode::Any);
    }

    #[test]
    fn query_requires_every_term() {
        let opts = FilterOptions {
            query: "RUST lifetimes".into(),
            ..Default::default()
        };
        assert_eq!(page_slugs(&filter_pages(sample_pages(), &opts)), vec![
            "guide/advanced"
        ]);
    }

    #[test]
    fn query_searches_tags_and_slug() {
        let opts = FilterOptions {
            query: "beginner".into(),
            ..Default::default()
        };
        assert_eq!(filter_pages(sample_pages(), &opts).len(), 1);

        let opts = FilterOptions {
            query: "notes/".into(),
            ..Default::default()
        };
        assert_eq!(filter_pages(sample_pages(), &opts).len(), 1);
    }

    #[test]
    fn predicates_combine_with_and() {
        let opts = FilterOptions {
            section: "Guide".into(),
            query: "ownership".into(),
            ..Default::default()
        };
        assert_eq!(page_slugs(&filter_pages(sample_pages(), &opts)), vec![
            "guide/rust"
        ]);
    }

    #[test]
    fn filter_manifest_uses_page_fields() {
        let pages = sample_pages();
        let entries = vec![
            entry("guide/advanced", "Advanced Rust"),
            entry("notes/shell", "Shell Tricks"),
        ];
        let opts = FilterOptions {
            tags: vec!["shell".into()],
            ..Default::default()
        };
        let kept = filter_manifest(entries, &pages, &opts).unwrap();
        assert_eq!(kept, vec![entry("notes/shell", "Shell Tricks")]);
    }

    #[test]
    fn filter_manifest_missing_page_is_error() {
        let opts = FilterOptions {
            query: "x".into(),
            ..Default::default()
        };
        let result = filter_manifest(vec![entry("ghost", "Ghost")], &sample_pages(), &opts);
        assert_eq!(result, Err(FilterError::PageNotFound("ghost".into())));
    }

    #[test]
    fn unique_slugs_pass() {
        assert!(validate_unique_slugs(&sample_pages()).is_ok());
    }

    #[test]
    fn duplicate_slug_is_error() {
        let pages = vec![page("A", "a"), page("B", "b"), page("A again", "a")];
        assert_eq!(
            validate_unique_slugs(&pages),
            Err(FilterError::DuplicateSlug("a".into()))
        );
    }

    #[test]
    fn empty_slugs_are_not_duplicates() {
        let pages = vec![page("A", ""), page("B", "")];
        assert!(validate_unique_slugs(&pages).is_ok());
    }
}
