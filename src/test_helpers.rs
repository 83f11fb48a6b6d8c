//! Shared test utilities for the simple-wiki test suite.
//!
//! Provides page builders, panicking lookups, bulk extractors, and index
//! shape assertions over the engine's plain data types.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let pages = vec![
//!     page("Home", "home"),
//!     page_with("Intro", "guide/intro", |p| p.order = 1),
//! ];
//! let index = generate_index(&pages).unwrap();
//!
//! assert_index_shape(&index, &[
//!     ("", "General", &["home"]),
//!     ("guide", "Guide", &["intro"]),
//! ]);
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::index::Index;
use crate::types::{ManifestEntry, Page};

// =========================================================================
// Builders
// =========================================================================

/// A published page with the given title and slug and a one-line body.
pub fn page(title: &str, slug: &str) -> Page {
    let mut page = Page::new(title, slug);
    page.content = format!("Body of {title}.");
    page
}

/// Like [`page`], then hand the page to `edit` for extra fields.
pub fn page_with(title: &str, slug: &str, edit: impl FnOnce(&mut Page)) -> Page {
    let mut page = page(title, slug);
    edit(&mut page);
    page
}

pub fn entry(slug: &str, title: &str) -> ManifestEntry {
    ManifestEntry {
        title: title.to_string(),
        slug: slug.to_string(),
        order: 0,
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a minimal page file at `root/rel_path`, creating directories.
pub fn write_page_file(root: &Path, rel_path: &str, title: &str, slug: &str) -> PathBuf {
    let path = root.join(rel_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(
        &path,
        format!("---\ntitle: {title}\nslug: {slug}\n---\nBody of {title}.\n"),
    )
    .unwrap();
    path
}

/// A temp wiki holding `pages`, each stored at `<slug>.md`.
pub fn setup_wiki(pages: &[Page]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for page in pages {
        crate::store::create_page(tmp.path(), page).unwrap();
    }
    tmp
}

// =========================================================================
// Lookups (panic with a clear message on miss)
// =========================================================================

/// Find a page by slug. Panics if not found.
pub fn find_page<'a>(pages: &'a [Page], slug: &str) -> &'a Page {
    pages.iter().find(|p| p.slug == slug).unwrap_or_else(|| {
        let slugs = page_slugs(pages);
        panic!("page '{slug}' not found. Available: {slugs:?}")
    })
}

// =========================================================================
// Bulk extractors
// =========================================================================

pub fn page_slugs(pages: &[Page]) -> Vec<&str> {
    pages.iter().map(|p| p.slug.as_str()).collect()
}

pub fn entry_slugs(entries: &[ManifestEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.slug.as_str()).collect()
}

// =========================================================================
// Index helpers
// =========================================================================

/// Assert that an index has exactly the expected sections, in order.
///
/// Each entry is `(slug, title, relative page slugs)`.
///
/// ```rust
/// assert_index_shape(&index, &[
///     ("", "General", &["home"]),
///     ("guide", "Guide", &["intro", "draft"]),
/// ]);
/// ```
pub fn assert_index_shape(index: &Index, expected: &[(&str, &str, &[&str])]) {
    let actual: Vec<(&str, &str)> = index
        .sections
        .iter()
        .map(|s| (s.slug.as_str(), s.title.as_str()))
        .collect();
    let wanted: Vec<(&str, &str)> = expected.iter().map(|(s, t, _)| (*s, *t)).collect();
    assert_eq!(actual, wanted, "index sections mismatch");

    for (section, (slug, _, pages)) in index.sections.iter().zip(expected) {
        assert_eq!(
            section.pages,
            pages.to_vec(),
            "pages of section '{slug}' mismatch"
        );
    }
}
