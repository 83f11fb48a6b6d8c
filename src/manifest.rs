//! Manifest building: flattening an index (or a bare page list) into the
//! ordered list of pages an export renders.
//!
//! ## Scopes
//!
//! | Function | Scope |
//! |----------|-------|
//! | [`build_manifest`] | every section of an index, in index order |
//! | [`build_manifest_from_pages`] | all pages, alphabetical (no index available) |
//! | [`build_page_manifest`] | one page by slug |
//! | [`build_section_manifest`] | one section of an index |
//! | [`build_manifest_for_sections`] | an ordered list of sections, de-duplicated |
//!
//! ## Status filtering
//!
//! Flattening drops `draft` and `archived` pages silently, but only after
//! the lookup: an index entry without a page is always
//! [`ManifestError::PageNotFound`], because it means the index and the page
//! store disagree. A direct single-page request for an unpublished page is
//! an error too, rather than an empty manifest.
//!
//! ## Indexed vs generated
//!
//! [`IndexSource`] records once per command whether the index came from
//! disk or was generated from the pages. Whole-root manifests follow the
//! index order in the first case and the alphabetical page order in the
//! second; section-scoped builds use the contained index either way.

use crate::cancel::{CancelToken, Canceled};
use crate::filter::{FilterError, validate_unique_slugs};
use crate::generate::{GenerateError, generate_index_cancelable};
use crate::index::{Index, IndexError, IndexSection, load_index};
use crate::section::{SectionError, find_section};
use crate::slug::{SlugError, normalize_slug, slug_from_path};
use crate::types::{ManifestEntry, Page, Status};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("page not found: {slug:?}{}", section_suffix(.section))]
    PageNotFound {
        slug: String,
        section: Option<String>,
    },
    #[error("page {slug:?} is {status} and cannot be exported")]
    NotPublished { slug: String, status: Status },
    #[error(transparent)]
    Section(#[from] SectionError),
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Canceled(#[from] Canceled),
}

fn section_suffix(section: &Option<String>) -> String {
    match section {
        Some(s) if s.is_empty() => " (listed in the root section)".to_string(),
        Some(s) => format!(" (listed in section {s:?})"),
        None => String::new(),
    }
}

/// Flatten every section of `index`, in index order.
pub fn build_manifest(index: &Index, pages: &[Page]) -> Result<Vec<ManifestEntry>, ManifestError> {
    validate_unique_slugs(pages)?;
    flatten(&index.sections.iter().collect::<Vec<_>>(), pages, false)
}

/// Flatten a page list without an index: published pages with a slug,
/// sorted by case-insensitive title (then slug).
pub fn build_manifest_from_pages(pages: &[Page]) -> Vec<ManifestEntry> {
    let mut kept: Vec<&Page> = pages
        .iter()
        .filter(|p| !p.slug.is_empty() && p.status.is_publishable())
        .collect();
    kept.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.slug.cmp(&b.slug))
    });
    kept.into_iter().map(ManifestEntry::from_page).collect()
}

/// A one-entry manifest for the page named `slug`.
///
/// The slug is normalized first, then matched against each page's own
/// slug or, failing that, the slug implied by its file location under
/// `root`.
pub fn build_page_manifest(
    root: &Path,
    pages: &[Page],
    slug: &str,
) -> Result<Vec<ManifestEntry>, ManifestError> {
    let slug = normalize_slug(slug)?;
    let page = pages
        .iter()
        .find(|p| p.slug == slug)
        .or_else(|| {
            pages.iter().find(|p| {
                p.file_path
                    .as_deref()
                    .and_then(|path| slug_from_path(root, path).ok())
                    .is_some_and(|derived| derived == slug)
            })
        })
        .ok_or_else(|| ManifestError::PageNotFound {
            slug: slug.clone(),
            section: None,
        })?;

    if !page.status.is_publishable() {
        return Err(ManifestError::NotPublished {
            slug,
            status: page.status,
        });
    }
    let mut entry = ManifestEntry::from_page(page);
    if entry.slug.is_empty() {
        entry.slug = slug;
    }
    Ok(vec![entry])
}

/// Flatten the single section `key` resolves to.
pub fn build_section_manifest(
    index: &Index,
    pages: &[Page],
    key: &str,
) -> Result<Vec<ManifestEntry>, ManifestError> {
    validate_unique_slugs(pages)?;
    let section = find_section(index, key)?;
    flatten(&[section], pages, false)
}

/// Flatten `sections` in the given order; a page reachable from several
/// sections appears once, at its first position.
pub fn build_manifest_for_sections(
    sections: &[&IndexSection],
    pages: &[Page],
) -> Result<Vec<ManifestEntry>, ManifestError> {
    validate_unique_slugs(pages)?;
    flatten(sections, pages, true)
}

fn flatten(
    sections: &[&IndexSection],
    pages: &[Page],
    dedupe: bool,
) -> Result<Vec<ManifestEntry>, ManifestError> {
    let by_slug: HashMap<&str, &Page> = pages
        .iter()
        .filter(|p| !p.slug.is_empty())
        .map(|p| (p.slug.as_str(), p))
        .collect();

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for section in sections {
        for slug in section.list_pages() {
            let page = by_slug
                .get(slug.as_str())
                .ok_or_else(|| ManifestError::PageNotFound {
                    slug: slug.clone(),
                    section: Some(section.slug.clone()),
                })?;
            if !page.status.is_publishable() {
                debug!(slug = %slug, status = %page.status, "skipping unpublished page");
                continue;
            }
            if dedupe && !seen.insert(slug.clone()) {
                continue;
            }
            entries.push(ManifestEntry::from_page(page));
        }
    }
    Ok(entries)
}

/// Where the index of a command came from, decided once per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    /// Loaded from the persisted index file.
    Indexed(Index),
    /// Generated from the page list because no index file exists.
    Generated(Index),
}

impl IndexSource {
    /// Load the index at `index_path`, or generate one from `pages` when
    /// the file does not exist. Any other load failure is returned.
    pub fn load_or_generate(
        index_path: &Path,
        pages: &[Page],
        cancel: &CancelToken,
    ) -> Result<Self, ManifestError> {
        match load_index(index_path) {
            Ok(index) => {
                debug!(path = %index_path.display(), "loaded persisted index");
                Ok(IndexSource::Indexed(index))
            }
            Err(IndexError::NotFound(_)) => {
                info!(path = %index_path.display(), "no index file, generating from pages");
                Ok(IndexSource::Generated(generate_index_cancelable(
                    pages, cancel,
                )?))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn index(&self) -> &Index {
        match self {
            IndexSource::Indexed(index) | IndexSource::Generated(index) => index,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, IndexSource::Generated(_))
    }

    /// The whole-root manifest for this source.
    pub fn manifest(&self, pages: &[Page]) -> Result<Vec<ManifestEntry>, ManifestError> {
        match self {
            IndexSource::Indexed(index) => build_manifest(index, pages),
            IndexSource::Generated(_) => {
                validate_unique_slugs(pages)?;
                Ok(build_manifest_from_pages(pages))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate_index;
    use crate::index::save_index;
    use crate::test_helpers::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn scenario_pages() -> Vec<Page> {
        vec![
            page("Home", "home"),
            page_with("Intro", "guide/intro", |p| {
                p.section = "Guide".into();
                p.order = 1;
            }),
            page_with("Draft", "guide/draft", |p| {
                p.section = "Guide".into();
                p.order = 2;
                p.status = Status::Draft;
            }),
        ]
    }

    fn linked_index() -> Index {
        let mut root = IndexSection::new("General", "");
        root.pages = vec!["home".into()];
        let mut guide = IndexSection::new("Guide", "guide");
        guide.pages = vec!["intro".into(), "draft".into()];
        guide.links.depends_on = vec!["ref".into()];
        let mut reference = IndexSection::new("Reference", "ref");
        reference.pages = vec!["api".into(), "old".into()];
        Index::new(vec![root, guide, reference])
    }

    fn linked_pages() -> Vec<Page> {
        let mut pages = scenario_pages();
        pages.push(page("API", "ref/api"));
        pages.push(page_with("Old", "ref/old", |p| p.status = Status::Archived));
        pages
    }

    // =========================================================================
    // build_manifest
    // =========================================================================

    #[test]
    fn scenario_manifest_skips_draft() {
        let pages = scenario_pages();
        let index = generate_index(&pages).unwrap();
        let entries = build_manifest(&index, &pages).unwrap();
        assert_eq!(entry_slugs(&entries), vec!["home", "guide/intro"]);
        assert_eq!(entries[1].title, "Intro");
        assert_eq!(entries[1].order, 1);
    }

    #[test]
    fn manifest_follows_index_order() {
        let pages = linked_pages();
        let mut index = linked_index();
        index.sections.reverse();
        let entries = build_manifest(&index, &pages).unwrap();
        assert_eq!(entry_slugs(&entries), vec!["ref/api", "guide/intro", "home"]);
    }

    #[test]
    fn manifest_never_contains_unpublished_pages() {
        let pages = linked_pages();
        let entries = build_manifest(&linked_index(), &pages).unwrap();
        for entry in &entries {
            let page = find_page(&pages, &entry.slug);
            assert_eq!(page.status, Status::Published);
        }
    }

    #[test]
    fn missing_page_is_page_not_found() {
        let pages: Vec<Page> = scenario_pages()
            .into_iter()
            .filter(|p| p.slug != "guide/draft")
            .collect();
        let index = generate_index(&scenario_pages()).unwrap();
        let err = build_manifest(&index, &pages).unwrap_err();
        match err {
            ManifestError::PageNotFound { slug, section } => {
                assert_eq!(slug, "guide/draft");
                assert_eq!(section.as_deref(), Some("guide"));
            }
            other => panic!("expected PageNotFound, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_slugs_fail_before_flattening() {
        let mut pages = scenario_pages();
        pages.push(page("Home again", "home"));
        let index = generate_index(&scenario_pages()).unwrap();
        assert!(matches!(
            build_manifest(&index, &pages),
            Err(ManifestError::Filter(FilterError::DuplicateSlug(_)))
        ));
    }

    // =========================================================================
    // build_manifest_from_pages
    // =========================================================================

    #[test]
    fn from_pages_sorts_by_title_and_filters() {
        let pages = vec![
            page("zeta", "z"),
            page("Alpha", "a"),
            page("Loose", ""),
            page_with("Beta", "b", |p| p.status = Status::Draft),
            page_with("Gamma", "g", |p| p.status = Status::Archived),
        ];
        let entries = build_manifest_from_pages(&pages);
        assert_eq!(entry_slugs(&entries), vec!["a", "z"]);
    }

    // =========================================================================
    // build_page_manifest
    // =========================================================================

    #[test]
    fn page_manifest_by_slug() {
        let entries =
            build_page_manifest(Path::new("/wiki"), &scenario_pages(), "guide//intro").unwrap();
        assert_eq!(entry_slugs(&entries), vec!["guide/intro"]);
    }

    #[test]
    fn page_manifest_by_file_path() {
        let mut loose = page("Loose", "");
        loose.file_path = Some(PathBuf::from("/wiki/notes/loose.md"));
        let entries = build_page_manifest(Path::new("/wiki"), &[loose], "notes/loose").unwrap();
        assert_eq!(entry_slugs(&entries), vec!["notes/loose"]);
        assert_eq!(entries[0].title, "Loose");
    }

    #[test]
    fn page_manifest_rejects_draft() {
        let err =
            build_page_manifest(Path::new("/wiki"), &scenario_pages(), "guide/draft").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::NotPublished {
                status: Status::Draft,
                ..
            }
        ));
        assert!(err.to_string().contains("draft"));
    }

    #[test]
    fn page_manifest_missing_page() {
        let err = build_page_manifest(Path::new("/wiki"), &scenario_pages(), "nope").unwrap_err();
        assert!(matches!(err, ManifestError::PageNotFound { section: None, .. }));
    }

    #[test]
    fn page_manifest_rejects_traversal() {
        let err =
            build_page_manifest(Path::new("/wiki"), &scenario_pages(), "../etc/passwd").unwrap_err();
        assert!(matches!(err, ManifestError::Slug(_)));
    }

    // =========================================================================
    // Section scopes
    // =========================================================================

    #[test]
    fn section_manifest_flattens_one_section() {
        let entries = build_section_manifest(&linked_index(), &linked_pages(), "Guide").unwrap();
        assert_eq!(entry_slugs(&entries), vec!["guide/intro"]);
    }

    #[test]
    fn section_manifest_unknown_section() {
        let err = build_section_manifest(&linked_index(), &linked_pages(), "nope").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Section(SectionError::NotFound { .. })
        ));
    }

    #[test]
    fn sections_manifest_dedupes_first_wins() {
        let index = linked_index();
        let mut overlap = IndexSection::new("Overlap", "");
        overlap.pages = vec!["guide/intro".into(), "home".into()];
        let sections = vec![&index.sections[1], &overlap, &index.sections[2]];
        let entries = build_manifest_for_sections(&sections, &linked_pages()).unwrap();
        assert_eq!(entry_slugs(&entries), vec!["guide/intro", "home", "ref/api"]);
    }

    #[test]
    fn sections_manifest_with_links() {
        let index = linked_index();
        let sections = crate::section::section_with_links(&index, "guide", &[]).unwrap();
        let entries = build_manifest_for_sections(&sections, &linked_pages()).unwrap();
        assert_eq!(entry_slugs(&entries), vec!["guide/intro", "ref/api"]);
    }

    // =========================================================================
    // IndexSource
    // =========================================================================

    #[test]
    fn index_source_generates_when_missing() {
        let tmp = TempDir::new().unwrap();
        let pages = linked_pages();
        let source =
            IndexSource::load_or_generate(&tmp.path().join("index.yaml"), &pages, &CancelToken::new())
                .unwrap();
        assert!(source.is_generated());
        // Generated sources flatten alphabetically.
        let entries = source.manifest(&pages).unwrap();
        assert_eq!(entry_slugs(&entries), vec!["ref/api", "home", "guide/intro"]);
    }

    #[test]
    fn index_source_uses_persisted_index() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.yaml");
        save_index(&path, &linked_index()).unwrap();

        let pages = linked_pages();
        let source = IndexSource::load_or_generate(&path, &pages, &CancelToken::new()).unwrap();
        assert!(!source.is_generated());
        assert_eq!(source.index(), &linked_index());
        let entries = source.manifest(&pages).unwrap();
        assert_eq!(entry_slugs(&entries), vec!["home", "guide/intro", "ref/api"]);
    }

    #[test]
    fn index_source_propagates_broken_index() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.yaml");
        std::fs::write(&path, "sections: [unclosed").unwrap();
        let result = IndexSource::load_or_generate(&path, &[], &CancelToken::new());
        assert!(matches!(result, Err(ManifestError::Index(IndexError::Yaml { .. }))));
    }
}
