//! Page store: one Markdown file per page under a wiki root.
//!
//! ## Directory Structure
//!
//! ```text
//! wiki/                        # Wiki root
//! ├── wiki.toml                # Configuration (optional)
//! ├── index.yaml               # Persisted index (optional)
//! ├── home.md                  # slug: home
//! ├── guide/
//! │   ├── intro.md             # slug: guide/intro
//! │   └── setup/
//! │       └── linux.md         # slug: guide/setup/linux
//! ├── templates/               # Skipped unless include_templates is set
//! │   └── note.md
//! └── .drafts/                 # Hidden entries are always skipped
//! ```
//!
//! A page's slug comes from its frontmatter. The file layout only matters
//! when writing (`<root>/<slug>.md`) and when a single-page export falls
//! back to matching by file location. Frontmatter slugs are normalized on
//! load, so every slug that leaves the store has passed the traversal
//! check.

use crate::cancel::{CancelToken, Canceled};
use crate::page::{PageError, load_page, save_page};
use crate::slug::{SlugError, normalize_slug};
use crate::types::Page;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Directory name skipped during listing unless templates are requested.
pub const TEMPLATES_DIR: &str = "templates";

const PAGE_EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot walk wiki root {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("{path}: {source}")]
    InvalidSlug { path: PathBuf, source: SlugError },
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("page file already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Canceled(#[from] Canceled),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// Also read pages inside `templates/` directories.
    pub include_templates: bool,
}

/// Read every page file under `root`, in file-name order.
///
/// `cancel` is checked between files; a canceled listing returns
/// [`StoreError::Canceled`] and no pages.
pub fn list_pages(
    root: &Path,
    opts: &ListOptions,
    cancel: &CancelToken,
) -> Result<Vec<Page>, StoreError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| keep_entry(e, opts));

    let mut pages = Vec::new();
    for entry in walker {
        cancel.check()?;
        let entry = entry.map_err(|source| StoreError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !is_page_file(&entry) {
            continue;
        }
        let mut page = load_page(entry.path())?;
        if !page.slug.is_empty() {
            page.slug = normalize_slug(&page.slug).map_err(|source| StoreError::InvalidSlug {
                path: entry.path().to_path_buf(),
                source,
            })?;
        }
        debug!(path = %entry.path().display(), slug = %page.slug, "loaded page");
        pages.push(page);
    }

    info!(root = %root.display(), count = pages.len(), "listed pages");
    Ok(pages)
}

fn keep_entry(entry: &DirEntry, opts: &ListOptions) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return false;
    }
    !(entry.file_type().is_dir() && name == TEMPLATES_DIR && !opts.include_templates)
}

fn is_page_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .path()
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(PAGE_EXTENSION))
}

/// The file a page with `slug` lives in: `<root>/<slug>.md`.
pub fn page_path(root: &Path, slug: &str) -> Result<PathBuf, SlugError> {
    let slug = normalize_slug(slug)?;
    let mut path = root.to_path_buf();
    let mut segments = slug.split('/').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{segment}.{PAGE_EXTENSION}"));
        }
    }
    Ok(path)
}

/// Write a new page file. Refuses to overwrite an existing one.
pub fn create_page(root: &Path, page: &Page) -> Result<PathBuf, StoreError> {
    let path = page_path(root, &page.slug)?;
    if path.exists() {
        return Err(StoreError::AlreadyExists(path));
    }
    save_page(&path, page)?;
    info!(path = %path.display(), "created page");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn lists_nested_pages_in_name_order() {
        let tmp = TempDir::new().unwrap();
        write_page_file(tmp.path(), "zeta.md", "Zeta", "zeta");
        write_page_file(tmp.path(), "guide/intro.md", "Intro", "guide/intro");
        write_page_file(tmp.path(), "alpha.md", "Alpha", "alpha");

        let pages = list_pages(tmp.path(), &ListOptions::default(), &CancelToken::new()).unwrap();
        assert_eq!(page_slugs(&pages), vec!["alpha", "guide/intro", "zeta"]);
        assert!(pages.iter().all(|p| p.file_path.is_some()));
    }

    #[test]
    fn skips_templates_unless_requested() {
        let tmp = TempDir::new().unwrap();
        write_page_file(tmp.path(), "home.md", "Home", "home");
        write_page_file(tmp.path(), "templates/note.md", "Note", "templates/note");

        let pages = list_pages(tmp.path(), &ListOptions::default(), &CancelToken::new()).unwrap();
        assert_eq!(page_slugs(&pages), vec!["home"]);

        let opts = ListOptions {
            include_templates: true,
        };
        let pages = list_pages(tmp.path(), &opts, &CancelToken::new()).unwrap();
        assert_eq!(page_slugs(&pages), vec!["home", "templates/note"]);
    }

    #[test]
    fn skips_hidden_and_non_markdown() {
        let tmp = TempDir::new().unwrap();
        write_page_file(tmp.path(), "home.md", "Home", "home");
        write_page_file(tmp.path(), ".trash/old.md", "Old", "old");
        fs::write(tmp.path().join("index.yaml"), "sections: []").unwrap();
        fs::write(tmp.path().join("notes.txt"), "plain").unwrap();

        let pages = list_pages(tmp.path(), &ListOptions::default(), &CancelToken::new()).unwrap();
        assert_eq!(page_slugs(&pages), vec!["home"]);
    }

    #[test]
    fn frontmatter_slugs_are_normalized() {
        let tmp = TempDir::new().unwrap();
        write_page_file(tmp.path(), "intro.md", "Intro", r"guide\intro");

        let pages = list_pages(tmp.path(), &ListOptions::default(), &CancelToken::new()).unwrap();
        assert_eq!(pages[0].slug, "guide/intro");
    }

    #[test]
    fn traversal_slug_is_rejected_with_path() {
        let tmp = TempDir::new().unwrap();
        write_page_file(tmp.path(), "evil.md", "Evil", "../outside");

        let err = list_pages(tmp.path(), &ListOptions::default(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSlug { .. }));
        assert!(err.to_string().contains("evil.md"));
    }

    #[test]
    fn parse_error_surfaces() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.md"), "no frontmatter").unwrap();
        let err = list_pages(tmp.path(), &ListOptions::default(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, StoreError::Page(_)));
    }

    #[test]
    fn canceled_listing_returns_canceled() {
        let tmp = TempDir::new().unwrap();
        write_page_file(tmp.path(), "home.md", "Home", "home");
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = list_pages(tmp.path(), &ListOptions::default(), &cancel).unwrap_err();
        assert!(matches!(err, StoreError::Canceled(_)));
    }

    #[test]
    fn missing_root_is_walk_error() {
        let tmp = TempDir::new().unwrap();
        let err = list_pages(
            &tmp.path().join("missing"),
            &ListOptions::default(),
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Walk { .. }));
    }

    #[test]
    fn page_path_nests_by_slug() {
        let root = Path::new("/wiki");
        assert_eq!(
            page_path(root, "guide/v1.2").unwrap(),
            root.join("guide").join("v1.2.md")
        );
        assert!(page_path(root, "../x").is_err());
    }

    #[test]
    fn create_page_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let page = page("Home", "home");
        let path = create_page(tmp.path(), &page).unwrap();
        assert_eq!(path, tmp.path().join("home.md"));
        assert!(matches!(
            create_page(tmp.path(), &page),
            Err(StoreError::AlreadyExists(_))
        ));
    }
}
