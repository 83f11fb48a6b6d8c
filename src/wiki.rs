//! The wiki façade: one root directory, its config, and the operations the
//! CLI runs against it.
//!
//! Every call rebuilds what it needs from disk. There is no cached page
//! list or index between calls, so the façade is safe to use from a
//! long-running process that edits pages in between.
//!
//! ## Export pipeline
//!
//! ```text
//! pages ─┬─ IndexSource (persisted | generated)
//!        └─ ExportScope ──► root manifest ──┐
//! [[roots]] (All scope only) ──► manifests ─┴─► validate ► flatten ► filter ► render
//! ```

use crate::cancel::{CancelToken, Canceled};
use crate::config::{ConfigError, WikiConfig, load_config};
use crate::export::{ExportError, ExportFormat, export};
use crate::filter::{FilterError, FilterOptions, filter_manifest, validate_unique_slugs};
use crate::generate::{GenerateError, generate_index_cancelable};
use crate::index::{IndexError, save_index};
use crate::manifest::{
    IndexSource, ManifestError, build_manifest_for_sections, build_page_manifest,
    build_section_manifest,
};
use crate::merge::{MergeError, apply_prefix, flatten_manifests, validate_manifests};
use crate::section::{LinkType, SectionError, find_section, section_with_links};
use crate::slug::slug_from_path;
use crate::store::{ListOptions, StoreError, create_page, list_pages};
use crate::types::{ManifestEntry, Page, RootManifest};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum WikiError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Section(#[from] SectionError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Canceled(#[from] Canceled),
    #[error("index file already exists: {} (use --force to overwrite)", .0.display())]
    IndexExists(PathBuf),
    #[error("in root {}: {source}", .root.display())]
    InRoot {
        root: PathBuf,
        #[source]
        source: Box<WikiError>,
    },
}

/// Which part of a root an export covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportScope {
    #[default]
    All,
    Page(String),
    Section {
        key: String,
        /// Also export the sections this one links to.
        with_links: bool,
        /// Link types to follow; empty means the configured default.
        link_types: Vec<LinkType>,
    },
}

/// Entries in export order plus the pages behind them.
///
/// Each page carries the final, prefixed slug of the entry it was resolved
/// for. Pages no entry points at (drafts, unlisted pages) are left out.
#[derive(Debug, Clone, Default)]
pub struct ExportSet {
    pub entries: Vec<ManifestEntry>,
    pub pages: Vec<Page>,
}

/// Result of [`Wiki::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub pages: usize,
    pub sections: usize,
    /// The index was generated because no index file exists.
    pub generated: bool,
    /// Problems that make exports fail.
    pub problems: Vec<String>,
    /// Pages with a slug that no index section lists.
    pub unindexed: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Wiki {
    root: PathBuf,
    config: WikiConfig,
}

impl Wiki {
    /// Open the wiki at `root`, reading `wiki.toml` if present.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, WikiError> {
        let root = root.into();
        let config = load_config(&root)?;
        Ok(Self { root, config })
    }

    pub fn with_config(root: impl Into<PathBuf>, config: WikiConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    pub fn index_path(&self) -> PathBuf {
        self.config.index_path(&self.root)
    }

    pub fn pages(&self, cancel: &CancelToken) -> Result<Vec<Page>, WikiError> {
        let opts = ListOptions {
            include_templates: self.config.include_templates,
        };
        Ok(list_pages(&self.root, &opts, cancel)?)
    }

    /// The persisted index, or one generated from `pages`.
    pub fn index_source(
        &self,
        pages: &[Page],
        cancel: &CancelToken,
    ) -> Result<IndexSource, WikiError> {
        Ok(IndexSource::load_or_generate(
            &self.index_path(),
            pages,
            cancel,
        )?)
    }

    /// Generate an index from `pages` and persist it.
    ///
    /// An existing index file is only replaced when `force` is set.
    pub fn write_index(
        &self,
        pages: &[Page],
        force: bool,
        cancel: &CancelToken,
    ) -> Result<PathBuf, WikiError> {
        let path = self.index_path();
        if path.exists() && !force {
            return Err(WikiError::IndexExists(path));
        }
        let index = generate_index_cancelable(pages, cancel)?;
        save_index(&path, &index)?;
        info!(path = %path.display(), sections = index.sections.len(), "wrote index");
        Ok(path)
    }

    /// The manifest of this root for `scope`, without filtering or merging.
    pub fn manifest(
        &self,
        scope: &ExportScope,
        pages: &[Page],
        cancel: &CancelToken,
    ) -> Result<Vec<ManifestEntry>, WikiError> {
        let entries = match scope {
            ExportScope::All => self.index_source(pages, cancel)?.manifest(pages)?,
            ExportScope::Page(slug) => build_page_manifest(&self.root, pages, slug)?,
            ExportScope::Section {
                key,
                with_links,
                link_types,
            } => {
                let source = self.index_source(pages, cancel)?;
                let index = source.index();
                if *with_links {
                    let link_types = if link_types.is_empty() {
                        self.config.export.link_types()
                    } else {
                        link_types.clone()
                    };
                    let sections = section_with_links(index, key, &link_types)?;
                    debug!(key = %key, sections = sections.len(), "section export with links");
                    build_manifest_for_sections(&sections, pages)?
                } else {
                    build_section_manifest(index, pages, key)?
                }
            }
        };
        Ok(entries)
    }

    /// Per-root manifests: this root first, then each configured extra
    /// root. Extra roots only take part in whole-root exports.
    pub fn root_manifests(
        &self,
        scope: &ExportScope,
        cancel: &CancelToken,
    ) -> Result<Vec<RootManifest>, WikiError> {
        Ok(self
            .collect_roots(scope, cancel)?
            .into_iter()
            .map(|(manifest, _)| manifest)
            .collect())
    }

    /// Validate and flatten the manifests of every root, then filter.
    pub fn export_set(
        &self,
        scope: &ExportScope,
        filter: &FilterOptions,
        cancel: &CancelToken,
    ) -> Result<ExportSet, WikiError> {
        let collected = self.collect_roots(scope, cancel)?;

        let mut pages = Vec::new();
        let mut taken = HashSet::new();
        for (manifest, root_pages) in &collected {
            for page in entry_pages(manifest, root_pages) {
                if taken.insert(page.slug.clone()) {
                    pages.push(page);
                }
            }
        }
        let manifests: Vec<RootManifest> = collected.into_iter().map(|(m, _)| m).collect();

        validate_manifests(&manifests)?;
        let entries = flatten_manifests(&manifests);
        let entries = filter_manifest(entries, &pages, filter)?;
        Ok(ExportSet { entries, pages })
    }

    /// Render an export in `format`, titled with the configured title
    /// unless `title` is given.
    pub fn export(
        &self,
        scope: &ExportScope,
        filter: &FilterOptions,
        format: ExportFormat,
        title: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<String, WikiError> {
        let set = self.export_set(scope, filter, cancel)?;
        let title = title.unwrap_or(&self.config.title);
        info!(entries = set.entries.len(), format = %format, "exporting");
        Ok(export(format, title, &set.entries, &set.pages, cancel)?)
    }

    pub fn create_page(&self, page: &Page) -> Result<PathBuf, WikiError> {
        Ok(create_page(&self.root, page)?)
    }

    /// Check the root for problems that would make exports fail.
    pub fn check(&self, cancel: &CancelToken) -> Result<CheckReport, WikiError> {
        let pages = self.pages(cancel)?;
        let mut report = CheckReport {
            pages: pages.len(),
            ..CheckReport::default()
        };

        if let Err(e) = validate_unique_slugs(&pages) {
            report.problems.push(e.to_string());
            return Ok(report);
        }

        let source = self.index_source(&pages, cancel)?;
        let index = source.index();
        report.generated = source.is_generated();
        report.sections = index.sections.len();

        let known: HashSet<&str> = pages
            .iter()
            .filter(|p| !p.slug.is_empty())
            .map(|p| p.slug.as_str())
            .collect();
        let mut listed = HashSet::new();
        for section in &index.sections {
            cancel.check()?;
            for slug in section.list_pages() {
                if !known.contains(slug.as_str()) {
                    report.problems.push(format!(
                        "section {:?} lists missing page {slug:?}",
                        section.resolution_key()
                    ));
                }
                listed.insert(slug);
            }
            for link_type in LinkType::ALL {
                for target in link_type.targets(&section.links) {
                    if let Err(e) = find_section(index, target) {
                        report.problems.push(format!(
                            "section {:?} {link_type} link: {e}",
                            section.resolution_key()
                        ));
                    }
                }
            }
        }

        report.unindexed = known
            .iter()
            .filter(|slug| !listed.contains(**slug))
            .map(|slug| slug.to_string())
            .collect();
        report.unindexed.sort();

        if !self.config.roots.is_empty() {
            match self.root_manifests(&ExportScope::All, cancel) {
                Ok(manifests) => {
                    if let Err(e) = validate_manifests(&manifests) {
                        report.problems.push(e.to_string());
                    }
                }
                Err(WikiError::Canceled(c)) => return Err(c.into()),
                Err(e) => report.problems.push(e.to_string()),
            }
        }

        if !report.is_ok() {
            warn!(problems = report.problems.len(), "check found problems");
        }
        Ok(report)
    }

    fn collect_roots(
        &self,
        scope: &ExportScope,
        cancel: &CancelToken,
    ) -> Result<Vec<(RootManifest, Vec<Page>)>, WikiError> {
        let pages = self.pages(cancel)?;
        let entries = self.manifest(scope, &pages, cancel)?;
        let mut collected = vec![(
            RootManifest {
                root: self.root.clone(),
                prefix: String::new(),
                entries,
            },
            pages,
        )];

        if *scope != ExportScope::All {
            return Ok(collected);
        }

        for extra in &self.config.roots {
            cancel.check()?;
            let path = self.root.join(&extra.path);
            let in_root = |source: WikiError| WikiError::InRoot {
                root: path.clone(),
                source: Box::new(source),
            };
            let wiki = Wiki::open(&path).map_err(in_root)?;
            let pages = wiki.pages(cancel).map_err(in_root)?;
            let entries = wiki
                .manifest(&ExportScope::All, &pages, cancel)
                .map_err(in_root)?;
            debug!(root = %path.display(), entries = entries.len(), "collected extra root");
            collected.push((
                RootManifest {
                    root: path.clone(),
                    prefix: extra.prefix.clone(),
                    entries,
                },
                pages,
            ));
        }
        Ok(collected)
    }
}

/// The pages `manifest`'s entries refer to, renamed to the entries' final
/// slugs. A page without a frontmatter slug is matched by its file path.
fn entry_pages(manifest: &RootManifest, pages: &[Page]) -> Vec<Page> {
    manifest
        .entries
        .iter()
        .filter_map(|entry| {
            let page = pages.iter().find(|p| p.slug == entry.slug).or_else(|| {
                pages.iter().find(|p| {
                    p.slug.is_empty()
                        && p.file_path
                            .as_deref()
                            .and_then(|path| slug_from_path(&manifest.root, path).ok())
                            .is_some_and(|derived| derived == entry.slug)
                })
            })?;
            let mut page = page.clone();
            page.slug = apply_prefix(&manifest.prefix, &entry.slug);
            Some(page)
        })
        .collect()
}
