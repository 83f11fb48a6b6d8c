//! The persisted navigation index of one page root.
//!
//! The index is a YAML document listing sections in their authoritative
//! render order. Each section stores page slugs *relative* to its own slug:
//!
//! ```yaml
//! index_version: 1
//! sections:
//! - title: General
//!   slug: ''
//!   pages:
//!   - home
//! - title: Guide
//!   slug: guide
//!   links:
//!     depends_on:
//!     - reference
//!   pages:
//!   - intro
//!   - setup/linux
//! ```
//!
//! Section order is never re-sorted on load; only a missing or non-positive
//! `index_version` is normalized (to 1) on both load and save.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Index format version written by this crate.
pub const INDEX_VERSION: i64 = 1;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("no index file at {0}")]
    NotFound(PathBuf),
    #[error("IO error on index {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid index YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Index {
    pub index_version: i64,
    pub sections: Vec<IndexSection>,
}

impl Index {
    pub fn new(sections: Vec<IndexSection>) -> Self {
        Self {
            index_version: INDEX_VERSION,
            sections,
        }
    }

    /// Fully qualified slugs of every page referenced, in index order.
    pub fn all_page_slugs(&self) -> Vec<String> {
        self.sections.iter().flat_map(|s| s.list_pages()).collect()
    }

    fn normalize_version(&mut self) {
        if self.index_version <= 0 {
            self.index_version = INDEX_VERSION;
        }
    }
}

/// A named group of pages. An empty `slug` is the implicit root group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    pub title: String,
    pub slug: String,
    pub order: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "SectionLinks::is_empty")]
    pub links: SectionLinks,
    /// Page slugs relative to `slug`.
    pub pages: Vec<String>,
}

impl IndexSection {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.slug.is_empty()
    }

    /// Fully qualified page slugs, in index order.
    pub fn list_pages(&self) -> Vec<String> {
        if self.is_root() {
            self.pages.clone()
        } else {
            self.pages
                .iter()
                .map(|p| format!("{}/{}", self.slug, p))
                .collect()
        }
    }

    /// Key used to de-duplicate sections: the slug, or the lowercased title
    /// for the root section.
    pub fn resolution_key(&self) -> String {
        if self.slug.is_empty() {
            self.title.to_lowercase()
        } else {
            self.slug.clone()
        }
    }
}

/// Declared section-to-section relationships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionLinks {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_to: Vec<String>,
}

impl SectionLinks {
    pub fn is_empty(&self) -> bool {
        self.depends_on.is_empty() && self.related_to.is_empty()
    }
}

/// Parse index YAML text.
pub fn parse_index(text: &str) -> Result<Index, serde_yaml::Error> {
    let mut index: Index = if text.trim().is_empty() {
        Index::default()
    } else {
        serde_yaml::from_str(text)?
    };
    index.normalize_version();
    Ok(index)
}

/// Serialize an index to YAML text. Deterministic for equal indexes.
pub fn render_index(index: &Index) -> Result<String, serde_yaml::Error> {
    let mut index = index.clone();
    index.normalize_version();
    serde_yaml::to_string(&index)
}

/// Load the index file at `path`.
///
/// A missing file is [`IndexError::NotFound`], which callers treat as the
/// signal to generate an index from the pages instead.
pub fn load_index(path: &Path) -> Result<Index, IndexError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(IndexError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(IndexError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    parse_index(&text).map_err(|source| IndexError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the index file at `path`, creating parent directories.
pub fn save_index(path: &Path, index: &Index) -> Result<(), IndexError> {
    let yaml = render_index(index).map_err(|source| IndexError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, yaml).map_err(io_err)
}
