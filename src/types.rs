//! Shared types used across the engine.
//!
//! These are the plain values handed between the store, the index and
//! manifest builders, and the export/CLI layers. All of them are built fresh
//! per command; nothing here is cached across calls.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Publication status of a page.
///
/// Only `published` pages make it into manifests built from an index or a
/// page list. Drafts and archived pages must still exist when an index
/// references them; they are just skipped during flattening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    #[default]
    Published,
    Archived,
}

impl Status {
    /// Whether pages with this status belong in an exported manifest.
    pub fn is_publishable(self) -> bool {
        self == Status::Published
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
            Status::Archived => "archived",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Status::Draft),
            "published" => Ok(Status::Published),
            "archived" => Ok(Status::Archived),
            other => Err(format!(
                "unknown status {other:?} (expected draft, published or archived)"
            )),
        }
    }
}

/// A single Markdown page with its frontmatter fields.
///
/// Serializes to exactly the frontmatter block: `content` and `file_path`
/// never reach YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub title: String,
    /// Root-relative slug, e.g. `guide/intro`. Empty means "not indexed".
    pub slug: String,
    /// Free-text section label, independent of the slug's section segment.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub section: String,
    /// Explicit ordering within a section; 0 = unordered (sorts last).
    #[serde(skip_serializing_if = "is_zero")]
    pub order: i64,
    #[serde(
        deserialize_with = "deserialize_tags",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub tags: BTreeSet<String>,
    pub status: Status,
    #[serde(skip)]
    pub content: String,
    /// Where the page was loaded from. Set by the store only.
    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

impl Page {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            ..Self::default()
        }
    }

    /// Replace the tag set, normalizing each tag.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
    }

    /// The structural section key: the slug segment before the first `/`.
    pub fn section_key(&self) -> &str {
        crate::slug::split_section_slug(&self.slug).0
    }
}

/// A flattened, render-ready reference to a page.
///
/// Produced by the manifest builders; the merger only rewrites `slug` when
/// applying a root prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub title: String,
    pub slug: String,
    pub order: i64,
}

impl ManifestEntry {
    pub(crate) fn from_page(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            slug: page.slug.clone(),
            order: page.order,
        }
    }
}

/// The manifest of one page root, tagged with the prefix used when merging
/// several roots into one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootManifest {
    pub root: PathBuf,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    pub entries: Vec<ManifestEntry>,
}

/// Lowercase and trim tags, dropping empties. Duplicates collapse.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Split a comma-separated tag string (`"rust, CLI"`) into normalized tags.
pub fn parse_tag_list(raw: &str) -> BTreeSet<String> {
    normalize_tags(raw.split(','))
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Tags may be written as a YAML list or as one comma-separated string.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTags {
        List(Vec<String>),
        Joined(String),
        Empty(()),
    }

    Ok(match RawTags::deserialize(deserializer)? {
        RawTags::List(list) => normalize_tags(list),
        RawTags::Joined(joined) => parse_tag_list(&joined),
        RawTags::Empty(()) => BTreeSet::new(),
    })
}
