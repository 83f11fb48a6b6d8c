//! Section lookup and section-link resolution.
//!
//! ## Lookup precedence
//!
//! [`find_section`] resolves a user-supplied key against an [`Index`]:
//!
//! 1. `""` names the root section (the one with an empty slug). A
//!    whitespace-only key is not empty.
//! 2. Case-insensitive exact match on section slugs.
//! 3. The key run through [`normalize_slug`] and matched on slugs again
//!    (so `Guide/` or `./guide` still find `guide`).
//! 4. Case-insensitive match on section titles, only if exactly one
//!    section carries that title.
//!
//! A slug match always wins over a title match on a different section.
//!
//! ## Links
//!
//! Sections declare `depends_on` and `related_to` links to other sections.
//! [`resolve_linked_sections`] follows them one level deep: links of linked
//! sections are not followed. A dangling link is an error, never a skip.

use crate::index::{Index, IndexSection, SectionLinks};
use crate::slug::normalize_slug;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The kind of a declared section link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    DependsOn,
    RelatedTo,
}

impl LinkType {
    pub const ALL: [LinkType; 2] = [LinkType::DependsOn, LinkType::RelatedTo];

    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::DependsOn => "depends_on",
            LinkType::RelatedTo => "related_to",
        }
    }

    /// The link targets of this type declared on `links`.
    pub fn targets(self, links: &SectionLinks) -> &[String] {
        match self {
            LinkType::DependsOn => &links.depends_on,
            LinkType::RelatedTo => &links.related_to,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "depends_on" => Ok(LinkType::DependsOn),
            "related_to" => Ok(LinkType::RelatedTo),
            other => Err(format!(
                "unknown link type {other:?} (expected depends_on or related_to)"
            )),
        }
    }
}

/// The link being followed when a lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub section: String,
    pub link_type: LinkType,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("section not found: {key:?}{}", link_suffix(.link))]
    NotFound { key: String, link: Option<LinkRef> },
    #[error("ambiguous section {key:?}: matches {candidates:?}{}", link_suffix(.link))]
    Ambiguous {
        key: String,
        candidates: Vec<String>,
        link: Option<LinkRef>,
    },
}

impl SectionError {
    fn not_found(key: &str) -> Self {
        SectionError::NotFound {
            key: key.to_string(),
            link: None,
        }
    }

    fn ambiguous(key: &str, matches: &[&IndexSection]) -> Self {
        SectionError::Ambiguous {
            key: key.to_string(),
            candidates: matches.iter().map(|s| describe(s)).collect(),
            link: None,
        }
    }

    fn via(self, section: &IndexSection, link_type: LinkType) -> Self {
        let link = Some(LinkRef {
            section: describe(section),
            link_type,
        });
        match self {
            SectionError::NotFound { key, .. } => SectionError::NotFound { key, link },
            SectionError::Ambiguous {
                key, candidates, ..
            } => SectionError::Ambiguous {
                key,
                candidates,
                link,
            },
        }
    }
}

fn link_suffix(link: &Option<LinkRef>) -> String {
    match link {
        Some(l) => format!(" ({} link from {:?})", l.link_type, l.section),
        None => String::new(),
    }
}

/// Human-facing name of a section for error messages.
fn describe(section: &IndexSection) -> String {
    if section.slug.is_empty() {
        format!("{} (root)", section.title)
    } else {
        section.slug.clone()
    }
}

fn eq_fold(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Find a section by key. See the module docs for precedence.
pub fn find_section<'a>(index: &'a Index, key: &str) -> Result<&'a IndexSection, SectionError> {
    if key.is_empty() {
        let roots: Vec<&IndexSection> = index.sections.iter().filter(|s| s.is_root()).collect();
        return match roots.as_slice() {
            [] => Err(SectionError::not_found(key)),
            [root] => Ok(*root),
            many => Err(SectionError::ambiguous(key, many)),
        };
    }

    let by_slug = |wanted: &str| {
        index
            .sections
            .iter()
            .find(|s| !s.is_root() && eq_fold(&s.slug, wanted))
    };

    if let Some(section) = by_slug(key) {
        return Ok(section);
    }
    if let Ok(normalized) = normalize_slug(key)
        && let Some(section) = by_slug(&normalized)
    {
        return Ok(section);
    }

    let by_title: Vec<&IndexSection> = index
        .sections
        .iter()
        .filter(|s| eq_fold(&s.title, key))
        .collect();
    match by_title.as_slice() {
        [] => Err(SectionError::not_found(key)),
        [section] => Ok(*section),
        many => Err(SectionError::ambiguous(key, many)),
    }
}

/// Resolve the sections linked from `section`, one level deep.
///
/// An empty `link_types` means all link types. The result keeps link-type
/// order, then declaration order, skipping sections already collected.
pub fn resolve_linked_sections<'a>(
    index: &'a Index,
    section: &IndexSection,
    link_types: &[LinkType],
) -> Result<Vec<&'a IndexSection>, SectionError> {
    let link_types = if link_types.is_empty() {
        &LinkType::ALL[..]
    } else {
        link_types
    };

    let mut seen = Vec::new();
    let mut linked = Vec::new();
    for &link_type in link_types {
        for target in link_type.targets(&section.links) {
            let found =
                find_section(index, target).map_err(|e| e.via(section, link_type))?;
            let key = found.resolution_key();
            if !seen.contains(&key) {
                seen.push(key);
                linked.push(found);
            }
        }
    }
    Ok(linked)
}

/// A section followed by its linked sections, without repeats.
///
/// This is the section list a "section plus linked sections" export
/// flattens.
pub fn section_with_links<'a>(
    index: &'a Index,
    key: &str,
    link_types: &[LinkType],
) -> Result<Vec<&'a IndexSection>, SectionError> {
    let section = find_section(index, key)?;
    let mut sections = vec![section];
    for linked in resolve_linked_sections(index, section, link_types)? {
        if linked.resolution_key() != section.resolution_key() {
            sections.push(linked);
        }
    }
    Ok(sections)
}
