//! Index generation from an unordered page collection.
//!
//! Used when a page root has no persisted index. Pages are grouped by the
//! first segment of their slug and ordered with explicit, total sort keys so
//! that two runs over the same pages (in any input order) render to
//! byte-identical YAML:
//!
//! ```text
//! Sections: root ("") first, then by lowercased title, then by slug.
//! Pages:    non-zero `order` before zero; ascending `order` when both set;
//!           otherwise lowercased title, then relative slug.
//! ```
//!
//! ## Section titles
//!
//! The first page (in sorted order) with a non-empty `section` label names
//! its section. Without one, the root section is `General` and other
//! sections derive a title from their key (`getting-started` →
//! `Getting Started`).

use crate::cancel::{CancelToken, Canceled};
use crate::filter::{FilterError, validate_unique_slugs};
use crate::index::{Index, IndexSection};
use crate::slug::{section_title_from_key, split_section_slug};
use crate::types::Page;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenerateError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Canceled(#[from] Canceled),
}

/// Build an index from `pages`.
pub fn generate_index(pages: &[Page]) -> Result<Index, GenerateError> {
    generate_index_cancelable(pages, &CancelToken::new())
}

/// Build an index from `pages`, checking `cancel` between pages.
pub fn generate_index_cancelable(
    pages: &[Page],
    cancel: &CancelToken,
) -> Result<Index, GenerateError> {
    validate_unique_slugs(pages)?;

    let mut groups: BTreeMap<&str, Vec<Member<'_>>> = BTreeMap::new();
    for page in pages {
        cancel.check()?;
        if page.slug.is_empty() {
            continue;
        }
        let (key, relative) = split_section_slug(&page.slug);
        groups.entry(key).or_default().push(Member { relative, page });
    }

    let mut sections: Vec<IndexSection> = groups
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(compare_members);
            build_section(key, &members)
        })
        .collect();
    sections.sort_by(compare_sections);

    debug!(
        sections = sections.len(),
        pages = pages.len(),
        "generated index"
    );
    Ok(Index::new(sections))
}

struct Member<'a> {
    relative: &'a str,
    page: &'a Page,
}

fn build_section(key: &str, members: &[Member<'_>]) -> IndexSection {
    let title = members
        .iter()
        .map(|m| m.page.section.trim())
        .find(|label| !label.is_empty())
        .map(String::from)
        .unwrap_or_else(|| section_title_from_key(key));

    IndexSection {
        title,
        slug: key.to_string(),
        pages: members.iter().map(|m| m.relative.to_string()).collect(),
        ..IndexSection::default()
    }
}

fn compare_members(a: &Member<'_>, b: &Member<'_>) -> Ordering {
    let (ao, bo) = (a.page.order, b.page.order);
    match (ao != 0, bo != 0) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) if ao != bo => ao.cmp(&bo),
        _ => a
            .page
            .title
            .to_lowercase()
            .cmp(&b.page.title.to_lowercase())
            .then_with(|| a.relative.cmp(b.relative)),
    }
}

fn compare_sections(a: &IndexSection, b: &IndexSection) -> Ordering {
    match (a.is_root(), b.is_root()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.slug.cmp(&b.slug)),
    }
}
