//! Rendering a manifest into a single document.
//!
//! The manifest decides which pages appear and in what order; this module
//! only looks up each entry's page and concatenates bodies. Two formats:
//!
//! - **Markdown**: the stream handed to external document compilers. A
//!   `% title` line, then one `# <page title>` block per entry.
//! - **HTML**: a standalone document with an inline stylesheet and a table
//!   of contents linking to per-page anchors.
//!
//! Entries are looked up by slug, so callers merging several roots must
//! pass pages whose slugs carry the same prefixes as the entries.

use crate::cancel::{CancelToken, Canceled};
use crate::slug::slugify;
use crate::types::{ManifestEntry, Page};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const CSS: &str = include_str!("../static/export.css");

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExportError {
    #[error("manifest entry {0:?} has no matching page")]
    PageNotFound(String),
    #[error(transparent)]
    Canceled(#[from] Canceled),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Html,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "html" => Ok(ExportFormat::Html),
            other => Err(format!(
                "unknown export format {other:?} (expected markdown or html)"
            )),
        }
    }
}

/// Render in the requested format.
pub fn export(
    format: ExportFormat,
    title: &str,
    entries: &[ManifestEntry],
    pages: &[Page],
    cancel: &CancelToken,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Markdown => export_markdown(title, entries, pages, cancel),
        ExportFormat::Html => export_html(title, entries, pages, cancel),
    }
}

/// Concatenate the pages of `entries` into one Markdown document.
pub fn export_markdown(
    title: &str,
    entries: &[ManifestEntry],
    pages: &[Page],
    cancel: &CancelToken,
) -> Result<String, ExportError> {
    let resolved = resolve_pages(entries, pages, cancel)?;

    let mut blocks = vec![format!("% {}", title.trim())];
    for (entry, page) in resolved {
        let body = trim_blank_lines(&page.content);
        if body.is_empty() {
            blocks.push(format!("# {}", entry.title));
        } else {
            blocks.push(format!("# {}\n\n{}", entry.title, body));
        }
    }

    let mut out = blocks.join("\n\n");
    out.push('\n');
    Ok(out)
}

/// Render the pages of `entries` into one standalone HTML document.
pub fn export_html(
    title: &str,
    entries: &[ManifestEntry],
    pages: &[Page],
    cancel: &CancelToken,
) -> Result<String, ExportError> {
    let resolved = resolve_pages(entries, pages, cancel)?;
    let ids = anchor_ids(&resolved);

    let content = html! {
        header {
            h1 { (title) }
        }
        @if !resolved.is_empty() {
            (render_toc(&resolved, &ids))
        }
        main {
            @for ((entry, page), id) in resolved.iter().zip(&ids) {
                (render_page_article(entry, page, id))
            }
        }
    };

    Ok(base_document(title, content).into_string())
}

/// Drop trailing whitespace and leading blank lines, keeping the
/// indentation of the first non-blank line.
fn trim_blank_lines(text: &str) -> &str {
    let mut rest = text.trim_end();
    while let Some((line, tail)) = rest.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        rest = tail;
    }
    rest
}

/// One unique HTML id per entry: the slugified slug, with `-2`, `-3`, ...
/// appended when an earlier entry already took it.
fn anchor_ids(resolved: &[(&ManifestEntry, &Page)]) -> Vec<String> {
    let mut taken = HashSet::new();
    resolved
        .iter()
        .map(|(entry, _)| {
            let base = slugify(&entry.slug);
            let mut id = base.clone();
            let mut n = 1;
            while !taken.insert(id.clone()) {
                n += 1;
                id = format!("{base}-{n}");
            }
            id
        })
        .collect()
}

fn resolve_pages<'a>(
    entries: &'a [ManifestEntry],
    pages: &'a [Page],
    cancel: &CancelToken,
) -> Result<Vec<(&'a ManifestEntry, &'a Page)>, ExportError> {
    let by_slug: HashMap<&str, &Page> = pages.iter().map(|p| (p.slug.as_str(), p)).collect();
    entries
        .iter()
        .map(|entry| {
            cancel.check()?;
            by_slug
                .get(entry.slug.as_str())
                .map(|page| (entry, *page))
                .ok_or_else(|| ExportError::PageNotFound(entry.slug.clone()))
        })
        .collect()
}

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

fn render_toc(resolved: &[(&ManifestEntry, &Page)], ids: &[String]) -> Markup {
    html! {
        nav.toc {
            ol {
                @for ((entry, _), id) in resolved.iter().zip(ids) {
                    li {
                        a href={ "#" (id) } { (entry.title) }
                    }
                }
            }
        }
    }
}

fn render_page_article(entry: &ManifestEntry, page: &Page, id: &str) -> Markup {
    let mut body_html = String::new();
    md_html::push_html(&mut body_html, Parser::new_ext(&page.content, markdown_options()));

    html! {
        article.page id=(id) {
            h2 { (entry.title) }
            (PreEscaped(body_html))
        }
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES
}
