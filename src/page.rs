//! Page codec: Markdown with a YAML frontmatter block.
//!
//! ```text
//! ---
//! title: Intro
//! slug: guide/intro
//! section: Guide
//! order: 1
//! tags:
//! - basics
//! status: published
//! ---
//! Body text in Markdown.
//! ```
//!
//! [`parse_page`] and [`render_page`] are pure; [`load_page`] and
//! [`save_page`] are the thin I/O wrappers the store builds on.
//!
//! Round trip: `parse_page(&render_page(p))` reproduces every frontmatter
//! field and the content, except that a non-empty body without a trailing
//! newline gains one.

use crate::types::Page;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid frontmatter: {0}")]
    InvalidFrontmatter(&'static str),
    #[error("invalid YAML in frontmatter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
    #[error("{path}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<PageError>,
    },
}

/// Parse page source text into a [`Page`].
///
/// The first line must be exactly `---` and another `---` line must close
/// the frontmatter. Everything after the closing delimiter is the body.
pub fn parse_page(text: &str) -> Result<Page, PageError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

    if lines.next() != Some(DELIMITER) {
        return Err(PageError::InvalidFrontmatter(
            "page must start with a '---' line",
        ));
    }

    let mut frontmatter = Vec::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line == DELIMITER {
            closed = true;
            break;
        }
        frontmatter.push(line);
    }
    if !closed {
        return Err(PageError::InvalidFrontmatter(
            "missing closing '---' line",
        ));
    }

    let yaml = frontmatter.join("\n");
    let mut page: Page = if yaml.trim().is_empty() {
        Page::default()
    } else {
        serde_yaml::from_str(&yaml)?
    };
    page.content = lines.collect::<Vec<_>>().join("\n");
    Ok(page)
}

/// Render a page back to its file form.
pub fn render_page(page: &Page) -> Result<String, PageError> {
    let yaml = serde_yaml::to_string(page)?;

    let mut out = String::with_capacity(yaml.len() + page.content.len() + 8);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&page.content);
    if !page.content.is_empty() && !page.content.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Read and parse one page file, recording where it came from.
pub fn load_page(path: &Path) -> Result<Page, PageError> {
    let text = fs::read_to_string(path).map_err(|source| PageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut page = parse_page(&text).map_err(|e| PageError::InFile {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    page.file_path = Some(path.to_path_buf());
    Ok(page)
}

/// Render and write one page file, creating parent directories.
pub fn save_page(path: &Path, page: &Page) -> Result<(), PageError> {
    let io_err = |source| PageError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let text = render_page(page)?;
    fs::write(path, text).map_err(io_err)
}
