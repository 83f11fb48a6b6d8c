//! Slug handling: the one place where user-supplied identifiers become paths.
//!
//! A slug is a root-relative, `/`-separated token such as `guide/intro`. Its
//! first segment doubles as the page's structural section key, the rest is
//! the slug relative to that section:
//!
//! ```text
//! guide/intro        → section "guide", relative "intro"
//! guide/setup/linux  → section "guide", relative "setup/linux"
//! home               → section "" (root), relative "home"
//! ```
//!
//! ## Two kinds of conversion
//!
//! - [`slugify`] is lossy and only proposes a default slug from a title.
//! - [`normalize_slug`] is strict validation. Every file path and section
//!   lookup key built from a slug must go through it, because it is the only
//!   guard against `..` traversal out of the configured root.

use std::path::{Component, Path};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("invalid slug {slug:?}: {reason}")]
    Invalid { slug: String, reason: &'static str },
}

/// Convert arbitrary text into a slug proposal.
///
/// - `"Getting Started"` → `"getting-started"`
/// - `"  C++ / Rust!  "` → `"c-rust"`
/// - `"Ünïcode"` → `"n-code"` (non-ASCII letters are separators)
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Validate and canonicalize a raw slug.
///
/// Backslashes become forward slashes, the path is cleaned lexically, and
/// the result is rejected if it is empty, `.`, `..`, climbs out of the root
/// or is absolute.
pub fn normalize_slug(raw: &str) -> Result<String, SlugError> {
    let invalid = |reason| SlugError::Invalid {
        slug: raw.to_string(),
        reason,
    };

    let unified = raw.trim().replace('\\', "/");
    if unified.is_empty() {
        return Err(invalid("slug is empty"));
    }
    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(invalid("slug must be relative"));
    }

    let cleaned = clean_path(&unified);
    if cleaned == "." || cleaned == ".." {
        return Err(invalid("slug does not name a page"));
    }
    if cleaned.starts_with("../") {
        return Err(invalid("slug escapes the wiki root"));
    }
    Ok(cleaned)
}

/// Split a fully qualified slug into `(section_key, relative_slug)`.
///
/// Slugs without a `/` belong to the root section (`""`).
pub fn split_section_slug(slug: &str) -> (&str, &str) {
    match slug.split_once('/') {
        Some((section, rest)) => (section, rest),
        None => ("", slug),
    }
}

/// Derive a display title for a section from its key.
///
/// - `""` → `"General"`
/// - `"getting-started"` → `"Getting Started"`
/// - `"api_reference"` → `"Api Reference"`
pub fn section_title_from_key(key: &str) -> String {
    if key.is_empty() {
        return "General".to_string();
    }
    key.split(['-', '_', '/'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a slug from a page file location relative to its root.
///
/// `root/guide/intro.md` → `guide/intro`. The result is normalized, so a
/// path outside `root` is an error rather than a `../` slug.
pub fn slug_from_path(root: &Path, path: &Path) -> Result<String, SlugError> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let without_ext = if relative
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
    {
        relative.with_extension("")
    } else {
        relative.to_path_buf()
    };
    let joined = without_ext
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::Prefix(_) => Some(String::new()),
            Component::CurDir => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    normalize_slug(&joined)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Lexical cleaning of a relative `/`-separated path.
///
/// Drops empty and `.` segments and folds `x/..` pairs. Leading `..`
/// segments that cannot be folded are kept so the caller can reject them.
fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
