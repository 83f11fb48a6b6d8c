//! Combining manifests from several independent page roots.
//!
//! Each root may carry a slug prefix, so that `intro` from a root with
//! prefix `team` becomes `team/intro` in the combined export. Two
//! operations share the same slug computation:
//!
//! - [`validate_manifests`] is strict: any repeated final slug is a
//!   [`MergeError::SlugConflict`] naming both roots. Exports call it first.
//! - [`flatten_manifests`] is lenient: the first occurrence across roots
//!   wins and later duplicates are dropped.

use crate::types::{ManifestEntry, RootManifest};
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error(
        "slug conflict on {slug:?}: provided by both {} and {}",
        .first_root.display(),
        .second_root.display()
    )]
    SlugConflict {
        slug: String,
        first_root: PathBuf,
        second_root: PathBuf,
    },
}

/// The slug an entry of `root` gets in a combined manifest.
pub fn prefixed_slug(root: &RootManifest, entry: &ManifestEntry) -> String {
    apply_prefix(&root.prefix, &entry.slug)
}

/// `prefix/slug`, or `slug` alone when the slash-trimmed prefix is empty.
pub fn apply_prefix(prefix: &str, slug: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        slug.to_string()
    } else {
        format!("{prefix}/{slug}")
    }
}

/// Concatenate root manifests in order, applying prefixes; the first entry
/// for each final slug wins.
pub fn flatten_manifests(roots: &[RootManifest]) -> Vec<ManifestEntry> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for root in roots {
        for entry in &root.entries {
            let slug = prefixed_slug(root, entry);
            if seen.insert(slug.clone()) {
                merged.push(ManifestEntry {
                    slug,
                    ..entry.clone()
                });
            }
        }
    }
    merged
}

/// Fail on the first final slug contributed twice.
pub fn validate_manifests(roots: &[RootManifest]) -> Result<(), MergeError> {
    let mut owners: HashMap<String, &PathBuf> = HashMap::new();
    for root in roots {
        for entry in &root.entries {
            let slug = prefixed_slug(root, entry);
            if let Some(first) = owners.get(&slug) {
                return Err(MergeError::SlugConflict {
                    slug,
                    first_root: (*first).clone(),
                    second_root: root.root.clone(),
                });
            }
            owners.insert(slug, &root.root);
        }
    }
    Ok(())
}
