//! # Simple Wiki
//!
//! A personal knowledge base of Markdown pages. Each page is one file with a
//! YAML frontmatter block; a section index groups pages into ordered
//! sections; manifests flatten the index into the exact page list an export
//! renders.
//!
//! # Architecture: Pages → Index → Manifest → Export
//!
//! ```text
//! 1. Store     wiki/**/*.md        →  Vec<Page>          (frontmatter + body)
//! 2. Index     index.yaml | pages  →  IndexSource        (persisted or generated)
//! 3. Manifest  index + pages       →  Vec<ManifestEntry> (scoped, filtered, merged)
//! 4. Export    manifest + pages    →  Markdown | HTML
//! ```
//!
//! Every stage is a function of its inputs. Nothing is cached between
//! commands: the page list and index are rebuilt from disk each time, which
//! is what lets a generated index be byte-for-byte reproducible.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`slug`] | Slug proposal from titles and strict normalization (the traversal guard) |
//! | [`types`] | `Page`, `Status`, `ManifestEntry`, `RootManifest` |
//! | [`page`] | Frontmatter codec: parse, render, load, save one page file |
//! | [`index`] | Index data model and YAML persistence |
//! | [`generate`] | Deterministic index generation from a page list |
//! | [`section`] | Section lookup by key and one-level link resolution |
//! | [`manifest`] | Index/page flattening into manifests; `IndexSource` |
//! | [`filter`] | Title, section, tag and full-text filtering |
//! | [`merge`] | Combining manifests of several roots under slug prefixes |
//! | [`store`] | Page files on disk: listing, paths, creation |
//! | [`export`] | Markdown and standalone HTML rendering of a manifest |
//! | [`config`] | `wiki.toml` loading, merging and validation |
//! | [`wiki`] | Façade tying one root, its config and every operation together |
//! | [`cancel`] | Cooperative cancellation token |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Index Is Optional
//!
//! A wiki without `index.yaml` still exports: the index is generated from
//! page slugs on the fly. [`manifest::IndexSource`] records which case
//! applies, because the two differ in one visible way. A whole-root export
//! follows section order when the index was written by a person, and plain
//! alphabetical page order when it was generated.
//!
//! ## Slugs Are Validated Once, At the Edge
//!
//! Slugs come from frontmatter, CLI flags and index files. All of them pass
//! through [`slug::normalize_slug`] before they are used as a path or a
//! lookup key, so `../` can never leave the wiki root.
//!
//! ## Errors Name What Failed
//!
//! Each module has its own `thiserror` enum. A missing page names the slug
//! and the section that listed it; a dangling section link names the link
//! type and the section it came from; a merge conflict names both roots.

pub mod cancel;
pub mod config;
pub mod export;
pub mod filter;
pub mod generate;
pub mod index;
pub mod manifest;
pub mod merge;
pub mod output;
pub mod page;
pub mod section;
pub mod slug;
pub mod store;
pub mod types;
pub mod wiki;

#[cfg(test)]
pub(crate) mod test_helpers;
