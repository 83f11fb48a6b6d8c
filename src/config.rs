//! Wiki configuration module.
//!
//! Handles loading, validating, and merging `wiki.toml`. Stock defaults are
//! serialized to a TOML table, the user's file is merged on top of it, and
//! the result is deserialized and validated.
//!
//! ## Config File Location
//!
//! ```text
//! wiki/
//! ├── wiki.toml                # Optional; every key has a default
//! ├── index.yaml
//! └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "Wiki"                 # Export document title
//! index_file = "index.yaml"      # Relative to the wiki root
//! include_templates = false      # Also read pages under templates/
//!
//! [export]
//! link_types = ["depends_on", "related_to"]  # Followed by --with-links
//! format = "markdown"                        # markdown | html
//!
//! [[roots]]                      # Extra roots merged into exports
//! path = "../team-wiki"          # Relative to the wiki root
//! prefix = "team"                # Slug prefix for that root's pages
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::export::ExportFormat;
use crate::section::LinkType;
use crate::slug::normalize_slug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up at the wiki root.
pub const CONFIG_FILE: &str = "wiki.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Wiki configuration loaded from `wiki.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WikiConfig {
    /// Title used for exported documents.
    pub title: String,
    /// Index file path, relative to the wiki root.
    pub index_file: String,
    pub include_templates: bool,
    pub export: ExportConfig,
    /// Additional page roots merged into exports, in order.
    pub roots: Vec<RootConfig>,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            title: "Wiki".to_string(),
            index_file: "index.yaml".to_string(),
            include_templates: false,
            export: ExportConfig::default(),
            roots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Link types followed when a section export asks for linked sections.
    pub link_types: Vec<String>,
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            link_types: LinkType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            format: ExportFormat::default(),
        }
    }
}

impl ExportConfig {
    /// The configured link types. Entries that fail to parse are skipped;
    /// [`WikiConfig::validate`] rejects them up front.
    pub fn link_types(&self) -> Vec<LinkType> {
        self.link_types
            .iter()
            .filter_map(|t| t.parse().ok())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub prefix: String,
}

impl WikiConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let index_file = Path::new(&self.index_file);
        if self.index_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "index_file must not be empty".into(),
            ));
        }
        if index_file.is_absolute() {
            return Err(ConfigError::Validation(format!(
                "index_file must be relative to the wiki root, got {:?}",
                self.index_file
            )));
        }
        let yaml_ext = index_file
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if !yaml_ext {
            return Err(ConfigError::Validation(format!(
                "index_file must end in .yaml or .yml, got {:?}",
                self.index_file
            )));
        }

        for raw in &self.export.link_types {
            raw.parse::<LinkType>()
                .map_err(|e| ConfigError::Validation(format!("export.link_types: {e}")))?;
        }

        for root in &self.roots {
            if root.path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "roots.path must not be empty".into(),
                ));
            }
            if !root.prefix.trim_matches('/').is_empty() {
                normalize_slug(&root.prefix).map_err(|e| {
                    ConfigError::Validation(format!("roots.prefix for {}: {e}", root.path.display()))
                })?;
            }
        }
        Ok(())
    }

    /// Absolute location of the index file for a wiki rooted at `root`.
    pub fn index_path(&self, root: &Path) -> PathBuf {
        root.join(&self.index_file)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(WikiConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `wiki.toml` from a wiki root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<WikiConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: WikiConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config for the wiki at `root`, falling back to defaults.
pub fn load_config(root: &Path) -> Result<WikiConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `wiki.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Wiki Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Title of exported documents.
title = "Wiki"

# Where the section index lives, relative to this file.
# Without an index file, one is generated from page slugs on every run.
index_file = "index.yaml"

# Read pages inside templates/ directories as regular pages.
include_templates = false

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Section links followed by `export --section KEY --with-links`.
link_types = ["depends_on", "related_to"]

# Output format: "markdown" or "html".
format = "markdown"

# ---------------------------------------------------------------------------
# Additional roots
# ---------------------------------------------------------------------------
# Each extra root is exported after this one. Its pages get `prefix/` in
# front of their slugs; a slug provided by two roots is an error.
#
# [[roots]]
# path = "../team-wiki"
# prefix = "team"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = WikiConfig::default();
        assert_eq!(config.title, "Wiki");
        assert_eq!(config.index_file, "index.yaml");
        assert!(!config.include_templates);
        assert_eq!(config.export.format, ExportFormat::Markdown);
        assert_eq!(
            config.export.link_types(),
            vec![LinkType::DependsOn, LinkType::RelatedTo]
        );
        assert!(config.roots.is_empty());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, WikiConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
title = "Handbook"

[export]
format = "html"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.title, "Handbook");
        assert_eq!(config.export.format, ExportFormat::Html);
        // Unspecified values should be defaults
        assert_eq!(config.index_file, "index.yaml");
        assert_eq!(config.export.link_types.len(), 2);
    }

    #[test]
    fn load_config_reads_roots() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
[[roots]]
path = "../team"
prefix = "team"

[[roots]]
path = "/srv/ops"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.roots.len(), 2);
        assert_eq!(config.roots[0].prefix, "team");
        assert_eq!(config.roots[1].prefix, "");
        assert_eq!(config.roots[1].path, PathBuf::from("/srv/ops"));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<WikiConfig, _> = toml::from_str("titel = \"x\"");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<WikiConfig, _> = toml::from_str("[export]\nformats = \"html\"");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_format_rejected() {
        let result: Result<WikiConfig, _> = toml::from_str("[export]\nformat = \"pdf\"");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_link_type_fails_validation() {
        let mut config = WikiConfig::default();
        config.export.link_types = vec!["depends_on".into(), "blocks".into()];
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("blocks"));
    }

    #[test]
    fn hyphenated_link_type_is_accepted() {
        let mut config = WikiConfig::default();
        config.export.link_types = vec!["related-to".into()];
        assert!(config.validate().is_ok());
        assert_eq!(config.export.link_types(), vec![LinkType::RelatedTo]);
    }

    #[test]
    fn index_file_must_be_relative_yaml() {
        for bad in ["", "/abs/index.yaml", "index.json"] {
            let config = WikiConfig {
                index_file: bad.into(),
                ..WikiConfig::default()
            };
            assert!(config.validate().is_err(), "{bad:?} should be rejected");
        }
        let config = WikiConfig {
            index_file: "meta/index.yml".into(),
            ..WikiConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn traversal_prefix_rejected() {
        let config = WikiConfig {
            roots: vec![RootConfig {
                path: "../other".into(),
                prefix: "../escape".into(),
            }],
            ..WikiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn index_path_joins_root() {
        let config = WikiConfig::default();
        assert_eq!(
            config.index_path(Path::new("/wiki")),
            PathBuf::from("/wiki/index.yaml")
        );
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"title = "Wiki""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"title = "Docs""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("title").unwrap().as_str(), Some("Docs"));
    }

    #[test]
    fn merge_toml_table_merge_keeps_base_keys() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[export]\nformat = \"html\"").unwrap();
        let merged = merge_toml(base, overlay);
        let export = merged.get("export").unwrap();
        assert_eq!(export.get("format").unwrap().as_str(), Some("html"));
        assert_eq!(export.get("link_types").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value =
            toml::from_str("[export]\nlink_types = [\"depends_on\"]").unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.export.link_types(), vec![LinkType::DependsOn]);
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let parsed: WikiConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, WikiConfig::default());
    }
}
