//! Site configuration module.
//!
//! Loads and validates the optional `config.toml` at the source root. Every
//! table and key defaults, so a file names only what it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [feed]
//! language = "en"            # Channel language when the header has no rss-language
//! ttl = 1440                 # Channel TTL (minutes) when the header has no rss-ttl
//! description_limit = 500    # Item descriptions longer than this are truncated
//! file_name = "feed.xml"     # Feed file written at the output root
//!
//! [metadata]
//! description_sentences = 2  # Sentences taken for a synthesized og:description
//! adult_tag_prefix = "🔞"     # Tag prefix that marks a post as adult
//! # highlight_stylesheet = "https://cdn.example.org/prism.css"
//! # highlight_script = "https://cdn.example.org/prism.js"
//!
//! [output]
//! suffix = "-built"          # Output directory is <source><suffix> unless --output is given
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the config at the source root. Never treated as content.
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Feed channel defaults and item limits.
    pub feed: FeedConfig,
    /// Head metadata synthesis.
    pub metadata: MetadataConfig,
    /// Output location.
    pub output: OutputConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.description_limit < 4 {
            return Err(ConfigError::Validation(
                "feed.description_limit must be at least 4".into(),
            ));
        }
        if self.feed.file_name.trim().is_empty() || self.feed.file_name.contains('/') {
            return Err(ConfigError::Validation(
                "feed.file_name must be a plain file name".into(),
            ));
        }
        if self.feed.language.trim().is_empty() {
            return Err(ConfigError::Validation(
                "feed.language must not be empty".into(),
            ));
        }
        if self.metadata.description_sentences == 0 {
            return Err(ConfigError::Validation(
                "metadata.description_sentences must be at least 1".into(),
            ));
        }
        if self.metadata.adult_tag_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "metadata.adult_tag_prefix must not be empty".into(),
            ));
        }
        if self.output.suffix.is_empty() {
            return Err(ConfigError::Validation(
                "output.suffix must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Feed channel defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Used when the header declares no `rss-language`.
    pub language: String,
    /// Used when the header declares no `rss-ttl`.
    pub ttl: u32,
    /// Maximum item description length in characters.
    pub description_limit: usize,
    pub file_name: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            ttl: 1440,
            description_limit: 500,
            file_name: "feed.xml".to_string(),
        }
    }
}

/// Per-article head metadata settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// How many sentences of the first paragraph make up a synthesized description.
    pub description_sentences: usize,
    /// A post with any tag starting with this is flagged adult.
    pub adult_tag_prefix: String,
    /// Stylesheet added to documents with language-tagged code blocks.
    pub highlight_stylesheet: Option<String>,
    /// Script added to documents with language-tagged code blocks.
    pub highlight_script: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            description_sentences: 2,
            adult_tag_prefix: "🔞".to_string(),
            highlight_stylesheet: None,
            highlight_script: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Appended to the source directory name to form the default output directory.
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: "-built".to_string(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parse config text. Missing tables and keys take their defaults.
pub fn parse_config(text: &str) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from the source root, or the defaults when it is absent.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if !config_path.is_file() {
        return Ok(SiteConfig::default());
    }
    parse_config(&fs::read_to_string(&config_path)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pressroom Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the root of the source tree, next to index.md.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Feed
# ---------------------------------------------------------------------------
# The feed itself is switched on by the header: it needs <rss-title>,
# <rss-description> and <rss-link> directives. These values fill in the rest.
[feed]
# Channel language when the header has no <rss-language> directive.
language = "en"

# Channel time-to-live in minutes when the header has no <rss-ttl> directive.
ttl = 1440

# Item descriptions longer than this many characters are cut and end in "...".
description_limit = 500

# Feed file written at the root of the output directory.
file_name = "feed.xml"

# ---------------------------------------------------------------------------
# Head metadata
# ---------------------------------------------------------------------------
[metadata]
# Sentences of the first paragraph used when a document has no explicit
# og:description meta.
description_sentences = 2

# A post with any tag starting with this prefix gets a rating=adult meta and
# never exposes og:image or a synthesized description.
adult_tag_prefix = "🔞"

# Syntax highlighting assets, added only to documents that contain
# language-tagged code blocks.
# highlight_stylesheet = "https://cdn.example.org/prism.css"
# highlight_script = "https://cdn.example.org/prism.js"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Default output directory is the source directory name plus this suffix.
# The --output flag overrides it.
suffix = "-built"
"##
}
