//! Shared types used across the build pipeline.
//!
//! These are the small value types that several stages pass between each
//! other: what a source file is ([`ContentUnit`]), how deep its output lands
//! ([`Depth`]), and the per-document warnings collected during a build
//! ([`Warnings`]).

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::content::SourceFormat;
use crate::naming;

/// What a source file contributes to the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    /// Undated document rendered at the top level of the output.
    Page,
    /// Dated document under `posts/`, rendered with navigation and a feed item.
    Post,
    /// Root `header.*` source, spliced into every document.
    Header,
    /// Root `footer.*` source, spliced into every document.
    Footer,
    /// Anything with an extension the pipeline does not render.
    IgnoredAsset,
}

/// Text direction declared in front matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// How far below the output root a document is written.
///
/// Pages land at the root; posts land one level down in `posts/`. Relative
/// links in shared fragments (header, footer, head nodes) are rewritten to
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Root,
    Nested,
}

impl Depth {
    pub fn for_kind(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Post => Depth::Nested,
            _ => Depth::Root,
        }
    }

    /// Prefix that reaches the output root from a document at this depth.
    pub fn prefix(self) -> &'static str {
        match self {
            Depth::Root => "./",
            Depth::Nested => "../",
        }
    }
}

/// One source file to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentUnit {
    pub path: PathBuf,
    pub kind: UnitKind,
    /// Filename stem with the date prefix and `_Title`/`_None` suffix stripped.
    pub raw_name: String,
    /// How the source is parsed; `None` for extensions that are not rendered.
    pub format: Option<SourceFormat>,
}

impl ContentUnit {
    /// Classify a file found during traversal.
    ///
    /// `in_posts` is true for files below the root `posts/` directory.
    pub fn classify(path: &Path, in_posts: bool) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = SourceFormat::from_path(path);

        let kind = match stem.to_lowercase().as_str() {
            "header" => UnitKind::Header,
            "footer" => UnitKind::Footer,
            _ if format.is_none() => UnitKind::IgnoredAsset,
            _ if in_posts => UnitKind::Post,
            _ => UnitKind::Page,
        };

        ContentUnit {
            path: path.to_path_buf(),
            kind,
            raw_name: naming::parse_entry_name(&stem).archive_name,
            format,
        }
    }
}

/// A non-fatal problem with a single document or asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub message: String,
}

/// Collected per-document warnings.
///
/// Every warning is logged through `tracing` as it is recorded, and kept so
/// the build summary can list them afterwards.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: Option<&Path>, message: impl Into<String>) {
        let message = message.into();
        match path {
            Some(p) => warn!(path = %p.display(), "{message}"),
            None => warn!("{message}"),
        }
        self.0.push(Warning {
            path: path.map(Path::to_path_buf),
            message,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when any recorded message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.iter().any(|w| w.message.contains(needle))
    }
}
