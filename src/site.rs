//! Build session: runs the whole pipeline for one source tree.
//!
//! ```text
//! prepare   config.toml, walk, favicon, header/footer, feed, post registry
//! render    every content file → RenderedDocument (in memory)
//! write     assets, documents, feed file → output directory
//! ```
//!
//! The registry is complete before the first document is rendered, and
//! nothing touches the output directory until every document is rendered.
//! All accumulated state lives on [`BuildSession`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::assemble::{Assembler, RenderedDocument};
use crate::chrome::{Chrome, ChromeError};
use crate::config::{self, ConfigError, SiteConfig};
use crate::feed::{FeedBuilder, FeedError};
use crate::head::{self, HeadNodeSet};
use crate::registry::PostRegistry;
use crate::types::{ContentUnit, UnitKind, Warning, Warnings};
use crate::walk::{self, DirKind, IMAGES_DIR, POSTS_DIR, STYLE_DIR, SourceTree, WalkError};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),
    #[error("Chrome error: {0}")]
    Chrome(#[from] ChromeError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("Output directory is inside the source tree: {0}")]
    OutputInsideSource(PathBuf),
}

/// Turns `.scss`/`.sass` sources into CSS.
///
/// `Ok(None)` means the compiler declines; the source is then copied as is.
pub trait StyleCompiler {
    fn compile(&self, source: &Path) -> std::io::Result<Option<String>>;
}

/// Copies preprocessor sources verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStyleCompiler;

impl StyleCompiler for NoStyleCompiler {
    fn compile(&self, _source: &Path) -> std::io::Result<Option<String>> {
        Ok(None)
    }
}

/// One rendered document as listed in the build summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub title: String,
    pub source: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedSummary {
    pub file: PathBuf,
    pub items: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub pages: Vec<ReportEntry>,
    pub posts: Vec<ReportEntry>,
    /// `None` when the header declares no feed.
    pub feed: Option<FeedSummary>,
    pub assets: usize,
    pub warnings: Vec<Warning>,
}

/// What `check` reports: everything known before rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub source: PathBuf,
    pub directories: usize,
    pub feed_title: Option<String>,
    pub registry: PostRegistry,
    pub warnings: Vec<Warning>,
}

/// State of one build, from the first walk to the closed feed.
pub struct BuildSession {
    tree: SourceTree,
    config: SiteConfig,
    chrome: Chrome,
    registry: PostRegistry,
    head: HeadNodeSet,
    feed: FeedBuilder,
    /// Output-relative path of the site stylesheet.
    stylesheet: String,
    warnings: Warnings,
}

impl BuildSession {
    /// First pass: everything every document depends on.
    pub fn prepare(source: &Path) -> Result<Self, BuildError> {
        let config = config::load_config(source)?;
        let mut warnings = Warnings::new();

        let tree = walk::walk(source, &mut warnings)?;
        debug!(directories = tree.dirs.len(), "source tree walked");

        let mut head = HeadNodeSet::new();
        head.add_universal(head::resolve_favicon(source, &mut warnings));

        let chrome = Chrome::load(&tree, &config.feed, &mut warnings)?;
        head.add_universal(chrome.universal_meta.iter().cloned());

        let mut feed = FeedBuilder::new();
        if let Some(meta) = chrome.feed.clone() {
            feed.open(meta)?;
        }

        let registry = PostRegistry::build(&tree.posts_dir(), &mut warnings)?;
        info!(posts = registry.len(), "post registry built");

        let stylesheet = site_stylesheet(&source.join(STYLE_DIR))?;

        Ok(Self {
            tree,
            config,
            chrome,
            registry,
            head,
            feed,
            stylesheet,
            warnings,
        })
    }

    /// Second pass: assemble every content file in traversal order.
    pub fn render(&mut self) -> Vec<RenderedDocument> {
        let assembler =
            Assembler::new(&self.registry, &self.chrome, &self.config, self.stylesheet.as_str());
        let mut documents: Vec<RenderedDocument> = Vec::new();
        let mut claimed: HashSet<PathBuf> = HashSet::new();

        for dir in self.tree.content_dirs() {
            for file in &dir.files {
                let unit = ContentUnit::classify(file, dir.kind == DirKind::Posts);
                if matches!(unit.kind, UnitKind::Header | UnitKind::Footer) {
                    if dir.kind != DirKind::Root {
                        self.warnings.push(
                            Some(file),
                            "header and footer are only read from the source root; ignored",
                        );
                    }
                    continue;
                }

                let Some(document) =
                    assembler.assemble(&unit, &mut self.head, &mut self.feed, &mut self.warnings)
                else {
                    continue;
                };
                if !claimed.insert(document.output_path.clone()) {
                    self.warnings.push(
                        Some(file),
                        format!(
                            "renders to {} which another file already produced; skipped",
                            document.output_path.display()
                        ),
                    );
                    continue;
                }
                documents.push(document);
            }
        }
        documents
    }

    /// Serialize the feed. Empty when the header declared none.
    pub fn close_feed(&mut self, build_time: DateTime<Utc>) -> Result<String, FeedError> {
        self.feed.close(build_time, &mut self.warnings)
    }

    /// Copy assets and write every document plus the feed file.
    ///
    /// Returns the number of asset files written.
    pub fn write_output(
        &mut self,
        output: &Path,
        documents: &[RenderedDocument],
        feed_xml: &str,
        compiler: &dyn StyleCompiler,
    ) -> Result<usize, BuildError> {
        fs::create_dir_all(output.join(POSTS_DIR))?;

        let mut assets = 0;
        for dir in [IMAGES_DIR, STYLE_DIR] {
            assets += copy_assets(
                &self.tree.root.join(dir),
                &output.join(dir),
                compiler,
                &mut self.warnings,
            )?;
        }

        for document in documents {
            let path = output.join(&document.output_path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &document.html)?;
            debug!(path = %path.display(), "written");
        }

        fs::write(output.join(&self.config.feed.file_name), feed_xml)?;
        Ok(assets)
    }
}

/// Build `source` into `output` (default: the `<source><suffix>` sibling).
pub fn build(
    source: &Path,
    output: Option<&Path>,
    compiler: &dyn StyleCompiler,
    build_time: DateTime<Utc>,
) -> Result<BuildReport, BuildError> {
    let mut session = BuildSession::prepare(source)?;

    // `.` and `..` have no file name to suffix, and `./out` must still be
    // recognised as inside `.`.
    let source_root = fs::canonicalize(source)?;
    let output = match output {
        Some(dir) => resolve_output(dir)?,
        None => default_output_dir(&source_root, &session.config.output.suffix),
    };
    if output.starts_with(&source_root) {
        return Err(BuildError::OutputInsideSource(output));
    }

    let documents = session.render();
    let feed_items = session.feed.item_count();
    let feed_open = session.feed.is_open();
    let feed_xml = session.close_feed(build_time)?;

    info!(output = %output.display(), documents = documents.len(), "writing output");
    let assets = session.write_output(&output, &documents, &feed_xml, compiler)?;

    let (posts, pages): (Vec<_>, Vec<_>) = documents
        .into_iter()
        .partition(|d| d.kind == UnitKind::Post);
    let entry = |d: RenderedDocument| ReportEntry {
        title: d.title,
        source: d.source,
        output: d.output_path,
    };

    Ok(BuildReport {
        source: source.to_path_buf(),
        feed: feed_open.then(|| FeedSummary {
            file: PathBuf::from(&session.config.feed.file_name),
            items: feed_items,
        }),
        output,
        pages: pages.into_iter().map(entry).collect(),
        posts: posts.into_iter().map(entry).collect(),
        assets,
        warnings: session.warnings.iter().cloned().collect(),
    })
}

/// Validate a source tree and build its registry without writing anything.
pub fn check(source: &Path) -> Result<CheckReport, BuildError> {
    let session = BuildSession::prepare(source)?;
    Ok(CheckReport {
        source: source.to_path_buf(),
        directories: session.tree.dirs.len(),
        feed_title: session.chrome.feed.as_ref().map(|f| f.title.clone()),
        warnings: session.warnings.iter().cloned().collect(),
        registry: session.registry,
    })
}

/// Absolute form of an output directory that may not exist yet.
fn resolve_output(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        return fs::canonicalize(path);
    }
    let absolute = std::path::absolute(path)?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) if parent.exists() => Ok(fs::canonicalize(parent)?.join(name)),
        _ => Ok(absolute),
    }
}

/// `site` → `site-built`, next to the source.
pub fn default_output_dir(source: &Path, suffix: &str) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site".to_string());
    source.with_file_name(format!("{name}{suffix}"))
}

/// Output path of the stylesheet every document links: `style.*` when
/// present, otherwise the first stylesheet, always with a `.css` extension.
fn site_stylesheet(style_dir: &Path) -> std::io::Result<String> {
    let sheets = walk::find_stylesheets(style_dir)?;
    let chosen = sheets
        .iter()
        .find(|s| s.file_stem().is_some_and(|stem| stem == "style"))
        .or(sheets.first());
    let stem = chosen
        .and_then(|s| s.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "style".to_string());
    Ok(format!("{STYLE_DIR}/{stem}.css"))
}

fn copy_assets(
    src: &Path,
    dst: &Path,
    compiler: &dyn StyleCompiler,
    warnings: &mut Warnings,
) -> Result<usize, BuildError> {
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    let files = WalkDir::new(src)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());

    for entry in files {
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if is_preprocessed_stylesheet(path) {
            match compiler.compile(path)? {
                Some(css) => {
                    fs::write(target.with_extension("css"), css)?;
                    copied += 1;
                    continue;
                }
                None => warnings.push(
                    Some(path),
                    "no stylesheet compiler available; copied without compiling",
                ),
            }
        }
        fs::copy(path, &target)?;
        copied += 1;
    }
    Ok(copied)
}

fn is_preprocessed_stylesheet(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| e == "scss" || e == "sass")
}
