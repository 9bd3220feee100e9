//! Source tree traversal.
//!
//! First stage of the build. Walks the source root breadth-first and lists,
//! per directory, the files directly inside it. Nothing is parsed here; the
//! walker only decides what each directory is for and checks that the root
//! holds what every build needs.
//!
//! ## Directory Layout
//!
//! ```text
//! site/
//! ├── config.toml          # Optional, never content
//! ├── index.md             # Required
//! ├── header.md            # Spliced into every document
//! ├── footer.md
//! ├── about.md             # Page → about.html
//! ├── style/               # Required, holds style.css (or .scss/.sass)
//! ├── images/              # Optional, favicon.ico / favicon.png
//! ├── posts/               # Dated posts → posts/<name>.html
//! │   └── 2024-01-05-hello.md
//! └── notes/               # Any other directory holds more pages
//!     └── reading-list.md
//! ```
//!
//! `style/` and `images/` are [`DirKind::Skipped`]: their files are copied
//! as assets, not rendered.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::config::CONFIG_FILE_NAME;
use crate::types::Warnings;

pub const POSTS_DIR: &str = "posts";
pub const STYLE_DIR: &str = "style";
pub const IMAGES_DIR: &str = "images";

/// Stylesheet extensions accepted in `style/`.
pub const STYLESHEET_EXTENSIONS: &[&str] = &["css", "scss", "sass"];

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source root has no files: {0}")]
    EmptyRoot(PathBuf),
    #[error("No index file found in source root: {0}")]
    MissingIndex(PathBuf),
    #[error("Missing required asset: {0}")]
    MissingRequiredAsset(PathBuf),
}

/// What a directory contributes to the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    /// The source root: pages plus the header and footer.
    Root,
    /// `posts/` and anything below it.
    Posts,
    /// Any other directory of pages.
    Pages,
    /// `style/` and `images/` at the root; copied, not rendered.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct SourceDir {
    pub path: PathBuf,
    pub kind: DirKind,
    /// Files directly inside, sorted by file name.
    pub files: Vec<PathBuf>,
}

/// All directories of a source tree in breadth-first order, root first.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub root: PathBuf,
    pub dirs: Vec<SourceDir>,
}

impl SourceTree {
    pub fn root_dir(&self) -> &SourceDir {
        &self.dirs[0]
    }

    /// Directories whose files are rendered.
    pub fn content_dirs(&self) -> impl Iterator<Item = &SourceDir> {
        self.dirs.iter().filter(|d| d.kind != DirKind::Skipped)
    }

    /// First root file whose stem equals `stem`, ignoring case.
    pub fn root_file(&self, stem: &str) -> Option<&Path> {
        self.root_dir()
            .files
            .iter()
            .find(|f| {
                f.file_stem()
                    .is_some_and(|s| s.to_string_lossy().eq_ignore_ascii_case(stem))
            })
            .map(PathBuf::as_path)
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.root.join(POSTS_DIR)
    }
}

/// Walk `root` and validate its required files.
pub fn walk(root: &Path, warnings: &mut Warnings) -> Result<SourceTree, WalkError> {
    let (root_files, root_subdirs) = list_dir(root)?;
    validate_root(root, &root_files)?;

    let mut dirs = vec![SourceDir {
        path: root.to_path_buf(),
        kind: DirKind::Root,
        files: root_files,
    }];

    let mut queue: VecDeque<(PathBuf, DirKind)> = root_subdirs
        .into_iter()
        .map(|path| {
            let kind = classify_root_subdir(&path);
            (path, kind)
        })
        .collect();

    while let Some((path, kind)) = queue.pop_front() {
        if kind == DirKind::Skipped {
            debug!(path = %path.display(), "skipping asset directory");
            dirs.push(SourceDir {
                path,
                kind,
                files: Vec::new(),
            });
            continue;
        }
        match list_dir(&path) {
            Ok((files, subdirs)) => {
                queue.extend(subdirs.into_iter().map(|sub| (sub, kind)));
                dirs.push(SourceDir { path, kind, files });
            }
            Err(e) => {
                warnings.push(Some(&path), format!("could not be read, skipping: {e}"));
            }
        }
    }

    Ok(SourceTree {
        root: root.to_path_buf(),
        dirs,
    })
}

fn classify_root_subdir(path: &Path) -> DirKind {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(POSTS_DIR) => DirKind::Posts,
        Some(STYLE_DIR) | Some(IMAGES_DIR) => DirKind::Skipped,
        _ => DirKind::Pages,
    }
}

fn validate_root(root: &Path, files: &[PathBuf]) -> Result<(), WalkError> {
    if files.is_empty() {
        return Err(WalkError::EmptyRoot(root.to_path_buf()));
    }

    let has_index = files.iter().any(|f| {
        f.file_stem()
            .map(|s| s.to_string_lossy())
            .is_some_and(|s| s.split('_').next() == Some("index"))
    });
    if !has_index {
        return Err(WalkError::MissingIndex(root.to_path_buf()));
    }

    let style_dir = root.join(STYLE_DIR);
    if !style_dir.is_dir() || find_stylesheets(&style_dir)?.is_empty() {
        return Err(WalkError::MissingRequiredAsset(style_dir));
    }
    Ok(())
}

/// Stylesheet sources directly inside `style_dir`, sorted.
pub fn find_stylesheets(style_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let (files, _) = list_dir(style_dir)?;
    Ok(files
        .into_iter()
        .filter(|f| {
            f.extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .is_some_and(|e| STYLESHEET_EXTENSIONS.contains(&e.as_str()))
        })
        .collect())
}

/// Visible files and subdirectories of `dir`, each sorted by name.
fn list_dir(dir: &Path) -> std::io::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name == CONFIG_FILE_NAME {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else {
            files.push(path);
        }
    }
    files.sort();
    subdirs.sort();
    Ok((files, subdirs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SiteBuilder;

    fn kinds(tree: &SourceTree) -> Vec<(String, DirKind)> {
        tree.dirs
            .iter()
            .map(|d| {
                let rel = d.path.strip_prefix(&tree.root).unwrap();
                (rel.to_string_lossy().into_owned(), d.kind)
            })
            .collect()
    }

    #[test]
    fn breadth_first_with_classification() {
        let site = SiteBuilder::minimal()
            .file("posts/2024-01-01-a.md", "a")
            .file("notes/deep/x.md", "x")
            .file("notes/y.md", "y")
            .file("images/favicon.png", "")
            .build();
        let tree = walk(site.path(), &mut Warnings::new()).unwrap();

        assert_eq!(
            kinds(&tree),
            vec![
                ("".to_string(), DirKind::Root),
                ("images".to_string(), DirKind::Skipped),
                ("notes".to_string(), DirKind::Pages),
                ("posts".to_string(), DirKind::Posts),
                ("style".to_string(), DirKind::Skipped),
                ("notes/deep".to_string(), DirKind::Pages),
            ]
        );
    }

    #[test]
    fn files_sorted_and_hidden_or_config_excluded() {
        let site = SiteBuilder::minimal()
            .file("b.md", "b")
            .file("a.md", "a")
            .file(".draft.md", "x")
            .file("config.toml", "")
            .build();
        let tree = walk(site.path(), &mut Warnings::new()).unwrap();
        let names: Vec<String> = tree
            .root_dir()
            .files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md", "footer.md", "header.md", "index.md"]);
    }

    #[test]
    fn root_file_lookup_ignores_case() {
        let site = SiteBuilder::new()
            .file("index.md", "hi")
            .file("Header.md", "h")
            .file("style/style.css", "")
            .build();
        let tree = walk(site.path(), &mut Warnings::new()).unwrap();
        assert!(tree.root_file("header").is_some());
        assert!(tree.root_file("footer").is_none());
    }

    #[test]
    fn empty_root_is_fatal() {
        let site = SiteBuilder::new().file("style/style.css", "").build();
        assert!(matches!(
            walk(site.path(), &mut Warnings::new()),
            Err(WalkError::EmptyRoot(_))
        ));
    }

    #[test]
    fn missing_index_is_fatal() {
        let site = SiteBuilder::new()
            .file("indexes.md", "x")
            .file("style/style.css", "")
            .build();
        assert!(matches!(
            walk(site.path(), &mut Warnings::new()),
            Err(WalkError::MissingIndex(_))
        ));
    }

    #[test]
    fn index_with_title_suffix_accepted() {
        let site = SiteBuilder::new()
            .file("index_Welcome.md", "x")
            .file("style/style.css", "")
            .build();
        assert!(walk(site.path(), &mut Warnings::new()).is_ok());
    }

    #[test]
    fn missing_style_is_fatal() {
        let site = SiteBuilder::new().file("index.md", "x").build();
        assert!(matches!(
            walk(site.path(), &mut Warnings::new()),
            Err(WalkError::MissingRequiredAsset(_))
        ));

        let site = SiteBuilder::new()
            .file("index.md", "x")
            .file("style/readme.txt", "")
            .build();
        assert!(matches!(
            walk(site.path(), &mut Warnings::new()),
            Err(WalkError::MissingRequiredAsset(_))
        ));
    }

    #[test]
    fn scss_counts_as_stylesheet() {
        let site = SiteBuilder::new()
            .file("index.md", "x")
            .file("style/style.scss", "")
            .build();
        assert!(walk(site.path(), &mut Warnings::new()).is_ok());
    }
}
