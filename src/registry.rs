//! The post registry: every post in the site, newest first.
//!
//! Built from `<root>/posts/` before anything is rendered, because both the
//! next/previous navigation of a post and the archive listings on any page
//! need the complete, ordered list. After [`PostRegistry::build`] returns the
//! registry is never modified.
//!
//! ## Ordering
//!
//! Filenames are sorted ascending and registered in reverse, so index 0 is
//! the file with the greatest `yyyy-MM-dd` prefix. Posts sharing a date fall
//! back to the rest of the filename.

use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::SourceFormat;
use crate::frontmatter::{self, FrontMatter};
use crate::naming;
use crate::types::Warnings;

/// One registered post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostEntry {
    /// Output stem: the post renders to `posts/<archive_name>.html`.
    pub archive_name: String,
    pub title: String,
    /// ISO `yyyy-MM-dd`.
    pub date: String,
    #[serde(skip)]
    pub published: NaiveDate,
    /// The `_None` sentinel: no `<h1>`/`<h4>` block when rendered.
    pub suppress_heading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_matter: Option<FrontMatter>,
    pub source: PathBuf,
}

impl PostEntry {
    pub fn file_name(&self) -> String {
        format!("{}.html", self.archive_name)
    }
}

/// Posts adjacent to one entry in registry order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbors<'a> {
    /// The next newer post (lower index).
    pub newer: Option<&'a PostEntry>,
    /// The next older post (higher index).
    pub older: Option<&'a PostEntry>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PostRegistry {
    entries: Vec<PostEntry>,
}

impl PostRegistry {
    /// Scan `posts_dir` and register every valid post.
    ///
    /// A missing directory yields an empty registry. Files without a
    /// recognized extension or a valid date prefix are skipped silently;
    /// a dated file with nothing after the date is skipped with a warning.
    pub fn build(posts_dir: &Path, warnings: &mut Warnings) -> std::io::Result<Self> {
        if !posts_dir.is_dir() {
            return Ok(Self::default());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(posts_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| SourceFormat::from_path(path).is_some())
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut entries = Vec::with_capacity(files.len());
        for path in files.into_iter().rev() {
            if let Some(entry) = register(&path, warnings) {
                entries.push(entry);
            }
        }

        Ok(Self { entries })
    }

    /// Registry over already ordered entries.
    pub fn from_entries(entries: Vec<PostEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PostEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PostEntry> {
        self.entries.get(index)
    }

    /// Index of the first post with this title.
    ///
    /// Titles are not unique: two posts with the same title both resolve to
    /// the newer one.
    pub fn position_by_title(&self, title: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.title == title)
    }

    pub fn neighbors(&self, index: usize) -> Neighbors<'_> {
        Neighbors {
            newer: index.checked_sub(1).and_then(|i| self.entries.get(i)),
            older: self.entries.get(index + 1),
        }
    }

    /// The `count` most recent posts, or all of them.
    pub fn recent(&self, count: Option<usize>) -> &[PostEntry] {
        let n = count.map_or(self.entries.len(), |c| c.min(self.entries.len()));
        &self.entries[..n]
    }
}

fn register(path: &Path, warnings: &mut Warnings) -> Option<PostEntry> {
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    let parsed = naming::parse_entry_name(&stem);
    let published = parsed.date?;

    if parsed.archive_name.is_empty() {
        warnings.push(Some(path), "has nothing after its date, will not be built");
        return None;
    }

    let front_matter = match SourceFormat::from_path(path) {
        Some(SourceFormat::Markdown) => match fs::read_to_string(path) {
            Ok(text) => frontmatter::parse(&text),
            Err(e) => {
                warnings.push(Some(path), format!("could not be read: {e}"));
                return None;
            }
        },
        _ => None,
    };

    let title = front_matter
        .as_ref()
        .and_then(|fm| fm.title.clone())
        .unwrap_or(parsed.title);

    Some(PostEntry {
        archive_name: parsed.archive_name,
        title,
        date: naming::format_iso_date(published),
        published,
        suppress_heading: parsed.suppress_heading,
        front_matter,
        source: path.to_path_buf(),
    })
}
