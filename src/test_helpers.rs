//! Shared test utilities for the pressroom test suite.
//!
//! Source trees are built in temp directories, either from the checked-in
//! `fixtures/site/` tree or file by file with [`SiteBuilder`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = SiteBuilder::minimal()
//!     .file("posts/2024-01-01-hello_None.md", "Hi there.")
//!     .build();
//! let tree = walk(site.path(), &mut Warnings::new()).unwrap();
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Ad-hoc source trees
// =========================================================================

pub const MINIMAL_HEADER: &str = "<nav><a href=\"./index.html\">Home</a></nav>\n";
pub const MINIMAL_FOOTER: &str = "Written by hand.\n";

/// Header declaring a feed for `https://blog.example.org`.
pub const FEED_HEADER: &str = "<rss-title>Example Blog</rss-title>\n\
<rss-description>Notes and photos</rss-description>\n\
<rss-link>https://blog.example.org</rss-link>\n\n\
<nav><a href=\"./index.html\">Home</a></nav>\n";

/// Builds a source tree file by file.
#[derive(Default)]
pub struct SiteBuilder {
    files: Vec<(String, String)>,
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index, header, footer and stylesheet: the smallest tree that builds.
    pub fn minimal() -> Self {
        Self::new()
            .file("index.md", "# Welcome\n\nHello there.\n")
            .file("header.md", MINIMAL_HEADER)
            .file("footer.md", MINIMAL_FOOTER)
            .file("style/style.css", "body { margin: 0; }\n")
    }

    /// Add or replace a file at a `/`-separated relative path.
    pub fn file(mut self, rel: &str, content: &str) -> Self {
        self.files.retain(|(path, _)| path != rel);
        self.files.push((rel.to_string(), content.to_string()));
        self
    }

    pub fn build(self) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (rel, content) in &self.files {
            let path = tmp.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
        }
        tmp
    }
}

/// Read an output file relative to `dir`. Panics with the path on failure.
pub fn read_output(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel))
        .unwrap_or_else(|e| panic!("could not read output {rel}: {e}"))
}
