//! CLI output formatting for `build` and `check`.
//!
//! Output is information-first: every document leads with its positional
//! index and title, the file it came from is secondary context on an
//! indented `Source:` line.
//!
//! ## Build
//!
//! ```text
//! Pages
//! 001 Welcome → index.html
//!     Source: index.md
//!
//! Posts
//! 001 Second Post → posts/second-post.html
//!     Source: posts/2024-01-02-second-post.md
//!
//! Feed
//!     feed.xml (1 item)
//!
//! Warnings
//!     posts/draft.md: has no date or an invalid date prepending the filename
//!
//! Built 1 page, 1 post, 2 assets → site-built
//! ```
//!
//! ## Check
//!
//! ```text
//! Posts
//! 001 2024-01-02 Second Post
//!     Source: posts/2024-01-02-second-post.md
//!
//! Feed
//!     Example Blog
//! ```
//!
//! Each `format_*` function returns lines and does no I/O; the `print_*`
//! wrappers write them to stdout.

use std::path::Path;

use crate::site::{BuildReport, CheckReport, ReportEntry};
use crate::types::Warning;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// `path` relative to `root` when possible, for display.
fn relative<'p>(path: &'p Path, root: &Path) -> &'p Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn document_lines(lines: &mut Vec<String>, heading: &str, entries: &[ReportEntry], root: &Path) {
    if entries.is_empty() {
        return;
    }
    lines.push(heading.to_string());
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            entry.title,
            entry.output.display()
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            relative(&entry.source, root).display()
        ));
    }
    lines.push(String::new());
}

fn warning_lines(lines: &mut Vec<String>, warnings: &[Warning], root: &Path) {
    if warnings.is_empty() {
        return;
    }
    lines.push("Warnings".to_string());
    for warning in warnings {
        match &warning.path {
            Some(path) => lines.push(format!(
                "{}{}: {}",
                indent(1),
                relative(path, root).display(),
                warning.message
            )),
            None => lines.push(format!("{}{}", indent(1), warning.message)),
        }
    }
    lines.push(String::new());
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();
    let root = report.source.as_path();

    document_lines(&mut lines, "Pages", &report.pages, root);
    document_lines(&mut lines, "Posts", &report.posts, root);

    lines.push("Feed".to_string());
    match &report.feed {
        Some(feed) => lines.push(format!(
            "{}{} ({})",
            indent(1),
            feed.file.display(),
            plural(feed.items, "item")
        )),
        None => lines.push(format!("{}disabled", indent(1))),
    }
    lines.push(String::new());

    warning_lines(&mut lines, &report.warnings, root);

    lines.push(format!(
        "Built {}, {}, {} \u{2192} {}",
        plural(report.pages.len(), "page"),
        plural(report.posts.len(), "post"),
        plural(report.assets, "asset"),
        report.output.display()
    ));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();
    let root = report.source.as_path();

    lines.push("Posts".to_string());
    if report.registry.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, entry) in report.registry.entries().iter().enumerate() {
        lines.push(format!(
            "{} {} {}",
            format_index(i + 1),
            entry.date,
            entry.title
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            relative(&entry.source, root).display()
        ));
    }
    lines.push(String::new());

    lines.push("Feed".to_string());
    match &report.feed_title {
        Some(title) => lines.push(format!("{}{}", indent(1), title)),
        None => lines.push(format!("{}disabled", indent(1))),
    }
    lines.push(String::new());

    warning_lines(&mut lines, &report.warnings, root);
    lines
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
