//! End-to-end builds of the fixture site in `fixtures/site`.
//!
//! Each test copies the fixture tree to a temp directory, builds it into a
//! second temp directory through the public `site::build` API and inspects
//! the written files.

use chrono::{DateTime, TimeZone, Utc};
use pressroom::site::{self, BuildReport, NoStyleCompiler};
use regex::Regex;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    copy_fixtures_into(tmp.path());
    tmp
}

fn build_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
}

fn build_at(source: &Path, time: DateTime<Utc>) -> (TempDir, BuildReport) {
    let out = TempDir::new().unwrap();
    let report = site::build(source, Some(out.path()), &NoStyleCompiler, time).unwrap();
    (out, report)
}

fn build_fixture() -> (TempDir, TempDir, BuildReport) {
    let source = setup_fixtures();
    let (out, report) = build_at(source.path(), build_time());
    (source, out, report)
}

fn read(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel)).unwrap_or_else(|e| panic!("could not read {rel}: {e}"))
}

/// Text of every `<description>` inside an `<item>`, CDATA or not.
fn item_descriptions(xml: &str) -> Vec<String> {
    let item = Regex::new(r"(?s)<item>.*?</item>").unwrap();
    let description = Regex::new(r"(?s)<description>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</description>").unwrap();
    item.find_iter(xml)
        .filter_map(|m| description.captures(m.as_str()))
        .map(|c| c[1].to_string())
        .collect()
}

// =========================================================================
// Output layout
// =========================================================================

#[test]
fn every_document_written() {
    let (_source, out, report) = build_fixture();
    for rel in [
        "index.html",
        "archive.html",
        "about.html",
        "reading-list.html",
        "posts/hello.html",
        "posts/night-walk.html",
        "posts/long-read.html",
        "posts/trip.html",
        "posts/sunrise.html",
        "style/style.css",
        "style/dark.css",
        "images/favicon.png",
        "feed.xml",
    ] {
        assert!(out.path().join(rel).is_file(), "missing {rel}");
    }
    assert!(!out.path().join("posts/draft.html").exists());
    assert!(!out.path().join("header.html").exists());
    assert!(report.warnings.iter().any(|w| w.message.contains("invalid date")));
}

#[test]
fn default_output_is_sibling_of_source() {
    let parent = TempDir::new().unwrap();
    let source = parent.path().join("blog");
    copy_fixtures_into(&source);

    let report = site::build(&source, None, &NoStyleCompiler, build_time()).unwrap();
    let parent_dir = fs::canonicalize(parent.path()).unwrap();
    assert_eq!(report.output, parent_dir.join("blog-built"));
    assert!(parent.path().join("blog-built/index.html").is_file());
}

#[test]
fn default_output_for_source_without_file_name() {
    // `blog/style/..` names the source the way `pressroom build .` does:
    // its last component has no file name.
    let parent = TempDir::new().unwrap();
    let source = parent.path().join("blog");
    copy_fixtures_into(&source);

    let dotted = source.join("style").join("..");
    let report = site::build(&dotted, None, &NoStyleCompiler, build_time()).unwrap();
    let parent_dir = fs::canonicalize(parent.path()).unwrap();
    assert_eq!(report.output, parent_dir.join("blog-built"));
    assert!(parent.path().join("blog-built/posts/sunrise.html").is_file());
}

fn copy_fixtures_into(dst: &Path) {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    for entry in WalkDir::new(&fixtures).into_iter().filter_map(|e| e.ok()) {
        let rel = entry.path().strip_prefix(&fixtures).unwrap();
        if entry.file_type().is_dir() {
            fs::create_dir_all(dst.join(rel)).unwrap();
        } else {
            fs::copy(entry.path(), dst.join(rel)).unwrap();
        }
    }
}

// =========================================================================
// Posts
// =========================================================================

#[test]
fn none_sentinel_post_has_title_but_no_heading() {
    let (_source, out, _) = build_fixture();
    let html = read(out.path(), "posts/hello.html");
    assert!(html.contains("<title>Hello</title>"));
    assert!(!html.contains("<h1>"));
    assert!(!html.contains("<h4>"));
}

#[test]
fn dated_post_has_heading_and_date() {
    let (_source, out, _) = build_fixture();
    let html = read(out.path(), "posts/sunrise.html");
    assert!(html.contains("<h1>Sunrise</h1><h4>20 May 2024</h4>"));
}

#[test]
fn navigation_follows_registry_order() {
    let (_source, out, _) = build_fixture();

    let newest = read(out.path(), "posts/sunrise.html");
    assert!(!newest.contains("Next Post"));
    assert!(newest.contains(r#"<a href="./trip.html">Previous Post »</a>"#));

    let middle = read(out.path(), "posts/trip.html");
    assert!(middle.contains(r#"<a href="./sunrise.html">« Next Post</a>"#));
    assert!(middle.contains(r#"<a href="./long-read.html">Previous Post »</a>"#));

    let oldest = read(out.path(), "posts/hello.html");
    assert!(oldest.contains(r#"<a href="./night-walk.html">« Next Post</a>"#));
    assert!(!oldest.contains("Previous Post"));
    assert!(oldest.contains(r#"<a href="../index.html">Home</a>"#));
}

#[test]
fn post_links_rewritten_for_depth() {
    let (_source, out, _) = build_fixture();
    let html = read(out.path(), "posts/trip.html");
    assert!(html.contains(r#"<a href="../posts/long-read.html">long read</a>"#));
    assert!(html.contains(r#"<a href="../about.html">About</a>"#));
    assert!(html.contains(r#"href="../images/favicon.png""#));

    let page = read(out.path(), "about.html");
    assert!(page.contains(r#"<a href="./index.html">Back home</a>"#));
    assert!(page.contains(r#"href="./style/style.css""#));
}

#[test]
fn style_directive_switches_stylesheet() {
    let (_source, out, _) = build_fixture();
    let html = read(out.path(), "posts/trip.html");
    assert!(html.contains(r#"<link rel="stylesheet" href="../style/dark.css">"#));
    assert!(!html.contains("<style>"));
}

#[test]
fn discussion_snippet_only_on_posts() {
    let (_source, out, _) = build_fixture();
    assert!(read(out.path(), "posts/sunrise.html").contains(r#"<div id="disqus_thread"></div>"#));
    assert!(!read(out.path(), "about.html").contains("disqus_thread"));
}

#[test]
fn header_meta_in_every_head() {
    let (_source, out, _) = build_fixture();
    for rel in ["index.html", "posts/hello.html"] {
        let html = read(out.path(), rel);
        let head_end = html.find("</head>").unwrap();
        let meta = html
            .find(r#"<meta name="author" content="Sam Rivera">"#)
            .unwrap_or_else(|| panic!("{rel} has no author meta"));
        assert!(meta < head_end, "{rel}");
        assert!(!html.contains("rss-title"), "{rel}");
    }
}

// =========================================================================
// Head metadata
// =========================================================================

#[test]
fn adult_post_gets_rating_and_no_image() {
    let (_source, out, _) = build_fixture();
    let html = read(out.path(), "posts/night-walk.html");
    assert!(html.contains(r#"<meta name="rating" content="adult">"#));
    assert!(!html.contains("og:image"));
    assert!(!html.contains("og:description"));
}

#[test]
fn ordinary_post_gets_open_graph() {
    let (_source, out, _) = build_fixture();
    let html = read(out.path(), "posts/sunrise.html");
    assert!(html.contains(
        r#"<meta property="og:image" content="https://images.example.org/sunrise.jpg">"#
    ));
    assert!(html.contains(
        r#"<meta property="og:description" content="Up before dawn. The light was worth it.">"#
    ));
    assert!(!html.contains("rating"));
}

// =========================================================================
// Archive
// =========================================================================

#[test]
fn index_lists_two_newest_posts() {
    let (_source, out, _) = build_fixture();
    let html = read(out.path(), "index.html");
    assert_eq!(html.matches(r#"<li><a href="./posts/"#).count(), 2);
    let sunrise = html.find("2024-05-20 » Sunrise").unwrap();
    let trip = html.find("2024-04-12 » Away").unwrap();
    assert!(sunrise < trip);
    assert!(html.contains(r#"<a href="archive.html">» more posts</a>"#));
    assert!(!html.contains("<archive"));
}

#[test]
fn archive_page_lists_every_post() {
    let (_source, out, _) = build_fixture();
    let html = read(out.path(), "archive.html");
    assert_eq!(html.matches(r#"<li><a href="./posts/"#).count(), 5);
    assert!(!html.contains("more posts"));
}

// =========================================================================
// Feed
// =========================================================================

#[test]
fn feed_has_one_item_per_post() {
    let (_source, out, report) = build_fixture();
    let xml = read(out.path(), "feed.xml");
    assert_eq!(xml.matches("<channel>").count(), 1);
    assert_eq!(xml.matches("<item>").count(), 5);
    assert_eq!(report.feed.unwrap().items, 5);
    assert!(xml.contains("<title>Workshop Notes</title>"));
    assert!(xml.contains("https://notes.example.org/posts/sunrise.html"));
    assert!(xml.contains("<lastBuildDate>Sat, 01 Jun 2024 09:30:00 +0000</lastBuildDate>"));
}

#[test]
fn feed_descriptions_bounded_and_overridable() {
    let (_source, out, _) = build_fixture();
    let descriptions = item_descriptions(&read(out.path(), "feed.xml"));
    assert_eq!(descriptions.len(), 5);
    for d in &descriptions {
        assert!(d.chars().count() <= 500, "too long: {d}");
    }
    assert!(descriptions.iter().any(|d| d == "A short trip north."));
    assert!(descriptions.iter().any(|d| d.ends_with("...") && d.chars().count() == 500));
    assert!(!read(out.path(), "posts/trip.html").contains("A short trip north."));
}

// =========================================================================
// Minimal sites and determinism
// =========================================================================

#[test]
fn minimal_site_without_feed_or_images() {
    let source = TempDir::new().unwrap();
    fs::write(source.path().join("index.md"), "# Home\n\nHello.\n").unwrap();
    fs::write(source.path().join("header.md"), "Header\n").unwrap();
    fs::write(source.path().join("footer.md"), "Footer\n").unwrap();
    fs::create_dir_all(source.path().join("style")).unwrap();
    fs::write(source.path().join("style/style.css"), "body {}\n").unwrap();

    let (out, report) = build_at(source.path(), build_time());
    assert_eq!(read(out.path(), "feed.xml"), "");
    assert!(report.feed.is_none());
    assert!(report.warnings.iter().any(|w| w.message.contains("favicon")));
    assert!(report.warnings.iter().any(|w| w.message.contains("RSS will not be built")));
    assert!(read(out.path(), "index.html").contains("<h1>Home</h1>"));
}

#[test]
fn rebuild_is_identical_except_build_date() {
    let source = setup_fixtures();
    let (first, _) = build_at(source.path(), build_time());
    let (second, _) = build_at(source.path(), Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    let build_date = Regex::new(r"<lastBuildDate>[^<]*</lastBuildDate>").unwrap();

    let files: Vec<_> = WalkDir::new(first.path())
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(first.path()).unwrap().to_path_buf())
        .collect();
    assert!(files.len() > 10);

    for rel in files {
        let a = fs::read(first.path().join(&rel)).unwrap();
        let b = fs::read(second.path().join(&rel)).unwrap();
        if rel == Path::new("feed.xml") {
            let a = String::from_utf8(a).unwrap();
            let b = String::from_utf8(b).unwrap();
            assert_ne!(a, b);
            assert_eq!(build_date.replace(&a, ""), build_date.replace(&b, ""));
        } else {
            assert_eq!(a, b, "{} differs between builds", rel.display());
        }
    }
}

#[test]
fn check_lists_registry_newest_first() {
    let source = setup_fixtures();
    let report = site::check(source.path()).unwrap();
    let names: Vec<&str> = report
        .registry
        .entries()
        .iter()
        .map(|e| e.archive_name.as_str())
        .collect();
    assert_eq!(names, ["sunrise", "trip", "long-read", "night-walk", "hello"]);
    assert_eq!(report.feed_title.as_deref(), Some("Workshop Notes"));
}
