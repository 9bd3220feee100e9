//! Source parsing: turns one content file into an HTML body fragment.
//!
//! Markdown/text sources have their front matter stripped and their relative
//! document links completed (`(./about)` → `(./about.html)`) before being
//! rendered with pulldown-cmark. HTML sources written for older layouts keep
//! their main region (`#content`) only; the navigation block and discussion
//! placeholder inside it belong to the old rendering and are dropped.

use pulldown_cmark::{Parser, html as md_html};
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use crate::dom::{self, Document, Edits};
use crate::frontmatter::{self, FrontMatter};

static RELATIVE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\.\.?/)([^().#?\s]+)\)").unwrap());

static LEADING_INDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]+").unwrap());

/// How a source file is parsed, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Markdown,
    Html,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "md" | "txt" => Some(SourceFormat::Markdown),
            "html" | "htm" | "htmls" => Some(SourceFormat::Html),
            _ => None,
        }
    }
}

/// A parsed source: its body fragment and, for Markdown, its front matter.
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub front_matter: Option<FrontMatter>,
    pub html: String,
}

impl ParsedSource {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// Parse `text` according to `format`.
pub fn parse(format: SourceFormat, text: &str) -> ParsedSource {
    match format {
        SourceFormat::Markdown => render_markdown(text),
        SourceFormat::Html => ParsedSource {
            front_matter: None,
            html: extract_html(text),
        },
    }
}

/// Strip front matter, complete relative links, and render to HTML.
pub fn render_markdown(text: &str) -> ParsedSource {
    let (front_matter, body) = frontmatter::split(text);
    let body = rewrite_relative_links(body);
    let mut html = String::new();
    md_html::push_html(&mut html, Parser::new(&body));
    ParsedSource { front_matter, html }
}

/// Append `.html` to extensionless `(./x)` and `(../x)` link targets.
pub fn rewrite_relative_links(markdown: &str) -> Cow<'_, str> {
    RELATIVE_LINK.replace_all(markdown, "(${1}${2}.html)")
}

/// Body fragment of an HTML source.
///
/// With a `#content` element only its children are kept, minus `#nextprev`
/// and `#disqus_thread`. Otherwise the whole body is kept, preceded by the
/// page's own `<meta>` elements so they can be relocated into the head.
pub fn extract_html(text: &str) -> String {
    static CONTENT: LazyLock<scraper::Selector> = LazyLock::new(|| dom::selector("#content"));
    static STALE: LazyLock<scraper::Selector> =
        LazyLock::new(|| dom::selector("#nextprev, #disqus_thread"));
    static BODY: LazyLock<scraper::Selector> = LazyLock::new(|| dom::selector("body"));
    static HEAD_META: LazyLock<scraper::Selector> =
        LazyLock::new(|| dom::selector("head meta[name], head meta[property]"));

    let doc = Document::parse_document(text);
    let mut edits = Edits::new();

    let extracted = match doc.first(&CONTENT) {
        Some(content) => {
            for stale in content.select(&STALE) {
                edits.remove(stale);
            }
            doc.inner_html(content, &edits)
        }
        None => {
            let mut out = String::new();
            for meta in doc.select(&HEAD_META) {
                if meta.value().attr("name") == Some("viewport") {
                    continue;
                }
                out.push_str(&dom::outer_html(meta));
                out.push('\n');
            }
            if let Some(body) = doc.first(&BODY) {
                out.push_str(&doc.inner_html(body, &edits));
            }
            out
        }
    };

    strip_indentation(&extracted).into_owned()
}

/// Remove leading spaces and tabs from every line.
pub fn strip_indentation(html: &str) -> Cow<'_, str> {
    LEADING_INDENT.replace_all(html, "")
}
