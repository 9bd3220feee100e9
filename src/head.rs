//! Head metadata: what goes into `<head>` besides the fixed template.
//!
//! Two sets of nodes are kept. The universal set lives for the whole build
//! (favicon link, `<meta>` elements from the header and footer). The article
//! set is filled while one document is assembled and emptied when that
//! document is finished. Nodes are serialized HTML elements; nothing is
//! de-duplicated.
//!
//! ## Article metadata
//!
//! For each document the article region is scanned:
//!
//! - `<meta>` elements written in the content are moved to the head.
//! - Images with absolute URLs become `og:image` candidates.
//! - Without an explicit `og:description`, one is synthesized from the first
//!   sentences of the first paragraph.
//! - A post with any tag carrying the adult prefix gets
//!   `<meta name="rating" content="adult">` instead of images and description.
//! - Posts always get `og:title` and `og:type`.
//! - Language-tagged code blocks pull in the configured highlighting assets.

use maud::html;
use scraper::{ElementRef, Selector};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::MetadataConfig;
use crate::dom::{self, Edits};
use crate::types::Warnings;
use crate::walk::IMAGES_DIR;

static META: LazyLock<Selector> = LazyLock::new(|| dom::selector("meta"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| dom::selector("img[src]"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| dom::selector("p"));
static HIGHLIGHTED_CODE: LazyLock<Selector> =
    LazyLock::new(|| dom::selector(r#"code[class*="language-"]"#));

/// Favicon candidates in `images/`, in order of preference.
const FAVICONS: &[(&str, &str)] = &[
    ("favicon.ico", "image/x-icon"),
    ("favicon.png", "image/png"),
];

#[derive(Debug, Clone, Default)]
pub struct HeadNodeSet {
    universal: Vec<String>,
    article: Vec<String>,
}

impl HeadNodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_universal(&mut self, nodes: impl IntoIterator<Item = String>) {
        self.universal.extend(nodes);
    }

    pub fn add_article(&mut self, nodes: impl IntoIterator<Item = String>) {
        self.article.extend(nodes);
    }

    pub fn universal(&self) -> &[String] {
        &self.universal
    }

    pub fn article(&self) -> &[String] {
        &self.article
    }

    /// Take the article set, leaving it empty for the next document.
    pub fn flush_article(&mut self) -> Vec<String> {
        std::mem::take(&mut self.article)
    }
}

/// Link node for the site favicon, if `images/` holds one.
pub fn resolve_favicon(root: &Path, warnings: &mut Warnings) -> Option<String> {
    let images = root.join(IMAGES_DIR);
    for (file, mime) in FAVICONS {
        if images.join(file).is_file() {
            debug!(favicon = file, "favicon found");
            return Some(favicon_node(file, mime));
        }
    }
    warnings.push(
        None,
        "no images/favicon.ico or images/favicon.png found; documents will have no favicon",
    );
    None
}

pub fn favicon_node(file: &str, mime: &str) -> String {
    let href = format!("./{IMAGES_DIR}/{file}");
    html! { link rel="icon" href=(href) type=(mime); }.into_string()
}

/// What the metadata scan needs to know about the document.
#[derive(Debug, Clone, Copy)]
pub struct ArticleContext<'c> {
    pub path: &'c Path,
    pub title: &'c str,
    pub is_post: bool,
    pub adult: bool,
}

/// Scan `article` for head metadata, marking relocated nodes for removal.
///
/// Returns the article head nodes in the order they should be written.
pub fn extract_article_meta<'a>(
    article: ElementRef<'a>,
    edits: &mut Edits<'a>,
    ctx: ArticleContext<'_>,
    config: &MetadataConfig,
    warnings: &mut Warnings,
) -> Vec<String> {
    let mut nodes = Vec::new();
    let mut has_description = false;

    for meta in article.select(&META) {
        let value = meta.value();
        if value.attr("property") == Some("og:description")
            || value.attr("name") == Some("description")
        {
            has_description = true;
        }
        nodes.push(dom::outer_html(meta));
        edits.remove(meta);
    }

    if ctx.adult {
        nodes.push(html! { meta name="rating" content="adult"; }.into_string());
    } else {
        let mut images = 0;
        for img in article.select(&IMAGE) {
            let Some(src) = img.value().attr("src") else {
                continue;
            };
            if src.starts_with("http://") || src.starts_with("https://") {
                nodes.push(html! { meta property="og:image" content=(src); }.into_string());
                images += 1;
            }
        }
        if images == 0 {
            debug!(path = %ctx.path.display(), "no absolute images for og:image");
        }

        if !has_description {
            match synthesize_description(article, edits, config.description_sentences) {
                Some(description) => nodes.push(
                    html! { meta property="og:description" content=(description); }.into_string(),
                ),
                None => warnings.push(
                    Some(ctx.path),
                    "has no paragraph to describe it; no og:description generated",
                ),
            }
        }
    }

    if ctx.is_post {
        nodes.push(html! { meta property="og:title" content=(ctx.title); }.into_string());
        nodes.push(html! { meta property="og:type" content="article"; }.into_string());
    }

    if article.select(&HIGHLIGHTED_CODE).next().is_some() {
        if let Some(href) = &config.highlight_stylesheet {
            nodes.push(html! { link rel="stylesheet" href=(href); }.into_string());
        }
        if let Some(src) = &config.highlight_script {
            nodes.push(html! { script src=(src) {} }.into_string());
        }
    }

    nodes
}

/// First sentences of the first paragraph that still has text once removed
/// directives (`<rss>`, `<style>`, relocated `<meta>`) are left out.
fn synthesize_description(
    article: ElementRef<'_>,
    edits: &Edits<'_>,
    sentences: usize,
) -> Option<String> {
    let text = article
        .select(&PARAGRAPH)
        .map(|paragraph| edits.visible_text(paragraph))
        .find(|text| !text.is_empty())?;
    Some(first_sentences(&text, sentences).to_string())
}

/// The first `n` sentences of `text`, or all of it.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or the end.
pub fn first_sentences(text: &str, n: usize) -> &str {
    let mut seen = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            seen += 1;
            if seen == n {
                return text[..i + c.len_utf8()].trim();
            }
        }
    }
    text.trim()
}
