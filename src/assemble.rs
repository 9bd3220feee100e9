//! Document assembly: one source file in, one finished HTML document out.
//!
//! Runs after the post registry is complete. For every page and post:
//!
//! 1. Derive title and date from the filename (and front matter).
//! 2. Parse the source into a body fragment.
//! 3. Build the page around it with the maud template: head, header,
//!    article (with heading, navigation and discussion snippet for posts),
//!    footer.
//! 4. Parse the page once and record edits against it: relocated head
//!    metadata, the inline style directive, the feed description node and
//!    archive placeholders.
//! 5. Serialize once, relinking relative paths for the document's depth.
//!
//! Problems with a single document become warnings and the document is
//! skipped; assembly never fails the build.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use scraper::Selector;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;

use crate::archive;
use crate::chrome::Chrome;
use crate::config::SiteConfig;
use crate::content;
use crate::dom::{self, Document, Edits};
use crate::feed::{self, FeedBuilder, FeedItem};
use crate::head::{self, ArticleContext, HeadNodeSet};
use crate::naming;
use crate::registry::{Neighbors, PostRegistry};
use crate::types::{ContentUnit, Depth, Direction, UnitKind, Warnings};
use crate::walk::POSTS_DIR;

static HEAD: LazyLock<Selector> = LazyLock::new(|| dom::selector("head"));
static ARTICLE: LazyLock<Selector> = LazyLock::new(|| dom::selector("article#content"));
static ARTICLE_PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| dom::selector("article#content p"));
static NAV: LazyLock<Selector> = LazyLock::new(|| dom::selector("nav#nextprev"));
static STYLE_DIRECTIVE: LazyLock<Selector> = LazyLock::new(|| dom::selector("body style"));
static SITE_STYLESHEET: LazyLock<Selector> =
    LazyLock::new(|| dom::selector(r#"head link[rel="stylesheet"]"#));
static FEED_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| dom::selector("rss"));

/// A finished document waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    /// Path relative to the output root, e.g. `posts/hello.html`.
    pub output_path: PathBuf,
    pub html: String,
    pub title: String,
    pub kind: UnitKind,
    pub source: PathBuf,
}

/// Title, date and flags of the document being assembled.
struct Identity {
    archive_name: String,
    title: String,
    date: Option<chrono::NaiveDate>,
    suppress_heading: bool,
    direction: Direction,
    adult: bool,
}

pub struct Assembler<'s> {
    registry: &'s PostRegistry,
    chrome: &'s Chrome,
    config: &'s SiteConfig,
    /// Output-relative path of the site stylesheet, e.g. `style/style.css`.
    stylesheet: String,
}

impl<'s> Assembler<'s> {
    pub fn new(
        registry: &'s PostRegistry,
        chrome: &'s Chrome,
        config: &'s SiteConfig,
        stylesheet: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            chrome,
            config,
            stylesheet: stylesheet.into(),
        }
    }

    /// Assemble one content unit. `None` means it was skipped with a warning.
    pub fn assemble(
        &self,
        unit: &ContentUnit,
        head: &mut HeadNodeSet,
        feed: &mut FeedBuilder,
        warnings: &mut Warnings,
    ) -> Option<RenderedDocument> {
        let path = unit.path.as_path();
        let is_post = unit.kind == UnitKind::Post;

        let Some(format) = unit.format else {
            warnings.push(
                Some(path),
                "is not a supported file type (or is an image that belongs in images/), will not be built",
            );
            return None;
        };

        let stem = path.file_stem()?.to_string_lossy().into_owned();
        let parsed_name = naming::parse_entry_name(&stem);
        if is_post && parsed_name.date.is_none() {
            warnings.push(
                Some(path),
                "has no date or an invalid date prepending the filename (expected yyyy-MM-dd-), will not be built",
            );
            return None;
        }

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warnings.push(Some(path), format!("could not be read: {e}"));
                return None;
            }
        };
        let source = content::parse(format, &text);
        if source.is_empty() {
            warnings.push(Some(path), "is empty, will not be built");
            return None;
        }

        let front_matter = source.front_matter.clone().unwrap_or_default();
        let identity = Identity {
            title: front_matter
                .title
                .clone()
                .unwrap_or_else(|| parsed_name.title.clone()),
            archive_name: parsed_name.archive_name,
            date: parsed_name.date,
            suppress_heading: parsed_name.suppress_heading,
            direction: front_matter.direction,
            adult: front_matter.any_tag_starts_with(&self.config.metadata.adult_tag_prefix),
        };
        if identity.archive_name.is_empty() || identity.title.trim().is_empty() {
            warnings.push(Some(path), "has no title in its filename, will not be built");
            return None;
        }

        let depth = Depth::for_kind(unit.kind);
        let page = self.page_template(unit.kind, &identity, &source.html, head, depth);
        let doc = Document::parse_document(&page.into_string());
        let mut edits = Edits::new();

        apply_style_directive(&doc, &mut edits);
        self.emit_feed_item(&doc, &mut edits, unit, &identity, feed, warnings);
        archive::expand(&doc, &mut edits, self.registry, depth, path, warnings);

        // Directives are already marked, so their text never reaches the head.
        if let Some(article) = doc.first(&ARTICLE) {
            let ctx = ArticleContext {
                path,
                title: &identity.title,
                is_post,
                adult: identity.adult,
            };
            let nodes =
                head::extract_article_meta(article, &mut edits, ctx, &self.config.metadata, warnings);
            head.add_article(nodes);
        }
        edits.remove_emptied_paragraphs();

        if let Some(nav) = doc.first(&NAV) {
            edits.keep_links(nav);
        }
        let article_nodes = head.flush_article();
        if let Some(head_el) = doc.first(&HEAD).filter(|_| !article_nodes.is_empty()) {
            edits.append(head_el, dom::relink(&article_nodes.concat(), depth));
        }

        let output_path = match unit.kind {
            UnitKind::Post => PathBuf::from(POSTS_DIR).join(format!("{}.html", identity.archive_name)),
            _ => PathBuf::from(format!("{}.html", identity.archive_name)),
        };
        debug!(path = %path.display(), output = %output_path.display(), "assembled");

        Some(RenderedDocument {
            output_path,
            html: doc.to_html(&edits, Some(depth)),
            title: identity.title,
            kind: unit.kind,
            source: unit.path.clone(),
        })
    }

    fn page_template(
        &self,
        kind: UnitKind,
        identity: &Identity,
        content: &str,
        head: &HeadNodeSet,
        depth: Depth,
    ) -> Markup {
        let is_post = kind == UnitKind::Post;
        let show_heading = is_post && !identity.suppress_heading;
        let dir = (identity.direction == Direction::Rtl).then_some("rtl");

        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (identity.title) }
                    link rel="stylesheet" href={ (depth.prefix()) (self.stylesheet) };
                    @for node in head.universal() {
                        (PreEscaped(node))
                    }
                }
                body {
                    div id="container" {
                        header id="header" { (PreEscaped(&self.chrome.header)) }
                        article id="content" dir=[dir] {
                            @if show_heading {
                                h1 { (identity.title) }
                                @if let Some(date) = identity.date {
                                    h4 { (naming::format_display_date(date)) }
                                }
                            }
                            (PreEscaped(content))
                            @if is_post {
                                (self.navigation(&identity.title))
                                @if let Some(discussion) = &self.chrome.discussion {
                                    (PreEscaped(discussion))
                                }
                            }
                        }
                        footer id="footer" { (PreEscaped(&self.chrome.footer)) }
                    }
                }
            }
        }
    }

    /// Next/previous links for the post titled `title`.
    ///
    /// The post is located by title; when it is not in the registry only the
    /// Home link is shown.
    fn navigation(&self, title: &str) -> Markup {
        let neighbors = self
            .registry
            .position_by_title(title)
            .map(|index| self.registry.neighbors(index))
            .unwrap_or(Neighbors {
                newer: None,
                older: None,
            });

        html! {
            nav id="nextprev" {
                @if let Some(newer) = neighbors.newer {
                    a href={ "./" (newer.archive_name) ".html" } { "« Next Post" }
                    " | "
                }
                a href="../index.html" { "Home" }
                @if let Some(older) = neighbors.older {
                    " | "
                    a href={ "./" (older.archive_name) ".html" } { "Previous Post »" }
                }
            }
        }
    }

    /// Append this post to the feed and drop its `<rss>` description node.
    fn emit_feed_item<'a>(
        &self,
        doc: &'a Document,
        edits: &mut Edits<'a>,
        unit: &ContentUnit,
        identity: &Identity,
        feed: &mut FeedBuilder,
        warnings: &mut Warnings,
    ) {
        let path = unit.path.as_path();
        let description_node = doc.first(&FEED_DESCRIPTION);
        for node in doc.select(&FEED_DESCRIPTION) {
            edits.remove(node);
        }

        if unit.kind != UnitKind::Post {
            return;
        }
        let (Some(channel), Some(published)) = (feed.channel(), identity.date) else {
            if description_node.is_some() {
                warnings.push(
                    Some(path),
                    "has an <rss> tag but RSS is not set up in the header; removed",
                );
            }
            return;
        };

        let text = match description_node {
            Some(node) => dom::text_of(node)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            None => doc
                .select(&ARTICLE_PARAGRAPH)
                .map(|paragraph| edits.visible_text(paragraph))
                .find(|text| !text.is_empty())
                .unwrap_or_default(),
        };

        let item = FeedItem {
            title: identity.title.clone(),
            description: feed::truncate_description(&text, self.config.feed.description_limit),
            link: channel.post_link(&identity.archive_name),
            published,
        };
        if let Err(e) = feed.push(item) {
            warnings.push(Some(path), format!("could not be added to the feed: {e}"));
        }
    }
}

/// Swap the site stylesheet for the one named by a `<style>` node in the body.
///
/// The last `style` in the stylesheet href is replaced by the node's text,
/// so `<style>dark</style>` turns `./style/style.css` into
/// `./style/dark.css`. The node itself is removed.
fn apply_style_directive<'a>(doc: &'a Document, edits: &mut Edits<'a>) {
    let Some(directive) = doc.first(&STYLE_DIRECTIVE) else {
        return;
    };
    edits.remove(directive);

    let name = dom::text_of(directive);
    let Some(link) = doc.first(&SITE_STYLESHEET) else {
        return;
    };
    let Some(href) = link.value().attr("href") else {
        return;
    };
    if let Some(href) = replace_last_style(href, &name) {
        edits.set_attr(link, "href", href);
    }
}

fn replace_last_style(href: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let at = href.rfind("style")?;
    Some(format!("{}{}{}", &href[..at], name, &href[at + "style".len()..]))
}
