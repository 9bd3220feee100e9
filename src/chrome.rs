//! Site chrome: the header and footer shared by every document.
//!
//! Both are required root files (`header.*`, `footer.*`) written in Markdown
//! or HTML. Besides their visible markup they carry the site-wide directives:
//!
//! | Directive | Effect |
//! |---|---|
//! | `<rss-title>`, `<rss-description>`, `<rss-link>` | All three open the feed |
//! | `<rss-language>`, `<rss-ttl>` | Optional channel values |
//! | `<disqus>` | Its markup is appended to every post |
//! | `<zone>` | Wrapper for the above, removed with its content |
//! | `<meta>` | Moved into the head of every document |
//!
//! Every directive is removed from the visible fragment.

use scraper::Selector;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::info;

use crate::config::FeedConfig;
use crate::content::{self, SourceFormat};
use crate::dom::{self, Document, Edits};
use crate::feed::ChannelMeta;
use crate::types::Warnings;
use crate::walk::SourceTree;

static RSS_TITLE: LazyLock<Selector> = LazyLock::new(|| dom::selector("rss-title"));
static RSS_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| dom::selector("rss-description"));
static RSS_LINK: LazyLock<Selector> = LazyLock::new(|| dom::selector("rss-link"));
static RSS_LANGUAGE: LazyLock<Selector> = LazyLock::new(|| dom::selector("rss-language"));
static RSS_TTL: LazyLock<Selector> = LazyLock::new(|| dom::selector("rss-ttl"));
static DISQUS: LazyLock<Selector> = LazyLock::new(|| dom::selector("disqus"));
static ZONE: LazyLock<Selector> = LazyLock::new(|| dom::selector("zone"));
static META: LazyLock<Selector> = LazyLock::new(|| dom::selector("meta"));

#[derive(Error, Debug)]
pub enum ChromeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No header file in the source root: {0}")]
    MissingHeader(PathBuf),
    #[error("No footer file in the source root: {0}")]
    MissingFooter(PathBuf),
    #[error("Required file is empty: {0}")]
    EmptyRequiredFile(PathBuf),
}

/// Header and footer fragments plus the directives they declared.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    /// Header markup with directives removed, links as written.
    pub header: String,
    pub footer: String,
    /// `<meta>` elements found in either fragment.
    pub universal_meta: Vec<String>,
    /// Channel metadata, when the feed directives are present.
    pub feed: Option<ChannelMeta>,
    /// Discussion snippet appended to every post.
    pub discussion: Option<String>,
}

/// One parsed chrome file before assembly into [`Chrome`].
struct Part {
    visible: String,
    meta: Vec<String>,
    feed: Option<ChannelMeta>,
    discussion: Option<String>,
}

impl Chrome {
    /// Load `header.*` and `footer.*` from the root of `tree`.
    pub fn load(
        tree: &SourceTree,
        feed_defaults: &FeedConfig,
        warnings: &mut Warnings,
    ) -> Result<Self, ChromeError> {
        let header_path = tree
            .root_file("header")
            .ok_or_else(|| ChromeError::MissingHeader(tree.root.clone()))?;
        let footer_path = tree
            .root_file("footer")
            .ok_or_else(|| ChromeError::MissingFooter(tree.root.clone()))?;

        let header = load_part(header_path, feed_defaults)?;
        let footer = load_part(footer_path, feed_defaults)?;

        let feed = header.feed.or(footer.feed);
        match &feed {
            Some(meta) => info!(title = %meta.title, link = %meta.link, "feed enabled"),
            None => warnings.push(
                Some(header_path),
                "declares no <rss-title>, <rss-description> and <rss-link>; RSS will not be built",
            ),
        }

        let mut universal_meta = header.meta;
        universal_meta.extend(footer.meta);

        Ok(Chrome {
            header: header.visible,
            footer: footer.visible,
            universal_meta,
            feed,
            discussion: header.discussion.or(footer.discussion),
        })
    }
}

fn load_part(path: &Path, feed_defaults: &FeedConfig) -> Result<Part, ChromeError> {
    let text = fs::read_to_string(path)?;
    // Extension was checked when the root file was found by stem; anything
    // unrecognised is read as HTML.
    let format = SourceFormat::from_path(path).unwrap_or(SourceFormat::Html);
    let parsed = content::parse(format, &text);
    if parsed.is_empty() {
        return Err(ChromeError::EmptyRequiredFile(path.to_path_buf()));
    }
    Ok(extract_directives(&parsed.html, feed_defaults))
}

/// Split a chrome fragment into its visible markup and its directives.
fn extract_directives(html: &str, feed_defaults: &FeedConfig) -> Part {
    let doc = Document::parse_fragment(html);
    let mut edits = Edits::new();

    let title = doc.first(&RSS_TITLE);
    let description = doc.first(&RSS_DESCRIPTION);
    let link = doc.first(&RSS_LINK);
    let feed = match (title, description, link) {
        (Some(title), Some(description), Some(link)) => {
            let language = doc
                .first(&RSS_LANGUAGE)
                .map(dom::text_of)
                .unwrap_or_else(|| feed_defaults.language.clone());
            let ttl = doc
                .first(&RSS_TTL)
                .map(dom::text_of)
                .unwrap_or_else(|| feed_defaults.ttl.to_string());
            Some(ChannelMeta::new(
                dom::text_of(title),
                dom::text_of(description),
                dom::text_of(link),
                language,
                ttl,
            ))
        }
        _ => None,
    };

    for selector in [
        &*RSS_TITLE,
        &*RSS_DESCRIPTION,
        &*RSS_LINK,
        &*RSS_LANGUAGE,
        &*RSS_TTL,
    ] {
        for el in doc.select(selector) {
            edits.remove(el);
        }
    }

    let discussion = doc.first(&DISQUS).map(|el| {
        let snippet = doc.inner_html(el, &Edits::new());
        edits.remove(el);
        snippet.trim().to_string()
    });

    for zone in doc.select(&ZONE) {
        edits.remove(zone);
    }

    let meta: Vec<String> = doc
        .select(&META)
        .map(|el| {
            edits.remove(el);
            dom::outer_html(el)
        })
        .collect();

    edits.remove_emptied_paragraphs();

    Part {
        visible: doc.to_html(&edits, None),
        meta,
        feed,
        discussion: discussion.filter(|d| !d.is_empty()),
    }
}
