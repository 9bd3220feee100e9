//! RSS 2.0 feed accumulated across a build.
//!
//! The feed is a small state machine:
//!
//! ```text
//! Uninitialized ──open()──▶ Open ──close()──▶ Closed
//!        └───────────────close()────────────────┘
//! ```
//!
//! Channel metadata comes from the header directives and is captured once.
//! Items are appended in the order posts are rendered (traversal order), not
//! by date. Closing serializes the channel; a feed that was never opened
//! closes to an empty string so `feed.xml` is still written.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use thiserror::Error;

use crate::types::Warnings;

/// RFC 822 date layout used for `pubDate` and `lastBuildDate`.
const RSS_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

#[derive(Error, Debug, PartialEq)]
pub enum FeedError {
    #[error("feed is not open")]
    NotOpen,
    #[error("feed channel already opened")]
    AlreadyOpen,
    #[error("feed already closed")]
    Closed,
}

/// Channel-level metadata declared by the header.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMeta {
    pub title: String,
    pub description: String,
    /// Site URL, always ending in `/`.
    pub link: String,
    pub language: String,
    pub ttl: String,
}

impl ChannelMeta {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
        language: impl Into<String>,
        ttl: impl Into<String>,
    ) -> Self {
        let mut link = link.into();
        if !link.ends_with('/') {
            link.push('/');
        }
        Self {
            title: title.into(),
            description: description.into(),
            link,
            language: language.into(),
            ttl: ttl.into(),
        }
    }

    /// Absolute URL of a rendered post.
    pub fn post_link(&self, archive_name: &str) -> String {
        format!("{}posts/{}.html", self.link, archive_name)
    }
}

/// One `<item>` of the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub published: NaiveDate,
}

#[derive(Debug)]
enum FeedState {
    Uninitialized,
    Open {
        meta: ChannelMeta,
        items: Vec<FeedItem>,
    },
    Closed,
}

#[derive(Debug)]
pub struct FeedBuilder {
    state: FeedState,
}

impl Default for FeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedBuilder {
    pub fn new() -> Self {
        Self {
            state: FeedState::Uninitialized,
        }
    }

    /// Capture channel metadata. Only valid once, before closing.
    pub fn open(&mut self, meta: ChannelMeta) -> Result<(), FeedError> {
        match self.state {
            FeedState::Uninitialized => {
                self.state = FeedState::Open {
                    meta,
                    items: Vec::new(),
                };
                Ok(())
            }
            FeedState::Open { .. } => Err(FeedError::AlreadyOpen),
            FeedState::Closed => Err(FeedError::Closed),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, FeedState::Open { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, FeedState::Closed)
    }

    pub fn channel(&self) -> Option<&ChannelMeta> {
        match &self.state {
            FeedState::Open { meta, .. } => Some(meta),
            _ => None,
        }
    }

    pub fn item_count(&self) -> usize {
        match &self.state {
            FeedState::Open { items, .. } => items.len(),
            _ => 0,
        }
    }

    pub fn push(&mut self, item: FeedItem) -> Result<(), FeedError> {
        match &mut self.state {
            FeedState::Open { items, .. } => {
                items.push(item);
                Ok(())
            }
            FeedState::Uninitialized => Err(FeedError::NotOpen),
            FeedState::Closed => Err(FeedError::Closed),
        }
    }

    /// Serialize the channel and move to `Closed`.
    ///
    /// Returns an empty string when the feed was never opened. Validation
    /// problems (an unparseable link, for instance) are recorded as warnings;
    /// the XML is still returned.
    pub fn close(
        &mut self,
        build_time: DateTime<Utc>,
        warnings: &mut Warnings,
    ) -> Result<String, FeedError> {
        match std::mem::replace(&mut self.state, FeedState::Closed) {
            FeedState::Uninitialized => Ok(String::new()),
            FeedState::Open { meta, items } => Ok(render_channel(&meta, &items, build_time, warnings)),
            FeedState::Closed => Err(FeedError::Closed),
        }
    }
}

fn render_channel(
    meta: &ChannelMeta,
    items: &[FeedItem],
    build_time: DateTime<Utc>,
    warnings: &mut Warnings,
) -> String {
    let items: Vec<rss::Item> = items
        .iter()
        .map(|item| {
            ItemBuilder::default()
                .title(item.title.clone())
                .link(item.link.clone())
                .guid(
                    GuidBuilder::default()
                        .permalink(true)
                        .value(item.link.clone())
                        .build(),
                )
                .description(item.description.clone())
                .pub_date(format_rss_date(item.published))
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(meta.title.clone())
        .link(meta.link.clone())
        .description(meta.description.clone())
        .language(meta.language.clone())
        .ttl(meta.ttl.clone())
        .last_build_date(build_time.format(RSS_DATE_FORMAT).to_string())
        .generator(format!("pressroom {}", env!("CARGO_PKG_VERSION")))
        .items(items)
        .build();

    if let Err(e) = channel.validate() {
        warnings.push(None, format!("feed validation failed: {e}"));
    }
    channel.to_string()
}

/// `pubDate` for a post published on `date` (midnight UTC).
pub fn format_rss_date(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .format(RSS_DATE_FORMAT)
        .to_string()
}

/// Cut `text` to at most `limit` characters, ending in `...` when cut.
pub fn truncate_description(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta() -> ChannelMeta {
        ChannelMeta::new("My Blog", "Notes", "https://blog.example.org", "en", "1440")
    }

    fn item(n: u32) -> FeedItem {
        FeedItem {
            title: format!("Post {n}"),
            description: "Body".into(),
            link: meta().post_link(&format!("post-{n}")),
            published: NaiveDate::from_ymd_opt(2024, 1, n).unwrap(),
        }
    }

    fn build_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn link_gets_trailing_slash() {
        assert_eq!(meta().link, "https://blog.example.org/");
        assert_eq!(
            meta().post_link("hello"),
            "https://blog.example.org/posts/hello.html"
        );
    }

    #[test]
    fn unopened_feed_closes_empty() {
        let mut feed = FeedBuilder::new();
        let mut warnings = Warnings::new();
        assert_eq!(feed.close(build_time(), &mut warnings).unwrap(), "");
        assert!(feed.is_closed());
    }

    #[test]
    fn push_before_open_is_error() {
        let mut feed = FeedBuilder::new();
        assert_eq!(feed.push(item(1)), Err(FeedError::NotOpen));
    }

    #[test]
    fn open_twice_is_error() {
        let mut feed = FeedBuilder::new();
        feed.open(meta()).unwrap();
        assert_eq!(feed.open(meta()), Err(FeedError::AlreadyOpen));
    }

    #[test]
    fn closes_exactly_once() {
        let mut feed = FeedBuilder::new();
        let mut warnings = Warnings::new();
        feed.open(meta()).unwrap();
        feed.push(item(1)).unwrap();
        assert!(feed.close(build_time(), &mut warnings).is_ok());
        assert_eq!(
            feed.close(build_time(), &mut warnings),
            Err(FeedError::Closed)
        );
        assert_eq!(feed.push(item(2)), Err(FeedError::Closed));
    }

    #[test]
    fn channel_serialized_with_items_in_push_order() {
        let mut feed = FeedBuilder::new();
        let mut warnings = Warnings::new();
        feed.open(meta()).unwrap();
        feed.push(item(1)).unwrap();
        feed.push(item(3)).unwrap();
        feed.push(item(2)).unwrap();
        let xml = feed.close(build_time(), &mut warnings).unwrap();

        assert_eq!(xml.matches("<item>").count(), 3);
        let first = xml.find("Post 1").unwrap();
        let third = xml.find("Post 3").unwrap();
        let second = xml.find("Post 2").unwrap();
        assert!(first < third && third < second);
        assert!(xml.contains("<title>My Blog</title>"));
        assert!(xml.contains("<language>en</language>"));
        assert!(xml.contains("<ttl>1440</ttl>"));
        assert!(xml.contains("<lastBuildDate>Thu, 01 Feb 2024 12:30:00 +0000</lastBuildDate>"));
        assert!(xml.contains("<pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>"));
        assert!(xml.contains("https://blog.example.org/posts/post-1.html"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn truncation_keeps_short_text() {
        assert_eq!(truncate_description("short", 500), "short");
        let exact = "a".repeat(500);
        assert_eq!(truncate_description(&exact, 500), exact);
    }

    #[test]
    fn truncation_cuts_to_limit_with_ellipsis() {
        let long = "b".repeat(501);
        let cut = truncate_description(&long, 500);
        assert_eq!(cut.chars().count(), 500);
        assert!(cut.ends_with("..."));
        assert_eq!(&cut[..497], &long[..497]);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let long = "é".repeat(600);
        let cut = truncate_description(&long, 500);
        assert_eq!(cut.chars().count(), 500);
    }
}
