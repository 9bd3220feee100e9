//! Leading metadata blocks in Markdown/text sources.
//!
//! ```text
//! ---
//! title: Night Walk
//! category: photography
//! tags:
//!   - 🔞 mature
//!   - city
//! pinned: true
//! dir: rtl
//! ---
//! Body text starts here.
//! ```
//!
//! Only top-level `key: value` lines are read. `tags` also takes the `- item`
//! lines directly below it. Unknown keys are ignored, and a file without the
//! block simply has no front matter.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::types::Direction;

static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A---[ \t]*\r?\n((?:.*\r?\n)*?)---[ \t]*(?:\r?\n|\z)").unwrap()
});

static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\w+):(.*)((?:\n[ \t]*-.*)+)?").unwrap());

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*-[ \t]?(.+?)\r?$").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub pinned: bool,
    pub direction: Direction,
}

impl FrontMatter {
    /// Whether any tag carries the given prefix (used for the adult marker).
    pub fn any_tag_starts_with(&self, prefix: &str) -> bool {
        self.tags.iter().any(|t| t.starts_with(prefix))
    }
}

/// Split a source into its front matter (if any) and the remaining body.
pub fn split(text: &str) -> (Option<FrontMatter>, &str) {
    match BLOCK.captures(text) {
        Some(caps) => {
            let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            (Some(deserialize(body)), &text[whole..])
        }
        None => (None, text),
    }
}

/// Parse only the front matter of a source.
pub fn parse(text: &str) -> Option<FrontMatter> {
    split(text).0
}

fn deserialize(block: &str) -> FrontMatter {
    let mut fm = FrontMatter::default();
    for caps in ENTRY.captures_iter(block) {
        let key = &caps[1];
        let value = clean_value(&caps[2]);
        match key {
            "title" => fm.title = Some(value.to_string()),
            "category" => fm.category = Some(value.to_string()),
            "tags" => {
                fm.tags = caps
                    .get(3)
                    .map(|items| {
                        LIST_ITEM
                            .captures_iter(items.as_str())
                            .map(|item| item[1].to_string())
                            .collect()
                    })
                    .unwrap_or_default();
            }
            "pinned" => fm.pinned = value == "true",
            "dir" => {
                fm.direction = if value == "rtl" {
                    Direction::Rtl
                } else {
                    Direction::Ltr
                }
            }
            _ => continue,
        }
    }
    fm
}

/// Drop the single space conventionally written after the colon and any
/// carriage return; everything else is kept verbatim.
fn clean_value(raw: &str) -> &str {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    raw.strip_prefix(' ').unwrap_or(raw)
}
