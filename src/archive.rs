//! Archive placeholders.
//!
//! A document may ask for a listing of recent posts:
//!
//! ```html
//! <archive count="5" more="archive"></archive>
//! ```
//!
//! Each placeholder is replaced by a `div#postlistdiv` list of the `count`
//! newest posts (all of them when `count` is missing, zero or not a number),
//! one `date » title` link per post. When `more` is set and posts remain
//! beyond the listed ones, a final `» more posts` item links to `<more>.html`.

use maud::{Markup, html};
use scraper::{ElementRef, Node, Selector};
use std::path::Path;
use std::sync::LazyLock;

use crate::dom::{self, Document, Edits};
use crate::registry::PostRegistry;
use crate::types::{Depth, Warnings};
use crate::walk::POSTS_DIR;

static ARCHIVE: LazyLock<Selector> = LazyLock::new(|| dom::selector("archive"));

/// Attributes of one `<archive>` placeholder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveRequest {
    /// `None` lists every post.
    pub count: Option<usize>,
    /// Page stem for the "more posts" link.
    pub more: Option<String>,
}

impl ArchiveRequest {
    pub fn from_element(element: ElementRef<'_>) -> Self {
        let value = element.value();
        let count = value
            .attr("count")
            .and_then(|c| c.trim().parse::<usize>().ok())
            .filter(|c| *c > 0);
        let more = value
            .attr("more")
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        Self { count, more }
    }
}

/// Listing markup for one request, linking posts relative to `depth`.
pub fn render_listing(registry: &PostRegistry, request: &ArchiveRequest, depth: Depth) -> Markup {
    let listed = registry.recent(request.count);
    let more = request
        .more
        .as_deref()
        .filter(|_| listed.len() < registry.len());

    html! {
        div id="postlistdiv" {
            ul {
                @for entry in listed {
                    li {
                        a href={ (depth.prefix()) (POSTS_DIR) "/" (entry.archive_name) ".html" } {
                            (entry.date) " » " (entry.title)
                        }
                    }
                }
                @if let Some(more) = more {
                    li.moreposts {
                        a href={ (more) ".html" } { "» more posts" }
                    }
                }
            }
        }
    }
}

/// Replace every archive placeholder of `doc`. Returns how many were found.
///
/// With no posts at all the placeholders are removed and a warning recorded.
/// A placeholder that is the only content of its paragraph replaces the
/// paragraph as well, so the listing is not nested inside a `<p>`.
pub fn expand<'a>(
    doc: &'a Document,
    edits: &mut Edits<'a>,
    registry: &PostRegistry,
    depth: Depth,
    path: &Path,
    warnings: &mut Warnings,
) -> usize {
    let placeholders: Vec<ElementRef<'a>> = doc.select(&ARCHIVE).collect();
    if placeholders.is_empty() {
        return 0;
    }

    if registry.is_empty() {
        for placeholder in &placeholders {
            edits.remove(*placeholder);
        }
        warnings.push(
            Some(path),
            "has an <archive> placeholder but the site has no posts; removed",
        );
        return placeholders.len();
    }

    for placeholder in &placeholders {
        let markup = render_listing(registry, &ArchiveRequest::from_element(*placeholder), depth)
            .into_string();
        match sole_paragraph_parent(*placeholder) {
            Some(paragraph) => edits.replace(paragraph, markup),
            None => edits.replace(*placeholder, markup),
        }
    }
    placeholders.len()
}

fn sole_paragraph_parent(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let parent = element.parent().and_then(ElementRef::wrap)?;
    if parent.value().name() != "p" {
        return None;
    }
    let alone = parent.children().all(|child| match child.value() {
        Node::Text(text) => text.trim().is_empty(),
        _ => child.id() == element.id(),
    });
    alone.then_some(parent)
}
