//! Parsed HTML with an edit overlay and a single serialization pass.
//!
//! Source documents, header/footer fragments and assembled pages are parsed
//! once with [`scraper`], queried with CSS selectors, and written back out
//! exactly once. Changes are not made by splicing strings: callers record
//! [`Edit`]s against elements, and [`Document::to_html`] applies them while
//! walking the tree.
//!
//! The serializer also owns depth relinking: when given a [`Depth`], every
//! `href`/`src` attribute that starts with `./` or `../` is rewritten so a
//! shared fragment works from the output root and from `posts/`.

use maud::html;
use scraper::html::Select;
use scraper::{ElementRef, Html, Node, Selector};
use std::borrow::Cow;

use crate::types::Depth;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text children html5ever keeps unescaped. `noscript`
/// belongs here because documents are parsed with scripting enabled.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

const LINK_ATTRIBUTES: &[&str] = &["href", "src", "poster", "action"];

/// A change applied to one element at serialization time.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Drop the element and everything inside it.
    Remove,
    /// Write this markup in place of the element.
    Replace(String),
    /// Override one attribute value.
    SetAttr { name: String, value: String },
    /// Write this markup after the element's existing children.
    Append(String),
    /// Leave links inside this element as written when relinking.
    KeepLinks,
}

/// Edits recorded against the elements of one [`Document`].
#[derive(Debug, Default)]
pub struct Edits<'a> {
    entries: Vec<(ElementRef<'a>, Edit)>,
}

impl<'a> Edits<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn remove(&mut self, element: ElementRef<'a>) {
        self.entries.push((element, Edit::Remove));
    }

    pub fn replace(&mut self, element: ElementRef<'a>, markup: impl Into<String>) {
        self.entries.push((element, Edit::Replace(markup.into())));
    }

    pub fn set_attr(&mut self, element: ElementRef<'a>, name: &str, value: impl Into<String>) {
        self.entries.push((
            element,
            Edit::SetAttr {
                name: name.to_string(),
                value: value.into(),
            },
        ));
    }

    pub fn append(&mut self, element: ElementRef<'a>, markup: impl Into<String>) {
        self.entries.push((element, Edit::Append(markup.into())));
    }

    pub fn keep_links(&mut self, element: ElementRef<'a>) {
        self.entries.push((element, Edit::KeepLinks));
    }

    /// Text of `element` as it will be written: removed or replaced
    /// descendants contribute nothing.
    pub fn visible_text(&self, element: ElementRef<'_>) -> String {
        let mut out = String::new();
        self.collect_visible_text(element, &mut out);
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_visible_text(&self, element: ElementRef<'_>, out: &mut String) {
        if self.structural(element).is_some() {
            return;
        }
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.collect_visible_text(child_element, out);
                    }
                }
                _ => {}
            }
        }
    }

    /// Also remove every `<p>` left with nothing but whitespace once the
    /// elements already marked for removal are gone.
    pub fn remove_emptied_paragraphs(&mut self) {
        let removed: Vec<ElementRef<'a>> = self
            .entries
            .iter()
            .filter(|(_, edit)| matches!(edit, Edit::Remove))
            .map(|(el, _)| *el)
            .collect();

        let mut emptied: Vec<ElementRef<'a>> = Vec::new();
        for el in &removed {
            let Some(parent) = el.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            if parent.value().name() != "p" || emptied.iter().any(|p| p.id() == parent.id()) {
                continue;
            }
            let only_removed = parent.children().all(|child| match child.value() {
                Node::Text(text) => text.trim().is_empty(),
                Node::Element(_) => removed.iter().any(|r| r.id() == child.id()),
                _ => true,
            });
            if only_removed {
                emptied.push(parent);
            }
        }

        for p in emptied {
            self.remove(p);
        }
    }

    /// Structural edits win over attribute edits on the same element.
    fn structural(&self, element: ElementRef<'_>) -> Option<&Edit> {
        self.entries
            .iter()
            .filter(|(target, _)| target.id() == element.id())
            .map(|(_, edit)| edit)
            .find(|edit| matches!(edit, Edit::Remove | Edit::Replace(_)))
    }

    fn edits_for<'s>(&'s self, element: ElementRef<'_>) -> impl Iterator<Item = &'s Edit> {
        let id = element.id();
        self.entries
            .iter()
            .filter(move |(target, _)| target.id() == id)
            .map(|(_, edit)| edit)
    }

    fn attr_override(&self, element: ElementRef<'_>, attr: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(target, _)| target.id() == element.id())
            .find_map(|(_, edit)| match edit {
                Edit::SetAttr { name, value } if name == attr => Some(value.as_str()),
                _ => None,
            })
    }
}

/// A parsed HTML document or fragment.
pub struct Document {
    html: Html,
    fragment: bool,
}

impl Document {
    /// Parse a full document (doctype, `<html>`, `<head>`, `<body>`).
    pub fn parse_document(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            fragment: false,
        }
    }

    /// Parse a body-context fragment such as a header or rendered Markdown.
    pub fn parse_fragment(source: &str) -> Self {
        Self {
            html: Html::parse_fragment(source),
            fragment: true,
        }
    }

    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.html.select(selector)
    }

    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// Serialize the whole document, applying `edits` and optional relinking.
    pub fn to_html(&self, edits: &Edits<'_>, depth: Option<Depth>) -> String {
        let writer = Writer { edits, depth };
        let mut out = String::new();
        let root = self.html.root_element();
        if self.fragment {
            writer.write_children(&mut out, root);
        } else {
            out.push_str("<!DOCTYPE html>\n");
            writer.write_element(&mut out, root);
        }
        out
    }

    /// Serialize only the children of `element`.
    pub fn inner_html(&self, element: ElementRef<'_>, edits: &Edits<'_>) -> String {
        let writer = Writer { edits, depth: None };
        let mut out = String::new();
        writer.write_children(&mut out, element);
        out
    }
}

/// Serialize `element` itself, without edits.
pub fn outer_html(element: ElementRef<'_>) -> String {
    let edits = Edits::new();
    let writer = Writer {
        edits: &edits,
        depth: None,
    };
    let mut out = String::new();
    writer.write_element(&mut out, element);
    out
}

/// Concatenated text content of an element, trimmed.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Rewrite relative link prefixes of a fragment for the given depth.
pub fn relink(fragment: &str, depth: Depth) -> String {
    Document::parse_fragment(fragment).to_html(&Edits::new(), Some(depth))
}

/// Rewrite one link value for a document at `depth`.
///
/// Root documents turn `../x` into `./x`; nested documents turn `./x` into
/// `../x`. Anything else is left alone.
pub fn relink_value(value: &str, depth: Depth) -> Cow<'_, str> {
    match depth {
        Depth::Root => match value.strip_prefix("../") {
            Some(rest) => Cow::Owned(format!("./{rest}")),
            None => Cow::Borrowed(value),
        },
        Depth::Nested => match value.strip_prefix("./") {
            Some(rest) => Cow::Owned(format!("../{rest}")),
            None => Cow::Borrowed(value),
        },
    }
}

/// Parse a selector known at compile time.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

struct Writer<'e, 'a> {
    edits: &'e Edits<'a>,
    depth: Option<Depth>,
}

impl Writer<'_, '_> {
    fn write_element(&self, out: &mut String, element: ElementRef<'_>) {
        self.write_element_at(out, element, self.depth);
    }

    fn write_children(&self, out: &mut String, element: ElementRef<'_>) {
        self.write_children_at(out, element, self.depth);
    }

    fn write_element_at(&self, out: &mut String, element: ElementRef<'_>, depth: Option<Depth>) {
        match self.edits.structural(element) {
            Some(Edit::Remove) => return,
            Some(Edit::Replace(markup)) => {
                out.push_str(markup);
                return;
            }
            _ => {}
        }

        let depth = if self
            .edits
            .edits_for(element)
            .any(|edit| matches!(edit, Edit::KeepLinks))
        {
            None
        } else {
            depth
        };

        let name = element.value().name();
        out.push('<');
        out.push_str(name);
        for (attr, value) in element.value().attrs() {
            let value = self.edits.attr_override(element, attr).unwrap_or(value);
            let value = match depth {
                Some(depth) if LINK_ATTRIBUTES.contains(&attr) => relink_value(value, depth),
                _ => Cow::Borrowed(value),
            };
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            out.push_str(&escape(&value));
            out.push('"');
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&name) {
            return;
        }
        self.write_children_at(out, element, depth);
        for edit in self.edits.edits_for(element) {
            if let Edit::Append(markup) = edit {
                out.push_str(markup);
            }
        }
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }

    fn write_children_at(&self, out: &mut String, element: ElementRef<'_>, depth: Option<Depth>) {
        let raw_text = RAW_TEXT_ELEMENTS.contains(&element.value().name());
        for child in element.children() {
            match child.value() {
                Node::Text(text) if raw_text => out.push_str(text),
                Node::Text(text) => out.push_str(&escape(text)),
                Node::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                }
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.write_element_at(out, child_element, depth);
                    }
                }
                _ => {}
            }
        }
    }
}
