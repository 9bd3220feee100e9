//! # Pressroom
//!
//! A static site builder for one author's pages, dated posts and RSS feed.
//! The source tree is the data source: files at the root and in ordinary
//! directories become pages, files in `posts/` become dated posts, and the
//! shared `header` and `footer` files carry the site-wide settings.
//!
//! # Architecture: Two Passes
//!
//! ```text
//! 1. Prepare   source/  →  config, source tree, header/footer, post registry
//! 2. Render    each file → finished document (in memory)
//!              then assets, documents and feed.xml → <source>-built/
//! ```
//!
//! Every post needs to know its neighbours and every archive listing needs
//! the whole post list, so the registry is complete before the first
//! document is rendered. The output directory is only touched once every
//! document has been rendered.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`walk`] | Breadth-first traversal, directory classification, root validation |
//! | [`naming`] | `yyyy-MM-dd-name_Title` filename grammar and title casing |
//! | [`frontmatter`] | Leading `---` block: title, category, tags, pinned, direction |
//! | [`registry`] | Newest-first list of every post, built before rendering |
//! | [`content`] | Markdown rendering and HTML source extraction |
//! | [`dom`] | Parsed HTML with an edit overlay and a single serialization |
//! | [`chrome`] | Header and footer fragments and their directives |
//! | [`head`] | Favicon and per-article `<head>` metadata |
//! | [`assemble`] | One source file → one finished document |
//! | [`archive`] | `<archive>` placeholders → post listings |
//! | [`feed`] | RSS 2.0 channel accumulated across the build |
//! | [`site`] | Build session: runs both passes and writes the output |
//! | [`config`] | Optional `config.toml` over stock defaults |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Shared types (`ContentUnit`, `Depth`, `Warnings`) |
//!
//! # Design Decisions
//!
//! ## Build, Then Edit, Then Serialize Once
//!
//! A document is laid out with [Maud](https://maud.lambda.xyz/), parsed once
//! with `scraper`, and changed through a recorded set of edits (remove,
//! replace, set attribute, append). Serialization applies the edits and
//! rewrites relative links for the document's depth in the same walk, so
//! every document is serialized exactly once.
//!
//! ## Warnings, Not Failures
//!
//! Only a broken source root stops the build: no index, no stylesheet, no
//! header or footer, an unreadable `config.toml`. A post without a date, an
//! empty file or an unsupported extension is skipped with a warning, and the
//! rest of the site is still built.

pub mod archive;
pub mod assemble;
pub mod chrome;
pub mod config;
pub mod content;
pub mod dom;
pub mod feed;
pub mod frontmatter;
pub mod head;
pub mod naming;
pub mod output;
pub mod registry;
pub mod site;
pub mod types;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
