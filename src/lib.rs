//! The library code for the `annal` static site generator. It turns a
//! directory tree of dated, tagged markdown documents into a static website:
//! one HTML page per entry, an index per group (e.g. per year), an index per
//! tag, a main index, RSS/Atom feeds, and a sitemap.
//!
//! The architecture breaks down into three layers:
//!
//! 1. Parsing content from source files on disk ([`crate::entry`],
//!    [`crate::top`], with [`crate::markdown`] and [`crate::frontmatter`]
//!    underneath)
//! 2. Aggregating entries into groups and tags ([`crate::index`]) and
//!    resolving URLs and output paths ([`crate::url`])
//! 3. Rendering everything to disk ([`crate::site`], with
//!    [`crate::templates`], [`crate::value`], [`crate::feed`], and
//!    [`crate::sitemap`] doing the serialization work)
//!
//! [`crate::site::Site::regenerate`] sequences the layers into one fixed,
//! single-threaded pipeline that either completes as a whole or aborts on
//! the first error. All state is rebuilt from the filesystem on every run.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod config;
pub mod entry;
pub mod feed;
pub mod frontmatter;
pub mod index;
pub mod markdown;
pub mod site;
pub mod sitemap;
pub mod templates;
pub mod top;
pub mod url;
pub mod value;
