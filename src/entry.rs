//! Defines [`Entry`], one dated, tagged markdown document, and the logic for
//! parsing it from disk. An entry is parsed exactly once at discovery time
//! and is immutable afterwards; the flat entry list and the group/tag
//! aggregates share entries via `Rc`.

use crate::frontmatter;
use crate::markdown;
use crate::url::{self, Location, Locator};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use ::url::Url as BaseUrl;

/// One dated post. Group membership and URLs are always derived from
/// [`Location`], never stored.
pub struct Entry {
    pub source_path: PathBuf,
    pub location: Location,

    pub title: String,
    pub author: String,
    pub posted: NaiveDate,
    pub modified: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub draft: bool,

    /// Explicit `summary` header field, or the rendered HTML of the
    /// document's first block.
    pub summary: String,

    pub rendered_html: String,
}

/// Knobs for parsing content items, lifted from the configuration.
#[derive(Clone, Copy, Default)]
pub struct ParseOptions {
    pub resolve_relative_links: bool,
    pub require_tags: bool,
}

impl Entry {
    /// Reads and parses the markdown document at `source`. Fails when the
    /// file is unreadable, not at entry depth, or carries an invalid header.
    pub fn parse(
        base: &Path,
        source: &Path,
        locator: &Locator,
        options: ParseOptions,
    ) -> Result<Entry, Error> {
        let location = Location::new(base, source)?;

        let link_base = match options.resolve_relative_links {
            false => None,
            true => {
                let raw = locator.entry_link_base(&location);
                Some(BaseUrl::parse(&raw).map_err(|err| Error::LinkBase {
                    path: source.to_owned(),
                    url: raw,
                    err,
                })?)
            }
        };

        let contents = fs::read_to_string(source).map_err(|err| Error::Read {
            path: source.to_owned(),
            err,
        })?;
        let (yaml, body) = markdown::split_frontmatter(&contents).map_err(|err| {
            Error::Document {
                path: source.to_owned(),
                err,
            }
        })?;
        let header = frontmatter::decode_entry(yaml, options.require_tags).map_err(|err| {
            Error::Header {
                path: source.to_owned(),
                err,
            }
        })?;

        let rendered_html = markdown::to_html(body, link_base.as_ref());
        let summary = match header.summary {
            Some(summary) => summary,
            None => markdown::first_block_html(body, link_base.as_ref()),
        };

        Ok(Entry {
            source_path: source.to_owned(),
            location,
            title: header.title,
            author: header.author,
            posted: header.posted,
            modified: modified_time(source),
            tags: header.tags,
            draft: header.draft,
            summary,
            rendered_html,
        })
    }
}

fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .ok()
}

/// Sorts entries by posted date, newest first. The sort is stable, so
/// entries posted on the same date keep their filesystem encounter order.
pub fn sort_by_date(entries: &mut [Rc<Entry>]) {
    entries.sort_by(|a, b| b.posted.cmp(&a.posted));
}

/// Represents a failure to parse an entry. Every variant names the source
/// file.
#[derive(Debug)]
pub enum Error {
    /// The file is not at entry depth under the base directory.
    Location(url::Error),

    /// The file could not be read.
    Read { path: PathBuf, err: std::io::Error },

    /// The front-matter block is malformed.
    Document {
        path: PathBuf,
        err: markdown::Error,
    },

    /// The header fields are missing or mis-typed.
    Header {
        path: PathBuf,
        err: frontmatter::Error,
    },

    /// The entry's base URL for relative links does not parse.
    LinkBase {
        path: PathBuf,
        url: String,
        err: ::url::ParseError,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Location(err) => err.fmt(f),
            Error::Read { path, err } => {
                write!(f, "reading entry '{}': {}", path.display(), err)
            }
            Error::Document { path, err } => {
                write!(f, "parsing entry '{}': {}", path.display(), err)
            }
            Error::Header { path, err } => {
                write!(f, "parsing entry header '{}': {}", path.display(), err)
            }
            Error::LinkBase { path, url, err } => write!(
                f,
                "building link base '{}' for entry '{}': {}",
                url,
                path.display(),
                err
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Location(err) => Some(err),
            Error::Read { err, .. } => Some(err),
            Error::Document { err, .. } => Some(err),
            Error::Header { err, .. } => Some(err),
            Error::LinkBase { err, .. } => Some(err),
        }
    }
}

impl From<url::Error> for Error {
    /// Converts location errors into [`Error`]. This allows us to use the
    /// `?` operator when decomposing source paths.
    fn from(err: url::Error) -> Error {
        Error::Location(err)
    }
}
