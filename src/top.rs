//! Defines [`Top`], a standalone page living directly under the base
//! directory (e.g. `about.md`). Top pages share the entry parse contract
//! minus date, author, and tags, and are keyed only by title.

use crate::frontmatter;
use crate::markdown;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Top {
    pub source_path: PathBuf,

    /// Source file name without the `.md` extension; the output file is
    /// `<file_stem>.html` at the output root.
    pub file_stem: String,

    pub title: String,
    pub modified: Option<DateTime<Utc>>,
    pub rendered_html: String,
}

impl Top {
    /// Reads and parses the markdown document at `source`. `link_base`, when
    /// given, absolutizes relative links the same way entries do.
    pub fn parse(source: &Path, link_base: Option<&::url::Url>) -> Result<Top, Error> {
        let file_stem = source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_owned)
            .ok_or_else(|| Error::Name {
                path: source.to_owned(),
            })?;

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
        let header = frontmatter::decode_top(yaml).map_err(|err| Error::Header {
            path: source.to_owned(),
            err,
        })?;

        Ok(Top {
            source_path: source.to_owned(),
            file_stem,
            title: header.title,
            modified: fs::metadata(source)
                .and_then(|meta| meta.modified())
                .map(DateTime::<Utc>::from)
                .ok(),
            rendered_html: markdown::to_html(body, link_base),
        })
    }
}

/// Represents a failure to parse a top page. Every variant names the source
/// file.
#[derive(Debug)]
pub enum Error {
    /// The file name is not valid UTF-8 or has no stem.
    Name { path: PathBuf },

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
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Name { path } => {
                write!(f, "unusable top page file name '{}'", path.display())
            }
            Error::Read { path, err } => {
                write!(f, "reading top page '{}': {}", path.display(), err)
            }
            Error::Document { path, err } => {
                write!(f, "parsing top page '{}': {}", path.display(), err)
            }
            Error::Header { path, err } => {
                write!(f, "parsing top page header '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Name { .. } => None,
            Error::Read { err, .. } => Some(err),
            Error::Document { err, .. } => Some(err),
            Error::Header { err, .. } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_top() -> Result<(), Error> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("about.md");
        fs::write(&path, "---\ntitle: about\n---\nhello there\n").unwrap();

        let top = Top::parse(&path, None)?;
        assert_eq!("about", top.title);
        assert_eq!("about", top.file_stem);
        assert!(top.rendered_html.contains("hello there"));
        Ok(())
    }

    #[test]
    fn test_parse_top_missing_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("about.md");
        fs::write(&path, "---\ndraft: false\n---\nhello\n").unwrap();

        assert!(matches!(Top::parse(&path, None), Err(Error::Header { .. })));
    }
}
