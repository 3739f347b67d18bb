//! URL joining and path resolution. Everything addressable on the generated
//! site (the root index, entries, groups, tags, top pages) gets its URLs and
//! output file paths from the [`Locator`], which is a pure function of the
//! configuration. Entry identity is derived from the source path via
//! [`Location`] rather than stored anywhere.

use std::fmt;
use std::path::{Component, Path, PathBuf};

const MARKDOWN_EXTENSION: &str = "md";
const HTML_EXTENSION: &str = "html";
const INDEX_FILE: &str = "index.html";
const TAGS_DIR: &str = "tags";

/// Joins URL segments with exactly one `/` between them. A trailing slash on
/// the accumulated prefix and a leading slash on the next segment collapse
/// into a single separator; empty segments are skipped. The result never
/// contains `//` past the scheme.
pub fn url_join<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut segments = segments.into_iter();
    let mut result = match segments.next() {
        Some(first) => first.as_ref().to_owned(),
        None => return String::new(),
    };

    for segment in segments {
        let segment = segment.as_ref().trim_start_matches('/');
        if segment.is_empty() {
            continue;
        }
        if !result.ends_with('/') {
            result.push('/');
        }
        result.push_str(segment);
    }

    result
}

/// The named components of an entry's location under the base directory:
/// `<base>/<group>/<dir>/<file_stem>.md`. Group membership and every URL for
/// an entry are computed from this value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// Name of the group directory, e.g. `2020`.
    pub group: String,

    /// Name of the entry directory, e.g. `2020-02-25`.
    pub dir: String,

    /// Source file name without the `.md` extension, e.g. `mist`.
    pub file_stem: String,
}

impl Location {
    /// Decomposes `source` (a markdown file somewhere under `base`) into its
    /// named components. Fails when the file does not sit exactly at entry
    /// depth, i.e. its path relative to `base` is not `group/dir/file.md`.
    pub fn new(base: &Path, source: &Path) -> Result<Location, Error> {
        let not_entry = || Error::NotEntryDepth {
            path: source.to_owned(),
        };

        let relative = source.strip_prefix(base).map_err(|_| Error::NotUnderBase {
            path: source.to_owned(),
            base: base.to_owned(),
        })?;

        let mut components = relative
            .components()
            .map(|c| match c {
                Component::Normal(os) => os.to_str().map(str::to_owned),
                _ => None,
            })
            .collect::<Option<Vec<String>>>()
            .ok_or_else(not_entry)?;

        if components.len() != 3 {
            return Err(not_entry());
        }

        let file_name = components.pop().unwrap_or_default();
        let file_stem = file_name
            .strip_suffix(&format!(".{}", MARKDOWN_EXTENSION))
            .ok_or_else(not_entry)?;

        Ok(Location {
            file_stem: file_stem.to_owned(),
            dir: components.pop().unwrap_or_default(),
            group: components.pop().unwrap_or_default(),
        })
    }

    /// Output file name for the rendered entry, e.g. `mist.html`.
    pub fn html_file_name(&self) -> String {
        format!("{}.{}", self.file_stem, HTML_EXTENSION)
    }
}

/// Computes absolute URLs, root-relative URLs, and output file paths for
/// every addressable resource. Pure: constructing a `Locator` and asking it
/// for paths has no filesystem side effects.
pub struct Locator {
    base_url: String,
    output_directory: PathBuf,
    nested_tags: bool,
}

impl Locator {
    pub fn new(base_url: &str, output_directory: &Path, nested_tags: bool) -> Locator {
        Locator {
            base_url: base_url.to_owned(),
            output_directory: output_directory.to_owned(),
            nested_tags,
        }
    }

    /// URL of the site's main index.
    pub fn site_url(&self) -> String {
        url_join([self.base_url.as_str(), INDEX_FILE])
    }

    pub fn entry_url(&self, location: &Location) -> String {
        url_join([
            self.base_url.as_str(),
            &location.group,
            &location.dir,
            &location.html_file_name(),
        ])
    }

    pub fn entry_relative_url(&self, location: &Location) -> String {
        url_join([
            "/",
            location.group.as_str(),
            &location.dir,
            &location.html_file_name(),
        ])
    }

    /// Base URL for resolving an entry's relative links, with a trailing
    /// slash so joining appends rather than replaces the last segment.
    pub fn entry_link_base(&self, location: &Location) -> String {
        url_join([self.base_url.as_str(), &location.group, &location.dir]) + "/"
    }

    /// Output path mirrors the source path under the output directory, with
    /// `.md` replaced by `.html`.
    pub fn entry_output_path(&self, location: &Location) -> PathBuf {
        self.output_directory
            .join(&location.group)
            .join(&location.dir)
            .join(location.html_file_name())
    }

    pub fn group_url(&self, name: &str) -> String {
        url_join([self.base_url.as_str(), name, INDEX_FILE])
    }

    pub fn group_relative_url(&self, name: &str) -> String {
        url_join(["/", name, INDEX_FILE])
    }

    pub fn group_output_path(&self, name: &str) -> PathBuf {
        self.output_directory.join(name).join(INDEX_FILE)
    }

    fn tag_file_name(&self, name: &str) -> String {
        format!("{}.{}", name, HTML_EXTENSION)
    }

    /// Tag index URL. Flat layout puts `<tag>.html` next to the main index;
    /// nested layout puts it under `tags/`.
    pub fn tag_url(&self, name: &str) -> String {
        if self.nested_tags {
            url_join([self.base_url.as_str(), TAGS_DIR, &self.tag_file_name(name)])
        } else {
            url_join([self.base_url.as_str(), &self.tag_file_name(name)])
        }
    }

    pub fn tag_relative_url(&self, name: &str) -> String {
        if self.nested_tags {
            url_join(["/", TAGS_DIR, &self.tag_file_name(name)])
        } else {
            url_join(["/", self.tag_file_name(name).as_str()])
        }
    }

    pub fn tag_output_path(&self, name: &str) -> PathBuf {
        if self.nested_tags {
            self.output_directory
                .join(TAGS_DIR)
                .join(self.tag_file_name(name))
        } else {
            self.output_directory.join(self.tag_file_name(name))
        }
    }

    pub fn top_url(&self, file_stem: &str) -> String {
        url_join([
            self.base_url.as_str(),
            &format!("{}.{}", file_stem, HTML_EXTENSION),
        ])
    }

    pub fn top_relative_url(&self, file_stem: &str) -> String {
        url_join(["/", &format!("{}.{}", file_stem, HTML_EXTENSION)])
    }

    pub fn top_output_path(&self, file_stem: &str) -> PathBuf {
        self.output_directory
            .join(format!("{}.{}", file_stem, HTML_EXTENSION))
    }
}

/// Represents a failure to decompose a source path into entry components.
#[derive(Debug)]
pub enum Error {
    /// The file is not located below the base directory.
    NotUnderBase { path: PathBuf, base: PathBuf },

    /// The file's relative path is not `group/dir/file.md`.
    NotEntryDepth { path: PathBuf },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotUnderBase { path, base } => write!(
                f,
                "file '{}' is not under the base directory '{}'",
                path.display(),
                base.display()
            ),
            Error::NotEntryDepth { path } => write!(
                f,
                "file '{}' is not at entry depth (expected <base>/<group>/<dir>/<file>.md)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for Error {}
