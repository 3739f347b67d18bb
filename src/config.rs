//! Configuration loading: a JSON document with kebab-case keys becomes a
//! typed [`Config`]. Everything here is validated before the first pipeline
//! stage runs; a bad configuration never starts a regeneration.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Site title, shown by the default templates and fed to the main index.
    pub title: String,

    /// Directory holding the markdown source tree.
    pub base_directory: PathBuf,

    /// Where output files land. Defaults to the base directory, in which
    /// case rendered files sit next to their sources.
    #[serde(default)]
    output_directory: Option<PathBuf>,

    /// Absolute URL the site is served under.
    pub base_url: String,

    /// Glob patterns matched against base names during asset sync; matching
    /// files and directories are skipped.
    #[serde(default)]
    pub output_excludes: Vec<String>,

    /// Relative path of the sitemap file. Absent or empty skips sitemap
    /// generation.
    #[serde(default)]
    sitemap_file: Option<String>,

    /// Rewrite relative links in markdown to absolute URLs.
    #[serde(default)]
    pub resolve_relative_links: bool,

    /// Treat an absent `tags` header field as an error instead of an empty
    /// set.
    #[serde(default)]
    pub require_tags: bool,

    /// Place tag indexes under `tags/` instead of next to the main index.
    #[serde(default)]
    pub nested_tags: bool,

    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Feed generation settings. Absent skips the feed stage.
    #[serde(default)]
    pub feed: Option<FeedConfig>,
}

/// Source files for the named templates; any unset template falls back to
/// its built-in default.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplatesConfig {
    pub main: Option<PathBuf>,
    pub group: Option<PathBuf>,
    pub tags: Option<PathBuf>,
    pub entry: Option<PathBuf>,
    pub top: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeedConfig {
    #[serde(default)]
    pub rss_enabled: bool,

    #[serde(default)]
    pub atom_enabled: bool,

    pub title: String,

    /// URL the feed advertises as the site link.
    pub link_href: String,

    #[serde(default)]
    pub description: String,

    pub author_name: String,

    #[serde(default)]
    pub author_email: Option<String>,
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Config, Error> {
        let raw = fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_owned(),
            err,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;

        ::url::Url::parse(&config.base_url).map_err(|err| Error::InvalidBaseUrl {
            url: config.base_url.clone(),
            err,
        })?;

        Ok(config)
    }

    pub fn output_directory(&self) -> &Path {
        match &self.output_directory {
            Some(dir) => dir,
            None => &self.base_directory,
        }
    }

    /// The configured sitemap path, with the empty string treated as unset.
    pub fn sitemap_file(&self) -> Option<&str> {
        self.sitemap_file
            .as_deref()
            .filter(|file| !file.is_empty())
    }
}

/// Represents an invalid or unreadable configuration file.
#[derive(Debug)]
pub enum Error {
    /// The config file could not be read.
    Read { path: PathBuf, err: std::io::Error },

    /// The config file is not valid JSON or misses required fields.
    Parse {
        path: PathBuf,
        err: serde_json::Error,
    },

    /// The configured base URL is not an absolute URL.
    InvalidBaseUrl {
        url: String,
        err: ::url::ParseError,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => {
                write!(f, "reading config file '{}': {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "parsing config file '{}': {}", path.display(), err)
            }
            Error::InvalidBaseUrl { url, err } => {
                write!(f, "invalid base-url '{}': {}", url, err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { err, .. } => Some(err),
            Error::Parse { err, .. } => Some(err),
            Error::InvalidBaseUrl { err, .. } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annal.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_full_config() -> Result<(), Error> {
        let (_dir, path) = write_config(
            r#"{
  "title": "felix/log",
  "base-directory": "/src/log",
  "output-directory": "/www/log",
  "base-url": "https://example.org/log",
  "output-excludes": ["*.draft", ".git"],
  "sitemap-file": "sitemap.xml",
  "resolve-relative-links": true,
  "nested-tags": true,
  "templates": { "main": "/src/templates/main.html" },
  "feed": {
    "rss-enabled": true,
    "atom-enabled": false,
    "title": "felix/log",
    "link-href": "https://example.org/log",
    "description": "a log",
    "author-name": "felix",
    "author-email": "felix@example.org"
  }
}"#,
        );

        let config = Config::load(&path)?;
        assert_eq!("felix/log", config.title);
        assert_eq!(Path::new("/www/log"), config.output_directory());
        assert_eq!(Some("sitemap.xml"), config.sitemap_file());
        assert!(config.resolve_relative_links);
        assert!(config.nested_tags);
        assert!(!config.require_tags);
        assert_eq!(2, config.output_excludes.len());
        assert_eq!(
            Some(Path::new("/src/templates/main.html")),
            config.templates.main.as_deref()
        );
        let feed = config.feed.expect("feed config");
        assert!(feed.rss_enabled);
        assert!(!feed.atom_enabled);
        assert_eq!("felix", feed.author_name);
        Ok(())
    }

    #[test]
    fn test_output_directory_defaults_to_base() -> Result<(), Error> {
        let (_dir, path) = write_config(
            r#"{"title": "t", "base-directory": "/src/log", "base-url": "https://example.org"}"#,
        );
        let config = Config::load(&path)?;
        assert_eq!(Path::new("/src/log"), config.output_directory());
        assert_eq!(None, config.sitemap_file());
        assert!(config.feed.is_none());
        Ok(())
    }

    #[test]
    fn test_empty_sitemap_file_is_unset() -> Result<(), Error> {
        let (_dir, path) = write_config(
            r#"{"title": "t", "base-directory": "/b", "base-url": "https://example.org", "sitemap-file": ""}"#,
        );
        assert_eq!(None, Config::load(&path)?.sitemap_file());
        Ok(())
    }

    #[test]
    fn test_missing_required_field() {
        let (_dir, path) = write_config(r#"{"title": "t", "base-url": "https://example.org"}"#);
        assert!(matches!(Config::load(&path), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_invalid_base_url() {
        let (_dir, path) = write_config(
            r#"{"title": "t", "base-directory": "/b", "base-url": "not a url"}"#,
        );
        assert!(matches!(
            Config::load(&path),
            Err(Error::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_unreadable_file() {
        assert!(matches!(
            Config::load(Path::new("/no/such/annal.json")),
            Err(Error::Read { .. })
        ));
    }
}
