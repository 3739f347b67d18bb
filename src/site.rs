//! Exports [`Site`], the root aggregate for one regeneration run, and its
//! [`Site::regenerate`] pipeline: load templates, sync assets, parse and
//! render entries and top pages, build and render group and tag indexes,
//! write the feeds, the main index, and the sitemap. Stages run strictly in
//! that order; the first error aborts the remainder of the pipeline while
//! files written by completed stages stay on disk. Each stage is timed and
//! reported, timing never affects behavior.

use crate::config::Config;
use crate::entry::{self, Entry, ParseOptions};
use crate::feed;
use crate::index::{self, Group, Tag};
use crate::sitemap::Sitemap;
use crate::templates::{self, TemplateSet};
use crate::top::Top;
use crate::url::Locator;
use crate::value;
use glob::Pattern;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

/// Owns all state for one regeneration run. Rebuilt from scratch on every
/// invocation; nothing survives across runs.
pub struct Site {
    config: Config,
    locator: Locator,

    entries: Vec<Rc<Entry>>,
    rendered_entries: Vec<Rc<Entry>>,
    tops: Vec<Top>,
    groups: BTreeMap<String, Group>,
    tags: BTreeMap<String, Tag>,
}

impl Site {
    pub fn new(config: Config) -> Site {
        let locator = Locator::new(
            &config.base_url,
            config.output_directory(),
            config.nested_tags,
        );
        Site {
            config,
            locator,
            entries: Vec::new(),
            rendered_entries: Vec::new(),
            tops: Vec::new(),
            groups: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Runs the full pipeline. Any stage error is terminal for the run.
    pub fn regenerate(&mut self) -> Result<()> {
        let templates = measure("read templates", || {
            TemplateSet::load(&self.config.templates).map_err(Error::from)
        })?;

        measure("synced assets", || self.sync_assets())?;

        measure("found entries", || self.read_entries())?;
        measure("rendered entries", || self.write_entries(&templates))?;

        measure("found tops", || self.read_tops())?;
        measure("rendered tops", || self.write_tops(&templates))?;

        measure("found groups", || self.find_groups())?;
        measure("rendered groups", || self.render_groups(&templates))?;

        measure("found tags", || self.find_tags())?;
        measure("rendered tags", || self.render_tags(&templates))?;

        measure("rendered feed", || self.render_feed())?;

        measure("rendered main index", || self.render_main_index(&templates))?;

        measure("rendered sitemap", || self.render_sitemap())?;

        Ok(())
    }

    pub fn entries(&self) -> &[Rc<Entry>] {
        &self.entries
    }

    pub fn rendered_entries(&self) -> &[Rc<Entry>] {
        &self.rendered_entries
    }

    pub fn groups(&self) -> &BTreeMap<String, Group> {
        &self.groups
    }

    pub fn tags(&self) -> &BTreeMap<String, Tag> {
        &self.tags
    }

    pub fn tops(&self) -> &[Top] {
        &self.tops
    }

    /// Copies non-markdown files from the base tree into the mirrored
    /// location under the output tree. Nothing to do when both directories
    /// are the same. `output-excludes` patterns prune files and whole
    /// directories by base name.
    fn sync_assets(&self) -> Result<()> {
        let base = &self.config.base_directory;
        let output = self.config.output_directory();
        if base == output {
            debug!("base and output directory are the same, nothing to sync");
            return Ok(());
        }

        let excludes = self
            .config
            .output_excludes
            .iter()
            .map(|raw| {
                Pattern::new(raw).map_err(|err| Error::Pattern {
                    pattern: raw.clone(),
                    err,
                })
            })
            .collect::<Result<Vec<Pattern>>>()?;

        let mut walker = WalkDir::new(base).sort_by_file_name().into_iter();
        while let Some(result) = walker.next() {
            let item = result?;
            let path = item.path();

            let name = item.file_name().to_string_lossy();
            if excludes.iter().any(|pattern| pattern.matches(&name)) {
                debug!(path = %path.display(), "sync exclude");
                if item.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }

            // don't sync the output tree into itself
            if item.file_type().is_dir() && path == output {
                walker.skip_current_dir();
                continue;
            }

            let relative = path.strip_prefix(base).unwrap_or(path);
            let target = output.join(relative);

            if item.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(|err| Error::Write { path: target.clone(), err })?;
                continue;
            }
            if path.extension().and_then(OsStr::to_str) == Some(MARKDOWN_EXTENSION) {
                continue;
            }

            fs::copy(path, &target).map_err(|err| Error::Sync {
                path: path.to_owned(),
                err,
            })?;
            debug!(target = %target.display(), "synced source to target");
        }

        Ok(())
    }

    /// Walks the base directory for entry documents and parses them. The
    /// walk is name-sorted so encounter order (and with it the order of
    /// equal-date entries) is identical across runs.
    fn read_entries(&mut self) -> Result<()> {
        let base = self.config.base_directory.clone();
        let output = self.config.output_directory().to_owned();
        let options = ParseOptions {
            resolve_relative_links: self.config.resolve_relative_links,
            require_tags: self.config.require_tags,
        };

        let mut sources = Vec::new();
        let mut walker = WalkDir::new(&base).sort_by_file_name().into_iter();
        while let Some(result) = walker.next() {
            let item = result?;
            let path = item.path();
            if item.file_type().is_dir() {
                if path != base && path == output {
                    walker.skip_current_dir();
                }
                continue;
            }
            if path.extension().and_then(OsStr::to_str) != Some(MARKDOWN_EXTENSION) {
                continue;
            }
            if path.parent() == Some(base.as_path()) {
                // top pages, picked up separately
                continue;
            }
            sources.push(path.to_owned());
        }
        info!(count = sources.len(), base = %base.display(), "walked base directory");

        for source in sources {
            let parsed = Entry::parse(&base, &source, &self.locator, options)?;
            self.entries.push(Rc::new(parsed));
        }

        entry::sort_by_date(&mut self.entries);
        self.rendered_entries = self
            .entries
            .iter()
            .filter(|e| !e.draft)
            .cloned()
            .collect();

        Ok(())
    }

    /// Renders every entry through the entry template. The template always
    /// executes, draft entries just never produce an output file.
    fn write_entries(&self, templates: &TemplateSet) -> Result<()> {
        for e in &self.entries {
            let page = self.page_value(value::entry(e, &self.locator));
            let rendered = templates::render(&templates.entry, page).map_err(|err| {
                Error::Render {
                    what: format!("entry '{}'", e.title),
                    err,
                }
            })?;

            if e.draft {
                debug!(title = %e.title, "skipping draft entry");
                continue;
            }

            let target = self.locator.entry_output_path(&e.location);
            write_file(&target, &rendered)?;
            debug!(title = %e.title, target = %target.display(), "wrote entry");
        }
        Ok(())
    }

    /// Scans the base directory itself (non-recursively) for top pages.
    fn read_tops(&mut self) -> Result<()> {
        let base = &self.config.base_directory;
        let link_base = match self.config.resolve_relative_links {
            false => None,
            true => Some(self.base_link_url()?),
        };

        let mut sources = fs::read_dir(base)
            .map_err(|err| Error::Read {
                path: base.clone(),
                err,
            })?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|err| Error::Read {
                path: base.clone(),
                err,
            })?
            .into_iter()
            .map(|item| item.path())
            .filter(|path| path.extension().and_then(OsStr::to_str) == Some(MARKDOWN_EXTENSION))
            .collect::<Vec<PathBuf>>();
        sources.sort();
        info!(count = sources.len(), base = %base.display(), "scanned base directory for tops");

        for source in sources {
            self.tops.push(Top::parse(&source, link_base.as_ref())?);
        }
        Ok(())
    }

    fn write_tops(&self, templates: &TemplateSet) -> Result<()> {
        for t in &self.tops {
            let page = self.page_value(value::top(t, &self.locator));
            let rendered = templates::render(&templates.top, page).map_err(|err| {
                Error::Render {
                    what: format!("top page '{}'", t.title),
                    err,
                }
            })?;
            let target = self.locator.top_output_path(&t.file_stem);
            write_file(&target, &rendered)?;
            debug!(title = %t.title, target = %target.display(), "wrote top page");
        }
        Ok(())
    }

    fn find_groups(&mut self) -> Result<()> {
        self.groups = index::build_groups(&self.entries);
        Ok(())
    }

    fn render_groups(&self, templates: &TemplateSet) -> Result<()> {
        for group in self.groups.values() {
            let page = self.page_value(value::group(group, &self.locator));
            let rendered = templates::render(&templates.group, page).map_err(|err| {
                Error::Render {
                    what: format!("group index '{}'", group.name),
                    err,
                }
            })?;
            let target = self.locator.group_output_path(&group.name);
            write_file(&target, &rendered)?;
            debug!(group = %group.name, target = %target.display(), "wrote group index");
        }
        Ok(())
    }

    fn find_tags(&mut self) -> Result<()> {
        self.tags = index::build_tags(&self.entries);
        Ok(())
    }

    fn render_tags(&self, templates: &TemplateSet) -> Result<()> {
        for tag in self.tags.values() {
            let page = self.page_value(value::tag(tag, &self.locator));
            let rendered = templates::render(&templates.tags, page).map_err(|err| {
                Error::Render {
                    what: format!("tag index '{}'", tag.name),
                    err,
                }
            })?;
            let target = self.locator.tag_output_path(&tag.name);
            write_file(&target, &rendered)?;
            debug!(tag = %tag.name, target = %target.display(), "wrote tag index");
        }
        Ok(())
    }

    fn render_feed(&self) -> Result<()> {
        let feed_config = match &self.config.feed {
            None => {
                debug!("no config for rendering feed");
                return Ok(());
            }
            Some(feed_config) => feed_config,
        };

        let items = feed::latest_items(&self.rendered_entries, &self.locator);

        if feed_config.rss_enabled {
            let mut raw = Vec::new();
            feed::write_rss(feed_config, &items, &mut raw)?;
            let target = self.config.output_directory().join("rss.xml");
            write_file(&target, &raw)?;
            debug!(target = %target.display(), "wrote rss feed");
        }

        if feed_config.atom_enabled {
            let mut raw = Vec::new();
            feed::write_atom(feed_config, &items, &mut raw)?;
            let target = self.config.output_directory().join("atom.xml");
            write_file(&target, &raw)?;
            debug!(target = %target.display(), "wrote atom feed");
        }

        Ok(())
    }

    fn render_main_index(&self, templates: &TemplateSet) -> Result<()> {
        let latest = self.rendered_entries.first().map(|e| e.as_ref());
        let page = self.page_value(value::main_index(
            &self.config.title,
            latest,
            self.groups.values(),
            self.tags.values(),
            &self.locator,
        ));
        let rendered = templates::render(&templates.main, page).map_err(|err| Error::Render {
            what: "main index".to_owned(),
            err,
        })?;
        write_file(&self.config.output_directory().join("index.html"), &rendered)
    }

    fn render_sitemap(&self) -> Result<()> {
        let file = match self.config.sitemap_file() {
            None => {
                debug!("no sitemap file configured");
                return Ok(());
            }
            Some(file) => file,
        };

        let mut urls = Vec::with_capacity(
            1 + self.rendered_entries.len() + self.groups.len() + self.tags.len(),
        );
        urls.push(self.locator.site_url());
        urls.extend(
            self.rendered_entries
                .iter()
                .map(|e| self.locator.entry_url(&e.location)),
        );
        urls.extend(self.groups.keys().map(|name| self.locator.group_url(name)));
        urls.extend(self.tags.keys().map(|name| self.locator.tag_url(name)));

        let sitemap = Sitemap::new(urls);
        let target = self.config.output_directory().join(file);
        write_file(&target, sitemap.to_xml().as_bytes())?;
        info!(target = %target.display(), count = sitemap.len(), "wrote sitemap");
        Ok(())
    }

    fn page_value(&self, page: gtmpl::Value) -> gtmpl::Value {
        value::with_site_fields(page, &self.config.title, &self.locator.site_url())
    }

    fn base_link_url(&self) -> Result<::url::Url> {
        let mut raw = self.config.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        ::url::Url::parse(&raw).map_err(|err| Error::BaseUrl { url: raw, err })
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| Error::Write {
            path: parent.to_owned(),
            err,
        })?;
    }
    fs::write(path, contents).map_err(|err| Error::Write {
        path: path.to_owned(),
        err,
    })
}

fn measure<T>(stage: &str, work: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = work();
    let elapsed = start.elapsed().as_millis();
    match &result {
        Ok(_) => info!("{} in {}ms", stage, elapsed),
        Err(_) => info!("{} failed after {}ms", stage, elapsed),
    }
    result
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for a regeneration run. Every variant names the failing
/// operation and resource; the first error aborts the pipeline.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading the template set.
    Template(templates::Error),

    /// Returned for errors parsing an entry document.
    Entry(entry::Error),

    /// Returned for errors parsing a top page document.
    Top(crate::top::Error),

    /// Returned for errors serializing a feed.
    Feed(feed::Error),

    /// Returned for filesystem walk failures during discovery or sync.
    Walk(walkdir::Error),

    /// Returned for malformed `output-excludes` patterns.
    Pattern {
        pattern: String,
        err: glob::PatternError,
    },

    /// Returned for template execution failures.
    Render { what: String, err: String },

    /// Returned for I/O problems reading a directory.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems writing output files.
    Write { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems copying an asset.
    Sync { path: PathBuf, err: std::io::Error },

    /// Returned when the configured base URL cannot be extended into a link
    /// base.
    BaseUrl {
        url: String,
        err: ::url::ParseError,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Entry(err) => err.fmt(f),
            Error::Top(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::Walk(err) => write!(f, "walking base directory: {}", err),
            Error::Pattern { pattern, err } => {
                write!(f, "invalid output-excludes pattern '{}': {}", pattern, err)
            }
            Error::Render { what, err } => write!(f, "rendering {}: {}", what, err),
            Error::Read { path, err } => {
                write!(f, "reading directory '{}': {}", path.display(), err)
            }
            Error::Write { path, err } => {
                write!(f, "writing '{}': {}", path.display(), err)
            }
            Error::Sync { path, err } => {
                write!(f, "syncing asset '{}': {}", path.display(), err)
            }
            Error::BaseUrl { url, err } => {
                write!(f, "building link base from base-url '{}': {}", url, err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Entry(err) => Some(err),
            Error::Top(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::Walk(err) => Some(err),
            Error::Pattern { err, .. } => Some(err),
            Error::Render { .. } => None,
            Error::Read { err, .. } => Some(err),
            Error::Write { err, .. } => Some(err),
            Error::Sync { err, .. } => Some(err),
            Error::BaseUrl { err, .. } => Some(err),
        }
    }
}

impl From<templates::Error> for Error {
    /// Converts template set errors into [`Error`]. This allows us to use
    /// the `?` operator in the pipeline.
    fn from(err: templates::Error) -> Error {
        Error::Template(err)
    }
}

impl From<entry::Error> for Error {
    /// Converts entry parse errors into [`Error`]. This allows us to use
    /// the `?` operator in the pipeline.
    fn from(err: entry::Error) -> Error {
        Error::Entry(err)
    }
}

impl From<crate::top::Error> for Error {
    /// Converts top page parse errors into [`Error`]. This allows us to use
    /// the `?` operator in the pipeline.
    fn from(err: crate::top::Error) -> Error {
        Error::Top(err)
    }
}

impl From<feed::Error> for Error {
    /// Converts feed errors into [`Error`]. This allows us to use the `?`
    /// operator in the pipeline.
    fn from(err: feed::Error) -> Error {
        Error::Feed(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts walk errors into [`Error`]. This allows us to use the `?`
    /// operator during discovery and sync.
    fn from(err: walkdir::Error) -> Error {
        Error::Walk(err)
    }
}
