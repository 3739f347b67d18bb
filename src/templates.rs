//! The template set: one named template per resource kind (main index,
//! group index, tag index, entry, top page). Each template comes from a
//! configured source file or falls back to its built-in default constant;
//! the defaults are passed into the loader explicitly rather than living in
//! mutable global state. Templates receive the values documented in
//! [`crate::value`].

use crate::config::TemplatesConfig;
use gtmpl::{Context, Template, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_MAIN: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ .title }}</title>
    <link rel="stylesheet" type="text/css" href="style.css">
  </head>

  <body>
    <section class="main">
      <h1>{{ .title }}</h1>
      {{ with .latest }}
      <h2>latest entry</h2>
      <article>
        <div>
          <a href="{{ .relative_url }}"><h2>{{ .title }}</h2></a>
        </div>
        <div>
          <div>
            tags: {{ range .tags }}<a href="{{ .relative_url }}">{{ .name }}</a> {{ end }}
          </div>
          <div>
            posted on {{ .posted }}
          </div>
        </div>
      </article>
      {{ end }}
    </section>

    <section class="groups">
      <h2>groups</h2>
      {{ range .groups }}
      <article>
        <div>
          <a href="{{ .relative_url }}">{{ .name }}</a> ({{ .count }})
        </div>
      </article>
      {{ end }}

      <h2>tags</h2>
      {{ range .tags }}
      <article>
        <div>
          <a href="{{ .relative_url }}">{{ .name }}</a> ({{ .count }})
        </div>
      </article>
      {{ end }}

      <h2>feeds</h2>
      <article>
        <div>
          <a href="rss.xml">rss</a>
        </div>
      </article>
      <article>
        <div>
          <a href="atom.xml">atom</a>
        </div>
      </article>
    </section>
  </body>
</html>
"#;

pub const DEFAULT_GROUP: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ .name }}</title>
    <link rel="stylesheet" type="text/css" href="../style.css">
  </head>

  <body>
    <section>
      <h1>{{ .name }}</h1>
      {{ range .entries }}
      <article>
        <div>
          <a href="{{ .relative_url }}"><h2>{{ .title }}</h2></a>
        </div>
        <div>
          <div>
            posted on {{ .posted }}
          </div>
          <div>
            tags: {{ range .tags }}<a href="{{ .relative_url }}">{{ .name }}</a> {{ end }}
          </div>
        </div>
      </article>
      {{ end }}
    </section>

    <footer>
      <div>
        <a href="{{ .site_url }}">{{ .site_title }}</a> /
        {{ .name }}
      </div>
      <div>
        {{ .count }} entries
      </div>
    </footer>
  </body>
</html>
"#;

pub const DEFAULT_TAGS: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ .name }}</title>
    <link rel="stylesheet" type="text/css" href="style.css">
  </head>

  <body>
    <section>
      <h1>{{ .name }}</h1>
      {{ range .entries }}
      <article>
        <div>
          <a href="{{ .relative_url }}"><h2>{{ .title }}</h2></a>
        </div>
        <div>
          <div>
            posted on {{ .posted }}
          </div>
          <div>
            tags: {{ range .tags }}<a href="{{ .relative_url }}">{{ .name }}</a> {{ end }}
          </div>
        </div>
      </article>
      {{ end }}
    </section>

    <footer>
      <div>
        <a href="{{ .site_url }}">{{ .site_title }}</a> /
        {{ .name }}
      </div>
      <div>
        {{ .count }} entries
      </div>
    </footer>
  </body>
</html>
"#;

pub const DEFAULT_ENTRY: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ .title }}</title>
    <link rel="stylesheet" type="text/css" href="../../style.css">
  </head>

  <body>
    <section>
      <article>
        {{ .rendered_html }}
      </article>
    </section>

    <footer>
      <div>
        <a href="{{ .site_url }}">{{ .site_title }}</a> /
        <a href="{{ .group_url }}">{{ .group }}</a> /
        {{ .title }}
      </div>
      <div>
        tags:
        {{ range .tags }}
        <a href="{{ .relative_url }}">{{ .name }}</a>
        {{ end }}
      </div>
      <div>
        posted on {{ .posted }}
      </div>
    </footer>
  </body>
</html>
"#;

pub const DEFAULT_TOP: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ .title }}</title>
    <link rel="stylesheet" type="text/css" href="style.css">
  </head>

  <body>
    <section>
      <article>
        {{ .rendered_html }}
      </article>
    </section>

    <footer>
      <div>
        <a href="{{ .site_url }}">{{ .site_title }}</a> /
        {{ .title }}
      </div>
    </footer>
  </body>
</html>
"#;

/// The parsed templates for one regeneration run.
pub struct TemplateSet {
    pub main: Template,
    pub group: Template,
    pub tags: Template,
    pub entry: Template,
    pub top: Template,
}

impl TemplateSet {
    /// Parses all five templates, reading configured source files and
    /// falling back to the built-in defaults where no file is configured.
    pub fn load(config: &TemplatesConfig) -> Result<TemplateSet, Error> {
        Ok(TemplateSet {
            main: load_template("main", config.main.as_deref(), DEFAULT_MAIN)?,
            group: load_template("group", config.group.as_deref(), DEFAULT_GROUP)?,
            tags: load_template("tags", config.tags.as_deref(), DEFAULT_TAGS)?,
            entry: load_template("entry", config.entry.as_deref(), DEFAULT_ENTRY)?,
            top: load_template("top", config.top.as_deref(), DEFAULT_TOP)?,
        })
    }
}

fn load_template(name: &'static str, file: Option<&Path>, fallback: &str) -> Result<Template, Error> {
    let raw = match file {
        None => {
            debug!(template = name, "using built-in template");
            fallback.to_owned()
        }
        Some(path) => {
            debug!(template = name, path = %path.display(), "reading template file");
            fs::read_to_string(path).map_err(|err| Error::Read {
                name,
                path: path.to_owned(),
                err,
            })?
        }
    };

    let mut template = Template::default();
    template
        .parse(&raw)
        .map_err(|err| Error::Parse { name, err })?;
    Ok(template)
}

/// Executes a template against a page value and returns the output bytes.
pub fn render(template: &Template, value: Value) -> Result<Vec<u8>, String> {
    let context = Context::from(value)?;
    let mut rendered = Vec::new();
    template.execute(&mut rendered, &context)?;
    Ok(rendered)
}

/// Represents a failure to load the template set.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while reading a configured template file.
    Read {
        name: &'static str,
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned for errors parsing a template source.
    Parse { name: &'static str, err: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { name, path, err } => write!(
                f,
                "reading {} template file '{}': {}",
                name,
                path.display(),
                err
            ),
            Error::Parse { name, err } => write!(f, "parsing {} template: {}", name, err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { err, .. } => Some(err),
            Error::Parse { .. } => None,
        }
    }
}
