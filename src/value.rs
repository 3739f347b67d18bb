//! Conversions from content types into [`gtmpl::Value`]s for templating.
//! This module is the single place that defines the field names templates
//! can rely on:
//!
//! - entry: `title`, `author`, `posted`, `url`, `relative_url`, `group`,
//!   `group_url`, `tags`, `summary`, `draft`, `rendered_html`
//! - tag reference (inside an entry's `tags`): `name`, `url`, `relative_url`
//! - group/tag index: `name`, `url`, `relative_url`, `count`, `entries`
//! - top page: `title`, `url`, `relative_url`, `rendered_html`
//! - main index: `title`, `url`, `latest` (entry or nil), `groups`, `tags`
//!
//! The renderer additionally injects `site_title` and `site_url` into every
//! page object before execution.

use crate::entry::Entry;
use crate::frontmatter::DATE_FORMAT;
use crate::index::{Group, Tag};
use crate::top::Top;
use crate::url::Locator;
use gtmpl::Value;
use std::collections::HashMap;

fn object<const N: usize>(fields: [(&str, Value); N]) -> Value {
    let mut m: HashMap<String, Value> = HashMap::with_capacity(N);
    for (name, value) in fields {
        m.insert(name.to_owned(), value);
    }
    Value::Object(m)
}

fn tag_link(name: &str, locator: &Locator) -> Value {
    object([
        ("name", Value::String(name.to_owned())),
        ("url", Value::String(locator.tag_url(name))),
        (
            "relative_url",
            Value::String(locator.tag_relative_url(name)),
        ),
    ])
}

pub fn entry(e: &Entry, locator: &Locator) -> Value {
    object([
        ("title", Value::String(e.title.clone())),
        ("author", Value::String(e.author.clone())),
        (
            "posted",
            Value::String(e.posted.format(DATE_FORMAT).to_string()),
        ),
        ("url", Value::String(locator.entry_url(&e.location))),
        (
            "relative_url",
            Value::String(locator.entry_relative_url(&e.location)),
        ),
        ("group", Value::String(e.location.group.clone())),
        (
            "group_url",
            Value::String(locator.group_relative_url(&e.location.group)),
        ),
        (
            "tags",
            Value::Array(e.tags.iter().map(|t| tag_link(t, locator)).collect()),
        ),
        ("summary", Value::String(e.summary.clone())),
        ("draft", Value::Bool(e.draft)),
        ("rendered_html", Value::String(e.rendered_html.clone())),
    ])
}

pub fn top(t: &Top, locator: &Locator) -> Value {
    object([
        ("title", Value::String(t.title.clone())),
        ("url", Value::String(locator.top_url(&t.file_stem))),
        (
            "relative_url",
            Value::String(locator.top_relative_url(&t.file_stem)),
        ),
        ("rendered_html", Value::String(t.rendered_html.clone())),
    ])
}

/// Group index value. `entries` holds only the published subset, which is
/// what index pages list; `count` is its length.
pub fn group(g: &Group, locator: &Locator) -> Value {
    object([
        ("name", Value::String(g.name.clone())),
        ("url", Value::String(locator.group_url(&g.name))),
        (
            "relative_url",
            Value::String(locator.group_relative_url(&g.name)),
        ),
        ("count", Value::from(g.rendered_entries.len() as u64)),
        (
            "entries",
            Value::Array(
                g.rendered_entries
                    .iter()
                    .map(|e| entry(e, locator))
                    .collect(),
            ),
        ),
    ])
}

pub fn tag(t: &Tag, locator: &Locator) -> Value {
    object([
        ("name", Value::String(t.name.clone())),
        ("url", Value::String(locator.tag_url(&t.name))),
        (
            "relative_url",
            Value::String(locator.tag_relative_url(&t.name)),
        ),
        ("count", Value::from(t.rendered_entries.len() as u64)),
        (
            "entries",
            Value::Array(
                t.rendered_entries
                    .iter()
                    .map(|e| entry(e, locator))
                    .collect(),
            ),
        ),
    ])
}

/// Main index value. `latest` is the newest published entry or nil when
/// nothing is published yet; templates guard it with `{{ with .latest }}`.
pub fn main_index<'a>(
    title: &str,
    latest: Option<&Entry>,
    groups: impl Iterator<Item = &'a Group>,
    tags: impl Iterator<Item = &'a Tag>,
    locator: &Locator,
) -> Value {
    object([
        ("title", Value::String(title.to_owned())),
        ("url", Value::String(locator.site_url())),
        (
            "latest",
            match latest {
                Some(e) => entry(e, locator),
                None => Value::Nil,
            },
        ),
        (
            "groups",
            Value::Array(groups.map(|g| group(g, locator)).collect()),
        ),
        (
            "tags",
            Value::Array(tags.map(|t| tag(t, locator)).collect()),
        ),
    ])
}

/// Injects the site-wide fields every template may use, mirroring how the
/// page value is finalized right before execution.
pub fn with_site_fields(value: Value, site_title: &str, site_url: &str) -> Value {
    match value {
        Value::Object(mut obj) => {
            obj.insert(
                "site_title".to_owned(),
                Value::String(site_title.to_owned()),
            );
            obj.insert("site_url".to_owned(), Value::String(site_url.to_owned()));
            Value::Object(obj)
        }
        other => other,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::url::Location;
    use chrono::NaiveDate;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    fn locator() -> Locator {
        Locator::new("https://example.org/log", Path::new("/www/log"), false)
    }

    fn mist() -> Entry {
        Entry {
            source_path: PathBuf::from("/log/2020/2020-02-25/mist.md"),
            location: Location {
                group: "2020".to_owned(),
                dir: "2020-02-25".to_owned(),
                file_stem: "mist".to_owned(),
            },
            title: "Mist".to_owned(),
            author: "felix".to_owned(),
            posted: NaiveDate::from_ymd_opt(2020, 2, 25).unwrap(),
            modified: None,
            tags: vec!["photo".to_owned(), "weather".to_owned()],
            draft: false,
            summary: "<p>low clouds</p>".to_owned(),
            rendered_html: "<p>low hanging clouds</p>".to_owned(),
        }
    }

    fn field<'v>(value: &'v Value, name: &str) -> &'v Value {
        match value {
            Value::Object(obj) => &obj[name],
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_entry_value_fields() {
        let value = entry(&mist(), &locator());
        assert_eq!(&Value::String("Mist".to_owned()), field(&value, "title"));
        assert_eq!(
            &Value::String("2020-02-25".to_owned()),
            field(&value, "posted")
        );
        assert_eq!(
            &Value::String("https://example.org/log/2020/2020-02-25/mist.html".to_owned()),
            field(&value, "url")
        );
        assert_eq!(
            &Value::String("/2020/2020-02-25/mist.html".to_owned()),
            field(&value, "relative_url")
        );
        match field(&value, "tags") {
            Value::Array(tags) => {
                assert_eq!(2, tags.len());
                assert_eq!(
                    &Value::String("photo".to_owned()),
                    field(&tags[0], "name")
                );
                assert_eq!(
                    &Value::String("/photo.html".to_owned()),
                    field(&tags[0], "relative_url")
                );
            }
            _ => panic!("expected tags array"),
        }
    }

    #[test]
    fn test_main_index_value_without_latest() {
        let value = main_index("felix/log", None, [].iter(), [].iter(), &locator());
        assert_eq!(&Value::Nil, field(&value, "latest"));
    }

    #[test]
    fn test_group_value_counts_rendered_entries() {
        let group_value = group(
            &Group {
                name: "2020".to_owned(),
                entries: vec![Rc::new(mist())],
                rendered_entries: vec![Rc::new(mist())],
                modified: None,
            },
            &locator(),
        );
        assert_eq!(&Value::from(1u64), field(&group_value, "count"));
        assert_eq!(
            &Value::String("https://example.org/log/2020/index.html".to_owned()),
            field(&group_value, "url")
        );
    }

    #[test]
    fn test_with_site_fields() {
        let value = with_site_fields(
            entry(&mist(), &locator()),
            "felix/log",
            "https://example.org/log/index.html",
        );
        assert_eq!(
            &Value::String("felix/log".to_owned()),
            field(&value, "site_title")
        );
    }
}
