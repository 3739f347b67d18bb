//! Support for creating RSS and Atom feeds from the newest published
//! entries. Both formats are fed from the same [`FeedItem`] projection and
//! are independently toggleable. Feed-level timestamps derive from the
//! newest item rather than the wall clock, so regenerating an unchanged
//! site produces identical bytes.

use crate::config::FeedConfig;
use crate::entry::Entry;
use crate::url::Locator;
use atom_syndication::{
    Content, EntryBuilder, FeedBuilder, FixedDateTime, LinkBuilder, PersonBuilder, Text,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};
use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// Feeds carry at most this many entries.
pub const FEED_ENTRY_LIMIT: usize = 3;

/// One feed entry: the projection of a published [`Entry`] that both feed
/// formats consume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub url: String,
    pub posted: NaiveDate,
    pub author: String,
    pub content_html: String,
}

/// Projects the newest published entries into feed items. `rendered` must
/// already be the date-descending non-draft list.
pub fn latest_items(rendered: &[Rc<Entry>], locator: &Locator) -> Vec<FeedItem> {
    rendered
        .iter()
        .take(FEED_ENTRY_LIMIT)
        .map(|e| FeedItem {
            title: e.title.clone(),
            url: locator.entry_url(&e.location),
            posted: e.posted,
            author: e.author.clone(),
            content_html: e.rendered_html.clone(),
        })
        .collect()
}

fn posted_at(posted: NaiveDate) -> FixedDateTime {
    NaiveDateTime::new(posted, NaiveTime::MIN)
        .and_utc()
        .fixed_offset()
}

fn feed_updated(items: &[FeedItem]) -> FixedDateTime {
    match items.first() {
        Some(item) => posted_at(item.posted),
        None => DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
    }
}

/// Serializes `items` as an RSS 2.0 channel into `writer`.
pub fn write_rss<W: Write>(config: &FeedConfig, items: &[FeedItem], writer: W) -> Result<()> {
    let channel = ChannelBuilder::default()
        .title(config.title.clone())
        .link(config.link_href.clone())
        .description(config.description.clone())
        .pub_date(items.first().map(|item| posted_at(item.posted).to_rfc2822()))
        .items(
            items
                .iter()
                .map(|item| {
                    ItemBuilder::default()
                        .title(item.title.clone())
                        .link(item.url.clone())
                        .guid(
                            GuidBuilder::default()
                                .permalink(true)
                                .value(item.url.clone())
                                .build(),
                        )
                        .pub_date(posted_at(item.posted).to_rfc2822())
                        .author(rss_author(config, item))
                        .content(item.content_html.clone())
                        .build()
                })
                .collect::<Vec<_>>(),
        )
        .build();

    channel.write_to(writer)?;
    Ok(())
}

/// Serializes `items` as an Atom feed into `writer`.
pub fn write_atom<W: Write>(config: &FeedConfig, items: &[FeedItem], writer: W) -> Result<()> {
    let entries = items
        .iter()
        .map(|item| {
            let mut content = Content::default();
            content.set_value(item.content_html.clone());
            content.set_content_type("html".to_string());

            EntryBuilder::default()
                .title(Text::plain(item.title.clone()))
                .id(item.url.clone())
                .updated(posted_at(item.posted))
                .published(Some(posted_at(item.posted)))
                .links(vec![LinkBuilder::default()
                    .href(item.url.clone())
                    .rel("alternate".to_string())
                    .build()])
                .authors(vec![PersonBuilder::default()
                    .name(item.author.clone())
                    .build()])
                .content(Some(content))
                .build()
        })
        .collect::<Vec<_>>();

    let subtitle = match config.description.is_empty() {
        true => None,
        false => Some(Text::plain(config.description.clone())),
    };

    let feed = FeedBuilder::default()
        .title(Text::plain(config.title.clone()))
        .id(config.link_href.clone())
        .updated(feed_updated(items))
        .authors(vec![PersonBuilder::default()
            .name(config.author_name.clone())
            .email(config.author_email.clone())
            .build()])
        .links(vec![LinkBuilder::default()
            .href(config.link_href.clone())
            .rel("alternate".to_string())
            .build()])
        .subtitle(subtitle)
        .entries(entries)
        .build();

    feed.write_to(writer)?;
    Ok(())
}

// RSS wants `email (name)` in the author element; fall back to the bare
// name when no email is configured.
fn rss_author(config: &FeedConfig, item: &FeedItem) -> Option<String> {
    match &config.author_email {
        Some(email) => Some(format!("{} ({})", email, item.author)),
        None => Some(item.author.clone()),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem serializing a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is an RSS-related error.
    Rss(rss::Error),

    /// Returned when there is an Atom-related error.
    Atom(atom_syndication::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Rss(err) => write!(f, "writing rss feed: {}", err),
            Error::Atom(err) => write!(f, "writing atom feed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Rss(err) => Some(err),
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<rss::Error> for Error {
    /// Converts [`rss::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: rss::Error) -> Error {
        Error::Rss(err)
    }
}

impl From<atom_syndication::Error> for Error {
    /// Converts [`atom_syndication::Error`]s into [`Error`]. This allows us
    /// to use the `?` operator in fallible feed operations.
    fn from(err: atom_syndication::Error) -> Error {
        Error::Atom(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::url::Location;
    use std::path::{Path, PathBuf};

    fn entry(dir: &str, stem: &str, posted: &str) -> Rc<Entry> {
        Rc::new(Entry {
            source_path: PathBuf::from(format!("/log/2020/{}/{}.md", dir, stem)),
            location: Location {
                group: "2020".to_owned(),
                dir: dir.to_owned(),
                file_stem: stem.to_owned(),
            },
            title: stem.to_owned(),
            author: "felix".to_owned(),
            posted: NaiveDate::parse_from_str(posted, "%Y-%m-%d").unwrap(),
            modified: None,
            tags: Vec::new(),
            draft: false,
            summary: String::new(),
            rendered_html: format!("<p>{}</p>", stem),
        })
    }

    fn locator() -> Locator {
        Locator::new("https://example.org/log", Path::new("/www/log"), false)
    }

    fn config() -> FeedConfig {
        FeedConfig {
            rss_enabled: true,
            atom_enabled: true,
            title: "felix/log".to_owned(),
            link_href: "https://example.org/log".to_owned(),
            description: "a log".to_owned(),
            author_name: "felix".to_owned(),
            author_email: Some("felix@example.org".to_owned()),
        }
    }

    #[test]
    fn test_latest_items_caps_at_limit() {
        let rendered = vec![
            entry("2020-04-01", "d", "2020-04-01"),
            entry("2020-03-01", "c", "2020-03-01"),
            entry("2020-02-01", "b", "2020-02-01"),
            entry("2020-01-01", "a", "2020-01-01"),
        ];

        let items = latest_items(&rendered, &locator());
        assert_eq!(FEED_ENTRY_LIMIT, items.len());
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(vec!["d", "c", "b"], titles);
        assert_eq!(
            "https://example.org/log/2020/2020-04-01/d.html",
            items[0].url
        );
    }

    #[test]
    fn test_rss_round_trip() -> Result<()> {
        let rendered = vec![
            entry("2020-02-25", "mist", "2020-02-25"),
            entry("2020-01-01", "frost", "2020-01-01"),
        ];
        let items = latest_items(&rendered, &locator());

        let mut raw = Vec::new();
        write_rss(&config(), &items, &mut raw)?;

        let channel = rss::Channel::read_from(&raw[..]).expect("parse generated rss");
        assert_eq!("felix/log", channel.title());
        assert_eq!(2, channel.items().len());
        assert_eq!(Some("mist"), channel.items()[0].title());
        assert_eq!(
            Some("https://example.org/log/2020/2020-02-25/mist.html"),
            channel.items()[0].link()
        );
        assert_eq!(Some("<p>mist</p>"), channel.items()[0].content());
        Ok(())
    }

    #[test]
    fn test_atom_round_trip() -> Result<()> {
        let rendered = vec![entry("2020-02-25", "mist", "2020-02-25")];
        let items = latest_items(&rendered, &locator());

        let mut raw = Vec::new();
        write_atom(&config(), &items, &mut raw)?;

        let feed = atom_syndication::Feed::read_from(&raw[..]).expect("parse generated atom");
        assert_eq!("felix/log", feed.title().as_str());
        assert_eq!(1, feed.entries().len());
        assert_eq!(
            "https://example.org/log/2020/2020-02-25/mist.html",
            feed.entries()[0].id()
        );
        Ok(())
    }

    #[test]
    fn test_empty_feed_serializes() -> Result<()> {
        let mut raw = Vec::new();
        write_atom(&config(), &[], &mut raw)?;
        let feed = atom_syndication::Feed::read_from(&raw[..]).expect("parse generated atom");
        assert!(feed.entries().is_empty());
        Ok(())
    }

    #[test]
    fn test_output_is_deterministic() -> Result<()> {
        let rendered = vec![entry("2020-02-25", "mist", "2020-02-25")];
        let items = latest_items(&rendered, &locator());

        let mut first = Vec::new();
        write_rss(&config(), &items, &mut first)?;
        let mut second = Vec::new();
        write_rss(&config(), &items, &mut second)?;
        assert_eq!(first, second);
        Ok(())
    }
}
