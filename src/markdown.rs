//! The markdown service: front-matter fence splitting and markdown-to-HTML
//! conversion. Callers hand in raw document text and get back the YAML
//! header slice and rendered HTML fragments; everything else about a
//! document's meaning lives in [`crate::frontmatter`] and the content item
//! types.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use std::fmt;
use ::url::Url;

const FENCE: &str = "---";

/// Splits a source document into its front-matter YAML and markdown body.
/// The document must begin with a `---` fence and contain a closing fence.
pub fn split_frontmatter(input: &str) -> Result<(&str, &str), Error> {
    if !input.starts_with(FENCE) {
        return Err(Error::MissingStartFence);
    }
    match input[FENCE.len()..].find(FENCE) {
        None => Err(Error::MissingEndFence),
        Some(offset) => {
            let yaml_stop = FENCE.len() + offset;
            Ok((&input[FENCE.len()..yaml_stop], &input[yaml_stop + FENCE.len()..]))
        }
    }
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Renders a markdown body to an HTML fragment. When `link_base` is given,
/// relative link and image destinations are rewritten to absolute URLs
/// against it. Absolute and unparseable destinations pass through untouched.
pub fn to_html(markdown: &str, link_base: Option<&Url>) -> String {
    let mut rendered = String::with_capacity(markdown.len() * 2);
    html::push_html(
        &mut rendered,
        Parser::new_ext(markdown, options()).map(|ev| convert(ev, link_base)),
    );
    rendered
}

/// Renders only the first top-level block of a markdown body, used to derive
/// a summary when the header does not provide one.
pub fn first_block_html(markdown: &str, link_base: Option<&Url>) -> String {
    let mut depth = 0usize;
    let mut events = Vec::new();

    for ev in Parser::new_ext(markdown, options()) {
        match &ev {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        events.push(convert(ev, link_base));
        if depth == 0 {
            break;
        }
    }

    let mut rendered = String::new();
    html::push_html(&mut rendered, events.into_iter());
    rendered
}

fn convert<'a>(ev: Event<'a>, link_base: Option<&Url>) -> Event<'a> {
    let base = match link_base {
        Some(base) => base,
        None => return ev,
    };
    match ev {
        Event::Start(Tag::Link(link_type, dest, title)) => {
            Event::Start(Tag::Link(link_type, absolutize(base, dest), title))
        }
        Event::Start(Tag::Image(link_type, dest, title)) => {
            Event::Start(Tag::Image(link_type, absolutize(base, dest), title))
        }
        _ => ev,
    }
}

fn absolutize<'a>(base: &Url, dest: CowStr<'a>) -> CowStr<'a> {
    match Url::parse(&dest) {
        // already absolute
        Ok(_) => dest,
        Err(url::ParseError::RelativeUrlWithoutBase) => match base.join(&dest) {
            Ok(absolute) => CowStr::Boxed(absolute.to_string().into_boxed_str()),
            Err(_) => dest,
        },
        Err(_) => dest,
    }
}

/// Represents a malformed front-matter block.
#[derive(Debug)]
pub enum Error {
    /// The document does not begin with the `---` fence.
    MissingStartFence,

    /// The opening fence is never closed.
    MissingEndFence,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingStartFence => write!(f, "document must begin with `---`"),
            Error::MissingEndFence => write!(f, "missing closing `---`"),
        }
    }
}

impl std::error::Error for Error {}
