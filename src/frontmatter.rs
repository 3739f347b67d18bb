//! Typed front-matter headers. The YAML between the fences is first parsed
//! into a generic value, then converted field by field into [`EntryHeader`]
//! or [`TopHeader`] so that every missing or mis-typed field produces its
//! own error instead of a generic cast failure.

use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};
use std::fmt;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decoded header of an entry document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryHeader {
    pub title: String,
    pub author: String,
    pub posted: NaiveDate,

    /// Slugified tag names, unique, in front-matter order.
    pub tags: Vec<String>,

    pub draft: bool,
    pub summary: Option<String>,
}

/// Decoded header of a top page document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopHeader {
    pub title: String,
}

/// Decodes an entry header. `require_tags` controls whether an absent `tags`
/// field is a hard error or an empty set.
pub fn decode_entry(yaml: &str, require_tags: bool) -> Result<EntryHeader, Error> {
    let header = mapping(yaml)?;

    let date_raw = required_str(&header, "date")?;
    let posted = NaiveDate::parse_from_str(&date_raw, DATE_FORMAT).map_err(|err| Error::Date {
        value: date_raw.clone(),
        err,
    })?;

    Ok(EntryHeader {
        title: required_str(&header, "title")?,
        author: required_str(&header, "author")?,
        posted,
        tags: tags(&header, require_tags)?,
        draft: optional_bool(&header, "draft")?.unwrap_or(false),
        summary: optional_str(&header, "summary")?,
    })
}

/// Decodes a top page header, which only requires a title.
pub fn decode_top(yaml: &str) -> Result<TopHeader, Error> {
    let header = mapping(yaml)?;
    Ok(TopHeader {
        title: required_str(&header, "title")?,
    })
}

fn mapping(yaml: &str) -> Result<Mapping, Error> {
    match serde_yaml::from_str(yaml).map_err(Error::Yaml)? {
        Value::Mapping(header) => Ok(header),
        _ => Err(Error::NotAMapping),
    }
}

fn field<'m>(header: &'m Mapping, name: &str) -> Option<&'m Value> {
    header.get(&Value::String(name.to_owned()))
}

fn required_str(header: &Mapping, name: &'static str) -> Result<String, Error> {
    match field(header, name) {
        None | Some(Value::Null) => Err(Error::MissingField(name)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::WrongType {
            field: name,
            expected: "string",
        }),
    }
}

fn optional_str(header: &Mapping, name: &'static str) -> Result<Option<String>, Error> {
    match field(header, name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::WrongType {
            field: name,
            expected: "string",
        }),
    }
}

fn optional_bool(header: &Mapping, name: &'static str) -> Result<Option<bool>, Error> {
    match field(header, name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(Error::WrongType {
            field: name,
            expected: "bool",
        }),
    }
}

/// Tag names are slugified so spelling variants collapse to one tag and the
/// names can be dropped into URLs; duplicates within one entry are removed,
/// first occurrence order is kept.
fn tags(header: &Mapping, require_tags: bool) -> Result<Vec<String>, Error> {
    let wrong_type = || {
        Err(Error::WrongType {
            field: "tags",
            expected: "array of strings",
        })
    };

    let raw = match field(header, "tags") {
        None | Some(Value::Null) if require_tags => return Err(Error::MissingField("tags")),
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(raw)) => raw,
        Some(_) => return wrong_type(),
    };

    let mut names = Vec::with_capacity(raw.len());
    for value in raw {
        match value {
            Value::String(name) => {
                let name = slug::slugify(name);
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            _ => return wrong_type(),
        }
    }
    Ok(names)
}

/// Represents an invalid front-matter header.
#[derive(Debug)]
pub enum Error {
    /// The header is not valid YAML.
    Yaml(serde_yaml::Error),

    /// The header is valid YAML but not a key/value mapping.
    NotAMapping,

    /// A required field is absent.
    MissingField(&'static str),

    /// A field is present with an unexpected type.
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// The `date` field does not parse as `YYYY-MM-DD`.
    Date {
        value: String,
        err: chrono::ParseError,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Yaml(err) => write!(f, "invalid header yaml: {}", err),
            Error::NotAMapping => write!(f, "header is not a key/value mapping"),
            Error::MissingField(name) => write!(f, "missing required header field `{}`", name),
            Error::WrongType { field, expected } => {
                write!(f, "header field `{}` must be a {}", field, expected)
            }
            Error::Date { value, err } => {
                write!(f, "header date `{}` must be YYYY-MM-DD: {}", value, err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Yaml(err) => Some(err),
            Error::Date { err, .. } => Some(err),
            _ => None,
        }
    }
}
