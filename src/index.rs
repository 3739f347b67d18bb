//! The content index: aggregates the flat entry list into [`Group`]s (one
//! per group directory, e.g. a year) and [`Tag`]s (one per front-matter tag
//! name). Aggregates live in `BTreeMap`s keyed by name, so every enumeration
//! is sorted by name and repeated runs over identical input enumerate in the
//! same order.

use crate::entry::{sort_by_date, Entry};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::rc::Rc;

/// All entries sharing one group directory. `entries` includes drafts;
/// `rendered_entries` holds only the published subset.
pub struct Group {
    pub name: String,
    pub entries: Vec<Rc<Entry>>,
    pub rendered_entries: Vec<Rc<Entry>>,

    /// Latest modification time over the member entries.
    pub modified: Option<DateTime<Utc>>,
}

/// All entries carrying one tag name. Same shape as [`Group`]; membership is
/// many-to-many via each entry's tag list.
pub struct Tag {
    pub name: String,
    pub entries: Vec<Rc<Entry>>,
    pub rendered_entries: Vec<Rc<Entry>>,
    pub modified: Option<DateTime<Utc>>,
}

/// Partitions the entry list into groups by directory-derived group name.
/// Single pass, aggregates created on first sight; both member lists are
/// sorted by date afterwards (stable, ties keep encounter order).
pub fn build_groups(entries: &[Rc<Entry>]) -> BTreeMap<String, Group> {
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();

    for entry in entries {
        let name = &entry.location.group;
        let group = groups.entry(name.clone()).or_insert_with(|| Group {
            name: name.clone(),
            entries: Vec::new(),
            rendered_entries: Vec::new(),
            modified: None,
        });
        group.entries.push(Rc::clone(entry));
        if !entry.draft {
            group.rendered_entries.push(Rc::clone(entry));
        }
    }

    for group in groups.values_mut() {
        sort_by_date(&mut group.entries);
        sort_by_date(&mut group.rendered_entries);
        group.modified = latest_modified(&group.entries);
    }

    groups
}

/// Collects entries by tag name. An entry appears under every tag it
/// carries; entries without tags appear under none.
pub fn build_tags(entries: &[Rc<Entry>]) -> BTreeMap<String, Tag> {
    let mut tags: BTreeMap<String, Tag> = BTreeMap::new();

    for entry in entries {
        for name in &entry.tags {
            let tag = tags.entry(name.clone()).or_insert_with(|| Tag {
                name: name.clone(),
                entries: Vec::new(),
                rendered_entries: Vec::new(),
                modified: None,
            });
            tag.entries.push(Rc::clone(entry));
            if !entry.draft {
                tag.rendered_entries.push(Rc::clone(entry));
            }
        }
    }

    for tag in tags.values_mut() {
        sort_by_date(&mut tag.entries);
        sort_by_date(&mut tag.rendered_entries);
        tag.modified = latest_modified(&tag.entries);
    }

    tags
}

fn latest_modified(entries: &[Rc<Entry>]) -> Option<DateTime<Utc>> {
    entries.iter().filter_map(|e| e.modified).max()
}
