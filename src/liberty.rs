//! The [`Library`] wrapper and selectors for the usual navigation steps:
//! library to cell to pin to timing group to timing table.
//!
//! The selectors exist so a missed lookup tells the caller what *would*
//! have matched: a bad cell name lists the library's cells, a bad
//! `related_pin` lists the pins the timing groups actually relate to, and
//! so on.

use std::fmt;
use std::io;
use std::ops::{Deref, DerefMut};

use crate::ast::{Group, Value};
use crate::error::Error;
use crate::json::group_to_json;

/// A parsed top-level group, usually `library (...) { ... }`.
#[derive(Debug, PartialEq, Clone)]
pub struct Library(pub Group);

impl Library {
    /// Format the library back into Liberty text.
    pub fn to_liberty_string(&self) -> String {
        self.0.to_string()
    }

    /// Project the library into a JSON document.
    pub fn to_json_value(&self) -> Result<serde_json::Value, Error> {
        group_to_json(&self.0)
    }

    /// Write the JSON projection, compact.
    pub fn to_json<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer(writer, &self.to_json_value()?).map_err(Error::from)
    }

    /// Write the JSON projection, pretty-printed.
    pub fn to_json_pretty<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer_pretty(writer, &self.to_json_value()?).map_err(Error::from)
    }
}

impl Deref for Library {
    type Target = Group;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Library {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Group> for Library {
    fn from(group: Group) -> Self {
        Library(group)
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sorted, deduplicated first arguments of `groups`.
fn argument_names(groups: &[&Group]) -> Vec<String> {
    let mut names: Vec<String> = groups
        .iter()
        .filter_map(|g| g.args.first().map(Value::text))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Sorted, deduplicated values of attribute `key` across `groups`.
fn attribute_texts(groups: &[&Group], key: &str) -> Vec<String> {
    let mut texts: Vec<String> = groups
        .iter()
        .flat_map(|g| g.get_attributes(key))
        .map(Value::text)
        .collect();
    texts.sort();
    texts.dedup();
    texts
}

/// Select a cell by name from a library group.
pub fn select_cell<'a>(library: &'a Group, cell_name: &str) -> Result<&'a Group, Error> {
    let cells = library.get_groups("cell", None);
    if cells
        .iter()
        .any(|g| g.args.first().map_or(false, |arg| arg.text() == cell_name))
    {
        library.get_group("cell", Some(cell_name))
    } else {
        Err(Error::NotFound {
            key: cell_name.to_string(),
            available: argument_names(&cells),
        })
    }
}

/// Select a pin by name from a cell group.
pub fn select_pin<'a>(cell: &'a Group, pin_name: &str) -> Result<&'a Group, Error> {
    let pins = cell.get_groups("pin", None);
    if pins
        .iter()
        .any(|g| g.args.first().map_or(false, |arg| arg.text() == pin_name))
    {
        cell.get_group("pin", Some(pin_name))
    } else {
        Err(Error::NotFound {
            key: pin_name.to_string(),
            available: argument_names(&pins),
        })
    }
}

/// Select a timing group from a pin group by its `related_pin`, narrowing
/// further by `when` and `timing_type` when given. The first group that
/// survives all filters wins.
pub fn select_timing_group<'a>(
    pin: &'a Group,
    related_pin: &str,
    when: Option<&str>,
    timing_type: Option<&str>,
) -> Result<&'a Group, Error> {
    let timings = pin.get_groups("timing", None);
    let attribute_text = |group: &Group, key: &str| -> Option<String> {
        group.get_attributes(key).first().map(|v| v.text())
    };

    let mut matches: Vec<&Group> = timings
        .iter()
        .copied()
        .filter(|g| attribute_text(g, "related_pin").as_deref() == Some(related_pin))
        .collect();
    if matches.is_empty() {
        return Err(Error::NotFound {
            key: related_pin.to_string(),
            available: attribute_texts(&timings, "related_pin"),
        });
    }

    if let Some(when) = when {
        let candidates = matches.clone();
        matches.retain(|g| attribute_text(g, "when").as_deref() == Some(when));
        if matches.is_empty() {
            return Err(Error::NotFound {
                key: when.to_string(),
                available: attribute_texts(&candidates, "when"),
            });
        }
    }

    if let Some(timing_type) = timing_type {
        let candidates = matches.clone();
        matches.retain(|g| attribute_text(g, "timing_type").as_deref() == Some(timing_type));
        if matches.is_empty() {
            return Err(Error::NotFound {
                key: timing_type.to_string(),
                available: attribute_texts(&candidates, "timing_type"),
            });
        }
    }

    matches.into_iter().next().ok_or_else(|| Error::NotFound {
        key: related_pin.to_string(),
        available: Vec::new(),
    })
}

/// Select a timing table (`cell_rise`, `rise_transition`, ...) from a pin.
pub fn select_timing_table<'a>(
    pin: &'a Group,
    related_pin: &str,
    table_name: &str,
    when: Option<&str>,
    timing_type: Option<&str>,
) -> Result<&'a Group, Error> {
    let timing = select_timing_group(pin, related_pin, when, timing_type)?;
    if timing.groups.iter().any(|g| g.group_name == table_name) {
        timing.get_group(table_name, None)
    } else {
        let mut available: Vec<String> =
            timing.groups.iter().map(|g| g.group_name.clone()).collect();
        available.sort();
        available.dedup();
        Err(Error::NotFound {
            key: table_name.to_string(),
            available,
        })
    }
}
