// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Timer identities and name validation.

use std::fmt;
use std::sync::OnceLock;

use phf::phf_set;
use regex::Regex;

use crate::error::{Result, TimerError};

/// Command verbs; a timer may not share a name with any of them.
pub static RESERVED_NAMES: phf::Set<&'static str> = phf_set! {
    "start", "stop", "status", "list", "create", "delete",
};

/// Longest single path component most filesystems accept.
pub const MAX_NAME_LEN: usize = 255;

/// Label used when the root timer is displayed.
pub const ROOT_LABEL: &str = "root";

/// `.` is excluded because `list` hides dotted entries; separators and NUL
/// would let a name escape its own directory.
fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^./\\\x00]+$").expect("static regex"))
}

/// Identity of a timer: the unnamed default timer or a named one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerId {
    Root,
    Named(String),
}

impl TimerId {
    /// Builds an identity from an optional user-supplied name; `None` means the root timer.
    pub fn from_arg(name: Option<&str>) -> Result<TimerId> {
        match name {
            None => Ok(TimerId::Root),
            Some(n) => TimerId::named(n),
        }
    }

    /// Validates `name` and wraps it as [`TimerId::Named`].
    pub fn named(name: &str) -> Result<TimerId> {
        validate_name(name)?;
        Ok(TimerId::Named(name.to_string()))
    }

    pub fn is_root(&self) -> bool {
        matches!(self, TimerId::Root)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            TimerId::Root => None,
            TimerId::Named(n) => Some(n),
        }
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerId::Root => f.write_str(ROOT_LABEL),
            TimerId::Named(n) => f.write_str(n),
        }
    }
}

/// Returns true if `name` is one of the command verbs.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(name)
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason| {
        Err(TimerError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };
    if name.is_empty() {
        return invalid("name is empty");
    }
    if is_reserved(name) {
        return invalid("name cannot be a valid command");
    }
    if !name_pattern().is_match(name) {
        return invalid("name may not contain '.', '/', '\\' or NUL");
    }
    if name.len() > MAX_NAME_LEN {
        return Err(TimerError::PathTooLong {
            name: name.to_string(),
            len: name.len(),
        });
    }
    Ok(())
}
