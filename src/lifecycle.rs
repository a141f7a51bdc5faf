// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Running/stopped state machine for a single timer.
//!
//! A timer is running iff its start marker exists. The marker is a text file
//! holding one line: the start instant in Unix seconds. `start` writes it to
//! a temporary file and links that into place without clobbering, so of two
//! racing invocations only the first one records a start and nobody sees a
//! half-written marker; `stop` reads it, removes it and reports the elapsed
//! time. The engine never creates or removes directories.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Local, TimeZone};
use log::{debug, warn};
use regex::Regex;
use tempfile::NamedTempFile;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TimerError};
use crate::registry::{Registry, RunState};
use crate::report::{self, Report};
use crate::timer_id::TimerId;

/// File name of the start marker inside a timer's storage directory.
pub const MARKER_FILE: &str = "start.tm";

fn marker_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{1,19})\s*$").expect("static regex"))
}

/// Parses marker content into its start instant; `None` if it is not exactly one integer.
pub fn parse_marker(content: &str) -> Option<i64> {
    let caps = marker_pattern().captures(content)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Snapshot of one timer's state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub timer: TimerId,
    pub running: bool,
    /// Start instant, when running and the marker is readable.
    pub since: Option<i64>,
    /// Clock reading the snapshot was taken at.
    pub now: i64,
}

impl Status {
    pub fn label(&self) -> &'static str {
        if self.running {
            "running"
        } else {
            "not running"
        }
    }

    /// Seconds since the start instant, if running.
    pub fn elapsed(&self) -> Option<u64> {
        self.since.map(|s| elapsed_between(s, self.now))
    }

    /// Multi-line status: the label, plus start time and elapsed time when running.
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        if let (Some(since), Some(elapsed)) = (self.since, self.elapsed()) {
            let started = Local
                .timestamp_opt(since, 0)
                .single()
                .map(|dt| dt.format("%a %b %d %H:%M:%S %Z %Y").to_string())
                .unwrap_or_else(|| since.to_string());
            out.push_str(&format!("\nstarted:\t{}", started));
            out.push_str(&format!("\nelapsed:\t{}", report::format_hms(elapsed)));
        }
        out
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer is {}", self.label())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StartOutcome {
    Started { timer: TimerId, at: i64 },
    /// Nothing was written; the existing start instant stands.
    AlreadyRunning(Status),
}

impl StartOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StartOutcome::Started { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StopOutcome {
    Stopped {
        timer: TimerId,
        started_at: i64,
        stopped_at: i64,
        report: Report,
    },
    /// Nothing was touched.
    NotRunning(Status),
}

impl StopOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StopOutcome::Stopped { .. })
    }
}

/// Start/stop/status operations against the markers of one registry.
pub struct Lifecycle<'r, C: Clock = SystemClock> {
    registry: &'r Registry,
    clock: C,
}

impl<'r> Lifecycle<'r, SystemClock> {
    pub fn with_system_clock(registry: &'r Registry) -> Self {
        Lifecycle::new(registry, SystemClock)
    }
}

impl<'r, C: Clock> Lifecycle<'r, C> {
    pub fn new(registry: &'r Registry, clock: C) -> Self {
        Lifecycle { registry, clock }
    }

    pub fn marker_path(&self, id: &TimerId) -> Result<PathBuf> {
        Ok(self.registry.path_for(id)?.join(MARKER_FILE))
    }

    /// True iff the marker exists. An absent timer is simply not running.
    pub fn is_running(&self, id: &TimerId) -> Result<bool> {
        let marker = self.marker_path(id)?;
        match fs::symlink_metadata(&marker) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(TimerError::storage(marker, e)),
        }
    }

    pub fn status(&self, id: &TimerId) -> Result<Status> {
        let now = self.clock.now();
        let marker = self.marker_path(id)?;
        let since = match read_marker(&marker) {
            Ok(since) => since,
            Err(TimerError::CorruptMarker { path, content }) => {
                warn!("start marker {} is corrupt: {:?}", path.display(), content);
                return Ok(Status {
                    timer: id.clone(),
                    running: true,
                    since: None,
                    now,
                });
            }
            Err(e) => return Err(e),
        };
        Ok(Status {
            timer: id.clone(),
            running: since.is_some(),
            since,
            now,
        })
    }

    /// Records the current instant as the timer's start, unless it is already running.
    pub fn start(&self, id: &TimerId) -> Result<StartOutcome> {
        self.require_exists(id)?;
        if self.is_running(id)? {
            return Ok(StartOutcome::AlreadyRunning(self.status(id)?));
        }
        self.publish_marker(id)
    }

    /// Writes the timestamp to a temporary file beside the marker, then links
    /// it into place without clobbering. Readers never see a partial marker,
    /// and if two starts race only the first link succeeds.
    fn publish_marker(&self, id: &TimerId) -> Result<StartOutcome> {
        let dir = self.registry.path_for(id)?;
        let marker = dir.join(MARKER_FILE);
        let mut tmp = match NamedTempFile::new_in(&dir) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TimerError::NotFound(id.clone()));
            }
            Err(e) => return Err(TimerError::storage(dir, e)),
        };
        let at = self.clock.now();
        tmp.write_all(format!("{}\n", at).as_bytes())
            .and_then(|_| tmp.flush())
            .map_err(|e| TimerError::storage(tmp.path(), e))?;
        match tmp.persist_noclobber(&marker) {
            Ok(_) => {}
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("lost start race on {}", marker.display());
                return Ok(StartOutcome::AlreadyRunning(self.status(id)?));
            }
            Err(e) => return Err(TimerError::storage(marker, e.error)),
        }
        debug!("started {} at {}", id, at);
        Ok(StartOutcome::Started {
            timer: id.clone(),
            at,
        })
    }

    /// Consumes the marker and reports the time since it was written.
    pub fn stop(&self, id: &TimerId) -> Result<StopOutcome> {
        self.require_exists(id)?;
        if !self.is_running(id)? {
            return Ok(StopOutcome::NotRunning(self.status(id)?));
        }
        let marker = self.marker_path(id)?;
        let started_at = match read_marker(&marker)? {
            Some(s) => s,
            None => return Ok(StopOutcome::NotRunning(self.status(id)?)),
        };
        match fs::remove_file(&marker) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("lost stop race on {}", marker.display());
                return Ok(StopOutcome::NotRunning(self.status(id)?));
            }
            Err(e) => return Err(TimerError::storage(marker, e)),
        }
        let stopped_at = self.clock.now();
        let elapsed = elapsed_between(started_at, stopped_at);
        debug!("stopped {} after {}s", id, elapsed);
        Ok(StopOutcome::Stopped {
            timer: id.clone(),
            started_at,
            stopped_at,
            report: report::report(elapsed),
        })
    }

    fn require_exists(&self, id: &TimerId) -> Result<()> {
        if self.registry.exists(id)? {
            Ok(())
        } else {
            Err(TimerError::NotFound(id.clone()))
        }
    }
}

impl<C: Clock> RunState for Lifecycle<'_, C> {
    fn is_running(&self, id: &TimerId) -> Result<bool> {
        Lifecycle::is_running(self, id)
    }
}

/// Reads the start instant from `marker`; `Ok(None)` if there is no marker.
/// Unparseable content is `CorruptMarker` and the file is left alone.
fn read_marker(marker: &Path) -> Result<Option<i64>> {
    let content = match fs::read_to_string(marker) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(TimerError::storage(marker, e)),
    };
    match parse_marker(&content) {
        Some(s) => Ok(Some(s)),
        None => Err(TimerError::CorruptMarker {
            path: marker.to_path_buf(),
            content,
        }),
    }
}

/// A start instant in the future (clock moved backwards) counts as zero elapsed.
fn elapsed_between(start: i64, end: i64) -> u64 {
    u64::try_from(end.saturating_sub(start)).unwrap_or(0)
}
