// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! On-disk set of named timers.
//!
//! The registry root is a single directory; each named timer is a
//! subdirectory of it. The root timer has no directory of its own and keeps
//! its marker directly under the registry root. The registry only deals with
//! existence; whether a timer is running is the lifecycle engine's business.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Result, TimerError};
use crate::lifecycle::MARKER_FILE;
use crate::timer_id::{self, TimerId};

#[cfg(unix)]
const PATH_MAX: usize = libc::PATH_MAX as usize;
#[cfg(not(unix))]
const PATH_MAX: usize = 260;

/// Anything that can answer whether a timer is currently running.
pub trait RunState {
    fn is_running(&self, id: &TimerId) -> Result<bool>;
}

#[derive(Clone, Debug)]
pub struct Registry {
    root: PathBuf,
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Registry { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the registry root if it is absent. A concurrent creator
    /// winning the race counts as success.
    pub fn ensure_root(&self) -> Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        debug!("creating registry root {}", self.root.display());
        make_dir(&self.root)
    }

    /// Storage directory for `id`. Deterministic for a given registry root.
    pub fn path_for(&self, id: &TimerId) -> Result<PathBuf> {
        let dir = match id {
            TimerId::Root => self.root.clone(),
            TimerId::Named(name) => {
                timer_id::validate_name(name)?;
                self.root.join(name)
            }
        };
        // The longest path ever built for a timer is its marker.
        let len = dir.as_os_str().len() + 1 + MARKER_FILE.len();
        if len >= PATH_MAX {
            return Err(TimerError::PathTooLong {
                name: id.to_string(),
                len,
            });
        }
        Ok(dir)
    }

    /// The root timer always exists; a named timer exists iff its directory does.
    pub fn exists(&self, id: &TimerId) -> Result<bool> {
        match id {
            TimerId::Root => Ok(true),
            TimerId::Named(_) => Ok(self.path_for(id)?.is_dir()),
        }
    }

    /// Creates the timer's directory. Idempotent; returns `true` only when
    /// this call created it. For the root timer this just ensures the root.
    pub fn create(&self, id: &TimerId) -> Result<bool> {
        let path = self.path_for(id)?;
        if id.is_root() {
            self.ensure_root()?;
            return Ok(false);
        }
        if path.is_dir() {
            return Ok(false);
        }
        self.ensure_root()?;
        debug!("creating timer directory {}", path.display());
        match fs::create_dir(&path) {
            Ok(()) => Ok(true),
            // A plain file of the same name is not a timer.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(false),
            Err(e) => Err(TimerError::from_dir_op(path, e)),
        }
    }

    /// Removes a stopped timer's directory.
    pub fn delete(&self, id: &TimerId, state: &dyn RunState) -> Result<()> {
        if id.is_root() {
            return Err(TimerError::InvalidName {
                name: id.to_string(),
                reason: "the root timer cannot be deleted",
            });
        }
        let path = self.path_for(id)?;
        if !path.is_dir() {
            return Err(TimerError::NotFound(id.clone()));
        }
        if state.is_running(id)? {
            return Err(TimerError::TimerBusy(id.clone()));
        }
        debug!("removing timer directory {}", path.display());
        match fs::remove_dir(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(TimerError::NotFound(id.clone())),
            Err(e) => Err(TimerError::from_dir_op(path, e)),
        }
    }

    /// Names of all existing timers, sorted. Entries containing a `.` (dotfiles,
    /// the root timer's marker) and non-directories are skipped. Symlinks are
    /// followed, as in [`Registry::exists`].
    ///
    /// The directory is read eagerly so the names can be sorted; the returned
    /// iterator only walks the collected list.
    pub fn list(&self) -> Result<impl Iterator<Item = String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| TimerError::storage(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TimerError::storage(&self.root, e))?;
            let name = match entry.file_name().into_string() {
                Ok(n) => n,
                Err(raw) => {
                    warn!("skipping non-UTF-8 entry {:?} in {}", raw, self.root.display());
                    continue;
                }
            };
            if name.contains('.') {
                continue;
            }
            let path = entry.path();
            match fs::metadata(&path) {
                Ok(m) if m.is_dir() => names.push(name),
                Ok(_) => debug!("skipping non-directory entry {}", name),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("skipping dangling entry {}", name)
                }
                Err(e) => return Err(TimerError::storage(path, e)),
            }
        }
        names.sort();
        Ok(names.into_iter())
    }
}

/// `mkdir -p` with mode 0755.
fn make_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    match builder.create(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(TimerError::from_dir_op(path, e)),
    }
}
