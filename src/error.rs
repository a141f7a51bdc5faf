// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Error taxonomy shared by the registry and the lifecycle engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::timer_id::TimerId;

pub type Result<T> = std::result::Result<T, TimerError>;

#[derive(Debug, Error)]
pub enum TimerError {
    /// A directory could not be created or removed because of permissions,
    /// link limits, a full device or a read-only mount.
    #[error("unable to create or remove '{}': {source}", path.display())]
    StorageFatal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid timer name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("timer '{0}' does not exist")]
    NotFound(TimerId),

    #[error("timer '{0}' is running; stop it before deleting")]
    TimerBusy(TimerId),

    /// The marker is left on disk for manual recovery.
    #[error("start marker '{}' is corrupt: {content:?}", path.display())]
    CorruptMarker { path: PathBuf, content: String },

    #[error("i/o error on '{}': {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path for timer '{name}' is too long ({len} bytes)")]
    PathTooLong { name: String, len: usize },
}

impl TimerError {
    /// Fatal errors abort the invocation; the rest are rejections of the
    /// caller's request that leave the registry untouched.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TimerError::StorageFatal { .. }
                | TimerError::CorruptMarker { .. }
                | TimerError::Storage { .. }
                | TimerError::PathTooLong { .. }
        )
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TimerError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Classifies a failed `mkdir`/`rmdir`: the errno values that mean the
    /// registry can never be written become `StorageFatal`, everything else
    /// stays a plain `Storage` error.
    pub(crate) fn from_dir_op(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if is_fatal_storage(&source) {
            TimerError::StorageFatal { path, source }
        } else {
            TimerError::Storage { path, source }
        }
    }
}

#[cfg(unix)]
fn is_fatal_storage(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EACCES) | Some(libc::EPERM) | Some(libc::EMLINK) | Some(libc::ENOSPC) | Some(libc::EROFS)
    )
}

#[cfg(not(unix))]
fn is_fatal_storage(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::PermissionDenied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_not_fatal() {
        let invalid = TimerError::InvalidName {
            name: "start".to_string(),
            reason: "reserved command",
        };
        assert!(!invalid.is_fatal());
        assert!(!TimerError::NotFound(TimerId::Named("x".into())).is_fatal());
        assert!(!TimerError::TimerBusy(TimerId::Root).is_fatal());
    }

    #[test]
    fn test_storage_errors_are_fatal() {
        let e = TimerError::storage("/tmp/x", io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(e.is_fatal());
        let corrupt = TimerError::CorruptMarker {
            path: PathBuf::from("/tmp/x/start.tm"),
            content: "junk".to_string(),
        };
        assert!(corrupt.is_fatal());
    }

    #[cfg(unix)]
    #[test]
    fn test_from_dir_op_classifies_errno() {
        let denied = io::Error::from_raw_os_error(libc::EACCES);
        assert!(matches!(
            TimerError::from_dir_op("/x", denied),
            TimerError::StorageFatal { .. }
        ));
        let rofs = io::Error::from_raw_os_error(libc::EROFS);
        assert!(matches!(
            TimerError::from_dir_op("/x", rofs),
            TimerError::StorageFatal { .. }
        ));
        let not_empty = io::Error::from_raw_os_error(libc::ENOTEMPTY);
        assert!(matches!(
            TimerError::from_dir_op("/x", not_empty),
            TimerError::Storage { .. }
        ));
    }

    #[test]
    fn test_display_names_timer() {
        let e = TimerError::TimerBusy(TimerId::Named("work".into()));
        assert_eq!(e.to_string(), "timer 'work' is running; stop it before deleting");
    }
}
