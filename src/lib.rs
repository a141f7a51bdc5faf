// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! # timer — filesystem-backed stopwatch timers
//!
//! Each timer's state lives on disk so that `start` and `stop` can be run as
//! separate, short-lived invocations with no daemon in between.
//!
//! ## Layout
//!
//! | Path                          | Meaning |
//! |-------------------------------|---------|
//! | `$HOME/.timer/`               | Registry root (override: `TIMER_DIR`). |
//! | `$HOME/.timer/start.tm`       | Start marker of the unnamed root timer. |
//! | `$HOME/.timer/<name>/`        | A named timer. |
//! | `$HOME/.timer/<name>/start.tm`| Its start marker, present only while running. |
//!
//! A marker holds one line: the start instant in Unix seconds.

pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod report;
pub mod timer_id;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::{Result, TimerError};
pub use lifecycle::{Lifecycle, StartOutcome, Status, StopOutcome, MARKER_FILE};
pub use registry::{Registry, RunState};
pub use report::{report, Report};
pub use timer_id::TimerId;
