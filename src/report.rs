// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Elapsed-time formatting.

use std::fmt;

/// Formatted view of an elapsed duration in whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Report {
    pub elapsed_secs: u64,
}

/// Builds the report for `elapsed_secs`. Pure; see [`Report::clock`] and [`Report::hours`].
pub fn report(elapsed_secs: u64) -> Report {
    Report { elapsed_secs }
}

impl Report {
    /// `HH:MM:SS`, each field zero-padded to two digits. Hours are not
    /// capped, so 100 hours or more simply widens the first field.
    pub fn clock(&self) -> String {
        format_hms(self.elapsed_secs)
    }

    /// Elapsed hours as a fraction.
    pub fn hours(&self) -> f64 {
        self.elapsed_secs as f64 / 3600.0
    }

    /// Hours rounded to two decimal places, as displayed.
    pub fn hours_display(&self) -> String {
        format!("{:.2}", self.hours())
    }
}

/// Prints as the stop report: a blank line, then the clock and hours lines.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "time: \t{}", self.clock())?;
        write!(f, "hours:\t{}", self.hours_display())
    }
}

pub fn format_hms(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}
