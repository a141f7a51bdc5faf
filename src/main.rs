// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! # timer — named stopwatch timers
//!
//! Starts and stops timers whose state lives under `$HOME/.timer`, so each
//! command is an independent short-lived process.
//!
//! ## Subcommands
//!
//! | Command   | Description |
//! |-----------|-------------|
//! | `start`   | Start a timer (creates a named timer on first use). |
//! | `stop`    | Stop a timer and print the elapsed time. |
//! | `status`  | Print whether a timer is running, and for how long. |
//! | `list`    | Print all named timers; `-l` adds their state. |
//! | `create`  | Create a named timer. |
//! | `delete`  | Delete a stopped named timer. |
//! | `manpage` | Output Unix manual page in groff format to stdout. |
//!
//! Omitting the name addresses the unnamed root timer.
//!
//! ## Exit status
//!
//! 0 on success, 1 when the request was rejected (already running, not
//! running, bad name, no such timer, timer busy), 2 on storage failures.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, TimeZone};
use clap::{ArgAction, Args, Parser, Subcommand};
#[cfg(unix)]
use libc::{signal, SIGPIPE, SIG_IGN};
use log::{debug, info, warn};
use thiserror::Error;

use timer::lifecycle::{StartOutcome, StopOutcome};
use timer::{Config, Lifecycle, Registry, TimerError, TimerId};

/// Environment variable holding an env_logger filter spec.
const LOG_ENV: &str = "TIMER_LOG";

/// Named stopwatch timers persisted on the filesystem
#[derive(Parser, Debug)]
#[command(name = "timer", version, about, long_about = None)]
struct Cli {
    /// Registry directory (default: $TIMER_DIR, then $HOME/.timer)
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress log output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a timer
    Start(Target),
    /// Stop a timer and report the elapsed time
    Stop(Target),
    /// Show whether a timer is running
    Status(Target),
    /// List named timers
    List {
        /// Also show whether each timer is running
        #[arg(short, long)]
        long: bool,
    },
    /// Create a named timer
    Create(Target),
    /// Delete a stopped named timer
    Delete(Target),
    /// Output Unix manual page in groff format to stdout
    Manpage,
}

/// Timer addressed by a command; no name means the root timer.
#[derive(Args, Debug)]
struct Target {
    /// Timer name
    #[arg(value_name = "NAME")]
    name: Option<String>,

    /// Timer name, given as an option
    #[arg(short = 'n', long = "name", value_name = "NAME", conflicts_with = "name")]
    flag_name: Option<String>,
}

impl Target {
    fn id(&self) -> Result<TimerId, TimerError> {
        TimerId::from_arg(self.name.as_deref().or(self.flag_name.as_deref()))
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// How a command that did not fail ended.
#[derive(Debug, PartialEq, Eq)]
enum Exit {
    Done,
    /// The request was a no-op (already running / not running).
    Rejected,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, out: &mut dyn Write) -> Result<Exit, CliError> {
    if let Command::Manpage = cli.command {
        out.write_all(manpage_content().as_bytes())?;
        out.flush()?;
        return Ok(Exit::Done);
    }

    let config = Config::resolve(cli.dir.clone());
    debug!("registry root {}", config.root.display());
    let registry = Registry::new(config.root);
    registry.ensure_root()?;
    let engine = Lifecycle::with_system_clock(&registry);

    match &cli.command {
        Command::Start(target) => cmd_start(&registry, &engine, &target.id()?, out),
        Command::Stop(target) => cmd_stop(&engine, &target.id()?, out),
        Command::Status(target) => {
            let status = engine.status(&target.id()?)?;
            writeln!(out, "{}", status.detail())?;
            Ok(Exit::Done)
        }
        Command::List { long } => cmd_list(&registry, &engine, *long, out),
        Command::Create(target) => {
            let id = target.id()?;
            if registry.create(&id)? {
                info!("created timer {}", id);
                writeln!(out, "created {}", id)?;
            } else if !id.is_root() {
                writeln!(out, "{} already exists", id)?;
            }
            Ok(Exit::Done)
        }
        Command::Delete(target) => {
            let id = target.id()?;
            registry.delete(&id, &engine)?;
            info!("deleted timer {}", id);
            writeln!(out, "deleted {}", id)?;
            Ok(Exit::Done)
        }
        Command::Manpage => Ok(Exit::Done),
    }
}

/// A named timer is created on its first start.
fn cmd_start(
    registry: &Registry,
    engine: &Lifecycle<'_>,
    id: &TimerId,
    out: &mut dyn Write,
) -> Result<Exit, CliError> {
    if registry.create(id)? {
        info!("created timer {}", id);
    }
    match engine.start(id)? {
        StartOutcome::Started { at, .. } => {
            let when = Local
                .timestamp_opt(at, 0)
                .single()
                .map(|dt| dt.format("%a %b %d %H:%M:%S %Z %Y").to_string())
                .unwrap_or_else(|| at.to_string());
            writeln!(out, "started {} at {}", id, when)?;
            Ok(Exit::Done)
        }
        StartOutcome::AlreadyRunning(status) => {
            writeln!(out, "{}", status.detail())?;
            Ok(Exit::Rejected)
        }
    }
}

fn cmd_stop(engine: &Lifecycle<'_>, id: &TimerId, out: &mut dyn Write) -> Result<Exit, CliError> {
    match engine.stop(id)? {
        StopOutcome::Stopped { report, .. } => {
            writeln!(out, "{}", report)?;
            Ok(Exit::Done)
        }
        StopOutcome::NotRunning(status) => {
            writeln!(out, "{}", status)?;
            Ok(Exit::Rejected)
        }
    }
}

fn cmd_list(
    registry: &Registry,
    engine: &Lifecycle<'_>,
    long: bool,
    out: &mut dyn Write,
) -> Result<Exit, CliError> {
    for name in registry.list()? {
        if long {
            // Directories made by hand may not be valid timer names.
            let label = match engine.status(&TimerId::Named(name.clone())) {
                Ok(status) => status.label(),
                Err(e) => {
                    warn!("{}: {}", name, e);
                    "unknown"
                }
            };
            writeln!(out, "{}\t{}", name, label)?;
        } else {
            writeln!(out, "{}", name)?;
        }
    }
    Ok(Exit::Done)
}

/// Groff man page source.
fn manpage_content() -> &'static str {
    r#".TH TIMER 1 "October 2026" "" "timer"
.SH NAME
timer \- named stopwatch timers kept on the filesystem
.SH SYNOPSIS
.B timer start
.RI [ name ]
.PP
.B timer stop
.RI [ name ]
.PP
.B timer status
.RI [ name ]
.PP
.B timer list
.RB [ \-l ]
.PP
.B timer create
.I name
.PP
.B timer delete
.I name
.PP
.B timer manpage
.SH DESCRIPTION
.B timer
records when a timer was started and reports the elapsed wall-clock time
when it is stopped. No process stays running in between: each timer is a
directory under the registry root and a running timer holds a
.I start.tm
file containing the start time in Unix seconds.
.PP
Omitting
.I name
addresses the unnamed root timer. Names may not be one of the command
words (start, stop, status, list, create, delete) and may not contain
a dot or a path separator. The name may also be given as
.BR \-n " " \fIname\fR.
.SH COMMANDS
.TP
.B start
Start the timer. A named timer is created on first use. Starting a
running timer changes nothing and prints its status.
.TP
.B stop
Stop the timer and print the elapsed time as HH:MM:SS and in hours.
.TP
.B status
Print whether the timer is running, with its start time and elapsed time.
.TP
.B list
Print the names of all named timers.
.B \-l
adds whether each is running.
.TP
.B create
Create a named timer. Creating an existing timer is not an error.
.TP
.B delete
Delete a named timer. A running timer must be stopped first.
.TP
.B manpage
Output this manual page in groff format.
.SH OPTIONS
.TP
.BI \-\-dir " dir"
Use
.I dir
as the registry root.
.TP
.BR \-v ", " \-\-verbose
More log output on stderr; repeat for debug output.
.TP
.BR \-q ", " \-\-quiet
Only log errors.
.SH ENVIRONMENT
.TP
.B TIMER_DIR
Registry root when
.B \-\-dir
is not given.
.TP
.B HOME
The default registry root is
.IR $HOME/.timer .
.TP
.B TIMER_LOG
Log filter (e.g. debug), overriding \-v and \-q.
.SH EXIT STATUS
0 on success, 1 if the request was rejected (already running, not
running, invalid name, no such timer, timer busy), 2 on storage errors.
.SH FILES
.TP
.I $HOME/.timer/start.tm
Start marker of the root timer.
.TP
.I $HOME/.timer/<name>/start.tm
Start marker of a named timer.
"#
}

fn main() -> ExitCode {
    #[cfg(unix)]
    unsafe {
        signal(SIGPIPE, SIG_IGN);
    }
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&cli, &mut out) {
        Ok(Exit::Done) => ExitCode::SUCCESS,
        Ok(Exit::Rejected) => ExitCode::from(1),
        Err(CliError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("timer: {}", e);
            match e {
                CliError::Timer(t) if !t.is_fatal() => ExitCode::from(1),
                _ => ExitCode::from(2),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run_args(dir: &std::path::Path, args: &[&str]) -> (Result<Exit, CliError>, String) {
        let mut argv = vec!["timer", "--dir", dir.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut buf = Vec::new();
        let result = run(&cli, &mut buf);
        (result, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_parse_positional_and_flag_name() {
        let cli = Cli::try_parse_from(["timer", "start", "work"]).unwrap();
        match cli.command {
            Command::Start(t) => assert_eq!(t.id().unwrap(), TimerId::Named("work".into())),
            other => panic!("unexpected {:?}", other),
        }
        let cli = Cli::try_parse_from(["timer", "stop", "-n", "work"]).unwrap();
        match cli.command {
            Command::Stop(t) => assert_eq!(t.id().unwrap(), TimerId::Named("work".into())),
            other => panic!("unexpected {:?}", other),
        }
        let cli = Cli::try_parse_from(["timer", "status"]).unwrap();
        match cli.command {
            Command::Status(t) => assert!(t.id().unwrap().is_root()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_both_name_forms() {
        assert!(Cli::try_parse_from(["timer", "start", "a", "-n", "b"]).is_err());
    }

    #[test]
    fn test_start_creates_named_timer() {
        let dir = tempfile::tempdir().unwrap();
        let (result, out) = run_args(dir.path(), &["start", "work"]);
        assert_eq!(result.unwrap(), Exit::Done);
        assert!(out.starts_with("started work at "));
        assert!(dir.path().join("work").join("start.tm").is_file());
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        run_args(dir.path(), &["start"]).0.unwrap();
        let (result, out) = run_args(dir.path(), &["start"]);
        assert_eq!(result.unwrap(), Exit::Rejected);
        assert!(out.starts_with("timer is running"));
    }

    #[test]
    fn test_stop_prints_report() {
        let dir = tempfile::tempdir().unwrap();
        run_args(dir.path(), &["create", "work"]).0.unwrap();
        let start = chrono::Utc::now().timestamp() - 3661;
        fs::write(dir.path().join("work").join("start.tm"), format!("{}\n", start)).unwrap();
        let (result, out) = run_args(dir.path(), &["stop", "work"]);
        assert_eq!(result.unwrap(), Exit::Done);
        assert!(out.starts_with("\ntime: \t01:01:0"), "got {:?}", out);
        assert!(out.contains("hours:\t1.02"));
        assert!(dir.path().join("work").is_dir());
        assert!(!dir.path().join("work").join("start.tm").exists());
    }

    #[test]
    fn test_stop_not_running_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (result, out) = run_args(dir.path(), &["stop"]);
        assert_eq!(result.unwrap(), Exit::Rejected);
        assert_eq!(out, "timer is not running\n");
    }

    #[test]
    fn test_stop_absent_named_timer_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (result, _) = run_args(dir.path(), &["stop", "ghost"]);
        match result {
            Err(CliError::Timer(e @ TimerError::NotFound(_))) => assert!(!e.is_fatal()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_list_and_long_list() {
        let dir = tempfile::tempdir().unwrap();
        for n in ["b", "a"] {
            run_args(dir.path(), &["create", n]).0.unwrap();
        }
        run_args(dir.path(), &["start", "b"]).0.unwrap();
        let (_, out) = run_args(dir.path(), &["list"]);
        assert_eq!(out, "a\nb\n");
        let (_, out) = run_args(dir.path(), &["list", "-l"]);
        assert_eq!(out, "a\tnot running\nb\trunning\n");
    }

    #[test]
    fn test_create_reserved_name_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let (result, _) = run_args(dir.path(), &["create", "stop"]);
        assert!(matches!(
            result,
            Err(CliError::Timer(TimerError::InvalidName { .. }))
        ));
        assert!(!dir.path().join("stop").exists());
    }

    #[test]
    fn test_delete_busy_then_ok() {
        let dir = tempfile::tempdir().unwrap();
        run_args(dir.path(), &["start", "work"]).0.unwrap();
        let (result, _) = run_args(dir.path(), &["delete", "work"]);
        assert!(matches!(result, Err(CliError::Timer(TimerError::TimerBusy(_)))));
        run_args(dir.path(), &["stop", "work"]).0.unwrap();
        let (result, out) = run_args(dir.path(), &["delete", "work"]);
        assert_eq!(result.unwrap(), Exit::Done);
        assert_eq!(out, "deleted work\n");
        assert!(!dir.path().join("work").exists());
    }

    #[test]
    fn test_manpage_mentions_commands() {
        let man = manpage_content();
        assert!(man.starts_with(".TH TIMER 1"));
        for cmd in ["start", "stop", "status", "list", "create", "delete"] {
            assert!(man.contains(&format!(".B timer {}", cmd)), "{} missing", cmd);
        }
    }
}
