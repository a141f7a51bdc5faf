// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Registry root resolution.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use log::warn;

/// Directory under `$HOME` that holds the registry.
pub const DEFAULT_DIR: &str = ".timer";

/// Environment variable overriding the registry root.
pub const DIR_ENV: &str = "TIMER_DIR";

/// Resolved configuration, threaded into the registry at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
}

impl Config {
    /// Resolves from `--dir`, then `$TIMER_DIR`, then `$HOME/.timer`.
    pub fn resolve(dir_flag: Option<PathBuf>) -> Config {
        Config::from_sources(dir_flag, env::var_os(DIR_ENV), env::var_os("HOME"))
    }

    /// Resolution with every input explicit. Empty values count as unset.
    pub fn from_sources(
        dir_flag: Option<PathBuf>,
        dir_env: Option<OsString>,
        home: Option<OsString>,
    ) -> Config {
        let root = dir_flag
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| dir_env.filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| {
                let home = home.filter(|h| !h.is_empty()).map(PathBuf::from);
                if home.is_none() {
                    warn!("HOME is not set; using ./{}", DEFAULT_DIR);
                }
                home.unwrap_or_else(|| PathBuf::from(".")).join(DEFAULT_DIR)
            });
        Config { root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_default() {
        let cfg = Config::from_sources(None, None, Some("/home/me".into()));
        assert_eq!(cfg.root, PathBuf::from("/home/me/.timer"));
    }

    #[test]
    fn test_env_overrides_home() {
        let cfg = Config::from_sources(None, Some("/srv/timers".into()), Some("/home/me".into()));
        assert_eq!(cfg.root, PathBuf::from("/srv/timers"));
    }

    #[test]
    fn test_flag_overrides_env() {
        let cfg = Config::from_sources(
            Some(PathBuf::from("/opt/t")),
            Some("/srv/timers".into()),
            Some("/home/me".into()),
        );
        assert_eq!(cfg.root, PathBuf::from("/opt/t"));
    }

    #[test]
    fn test_empty_values_ignored() {
        let cfg = Config::from_sources(Some(PathBuf::new()), Some("".into()), Some("/home/me".into()));
        assert_eq!(cfg.root, PathBuf::from("/home/me/.timer"));
    }

    #[test]
    fn test_missing_home_falls_back_to_cwd() {
        let cfg = Config::from_sources(None, None, None);
        assert_eq!(cfg.root, PathBuf::from("./.timer"));
    }
}
