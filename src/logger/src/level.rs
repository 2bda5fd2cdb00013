// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Severity of a log record. Records below the logger threshold are dropped
/// before they are formatted.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Debug = 0,
    Info = 1,
    #[serde(alias = "warning")]
    Warn = 2,
    Error = 3,
}

/// All levels, in ascending order of severity.
pub const LEVELS: [Level; 4] = [Level::Debug, Level::Info, Level::Warn, Level::Error];

impl Level {
    /// Converts a raw numeric level, clamping anything out of range to
    /// `Level::Error`.
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            _ => Level::Error,
        }
    }

    /// The four letter code used in formatted lines.
    pub fn code(&self) -> &'static str {
        match self {
            Level::Debug => "DBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERRO",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<u32> for Level {
    fn from(value: u32) -> Self {
        Level::from_u32(value)
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

impl From<Level> for log::LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            // trace records are folded into debug, so let them through
            Level::Debug => log::LevelFilter::Trace,
            Level::Info => log::LevelFilter::Info,
            Level::Warn => log::LevelFilter::Warn,
            Level::Error => log::LevelFilter::Error,
        }
    }
}

/// Returned when a string does not name a level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "dbug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" | "erro" => Ok(Level::Error),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn out_of_range_clamps_to_error() {
        assert_eq!(Level::from_u32(3), Level::Error);
        assert_eq!(Level::from_u32(4), Level::Error);
        assert_eq!(Level::from(u32::MAX), Level::Error);
        assert_eq!(Level::from_u32(1), Level::Info);
    }

    #[test]
    fn codes() {
        let codes: Vec<&str> = LEVELS.iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec!["DBUG", "INFO", "WARN", "ERRO"]);
        assert_eq!(format!("{}", Level::Warn), "WARN");
    }

    #[test]
    fn parse() {
        assert_eq!("Info".parse::<Level>(), Ok(Level::Info));
        assert_eq!(" warning ".parse::<Level>(), Ok(Level::Warn));
        let err = "verbose".parse::<Level>().unwrap_err();
        assert_eq!(err.to_string(), "unknown log level: verbose");
    }

    #[test]
    fn from_log_level() {
        assert_eq!(Level::from(log::Level::Trace), Level::Debug);
        assert_eq!(Level::from(log::Level::Error), Level::Error);
    }
}
