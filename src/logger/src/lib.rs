// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! This crate provides a tag-scoped logger which writes each tag to its own
//! set of size and count bounded rotating files.
//!
//! The core of this crate is the `Logger` type, which is constructed using a
//! `LoggerBuilder` or a `LogConfig`. A logger has a default tag, named after
//! the program unless configured, and any number of additional tags. Records
//! logged to a tag which was never registered are routed to the default tag.
//!
//! Until a directory is configured every tag writes to standard error. Once
//! one is, the tag `encode` writes to `encode_last.log` in it. When a write
//! would grow that file past the size limit, the file is renamed to the next
//! archive, for example `encode_00000003.log`, and a new live file is started.
//! The oldest archives are removed so that at most the configured number of
//! files exist per tag. A restarted process resumes the live file if it is
//! still below the size limit.
//!
//! Each level may carry one hook, which receives a copy of every formatted
//! line at that level, for example to raise alerts on errors.
//!
//! Writes are synchronous by default. `LoggerBuilder::queue_depth` moves the
//! file I/O onto a background thread per tag, in which case `Logger::flush`
//! must be called before shutdown.
//!
//! ```no_run
//! use taglog::*;
//!
//! let logger = LoggerBuilder::new()
//!     .tag("request")
//!     .directory("log", 100 * MB, 10)
//!     .build()
//!     .expect("failed to initialize logger");
//!
//! logger.info("started");
//! infof!(logger, tag: "request", "ip:{} method:{}", "127.0.0.1", "POST");
//! ```

mod builder;
mod claims;
mod config;
mod error;
mod format;
mod hooks;
mod level;
mod logger;
mod outputs;
mod queued;
mod registry;
mod rotating;
mod traits;

pub use builder::*;
pub use claims::*;
pub use config::*;
pub use error::*;
pub use format::*;
pub use hooks::{Hook, Hooks};
pub use level::*;
pub use logger::*;
pub use outputs::*;
pub use queued::*;
pub use registry::*;
pub use rotating::*;
pub use traits::*;

use std::sync::OnceLock;

pub const KB: u64 = 1 << 10;
pub const MB: u64 = 1 << 20;

// default capacity of a formatting buffer
pub(crate) const DEFAULT_MSG_SIZE: usize = 256;

// tag used when the program name is unavailable
pub(crate) const DEFAULT_TAG: &str = "app";

pub(crate) const LOG_OPEN: &str = "log_open";
pub(crate) const LOG_OPEN_EX: &str = "log_open_ex";
pub(crate) const LOG_WRITE: &str = "log_write";
pub(crate) const LOG_WRITE_BYTE: &str = "log_write_byte";
pub(crate) const LOG_WRITE_EX: &str = "log_write_ex";
pub(crate) const LOG_SKIP: &str = "log_skip";
pub(crate) const LOG_ROTATE: &str = "log_rotate";
pub(crate) const LOG_FORMAT_EX: &str = "log_format_ex";
pub(crate) const LOG_HOOK_EX: &str = "log_hook_ex";

/// The process wide logger, created with default settings on first use.
pub fn global() -> &'static Logger {
    static GLOBAL: OnceLock<Logger> = OnceLock::new();
    GLOBAL.get_or_init(Logger::new)
}

/// Log a formatted message at debug level. An optional `tag:` selects the
/// tag, otherwise the default tag is used.
#[macro_export]
macro_rules! debugf {
    ($logger:expr, tag: $tag:expr, $($arg:tt)+) => (
        $logger.tag_debugf($tag, format_args!($($arg)+))
    );
    ($logger:expr, $($arg:tt)+) => (
        $logger.debugf(format_args!($($arg)+))
    );
}

/// Log a formatted message at info level, see `debugf!`.
#[macro_export]
macro_rules! infof {
    ($logger:expr, tag: $tag:expr, $($arg:tt)+) => (
        $logger.tag_infof($tag, format_args!($($arg)+))
    );
    ($logger:expr, $($arg:tt)+) => (
        $logger.infof(format_args!($($arg)+))
    );
}

/// Log a formatted message at warn level, see `debugf!`.
#[macro_export]
macro_rules! warnf {
    ($logger:expr, tag: $tag:expr, $($arg:tt)+) => (
        $logger.tag_warnf($tag, format_args!($($arg)+))
    );
    ($logger:expr, $($arg:tt)+) => (
        $logger.warnf(format_args!($($arg)+))
    );
}

/// Log a formatted message at error level, see `debugf!`.
#[macro_export]
macro_rules! errorf {
    ($logger:expr, tag: $tag:expr, $($arg:tt)+) => (
        $logger.tag_errorf($tag, format_args!($($arg)+))
    );
    ($logger:expr, $($arg:tt)+) => (
        $logger.errorf(format_args!($($arg)+))
    );
}
