// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::*;

use chrono::Local;
use parking_lot::RwLock;
use std::fmt::{Arguments, Display};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// read on every logging call
struct Settings {
    level: Level,
    show_caller: bool,
    hooks: Hooks,
}

/// A tag-scoped logger. Records below the configured level are dropped
/// before any formatting. Everything else is formatted, handed to the hook
/// registered for its level, and written to the output of its tag.
///
/// A logger is usually constructed once with a `LoggerBuilder` and shared by
/// reference, or installed as the `log` crate logger with `start`.
pub struct Logger {
    settings: RwLock<Settings>,
    registry: RwLock<TagRegistry>,
    default_tag: String,
    claims: DirectoryClaims,
    format: FormatFunction,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// A logger writing every tag to standard error, with the program name as
    /// the default tag.
    pub fn new() -> Self {
        Self::with_parts(
            &program_name(),
            Level::Debug,
            true,
            None,
            DirectoryClaims::global(),
            default_format,
        )
    }

    pub(crate) fn with_parts(
        default_tag: &str,
        level: Level,
        show_caller: bool,
        queue_depth: Option<usize>,
        claims: DirectoryClaims,
        format: FormatFunction,
    ) -> Self {
        Self {
            settings: RwLock::new(Settings {
                level,
                show_caller,
                hooks: Hooks::new(),
            }),
            registry: RwLock::new(TagRegistry::new(default_tag, queue_depth)),
            default_tag: default_tag.to_owned(),
            claims,
            format,
        }
    }

    /// Register the logger with the `log` crate. The record target selects
    /// the tag, so `log::info!(target: "encode", ...)` writes to `encode`.
    pub fn install(&'static self) -> Result<(), Error> {
        log::set_logger(self).map_err(ConfigError::from)?;
        // level filtering happens here, where the threshold can change
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }

    /// Move the logger into static storage and install it, see `install`.
    pub fn start(self) -> Result<&'static Logger, Error> {
        let logger: &'static Logger = Box::leak(Box::new(self));
        logger.install()?;
        Ok(logger)
    }

    pub fn level(&self) -> Level {
        self.settings.read().level
    }

    pub fn set_level(&self, level: Level) {
        self.settings.write().level = level;
    }

    pub fn show_caller(&self) -> bool {
        self.settings.read().show_caller
    }

    /// Controls whether `file:line` of the call site is included. Leave this
    /// off in production to skip the caller lookup.
    pub fn set_show_caller(&self, show: bool) {
        self.settings.write().show_caller = show;
    }

    /// Register the hook for a level. Only one hook may be registered per
    /// level, a second registration fails and leaves the first in place.
    pub fn register_hook<F>(&self, level: Level, hook: F) -> Result<(), Error>
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.settings.write().hooks.register(level, Arc::new(hook))?;
        Ok(())
    }

    /// Register a new tag. If a directory is configured, the tag gets its own
    /// rotating file in it.
    pub fn register_tag(&self, name: &str) -> Result<(), Error> {
        self.registry.write().register(name)
    }

    pub fn default_tag(&self) -> &str {
        &self.default_tag
    }

    pub fn tags(&self) -> Vec<String> {
        self.registry
            .read()
            .tags()
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn output_directory(&self) -> Option<PathBuf> {
        self.registry.read().directory().map(|d| d.path.clone())
    }

    /// Write every tag to rotating files in `path`. Files rotate when they
    /// would grow past `max_file_size_mb` megabytes, and at most `max_files`
    /// files (live and archived) are kept per tag.
    pub fn set_output_directory<T: AsRef<Path>>(
        &self,
        path: T,
        max_file_size_mb: u64,
        max_files: usize,
    ) -> Result<(), Error> {
        self.set_output_directory_bytes(path, megabytes(max_file_size_mb), max_files)
    }

    /// As `set_output_directory`, with the size limit in bytes.
    pub fn set_output_directory_bytes<T: AsRef<Path>>(
        &self,
        path: T,
        max_file_size: u64,
        max_files: usize,
    ) -> Result<(), Error> {
        let path = prepare_directory(path.as_ref())?;

        let mut registry = self.registry.write();
        let previous = registry.directory().map(|d| d.path.clone());
        let claimed = previous.as_ref() != Some(&path);
        if claimed {
            self.claims.claim(&path)?;
        }

        let directory = Directory {
            path: path.clone(),
            max_size: max_file_size.max(MIN_FILE_SIZE),
            max_files: max_files.max(MIN_FILE_COUNT),
        };
        if let Err(e) = registry.rebind(directory) {
            if claimed {
                self.claims.release(&path);
            }
            return Err(e);
        }

        if let Some(previous) = previous.filter(|_| claimed) {
            self.claims.release(&previous);
        }
        Ok(())
    }

    /// Flush the outputs of every tag. With queued outputs this waits until
    /// every record logged so far has been written.
    pub fn flush(&self) -> Result<(), Error> {
        self.registry.read().flush()?;
        Ok(())
    }

    /// Filter, format, dispatch and write a single record, returning the
    /// number of bytes written. `tag` defaults to the default tag. Records
    /// below the level are dropped and `Ok(0)` is returned.
    pub fn output(
        &self,
        tag: Option<&str>,
        level: Level,
        caller: Option<Caller>,
        args: Arguments,
    ) -> Result<usize, Error> {
        let (show_caller, hook) = {
            let settings = self.settings.read();
            if level < settings.level {
                metrics::counter!(LOG_SKIP).increment(1);
                return Ok(0);
            }
            (settings.show_caller, settings.hooks.get(level))
        };

        let tag = tag.unwrap_or(&self.default_tag);
        let record = Record {
            level,
            tag,
            caller: caller.filter(|_| show_caller),
            args,
        };

        let mut buffer = Vec::with_capacity(DEFAULT_MSG_SIZE);
        if let Err(e) = (self.format)(&mut buffer, Local::now(), &record) {
            metrics::counter!(LOG_FORMAT_EX).increment(1);
            return Err(e.into());
        }

        if let Some(hook) = hook {
            crate::hooks::dispatch(&hook, tag, &String::from_utf8_lossy(&buffer));
        }

        let written = self.registry.read().resolve(tag).write(&buffer)?;
        Ok(written)
    }

    #[track_caller]
    fn emit(&self, tag: Option<&str>, level: Level, args: Arguments) {
        let caller = Location::caller();
        // the convenience entry points have no way to return the error
        if let Err(e) = self.output(tag, level, Some(caller.into()), args) {
            eprintln!("log output failed: {}", e);
        }
    }

    /// Log formatted arguments at `level` to the default tag.
    #[track_caller]
    pub fn logf(&self, level: Level, args: Arguments) {
        self.emit(None, level, args)
    }

    /// Log formatted arguments at `level` to `tag`.
    #[track_caller]
    pub fn tag_logf(&self, tag: &str, level: Level, args: Arguments) {
        self.emit(Some(tag), level, args)
    }

    #[track_caller]
    pub fn debug<T: Display>(&self, msg: T) {
        self.emit(None, Level::Debug, format_args!("{}", msg))
    }

    #[track_caller]
    pub fn info<T: Display>(&self, msg: T) {
        self.emit(None, Level::Info, format_args!("{}", msg))
    }

    #[track_caller]
    pub fn warn<T: Display>(&self, msg: T) {
        self.emit(None, Level::Warn, format_args!("{}", msg))
    }

    #[track_caller]
    pub fn error<T: Display>(&self, msg: T) {
        self.emit(None, Level::Error, format_args!("{}", msg))
    }

    #[track_caller]
    pub fn tag_debug<T: Display>(&self, tag: &str, msg: T) {
        self.emit(Some(tag), Level::Debug, format_args!("{}", msg))
    }

    #[track_caller]
    pub fn tag_info<T: Display>(&self, tag: &str, msg: T) {
        self.emit(Some(tag), Level::Info, format_args!("{}", msg))
    }

    #[track_caller]
    pub fn tag_warn<T: Display>(&self, tag: &str, msg: T) {
        self.emit(Some(tag), Level::Warn, format_args!("{}", msg))
    }

    #[track_caller]
    pub fn tag_error<T: Display>(&self, tag: &str, msg: T) {
        self.emit(Some(tag), Level::Error, format_args!("{}", msg))
    }

    #[track_caller]
    pub fn debugf(&self, args: Arguments) {
        self.emit(None, Level::Debug, args)
    }

    #[track_caller]
    pub fn infof(&self, args: Arguments) {
        self.emit(None, Level::Info, args)
    }

    #[track_caller]
    pub fn warnf(&self, args: Arguments) {
        self.emit(None, Level::Warn, args)
    }

    #[track_caller]
    pub fn errorf(&self, args: Arguments) {
        self.emit(None, Level::Error, args)
    }

    #[track_caller]
    pub fn tag_debugf(&self, tag: &str, args: Arguments) {
        self.emit(Some(tag), Level::Debug, args)
    }

    #[track_caller]
    pub fn tag_infof(&self, tag: &str, args: Arguments) {
        self.emit(Some(tag), Level::Info, args)
    }

    #[track_caller]
    pub fn tag_warnf(&self, tag: &str, args: Arguments) {
        self.emit(Some(tag), Level::Warn, args)
    }

    #[track_caller]
    pub fn tag_errorf(&self, tag: &str, args: Arguments) {
        self.emit(Some(tag), Level::Error, args)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        Level::from(metadata.level()) >= self.level()
    }

    fn log(&self, record: &log::Record<'_>) {
        let caller = record.file().map(|file| Caller {
            file,
            line: record.line().unwrap_or(0),
        });
        if let Err(e) = self.output(
            Some(record.target()),
            record.level().into(),
            caller,
            *record.args(),
        ) {
            eprintln!("log output failed: {}", e);
        }
    }

    fn flush(&self) {
        if let Err(e) = Logger::flush(self) {
            eprintln!("log flush failed: {}", e);
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let registry = self.registry.get_mut();
        if let Err(e) = registry.close() {
            eprintln!("failed to close log output: {}", e);
        }
        if let Some(directory) = registry.directory() {
            self.claims.release(&directory.path);
        }
    }
}

/// Create the directory if needed and check that it can hold log files,
/// returning its canonical path.
fn prepare_directory(path: &Path) -> Result<PathBuf, ConfigError> {
    if let Ok(metadata) = std::fs::metadata(path) {
        if !metadata.is_dir() {
            return Err(ConfigError::NotADirectory(path.to_owned()));
        }
    }
    let create_error = |source| ConfigError::CreateDirectory {
        path: path.to_owned(),
        source,
    };
    std::fs::create_dir_all(path).map_err(create_error)?;
    let path = std::fs::canonicalize(path).map_err(create_error)?;
    let metadata = std::fs::metadata(&path).map_err(create_error)?;
    if metadata.permissions().readonly() {
        return Err(ConfigError::PermissionDenied(path));
    }
    Ok(path)
}

/// Convert a size in megabytes to bytes, with a floor of one megabyte.
pub(crate) fn megabytes(size_mb: u64) -> u64 {
    size_mb.max(1).saturating_mul(MB)
}

/// The file name of the running program up to its first `.`.
pub(crate) fn program_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg| {
            Path::new(&arg)
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.split('.').next())
                .map(|name| name.trim().to_owned())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_TAG.to_owned())
}
