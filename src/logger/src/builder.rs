// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::*;

use std::path::PathBuf;

/// A type to construct a `Logger`.
pub struct LoggerBuilder {
    level: Level,
    show_caller: bool,
    default_tag: Option<String>,
    tags: Vec<String>,
    // directory, max file size in bytes, max file count
    directory: Option<(PathBuf, u64, usize)>,
    queue_depth: Option<usize>,
    format: FormatFunction,
    claims: Option<DirectoryClaims>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            show_caller: true,
            default_tag: None,
            tags: Vec::new(),
            directory: None,
            queue_depth: None,
            format: default_format,
            claims: None,
        }
    }
}

impl LoggerBuilder {
    /// Create a new logger builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the minimum level which will be written.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets whether the `file:line` of the call site is included.
    pub fn show_caller(mut self, show: bool) -> Self {
        self.show_caller = show;
        self
    }

    /// Sets the name of the default tag. Defaults to the program name.
    pub fn default_tag(mut self, name: &str) -> Self {
        self.default_tag = Some(name.to_owned());
        self
    }

    /// Adds a tag to register when the logger is built.
    pub fn tag(mut self, name: &str) -> Self {
        self.tags.push(name.to_owned());
        self
    }

    /// Write to rotating files in the directory instead of standard error.
    /// The maximum file size is in bytes.
    pub fn directory<T: Into<PathBuf>>(mut self, path: T, max_size: u64, max_files: usize) -> Self {
        self.directory = Some((path.into(), max_size, max_files));
        self
    }

    /// As `directory`, with the maximum file size in megabytes. Sizes below
    /// one megabyte are raised to one.
    pub fn directory_mb<T: Into<PathBuf>>(
        self,
        path: T,
        max_size_mb: u64,
        max_files: usize,
    ) -> Self {
        self.directory(path, crate::logger::megabytes(max_size_mb), max_files)
    }

    /// Move file writes onto one background thread per tag, each fed by a
    /// queue of the given depth. `Logger::flush` must be called, or the
    /// logger dropped, before shutdown.
    pub fn queue_depth(mut self, messages: usize) -> Self {
        self.queue_depth = Some(messages);
        self
    }

    /// Sets the format function to be used to format messages.
    pub fn format(mut self, format: FormatFunction) -> Self {
        self.format = format;
        self
    }

    /// Sets the directory claims this logger participates in. Defaults to
    /// the process wide claims.
    pub fn claims(mut self, claims: DirectoryClaims) -> Self {
        self.claims = Some(claims);
        self
    }

    /// Consumes the builder and returns a `Logger`.
    pub fn build(self) -> Result<Logger, Error> {
        let default_tag = match &self.default_tag {
            Some(name) => crate::registry::tag_name(name)?.to_owned(),
            None => crate::logger::program_name(),
        };

        let logger = Logger::with_parts(
            &default_tag,
            self.level,
            self.show_caller,
            self.queue_depth,
            self.claims.unwrap_or_else(DirectoryClaims::global),
            self.format,
        );

        for tag in &self.tags {
            logger.register_tag(tag)?;
        }

        if let Some((path, max_size, max_files)) = self.directory {
            logger.set_output_directory_bytes(path, max_size, max_files)?;
        }

        Ok(logger)
    }
}
