// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

////////////////////////////////////////////////////////////////////////////////
// constants to define default values
////////////////////////////////////////////////////////////////////////////////

// minimum level which is written
const LEVEL: Level = Level::Debug;

// include the file:line of the call site
const SHOW_CALLER: bool = true;

// log to standard error unless a directory is given
const DIRECTORY: Option<String> = None;

// max log size before rotate in megabytes
const MAX_SIZE_MB: u64 = 100;

// max number of files kept per tag, including the live file
const MAX_FILES: usize = 10;

// defaults to the program name
const DEFAULT_TAG: Option<String> = None;

// synchronous writes unless a queue depth is given
const QUEUE_DEPTH: Option<usize> = None;

////////////////////////////////////////////////////////////////////////////////
// helper functions
////////////////////////////////////////////////////////////////////////////////

fn level() -> Level {
    LEVEL
}

fn show_caller() -> bool {
    SHOW_CALLER
}

fn directory() -> Option<String> {
    DIRECTORY
}

fn max_size_mb() -> u64 {
    MAX_SIZE_MB
}

fn max_files() -> usize {
    MAX_FILES
}

fn default_tag() -> Option<String> {
    DEFAULT_TAG
}

fn queue_depth() -> Option<usize> {
    QUEUE_DEPTH
}

////////////////////////////////////////////////////////////////////////////////
// struct definitions
////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "level")]
    level: Level,
    #[serde(default = "show_caller")]
    show_caller: bool,
    #[serde(default = "directory")]
    directory: Option<String>,
    #[serde(default = "max_size_mb")]
    max_size_mb: u64,
    #[serde(default = "max_files")]
    max_files: usize,
    #[serde(default = "default_tag")]
    default_tag: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default = "queue_depth")]
    queue_depth: Option<usize>,
}

////////////////////////////////////////////////////////////////////////////////
// implementation
////////////////////////////////////////////////////////////////////////////////

impl LogConfig {
    /// Load the config from a TOML file.
    pub fn load<T: AsRef<Path>>(path: T) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse the config from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn show_caller(&self) -> bool {
        self.show_caller
    }

    pub fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }

    pub fn max_size_mb(&self) -> u64 {
        self.max_size_mb
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn default_tag(&self) -> Option<&str> {
        self.default_tag.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn queue_depth(&self) -> Option<usize> {
        self.queue_depth
    }

    /// A builder for a logger configured by this config.
    pub fn builder(&self) -> LoggerBuilder {
        let mut builder = LoggerBuilder::new()
            .level(self.level)
            .show_caller(self.show_caller);
        if let Some(name) = self.default_tag() {
            builder = builder.default_tag(name);
        }
        for tag in &self.tags {
            builder = builder.tag(tag);
        }
        if let Some(directory) = self.directory() {
            builder = builder.directory_mb(directory, self.max_size_mb, self.max_files);
        }
        if let Some(depth) = self.queue_depth {
            builder = builder.queue_depth(depth);
        }
        builder
    }

    /// Build a logger configured by this config.
    pub fn build(&self) -> Result<Logger, Error> {
        self.builder().build()
    }
}

////////////////////////////////////////////////////////////////////////////////
// trait implementations
////////////////////////////////////////////////////////////////////////////////

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: level(),
            show_caller: show_caller(),
            directory: directory(),
            max_size_mb: max_size_mb(),
            max_files: max_files(),
            default_tag: default_tag(),
            tags: Vec::new(),
            queue_depth: queue_depth(),
        }
    }
}
