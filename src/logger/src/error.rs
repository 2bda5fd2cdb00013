// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Errors returned to callers of this library.

use crate::Level;
use std::path::PathBuf;
use thiserror::Error;

/// Rejected configuration. The logger state is left unchanged when one of
/// these is returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("tag name is empty")]
    EmptyTag,
    #[error("tag name is not a valid file name: {0:?}")]
    InvalidTag(String),
    #[error("tag already registered: {0}")]
    DuplicateTag(String),
    #[error("hook already registered for level {0}")]
    DuplicateHook(Level),
    #[error("log directory already in use: {0:?}")]
    DirectoryInUse(PathBuf),
    #[error("failed to create log directory {path:?}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("log path is not a directory: {0:?}")]
    NotADirectory(PathBuf),
    #[error("log directory is not writable: {0:?}")]
    PermissionDenied(PathBuf),
    #[error("failed to read config file {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to install logger: {0}")]
    Install(#[from] log::SetLoggerError),
}

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("log write failed: {0}")]
    Io(#[from] std::io::Error),
}
