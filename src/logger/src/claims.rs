// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::*;

use ahash::AHashSet as HashSet;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// The set of log directories in use by a group of loggers. Two loggers which
/// share a `DirectoryClaims` can never write into the same directory, which
/// would interleave their rotations and corrupt the archive numbering.
#[derive(Clone, Default)]
pub struct DirectoryClaims {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
}

impl DirectoryClaims {
    /// An empty, independent set of claims.
    pub fn new() -> Self {
        Default::default()
    }

    /// The claims shared by every logger in this process which was not given
    /// its own set.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<DirectoryClaims> = OnceLock::new();
        GLOBAL.get_or_init(DirectoryClaims::new).clone()
    }

    pub fn claim(&self, path: &Path) -> Result<(), ConfigError> {
        if self.paths.lock().insert(path.to_owned()) {
            Ok(())
        } else {
            Err(ConfigError::DirectoryInUse(path.to_owned()))
        }
    }

    pub fn release(&self, path: &Path) {
        self.paths.lock().remove(path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.lock().contains(path)
    }
}
