// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::*;

use ahash::AHashMap as HashMap;
use std::io;
use std::path::PathBuf;

/// Where file backed outputs are rooted, and their rotation limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directory {
    pub path: PathBuf,
    pub max_size: u64,
    pub max_files: usize,
}

/// Routes tag names to outputs. Every tag writes to standard error until a
/// directory is bound, after which each tag owns a `RotatingFile` in that
/// directory with `<tag>_` as its prefix. Unknown tags are routed to the
/// default tag.
pub struct TagRegistry {
    default_tag: String,
    default: Box<dyn Output>,
    targets: HashMap<String, Box<dyn Output>>,
    directory: Option<Directory>,
    // file backed outputs are wrapped in a `Queued` when this is set
    queue_depth: Option<usize>,
}

impl TagRegistry {
    pub fn new(default_tag: &str, queue_depth: Option<usize>) -> Self {
        Self {
            default_tag: default_tag.to_owned(),
            default: Box::new(Stderr::new()),
            targets: HashMap::new(),
            directory: None,
            queue_depth,
        }
    }

    fn build(
        &self,
        tag: &str,
        directory: Option<&Directory>,
    ) -> Result<Box<dyn Output>, io::Error> {
        let directory = match directory {
            Some(directory) => directory,
            None => return Ok(Box::new(Stderr::new())),
        };
        let file = RotatingFile::new(
            &directory.path,
            &format!("{}_", tag),
            directory.max_size,
            directory.max_files,
        );
        match self.queue_depth {
            Some(depth) => Ok(Box::new(Queued::new(tag, Box::new(file), depth)?)),
            None => Ok(Box::new(file)),
        }
    }

    /// Register a new tag. Names are trimmed, and must be usable as a file
    /// name prefix and not already registered.
    pub fn register(&mut self, name: &str) -> Result<(), Error> {
        let name = tag_name(name)?;
        if self.contains(name) {
            return Err(ConfigError::DuplicateTag(name.to_owned()).into());
        }
        let output = self.build(name, self.directory.as_ref())?;
        self.targets.insert(name.to_owned(), output);
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        name == self.default_tag || self.targets.contains_key(name)
    }

    /// Return the output for a tag, or the default tag output if the tag is
    /// not registered.
    pub fn resolve(&self, name: &str) -> &dyn Output {
        self.targets
            .get(name)
            .map(|output| &**output)
            .unwrap_or_else(|| &*self.default)
    }

    /// Bind every tag to a new rotating file in `directory`. The new outputs
    /// are built before the old ones are closed, so a failure leaves the
    /// previous binding in place.
    pub fn rebind(&mut self, directory: Directory) -> Result<(), Error> {
        let default = self.build(&self.default_tag, Some(&directory))?;
        let mut targets = HashMap::with_capacity(self.targets.len());
        for name in self.targets.keys() {
            targets.insert(name.clone(), self.build(name, Some(&directory))?);
        }

        if let Err(e) = self.close() {
            eprintln!("failed to close log output: {}", e);
        }

        self.default = default;
        self.targets = targets;
        self.directory = Some(directory);
        Ok(())
    }

    pub fn directory(&self) -> Option<&Directory> {
        self.directory.as_ref()
    }

    /// Registered tag names, default tag first.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.targets.keys().map(|k| k.as_str()).collect();
        tags.sort_unstable();
        tags.insert(0, &self.default_tag);
        tags
    }

    fn outputs(&self) -> impl Iterator<Item = &Box<dyn Output>> {
        std::iter::once(&self.default).chain(self.targets.values())
    }

    /// Flush every output. All outputs are flushed even if one fails, the
    /// first error is returned.
    pub fn flush(&self) -> Result<(), io::Error> {
        let mut result = Ok(());
        for output in self.outputs() {
            if let Err(e) = output.flush() {
                result = result.and(Err(e));
            }
        }
        result
    }

    /// Close every output, see `flush` for error handling.
    pub fn close(&self) -> Result<(), io::Error> {
        let mut result = Ok(());
        for output in self.outputs() {
            if let Err(e) = output.close() {
                result = result.and(Err(e));
            }
        }
        result
    }
}

/// Trim a tag name and check that it stays inside the log directory when
/// used as a file name prefix.
pub(crate) fn tag_name(name: &str) -> Result<&str, ConfigError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::EmptyTag);
    }
    if name.contains(|c: char| matches!(c, '/' | '\\' | '\0')) || name.contains("..") {
        return Err(ConfigError::InvalidTag(name.to_owned()));
    }
    Ok(name)
}
