// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::*;

use std::io::{Error, Write};

/// An output that writes to `stderr`. This is the destination for every tag
/// until a log directory is configured.
#[derive(Default)]
pub struct Stderr {}

impl Stderr {
    pub fn new() -> Self {
        Self {}
    }
}

impl Output for Stderr {
    fn write(&self, buf: &[u8]) -> Result<usize, Error> {
        // holding the lock keeps a record from interleaving with other writers
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stderr().lock().flush()
    }
}
