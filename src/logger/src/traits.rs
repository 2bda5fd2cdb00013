// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::io::Error;

/// An `Output` is a logging destination, for example, standard error or a
/// rotating file. Outputs are shared between threads, so each implementation
/// serializes its own writes. A single call to `write` is never interleaved
/// with another call on the same output.
pub trait Output: Send + Sync {
    /// Write one formatted record, returning the number of bytes written.
    fn write(&self, buf: &[u8]) -> Result<usize, Error>;

    /// Flush any buffered bytes to the underlying destination.
    fn flush(&self) -> Result<(), Error>;

    /// Flush and release any resources held by the output. Outputs may be
    /// written to again after being closed and will reopen as needed.
    fn close(&self) -> Result<(), Error> {
        self.flush()
    }
}
