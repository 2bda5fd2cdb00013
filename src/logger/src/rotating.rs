// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A file based output which rotates the live log file to a numbered archive
//! when it would grow past a size limit, and retires the oldest archives so
//! that the number of files kept for a prefix stays bounded.
//!
//! For a prefix `P` in directory `D` the live log is `D/Plast.log` and the
//! archives are `D/P00000000.log`, `D/P00000001.log`, and so on. The prefix
//! carries any separator it needs, the tag registry uses `<tag>_`.

use crate::*;

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Error, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Smallest accepted maximum file size in bytes.
pub const MIN_FILE_SIZE: u64 = 1;

/// Smallest accepted file count: the live file and one archive.
pub const MIN_FILE_COUNT: usize = 2;

const INDEX_WIDTH: usize = 8;
const ACTIVE_NAME: &str = "last.log";
const EXTENSION: &str = ".log";

struct State {
    // bytes in the live file, only meaningful while `file` is open
    size: u64,
    file: Option<File>,
}

/// A rotating file output bound to one directory and filename prefix.
pub struct RotatingFile {
    directory: PathBuf,
    prefix: String,
    max_size: u64,
    max_files: usize,
    state: Mutex<State>,
}

impl RotatingFile {
    /// Create a new rotating output. Nothing is opened until the first write
    /// or size probe. The limits are raised to `MIN_FILE_SIZE` and
    /// `MIN_FILE_COUNT` if they are smaller.
    pub fn new<T: AsRef<Path>>(
        directory: T,
        prefix: &str,
        max_size: u64,
        max_files: usize,
    ) -> Self {
        Self {
            directory: directory.as_ref().to_owned(),
            prefix: prefix.to_owned(),
            max_size: max_size.max(MIN_FILE_SIZE),
            max_files: max_files.max(MIN_FILE_COUNT),
            state: Mutex::new(State {
                size: 0,
                file: None,
            }),
        }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Path of the live log file.
    pub fn active_path(&self) -> PathBuf {
        self.directory.join(format!("{}{}", self.prefix, ACTIVE_NAME))
    }

    fn rotated_path(&self, index: u64) -> PathBuf {
        self.directory.join(format!(
            "{}{:0width$}{}",
            self.prefix,
            index,
            EXTENSION,
            width = INDEX_WIDTH
        ))
    }

    fn parse_index(&self, name: &str) -> Option<u64> {
        let digits = name.strip_prefix(&self.prefix)?.strip_suffix(EXTENSION)?;
        if digits.len() < INDEX_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Archived files for this prefix, oldest first.
    pub fn rotated_files(&self) -> Result<Vec<PathBuf>, Error> {
        Ok(self.archives()?.into_iter().map(|(_, path)| path).collect())
    }

    fn archives(&self) -> Result<Vec<(u64, PathBuf)>, Error> {
        let mut archives = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(index) = name.to_str().and_then(|name| self.parse_index(name)) {
                archives.push((index, entry.path()));
            }
        }
        // zero padding makes this the same as lexicographic order
        archives.sort();
        Ok(archives)
    }

    /// Return the size of the live log in bytes, opening it if necessary.
    pub fn size(&self) -> Result<u64, Error> {
        let mut state = self.state.lock();
        self.open(&mut state)?;
        Ok(state.size)
    }

    /// Open the live file if it is not already open. An existing live file
    /// below the size limit is appended to, anything else is rotated away.
    fn open(&self, state: &mut State) -> Result<(), Error> {
        if state.file.is_some() {
            return Ok(());
        }
        match std::fs::metadata(self.active_path()) {
            Ok(metadata) if metadata.is_file() && metadata.len() < self.max_size => {
                self.open_active(state, metadata.len())
            }
            _ => self.rotate(state),
        }
    }

    fn open_active(&self, state: &mut State, size: u64) -> Result<(), Error> {
        metrics::counter!(LOG_OPEN).increment(1);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.active_path())
            .inspect_err(|_| metrics::counter!(LOG_OPEN_EX).increment(1))?;
        state.file = Some(file);
        state.size = size;
        Ok(())
    }

    /// Archive the live file and open an empty one in its place.
    fn rotate(&self, state: &mut State) -> Result<(), Error> {
        self.archive(state)?;
        self.open_active(state, 0)
    }

    /// Retire the oldest archives and move the live file to the next archive
    /// index, leaving no file open. If the live file is missing only the
    /// retirement happens, so a failed open is never followed by a rename.
    fn archive(&self, state: &mut State) -> Result<(), Error> {
        metrics::counter!(LOG_ROTATE).increment(1);

        // the handle must be closed before the file is renamed
        state.file = None;
        state.size = 0;

        let active = self.active_path();
        let active_exists = active.is_file();
        let archives = self.archives()?;
        let next = archives.last().map(|(index, _)| index + 1).unwrap_or(0);

        let count = archives.len() + active_exists as usize;
        if count >= self.max_files {
            let excess = count + 1 - self.max_files;
            for (_, path) in archives.iter().take(excess) {
                match std::fs::remove_file(path) {
                    Err(e) if e.kind() != ErrorKind::NotFound => return Err(e),
                    _ => {}
                }
            }
        }

        if active_exists {
            std::fs::rename(&active, self.rotated_path(next))?;
        }
        Ok(())
    }
}

impl Output for RotatingFile {
    fn write(&self, buf: &[u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut state = self.state.lock();
        self.open(&mut state)?;

        // an empty live file takes the record even when it is oversized, so
        // rotation never produces an empty archive
        if state.size > 0 && state.size + buf.len() as u64 > self.max_size {
            self.rotate(&mut state)?;
        }

        metrics::counter!(LOG_WRITE).increment(1);
        let result = match state.file.as_mut() {
            Some(file) => file.write_all(buf),
            None => Err(Error::new(ErrorKind::Other, "log file is not open")),
        };
        match result {
            Ok(()) => {
                state.size += buf.len() as u64;
                metrics::counter!(LOG_WRITE_BYTE).increment(buf.len() as u64);
                Ok(buf.len())
            }
            Err(e) => {
                metrics::counter!(LOG_WRITE_EX).increment(1);
                Err(e)
            }
        }
    }

    fn flush(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        if let Some(file) = state.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        if let Some(mut file) = state.file.take() {
            file.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    fn read(path: PathBuf) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn rotates_when_write_would_exceed_max_size() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 10, 3);

        assert_eq!(file.write(b"123456").unwrap(), 6);
        assert_eq!(file.write(b"78901").unwrap(), 5);

        assert_eq!(names(dir.path()), vec!["app_00000000.log", "app_last.log"]);
        assert_eq!(read(dir.path().join("app_00000000.log")), "123456");
        assert_eq!(read(file.active_path()), "78901");
        assert_eq!(file.size().unwrap(), 5);
    }

    #[test]
    fn write_reaching_exactly_max_size_does_not_rotate() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 10, 3);

        file.write(b"12345").unwrap();
        file.write(b"67890").unwrap();

        assert_eq!(names(dir.path()), vec!["app_last.log"]);
        assert_eq!(file.size().unwrap(), 10);
    }

    #[test]
    fn retains_most_recent_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 4, 3);

        for record in ["aaaa", "bbbb", "cccc", "dddd", "eeee"] {
            file.write(record.as_bytes()).unwrap();
            assert!(names(dir.path()).len() <= 3);
        }

        // four rotations, the two oldest archives were retired
        assert_eq!(
            names(dir.path()),
            vec!["app_00000002.log", "app_00000003.log", "app_last.log"]
        );
        assert_eq!(read(dir.path().join("app_00000002.log")), "cccc");
        assert_eq!(read(dir.path().join("app_00000003.log")), "dddd");
        assert_eq!(read(file.active_path()), "eeee");
    }

    #[test]
    fn indices_keep_increasing_at_minimum_retention() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 1, 0);
        assert_eq!(file.max_files(), MIN_FILE_COUNT);

        let mut last = None;
        for _ in 0..5 {
            file.write(b"x").unwrap();
            let rotated = file.rotated_files().unwrap();
            assert!(rotated.len() <= 1);
            if let Some(path) = rotated.last() {
                let index = file
                    .parse_index(path.file_name().unwrap().to_str().unwrap())
                    .unwrap();
                if let Some(previous) = last {
                    assert!(index > previous);
                }
                last = Some(index);
            }
        }
        assert_eq!(last, Some(3));
    }

    #[test]
    fn resumes_existing_active_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app_last.log"), "abc").unwrap();

        let file = RotatingFile::new(dir.path(), "app_", 100, 3);
        assert_eq!(file.size().unwrap(), 3);
        file.write(b"def").unwrap();

        assert_eq!(names(dir.path()), vec!["app_last.log"]);
        assert_eq!(read(file.active_path()), "abcdef");
    }

    #[test]
    fn full_active_file_is_rotated_on_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app_00000004.log"), "old").unwrap();
        std::fs::write(dir.path().join("app_last.log"), "0123456789").unwrap();

        let file = RotatingFile::new(dir.path(), "app_", 10, 3);
        file.write(b"new").unwrap();

        assert_eq!(
            names(dir.path()),
            vec!["app_00000004.log", "app_00000005.log", "app_last.log"]
        );
        assert_eq!(read(dir.path().join("app_00000005.log")), "0123456789");
        assert_eq!(read(file.active_path()), "new");
    }

    #[test]
    fn zero_byte_write_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 4, 3);

        assert_eq!(file.write(b"").unwrap(), 0);
        assert!(names(dir.path()).is_empty());

        file.write(b"abcd").unwrap();
        assert_eq!(file.write(b"").unwrap(), 0);
        assert_eq!(file.size().unwrap(), 4);
        assert_eq!(names(dir.path()), vec!["app_last.log"]);
    }

    #[test]
    fn oversized_record_goes_into_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 4, 3);

        file.write(b"0123456789").unwrap();
        assert_eq!(names(dir.path()), vec!["app_last.log"]);

        file.write(b"x").unwrap();
        assert_eq!(names(dir.path()), vec!["app_00000000.log", "app_last.log"]);
    }

    #[test]
    fn ignores_files_of_other_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app_b_last.log"), "other").unwrap();
        std::fs::write(dir.path().join("app_b_00000000.log"), "other").unwrap();
        std::fs::write(dir.path().join("web_00000000.log"), "other").unwrap();
        std::fs::write(dir.path().join("app_notes.log"), "other").unwrap();

        let file = RotatingFile::new(dir.path(), "app_", 2, 2);
        for _ in 0..4 {
            file.write(b"zz").unwrap();
        }

        assert_eq!(file.rotated_files().unwrap().len(), 1);
        for name in ["app_b_last.log", "app_b_00000000.log", "web_00000000.log", "app_notes.log"] {
            assert_eq!(read(dir.path().join(name)), "other");
        }
    }

    #[test]
    fn reopens_missing_active_file_without_rotating() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 100, 3);

        file.write(b"first").unwrap();
        file.close().unwrap();
        std::fs::remove_file(file.active_path()).unwrap();

        file.write(b"second").unwrap();
        assert_eq!(names(dir.path()), vec!["app_last.log"]);
        assert_eq!(read(file.active_path()), "second");
    }

    #[test]
    fn failed_open_after_rename_is_not_renamed_again() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 4, 5);

        file.write(b"aaaa").unwrap();
        file.write(b"bbbb").unwrap();

        // archive the live file, then block the new one with a directory
        file.archive(&mut file.state.lock()).unwrap();
        std::fs::create_dir(file.active_path()).unwrap();
        assert!(file.write(b"cccc").is_err());
        assert_eq!(
            names(dir.path()),
            vec!["app_00000000.log", "app_00000001.log", "app_last.log"]
        );

        std::fs::remove_dir(file.active_path()).unwrap();
        file.write(b"dddd").unwrap();

        assert_eq!(
            names(dir.path()),
            vec!["app_00000000.log", "app_00000001.log", "app_last.log"]
        );
        assert_eq!(read(dir.path().join("app_00000000.log")), "aaaa");
        assert_eq!(read(dir.path().join("app_00000001.log")), "bbbb");
        assert_eq!(read(file.active_path()), "dddd");
    }

    #[test]
    fn failed_write_leaves_size_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 100, 3);
        file.write(b"abc").unwrap();

        // a read only handle rejects every write
        file.state.lock().file = Some(File::open(file.active_path()).unwrap());
        assert!(file.write(b"def").is_err());
        assert_eq!(file.size().unwrap(), 3);

        file.close().unwrap();
        assert_eq!(file.write(b"ghi").unwrap(), 3);
        assert_eq!(file.size().unwrap(), 6);
        assert_eq!(read(file.active_path()), "abcghi");
    }

    #[test]
    fn close_then_write_appends() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path(), "app_", 100, 3);

        file.write(b"one").unwrap();
        file.close().unwrap();
        file.write(b"two").unwrap();

        assert_eq!(read(file.active_path()), "onetwo");
        assert_eq!(file.size().unwrap(), 6);
    }

    #[test]
    fn clamps_limits() {
        let file = RotatingFile::new("/nonexistent", "app_", 0, 1);
        assert_eq!(file.max_size(), MIN_FILE_SIZE);
        assert_eq!(file.max_files(), MIN_FILE_COUNT);
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path().join("missing"), "app_", 100, 3);
        assert!(file.write(b"lost").is_err());
    }
}
