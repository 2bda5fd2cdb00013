// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::Level;
use chrono::{DateTime, Local};

use std::fmt::Arguments;
use std::io::Write;

/// Source location of the original call site.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Caller<'a> {
    pub file: &'a str,
    pub line: u32,
}

impl<'a> From<&'a std::panic::Location<'a>> for Caller<'a> {
    fn from(location: &'a std::panic::Location<'a>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

/// A single log record. Records are built per call and consumed by the
/// format function, they are never retained.
pub struct Record<'a> {
    pub level: Level,
    pub tag: &'a str,
    pub caller: Option<Caller<'a>>,
    pub args: Arguments<'a>,
}

pub type FormatFunction = fn(
    buffer: &mut Vec<u8>,
    now: DateTime<Local>,
    record: &Record,
) -> Result<(), std::io::Error>;

/// Renders `2006/01/02 15:04:05 [INFO] <tag> main.rs:12 message`. The caller
/// segment is only present when the record carries one. A newline is added
/// unless the message already ends with one.
pub fn default_format(
    buffer: &mut Vec<u8>,
    now: DateTime<Local>,
    record: &Record,
) -> Result<(), std::io::Error> {
    write!(
        buffer,
        "{} [{}] <{}> ",
        now.format("%Y/%m/%d %H:%M:%S"),
        record.level.code(),
        record.tag
    )?;
    if let Some(caller) = record.caller {
        write!(buffer, "{}:{} ", basename(caller.file), caller.line)?;
    }
    buffer.write_fmt(record.args)?;
    terminate(buffer);
    Ok(())
}

/// Renders only the time and the message, for tags which carry their own
/// structure (command logs, audit logs).
pub fn message_format(
    buffer: &mut Vec<u8>,
    now: DateTime<Local>,
    record: &Record,
) -> Result<(), std::io::Error> {
    write!(buffer, "{} ", now.format("%Y/%m/%d %H:%M:%S"))?;
    buffer.write_fmt(record.args)?;
    terminate(buffer);
    Ok(())
}

fn terminate(buffer: &mut Vec<u8>) {
    if buffer.last() != Some(&b'\n') {
        buffer.push(b'\n');
    }
}

fn basename(file: &str) -> &str {
    file.rsplit(['/', '\\']).next().unwrap_or(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn render(
        format: FormatFunction,
        level: Level,
        tag: &str,
        caller: Option<Caller>,
        args: Arguments,
    ) -> String {
        let now = Local.with_ymd_and_hms(2010, 10, 11, 12, 0, 1).unwrap();
        let record = Record {
            level,
            tag,
            caller,
            args,
        };
        let mut buffer = Vec::new();
        format(&mut buffer, now, &record).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn with_caller() {
        let caller = Caller {
            file: "src/bin/server/main.rs",
            line: 40,
        };
        assert_eq!(
            render(
                default_format,
                Level::Debug,
                "request",
                Some(caller),
                format_args!("ip:{} method:{}", "127.0.0.1", "POST")
            ),
            "2010/10/11 12:00:01 [DBUG] <request> main.rs:40 ip:127.0.0.1 method:POST\n"
        );
    }

    #[test]
    fn without_caller() {
        assert_eq!(
            render(
                default_format,
                Level::Error,
                "app",
                None,
                format_args!("my age is {}", 30)
            ),
            "2010/10/11 12:00:01 [ERRO] <app> my age is 30\n"
        );
    }

    #[test]
    fn existing_newline_is_kept() {
        assert_eq!(
            render(default_format, Level::Info, "app", None, format_args!("done\n")),
            "2010/10/11 12:00:01 [INFO] <app> done\n"
        );
    }

    #[test]
    fn empty_message() {
        assert_eq!(
            render(default_format, Level::Warn, "app", None, format_args!("")),
            "2010/10/11 12:00:01 [WARN] <app> \n"
        );
    }

    #[test]
    fn message_only() {
        assert_eq!(
            render(
                message_format,
                Level::Info,
                "command",
                None,
                format_args!("\"get 0\" 0 0")
            ),
            "2010/10/11 12:00:01 \"get 0\" 0 0\n"
        );
    }

    #[test]
    fn windows_paths() {
        assert_eq!(basename("src\\lib.rs"), "lib.rs");
        assert_eq!(basename("lib.rs"), "lib.rs");
    }
}
