// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::*;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A side channel for one level, for example alerting on errors. The hook is
/// called with the tag name and the fully formatted line.
pub type Hook = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Holds at most one hook per level.
#[derive(Default, Clone)]
pub struct Hooks {
    table: [Option<Hook>; LEVELS.len()],
}

impl Hooks {
    pub fn new() -> Self {
        Default::default()
    }

    /// Register a hook for a level. Fails if the level already has one, in
    /// which case the existing hook is kept.
    pub fn register(&mut self, level: Level, hook: Hook) -> Result<(), ConfigError> {
        let slot = &mut self.table[level.index()];
        if slot.is_some() {
            return Err(ConfigError::DuplicateHook(level));
        }
        *slot = Some(hook);
        Ok(())
    }

    pub fn get(&self, level: Level) -> Option<Hook> {
        self.table[level.index()].clone()
    }

}

/// Run a hook, containing any panic so the record still reaches its output.
pub(crate) fn dispatch(hook: &Hook, tag: &str, line: &str) {
    if catch_unwind(AssertUnwindSafe(|| hook(tag, line))).is_err() {
        metrics::counter!(LOG_HOOK_EX).increment(1);
        eprintln!("log hook panicked for tag: {}", tag);
    }
}
