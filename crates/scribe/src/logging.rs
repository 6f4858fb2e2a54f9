//! Per-file command logs.
//!
//! When logging is enabled for a buffer, every command executed against it
//! is appended to a hidden `.name.log` file next to the source. Log writes
//! never fail a command; problems are reported through `tracing` instead.

use crate::error::{Error, Result};
use crate::events::{Event, EventKind, Listener};
use crate::paths::log_file_path;
use chrono::{DateTime, Local, TimeZone};
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub const TIME_FORMAT: &str = "%Y%m%d %H:%M:%S";

#[derive(Debug, Default)]
struct State {
    enabled: BTreeSet<PathBuf>,
    session_started: HashSet<PathBuf>,
}

#[derive(Debug, Default)]
pub struct Logger {
    state: Mutex<State>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns logging on for `path`. The first enable in this process also
    /// writes a `session start at ...` line.
    pub fn enable(&self, path: &Path) {
        let mut state = self.lock();
        state.enabled.insert(path.to_path_buf());
        if state.session_started.contains(path) {
            return;
        }
        let line = format!("session start at {}", timestamp(&Local::now()));
        match append_line(path, &line) {
            Ok(()) => {
                state.session_started.insert(path.to_path_buf());
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to write session start")
            }
        }
    }

    pub fn disable(&self, path: &Path) {
        self.lock().enabled.remove(path);
    }

    pub fn is_enabled(&self, path: &Path) -> bool {
        self.lock().enabled.contains(path)
    }

    /// Re-enables logging for paths saved in a previous session.
    pub fn restore<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            self.enable(path.as_ref());
        }
    }

    /// Enabled paths, sorted.
    pub fn active_paths(&self) -> Vec<PathBuf> {
        self.lock().enabled.iter().cloned().collect()
    }

    /// Full contents of the log file for `path`.
    pub fn show(&self, path: &Path) -> Result<String> {
        let log = log_file_path(path);
        fs::read_to_string(&log).map_err(|err| match err.kind() {
            ErrorKind::NotFound => Error::NotFound(format!("log file {}", log.display())),
            _ => Error::Io(err),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Listener for Logger {
    fn handle(&self, event: &Event) -> Result<()> {
        if event.kind != EventKind::CommandExecuted {
            return Ok(());
        }
        let Some(file) = &event.file else {
            return Ok(());
        };
        if !self.is_enabled(file) {
            return Ok(());
        }
        let line = format!("{} {}", timestamp(&event.timestamp), event.raw);
        if let Err(err) = append_line(file, &line) {
            tracing::warn!(path = %file.display(), error = %err, "failed to append log line");
        }
        Ok(())
    }
}

fn timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format(TIME_FORMAT).to_string()
}

/// Opens, appends one trimmed line and closes the log for `source`.
fn append_line(source: &Path, line: &str) -> std::io::Result<()> {
    let log = log_file_path(source);
    if let Some(dir) = log.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(&log)?;
    writeln!(file, "{}", line.trim())
}
