//! Per-file editing time.
//!
//! Only the active buffer accrues time. The tracker is driven by the
//! workspace whenever the active buffer changes.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(delta) = chrono::Duration::from_std(by) {
            *self.now.lock().unwrap_or_else(|p| p.into_inner()) += delta;
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

struct State {
    durations: HashMap<PathBuf, Duration>,
    active: Option<(PathBuf, DateTime<Utc>)>,
    clock: Arc<dyn Clock>,
}

impl State {
    /// Time since `started`. A clock that moved backwards yields zero.
    fn elapsed(&self, started: DateTime<Utc>) -> Duration {
        (self.clock.now() - started)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    fn flush(&mut self) -> Option<PathBuf> {
        let (path, started) = self.active.take()?;
        let elapsed = self.elapsed(started);
        *self.durations.entry(path.clone()).or_default() += elapsed;
        Some(path)
    }
}

pub struct Tracker {
    state: Mutex<State>,
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                durations: HashMap::new(),
                active: None,
                clock: Arc::new(SystemClock),
            }),
        }
    }

    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        self.set_clock(clock);
        self
    }

    pub fn set_clock(&self, clock: Arc<dyn Clock>) {
        self.lock().clock = clock;
    }

    /// Moves the running timer from `prev` to `next`.
    ///
    /// Time is credited to `prev` only if it is the file currently being
    /// timed. A `None` for `next` leaves nothing running.
    pub fn switch(&self, prev: Option<&Path>, next: Option<&Path>) {
        let mut state = self.lock();
        let now = state.clock.now();
        let prev_is_active = match (prev, &state.active) {
            (Some(prev), Some((active, _))) => prev == active,
            _ => false,
        };
        if prev_is_active {
            state.flush();
        }
        match next {
            Some(next) => {
                state.durations.entry(next.to_path_buf()).or_default();
                state.active = Some((next.to_path_buf(), now));
            }
            None => state.active = None,
        }
    }

    /// Stops timing `path` and forgets its total.
    pub fn close(&self, path: &Path) {
        let mut state = self.lock();
        if state.active.as_ref().is_some_and(|(active, _)| active == path) {
            state.flush();
        }
        state.durations.remove(path);
    }

    /// Credits the running timer to its file and stops it.
    pub fn stop_all(&self) {
        self.lock().flush();
    }

    pub fn duration(&self, path: &Path) -> Duration {
        let state = self.lock();
        let mut total = state.durations.get(path).copied().unwrap_or_default();
        if let Some((active, started)) = &state.active
            && active == path
        {
            total += state.elapsed(*started);
        }
        total
    }

    pub fn active(&self) -> Option<PathBuf> {
        self.lock().active.as_ref().map(|(path, _)| path.clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

/// Renders a duration in the largest two units that apply, e.g. `2小时15分钟`.
pub fn format_duration(d: Duration) -> String {
    let seconds = d.as_secs();
    if seconds < 60 {
        return format!("{seconds}秒");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}分钟");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return match minutes % 60 {
            0 => format!("{hours}小时"),
            rem => format!("{hours}小时{rem}分钟"),
        };
    }
    let days = hours / 24;
    match hours % 24 {
        0 => format!("{days}天"),
        rem => format!("{days}天{rem}小时"),
    }
}
