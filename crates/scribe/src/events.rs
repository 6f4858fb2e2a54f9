//! Synchronous observer bus for workspace events.

use crate::error::Result;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A user command ran to completion.
    CommandExecuted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::CommandExecuted => write!(f, "command_executed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: DateTime<Local>,
    /// Command name, e.g. `append`.
    pub command: String,
    /// The command line exactly as the user typed it.
    pub raw: String,
    /// Buffer the command targeted, if any.
    pub file: Option<PathBuf>,
    pub metadata: BTreeMap<String, String>,
}

impl Event {
    pub fn command_executed(command: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind: EventKind::CommandExecuted,
            timestamp: Local::now(),
            command: command.into(),
            raw: raw.into(),
            file: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait Listener: Send + Sync {
    fn handle(&self, event: &Event) -> Result<()>;
}

#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Arc<dyn Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener>) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Delivers `event` to every listener in subscription order. A failing
    /// listener does not stop delivery to the rest.
    pub fn publish(&self, event: &Event) {
        let listeners: Vec<Arc<dyn Listener>> = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for listener in listeners {
            if let Err(err) = listener.handle(event) {
                tracing::debug!(command = %event.command, error = %err, "event listener failed");
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
