//! The workspace: every open buffer, which one is active, and the
//! collaborators that observe them.
//!
//! Buffers are keyed by the absolute, normalized path the
//! [`PathResolver`] produces. `history` lists the open paths
//! most-recently-activated first, and the active path, when there is one, is
//! always `history[0]`. Every change of the active buffer goes through
//! [`Workspace::set_active`] so the statistics tracker sees it.

use crate::buffer::{Buffer, BufferKind};
use crate::dir_tree;
use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::logging::Logger;
use crate::paths::PathResolver;
use crate::spell::{self, SpellService};
use crate::state::{EditorState, StateKeeper, WorkspaceState};
use crate::stats::{Clock, Tracker};
use crate::text::TextBuffer;
use crate::xml::XmlBuffer;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Asked whether a modified buffer should be written before it goes away.
pub trait SaveDecider {
    fn confirm_save(&mut self, path: &Path) -> Result<bool>;
}

/// One row of [`Workspace::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferInfo {
    pub path: PathBuf,
    pub name: String,
    pub modified: bool,
    pub active: bool,
    pub duration: Duration,
}

pub struct Workspace {
    resolver: PathResolver,
    editors: HashMap<PathBuf, Buffer>,
    active: Option<PathBuf>,
    history: Vec<PathBuf>,
    bus: Arc<EventBus>,
    keeper: StateKeeper,
    logger: Arc<Logger>,
    decider: Option<Box<dyn SaveDecider>>,
    stats: Tracker,
    speller: Option<Box<dyn SpellService>>,
}

impl Workspace {
    pub fn new(
        base_dir: &Path,
        bus: Arc<EventBus>,
        keeper: StateKeeper,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            resolver: PathResolver::new(base_dir),
            editors: HashMap::new(),
            active: None,
            history: Vec::new(),
            bus,
            keeper,
            logger,
            decider: None,
            stats: Tracker::new(),
            speller: None,
        }
    }

    pub fn with_decider(mut self, decider: Box<dyn SaveDecider>) -> Self {
        self.decider = Some(decider);
        self
    }

    pub fn with_spell_service(mut self, speller: Box<dyn SpellService>) -> Self {
        self.speller = Some(speller);
        self
    }

    pub fn set_decider(&mut self, decider: Box<dyn SaveDecider>) {
        self.decider = Some(decider);
    }

    pub fn set_spell_service(&mut self, speller: Box<dyn SpellService>) {
        self.speller = Some(speller);
    }

    /// Swaps the clock behind editing-time statistics.
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.stats.set_clock(clock);
    }

    pub fn base_dir(&self) -> &Path {
        self.resolver.base_dir()
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    /// Open paths, most recently activated first.
    pub fn history(&self) -> &[PathBuf] {
        &self.history
    }

    pub fn resolve(&self, input: &str) -> Result<PathBuf> {
        self.resolver.resolve(input)
    }

    /// Opens `input`, or activates it if it is already open.
    ///
    /// `.xml` files must exist and parse. Any other missing file opens as an
    /// empty, modified text buffer.
    pub fn load(&mut self, input: &str) -> Result<&mut Buffer> {
        let path = self.resolver.resolve(input)?;
        if !self.editors.contains_key(&path) {
            let buffer = open_buffer(&path)?;
            let wants_log = buffer.wants_log();
            self.editors.insert(path.clone(), buffer);
            self.set_active(Some(path.clone()));
            if wants_log {
                self.logger.enable(&path);
            }
        } else {
            self.set_active(Some(path.clone()));
        }
        self.buffer_mut(&path)
    }

    /// Creates a new unsaved buffer for a file that does not exist yet.
    pub fn init(&mut self, kind: BufferKind, input: &str, with_log: bool) -> Result<&mut Buffer> {
        let path = self.resolver.resolve(input)?;
        if path.exists() || self.editors.contains_key(&path) {
            return Err(Error::AlreadyExists(path));
        }
        let buffer: Buffer = match kind {
            BufferKind::Text => {
                let lines = if with_log {
                    vec!["# log".to_string()]
                } else {
                    Vec::new()
                };
                TextBuffer::new(&path, lines, true).into()
            }
            BufferKind::Xml => XmlBuffer::with_default_root(&path, with_log).into(),
        };
        self.editors.insert(path.clone(), buffer);
        self.set_active(Some(path.clone()));
        if with_log {
            self.logger.enable(&path);
        }
        self.buffer_mut(&path)
    }

    /// Writes one buffer, the active one when `input` is `None` or empty.
    pub fn save(&mut self, input: Option<&str>) -> Result<PathBuf> {
        let path = self.target(input)?;
        let buffer = self.buffer_mut(&path)?;
        write_buffer(buffer)?;
        buffer.set_modified(false);
        Ok(path)
    }

    /// Writes every open buffer in path order, stopping at the first failure.
    pub fn save_all(&mut self) -> Result<()> {
        let mut paths: Vec<PathBuf> = self.editors.keys().cloned().collect();
        paths.sort();
        for path in paths {
            let buffer = self.buffer_mut(&path)?;
            write_buffer(buffer)?;
            buffer.set_modified(false);
        }
        Ok(())
    }

    /// Closes a buffer, offering to save it first if it has unsaved changes.
    /// Closing the active buffer activates the most recent remaining one.
    pub fn close(&mut self, input: Option<&str>) -> Result<PathBuf> {
        let path = self.target(input)?;
        let modified = self.buffer(&path)?.is_modified();
        if modified && let Some(decider) = self.decider.as_mut() {
            if decider.confirm_save(&path)? {
                let buffer = self.buffer_mut(&path)?;
                write_buffer(buffer)?;
                buffer.set_modified(false);
            }
        }

        self.stats.close(&path);
        self.editors.remove(&path);
        self.history.retain(|p| p != &path);
        let next = if self.active.as_ref() == Some(&path) {
            self.history.first().cloned()
        } else {
            self.active.clone()
        };
        self.set_active(next);
        Ok(path)
    }

    /// Makes an already open buffer the active one.
    pub fn edit(&mut self, input: &str) -> Result<PathBuf> {
        let path = self.resolver.resolve(input)?;
        if !self.editors.contains_key(&path) {
            return Err(Error::not_open(&path));
        }
        self.set_active(Some(path.clone()));
        Ok(path)
    }

    pub fn undo(&mut self) -> Result<PathBuf> {
        let buffer = self.active_buffer_mut()?;
        buffer.undo()?;
        Ok(buffer.path().to_path_buf())
    }

    pub fn redo(&mut self) -> Result<PathBuf> {
        let buffer = self.active_buffer_mut()?;
        buffer.redo()?;
        Ok(buffer.path().to_path_buf())
    }

    /// Every open buffer, sorted by path.
    pub fn list(&self) -> Vec<BufferInfo> {
        let mut infos: Vec<BufferInfo> = self
            .editors
            .iter()
            .map(|(path, buffer)| BufferInfo {
                path: path.clone(),
                name: buffer.name(),
                modified: buffer.is_modified(),
                active: self.active.as_ref() == Some(path),
                duration: self.stats.duration(path),
            })
            .collect();
        infos.sort_by(|a, b| a.path.cmp(&b.path));
        infos
    }

    pub fn active_buffer(&self) -> Result<&Buffer> {
        let path = self.active.as_ref().ok_or(Error::NoActive)?;
        self.buffer(path)
    }

    pub fn active_buffer_mut(&mut self) -> Result<&mut Buffer> {
        let path = self.active.clone().ok_or(Error::NoActive)?;
        self.buffer_mut(&path)
    }

    pub fn buffer_by_path(&self, input: &str) -> Result<&Buffer> {
        let path = self.resolver.resolve(input)?;
        self.buffer(&path)
    }

    /// Runs the spell checker over a buffer and renders the report.
    pub fn spell_check(&self, input: Option<&str>) -> Result<String> {
        let speller = self
            .speller
            .as_deref()
            .ok_or_else(|| Error::NotFound("no spell checker configured".to_string()))?;
        let path = self.target(input)?;
        let report = match self.buffer(&path)? {
            Buffer::Text(text) => spell::format_text_issues(&speller.check_lines(text.lines())),
            Buffer::Xml(xml) => spell::format_xml_issues(&speller.check_xml_text(&xml.text_nodes())),
        };
        Ok(report)
    }

    /// Publishes a `command_executed` event for a finished command.
    pub fn publish_command(&self, name: &str, raw: &str, file: Option<&Path>) {
        let mut event =
            Event::command_executed(name, raw).with_file(file.map(Path::to_path_buf));
        if let Some(active) = &self.active {
            event = event.with_metadata("active", active.to_string_lossy());
        }
        self.bus.publish(&event);
    }

    /// Turns on command logging for a file, the active buffer by default.
    pub fn enable_log(&self, input: Option<&str>) -> Result<PathBuf> {
        let path = self.log_target(input)?;
        self.logger.enable(&path);
        Ok(path)
    }

    pub fn disable_log(&self, input: Option<&str>) -> Result<PathBuf> {
        let path = self.log_target(input)?;
        self.logger.disable(&path);
        Ok(path)
    }

    pub fn show_log(&self, input: Option<&str>) -> Result<(PathBuf, String)> {
        let path = self.log_target(input)?;
        let content = self.logger.show(&path)?;
        Ok((path, content))
    }

    /// Renders a directory, the base directory by default.
    pub fn dir_tree(&self, input: Option<&str>) -> Result<String> {
        match input.filter(|s| !s.is_empty()) {
            Some(input) => dir_tree::render(&self.resolver.resolve(input)?),
            None => dir_tree::render(self.resolver.base_dir()),
        }
    }

    /// Writes the open set to the state file. The running editing timer is
    /// stopped first so its time is counted.
    pub fn persist(&self) -> Result<()> {
        let mut editors: Vec<EditorState> = self
            .editors
            .iter()
            .map(|(path, buffer)| EditorState {
                path: path.to_string_lossy().into_owned(),
                modified: buffer.is_modified(),
            })
            .collect();
        editors.sort_by(|a, b| a.path.cmp(&b.path));

        let state = WorkspaceState {
            editors,
            active: self
                .active
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            logging: self
                .logger
                .active_paths()
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        };
        self.stats.stop_all();
        self.keeper.save(&state)
    }

    /// Reopens the buffers recorded by the last [`persist`](Self::persist).
    ///
    /// Files that vanished or no longer load are skipped with a warning.
    pub fn restore(&mut self) -> Result<()> {
        let Some(state) = self.keeper.load()? else {
            return Ok(());
        };

        for entry in &state.editors {
            if entry.path.is_empty() || !Path::new(&entry.path).exists() {
                tracing::warn!(path = %entry.path, "skipping missing file from saved workspace");
                continue;
            }
            match self.load(&entry.path) {
                Ok(buffer) => buffer.set_modified(entry.modified),
                Err(err) => {
                    tracing::warn!(path = %entry.path, error = %err, "failed to reopen file from saved workspace")
                }
            }
        }

        if !state.active.is_empty()
            && let Ok(active) = self.resolver.resolve(&state.active)
            && self.editors.contains_key(&active)
        {
            self.set_active(Some(active));
        }

        let logging: Vec<PathBuf> = state
            .logging
            .iter()
            .filter_map(|p| self.resolver.resolve(p).ok())
            .collect();
        self.logger.restore(&logging);
        Ok(())
    }

    /// The only place `active` changes.
    fn set_active(&mut self, next: Option<PathBuf>) {
        if next == self.active {
            return;
        }
        let prev = self.active.take();
        self.stats.switch(prev.as_deref(), next.as_deref());
        if let Some(path) = &next {
            self.history.retain(|p| p != path);
            self.history.insert(0, path.clone());
            tracing::debug!(path = %path.display(), "active buffer changed");
        }
        self.active = next;
    }

    /// An open buffer named by `input`, or the active one.
    fn target(&self, input: Option<&str>) -> Result<PathBuf> {
        match input.filter(|s| !s.is_empty()) {
            Some(input) => {
                let path = self.resolver.resolve(input)?;
                if !self.editors.contains_key(&path) {
                    return Err(Error::not_open(&path));
                }
                Ok(path)
            }
            None => self.active.clone().ok_or(Error::NoActive),
        }
    }

    /// Like [`target`](Self::target), but the file need not be open.
    fn log_target(&self, input: Option<&str>) -> Result<PathBuf> {
        match input.filter(|s| !s.is_empty()) {
            Some(input) => self.resolver.resolve(input),
            None => self.active.clone().ok_or(Error::NoActive),
        }
    }

    fn buffer(&self, path: &Path) -> Result<&Buffer> {
        self.editors.get(path).ok_or_else(|| Error::not_open(path))
    }

    fn buffer_mut(&mut self, path: &Path) -> Result<&mut Buffer> {
        self.editors.get_mut(path).ok_or_else(|| Error::not_open(path))
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("base_dir", &self.resolver.base_dir())
            .field("active", &self.active)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

fn open_buffer(path: &Path) -> Result<Buffer> {
    let meta = match fs::metadata(path) {
        Ok(meta) => Some(meta),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };
    if meta.as_ref().is_some_and(|m| m.is_dir()) {
        return Err(Error::BadTarget(path.to_path_buf()));
    }

    match (BufferKind::for_path(path), meta) {
        (BufferKind::Xml, None) => Err(Error::NotFound(format!(
            "XML file does not exist: {}",
            path.display()
        ))),
        (BufferKind::Xml, Some(_)) => {
            let content = fs::read_to_string(path)?;
            Ok(XmlBuffer::parse(path, &content)?.into())
        }
        (BufferKind::Text, None) => Ok(TextBuffer::new(path, Vec::new(), true).into()),
        (BufferKind::Text, Some(_)) => {
            let content = fs::read_to_string(path)?;
            Ok(TextBuffer::from_content(path, &content).into())
        }
    }
}

fn write_buffer(buffer: &Buffer) -> Result<()> {
    if let Some(dir) = buffer.path().parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(buffer.path(), buffer.content())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::log_file_path;
    use crate::spell::{TextIssue, XmlIssue};
    use crate::stats::ManualClock;
    use crate::xml::TextNode;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn workspace(base: &Path) -> Workspace {
        let bus = Arc::new(EventBus::new());
        let logger = Arc::new(Logger::new());
        bus.subscribe(logger.clone());
        Workspace::new(base, bus, StateKeeper::new(base), logger)
    }

    struct ScriptedDecider {
        answer: bool,
        asked: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl SaveDecider for ScriptedDecider {
        fn confirm_save(&mut self, path: &Path) -> Result<bool> {
            self.asked.lock().unwrap().push(path.to_path_buf());
            Ok(self.answer)
        }
    }

    struct FlagEverything;

    impl SpellService for FlagEverything {
        fn check_lines(&self, lines: &[String]) -> Vec<TextIssue> {
            lines
                .iter()
                .enumerate()
                .map(|(i, line)| TextIssue {
                    line: i + 1,
                    column: 1,
                    word: line.clone(),
                    suggestions: vec![],
                })
                .collect()
        }

        fn check_xml_text(&self, nodes: &[TextNode]) -> Vec<XmlIssue> {
            nodes
                .iter()
                .map(|n| XmlIssue {
                    element_id: n.element_id.clone(),
                    word: n.text.clone(),
                    suggestions: vec!["fixed".into()],
                })
                .collect()
        }
    }

    fn assert_history_invariant(ws: &Workspace) {
        let history: HashSet<&PathBuf> = ws.history().iter().collect();
        let open: HashSet<&PathBuf> = ws.editors.keys().collect();
        assert_eq!(history, open);
        assert_eq!(history.len(), ws.history().len());
        assert_eq!(ws.active.as_ref(), ws.history().first());
    }

    #[test]
    fn test_load_same_path_twice() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        ws.load("a.txt").unwrap();
        ws.load("b.txt").unwrap();
        let path = ws.load("./sub/../a.txt").unwrap().path().to_path_buf();

        assert_eq!(ws.editors.len(), 2);
        assert_eq!(ws.active_buffer().unwrap().path(), path);
        assert!(path.is_absolute());
        assert_history_invariant(&ws);
    }

    #[test]
    fn test_load_missing_text_is_empty_and_modified() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        let buffer = ws.load("new.txt").unwrap();
        assert!(buffer.is_modified());
        assert!(buffer.as_text().unwrap().lines().is_empty());
    }

    #[test]
    fn test_load_existing_text() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "one\r\ntwo\n").unwrap();
        let mut ws = workspace(temp.path());
        let buffer = ws.load("a.txt").unwrap();
        assert!(!buffer.is_modified());
        assert_eq!(buffer.as_text().unwrap().lines(), ["one", "two"]);
    }

    #[test]
    fn test_load_errors() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("dir.txt")).unwrap();
        fs::write(temp.path().join("bad.xml"), "<root><child/></root>").unwrap();
        let mut ws = workspace(temp.path());

        assert!(matches!(ws.load("dir.txt"), Err(Error::BadTarget(_))));
        assert!(matches!(ws.load("missing.xml"), Err(Error::NotFound(_))));
        assert!(matches!(ws.load("bad.xml"), Err(Error::Parse(_))));
        assert!(ws.list().is_empty());
        assert!(ws.active_path().is_none());
    }

    #[test]
    fn test_init_and_save() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        ws.init(BufferKind::Xml, "doc.xml", false).unwrap();
        ws.active_buffer_mut()
            .unwrap()
            .as_xml_mut()
            .unwrap()
            .append_child("item", "i1", "root", Some("hi"))
            .unwrap();
        let saved = ws.save(None).unwrap();

        let written = fs::read_to_string(&saved).unwrap();
        assert_eq!(
            written,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root id=\"root\">\n    <item id=\"i1\">hi</item>\n</root>\n"
        );
        assert!(!ws.active_buffer().unwrap().is_modified());
    }

    #[test]
    fn test_init_rejects_existing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "x").unwrap();
        let mut ws = workspace(temp.path());
        assert!(matches!(
            ws.init(BufferKind::Text, "a.txt", false),
            Err(Error::AlreadyExists(_))
        ));
        ws.init(BufferKind::Text, "b.txt", false).unwrap();
        assert!(matches!(
            ws.init(BufferKind::Text, "b.txt", false),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_init_with_log() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        let path = ws
            .init(BufferKind::Text, "log.txt", true)
            .unwrap()
            .path()
            .to_path_buf();
        assert_eq!(
            ws.active_buffer().unwrap().as_text().unwrap().lines(),
            ["# log"]
        );
        assert!(ws.logger().is_enabled(&path));
        assert!(log_file_path(&path).exists());
    }

    #[test]
    fn test_save_into_missing_directory() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        ws.load("deep/nested/a.txt").unwrap();
        ws.active_buffer_mut()
            .unwrap()
            .as_text_mut()
            .unwrap()
            .append("hello")
            .unwrap();
        ws.save(None).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("deep/nested/a.txt")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_save_requires_active_or_open() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        assert!(matches!(ws.save(None), Err(Error::NoActive)));
        assert!(matches!(ws.save(Some("x.txt")), Err(Error::NotFound(_))));
        assert!(matches!(ws.undo(), Err(Error::NoActive)));
    }

    #[test]
    fn test_save_all() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        ws.load("a.txt").unwrap();
        ws.load("b.txt").unwrap();
        ws.save_all().unwrap();
        assert!(ws.list().iter().all(|info| !info.modified));
        assert!(temp.path().join("a.txt").exists());
        assert!(temp.path().join("b.txt").exists());
    }

    #[test]
    fn test_close_activates_most_recent() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        let a = ws.load("a.txt").unwrap().path().to_path_buf();
        let b = ws.load("b.txt").unwrap().path().to_path_buf();
        let c = ws.load("c.txt").unwrap().path().to_path_buf();
        ws.edit("a.txt").unwrap();
        assert_eq!(ws.history(), [a.clone(), c.clone(), b.clone()]);

        ws.close(None).unwrap();
        assert_eq!(ws.active_path(), Some(c.as_path()));
        ws.close(Some("b.txt")).unwrap();
        assert_eq!(ws.active_path(), Some(c.as_path()));
        assert_history_invariant(&ws);

        ws.close(None).unwrap();
        assert!(ws.active_path().is_none());
        assert!(ws.history().is_empty());
        assert!(matches!(ws.close(None), Err(Error::NoActive)));
    }

    #[test]
    fn test_close_asks_decider_for_modified() {
        let temp = TempDir::new().unwrap();
        let asked = Arc::new(Mutex::new(Vec::new()));
        let mut ws = workspace(temp.path()).with_decider(Box::new(ScriptedDecider {
            answer: true,
            asked: asked.clone(),
        }));
        let path = ws.load("a.txt").unwrap().path().to_path_buf();
        ws.close(None).unwrap();
        assert_eq!(*asked.lock().unwrap(), vec![path.clone()]);
        assert!(path.exists());

        fs::write(temp.path().join("clean.txt"), "x").unwrap();
        ws.load("clean.txt").unwrap();
        ws.close(None).unwrap();
        assert_eq!(asked.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_close_declined_does_not_write() {
        let temp = TempDir::new().unwrap();
        let asked = Arc::new(Mutex::new(Vec::new()));
        let mut ws = workspace(temp.path());
        ws.set_decider(Box::new(ScriptedDecider {
            answer: false,
            asked,
        }));
        ws.load("a.txt").unwrap();
        ws.close(None).unwrap();
        assert!(!temp.path().join("a.txt").exists());
    }

    #[test]
    fn test_edit_requires_open() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        assert!(matches!(ws.edit("a.txt"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_history_invariant_over_sequence() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        for step in ["a", "b", "c", "a", "d", "b"] {
            ws.load(&format!("{step}.txt")).unwrap();
            assert_history_invariant(&ws);
        }
        ws.close(Some("a.txt")).unwrap();
        assert_history_invariant(&ws);
        ws.edit("c.txt").unwrap();
        ws.close(None).unwrap();
        assert_history_invariant(&ws);
        assert_eq!(ws.active_buffer().unwrap().name(), "b.txt");
    }

    #[test]
    fn test_list_tracks_durations() {
        let temp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let mut ws = workspace(temp.path());
        ws.set_clock(clock.clone());

        ws.load("a.txt").unwrap();
        clock.advance(Duration::from_secs(120));
        ws.load("b.txt").unwrap();
        clock.advance(Duration::from_secs(5));

        let list = ws.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "a.txt");
        assert_eq!(list[0].duration, Duration::from_secs(120));
        assert!(!list[0].active);
        assert_eq!(list[1].duration, Duration::from_secs(5));
        assert!(list[1].active);
    }

    #[test]
    fn test_auto_log_on_load() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("t.txt"), "# log\nbody\n").unwrap();
        fs::write(
            temp.path().join("d.xml"),
            r#"<root id="root" log="True"></root>"#,
        )
        .unwrap();
        fs::write(temp.path().join("plain.txt"), "body\n").unwrap();
        let mut ws = workspace(temp.path());

        for name in ["t.txt", "d.xml", "plain.txt"] {
            ws.load(name).unwrap();
        }
        let enabled = ws.logger().active_paths();
        assert_eq!(enabled.len(), 2);
        assert!(enabled.contains(&temp.path().join("t.txt")));
        assert!(enabled.contains(&temp.path().join("d.xml")));
    }

    #[test]
    fn test_publish_command_reaches_logger() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        let path = ws.load("a.txt").unwrap().path().to_path_buf();
        ws.enable_log(None).unwrap();
        ws.publish_command("append", "append \"hi\"", Some(&path));
        ws.publish_command("editor-list", "editor-list", None);

        let (_, log) = ws.show_log(Some("a.txt")).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("session start at "));
        assert!(lines[1].ends_with(" append \"hi\""));

        ws.disable_log(None).unwrap();
        ws.publish_command("append", "append \"more\"", Some(&path));
        assert_eq!(ws.show_log(None).unwrap().1.lines().count(), 2);
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    impl crate::events::Listener for Recorder {
        fn handle(&self, event: &Event) -> Result<()> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[test]
    fn test_publish_command_metadata() {
        let temp = TempDir::new().unwrap();
        let bus = Arc::new(EventBus::new());
        let recorder = Arc::new(Recorder::default());
        bus.subscribe(recorder.clone());
        let mut ws = Workspace::new(
            temp.path(),
            bus,
            StateKeeper::new(temp.path()),
            Arc::new(Logger::new()),
        );

        ws.publish_command("editor-list", "editor-list", None);
        let path = ws.load("a.txt").unwrap().path().to_path_buf();
        ws.publish_command("append", "append x", Some(&path));

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(!events[0].metadata.contains_key("active"));
        assert_eq!(events[0].file, None);

        let event = &events[1];
        assert_eq!(event.kind, crate::events::EventKind::CommandExecuted);
        assert_eq!(event.command, "append");
        assert_eq!(event.raw, "append x");
        assert_eq!(event.file.as_deref(), Some(path.as_path()));
        assert_eq!(
            event.metadata.get("active").map(String::as_str),
            Some(path.to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_spell_check_dispatch() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        ws.load("a.txt").unwrap();
        assert!(matches!(ws.spell_check(None), Err(Error::NotFound(_))));

        ws.set_spell_service(Box::new(FlagEverything));
        assert_eq!(
            ws.spell_check(None).unwrap(),
            "spell check results:\nno spelling errors found"
        );
        ws.active_buffer_mut()
            .unwrap()
            .as_text_mut()
            .unwrap()
            .append("helo")
            .unwrap();
        assert!(ws.spell_check(Some("a.txt")).unwrap().contains("line 1, column 1: \"helo\""));

        ws.init(BufferKind::Xml, "d.xml", false).unwrap();
        ws.active_buffer_mut()
            .unwrap()
            .as_xml_mut()
            .unwrap()
            .append_child("t", "t1", "root", Some("Rowlling"))
            .unwrap();
        assert!(ws.spell_check(None).unwrap().contains("element t1: \"Rowlling\" -> suggestions: fixed"));
    }

    #[test]
    fn test_persist_and_restore() {
        let temp = TempDir::new().unwrap();
        let sample = temp.path().join("sample.txt");
        {
            let mut ws = workspace(temp.path());
            ws.load("sample.txt")
                .unwrap()
                .as_text_mut()
                .unwrap()
                .append("hello")
                .unwrap();
            ws.save(None).unwrap();
            ws.persist().unwrap();
        }

        let state = StateKeeper::new(temp.path()).load().unwrap().unwrap();
        let path = sample.to_string_lossy().into_owned();
        assert_eq!(
            state,
            WorkspaceState {
                editors: vec![EditorState {
                    path: path.clone(),
                    modified: false
                }],
                active: path,
                logging: vec![],
            }
        );

        let mut ws = workspace(temp.path());
        ws.restore().unwrap();
        assert_eq!(ws.active_path(), Some(sample.as_path()));
        assert_eq!(
            ws.active_buffer().unwrap().as_text().unwrap().lines(),
            ["hello"]
        );
    }

    #[test]
    fn test_restore_skips_missing_and_keeps_flags() {
        let temp = TempDir::new().unwrap();
        let kept = temp.path().join("kept.txt");
        fs::write(&kept, "x").unwrap();
        let state = WorkspaceState {
            editors: vec![
                EditorState {
                    path: temp.path().join("gone.txt").to_string_lossy().into_owned(),
                    modified: false,
                },
                EditorState {
                    path: kept.to_string_lossy().into_owned(),
                    modified: true,
                },
            ],
            active: temp.path().join("gone.txt").to_string_lossy().into_owned(),
            logging: vec![kept.to_string_lossy().into_owned()],
        };
        StateKeeper::new(temp.path()).save(&state).unwrap();

        let mut ws = workspace(temp.path());
        ws.restore().unwrap();
        let list = ws.list();
        assert_eq!(list.len(), 1);
        assert!(list[0].modified);
        assert_eq!(ws.active_path(), Some(kept.as_path()));
        assert!(ws.logger().is_enabled(&kept));
    }

    #[test]
    fn test_restore_without_state_file() {
        let temp = TempDir::new().unwrap();
        let mut ws = workspace(temp.path());
        ws.restore().unwrap();
        assert!(ws.list().is_empty());
    }

    #[test]
    fn test_dir_tree_defaults_to_base() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "").unwrap();
        let ws = workspace(temp.path());
        assert_eq!(ws.dir_tree(None).unwrap(), "└── a.txt");
        assert!(matches!(ws.dir_tree(Some("a.txt")), Err(Error::BadTarget(_))));
    }
}
