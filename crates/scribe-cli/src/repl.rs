use crate::console::Console;
use crate::tokenize::tokenize;
use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use scribe::{Buffer, BufferKind, TextBuffer, Workspace, XmlBuffer, format_duration};
use std::path::PathBuf;

const PROMPT: &str = "> ";

// ============================================================================
// Command grammar
// ============================================================================

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Open a file, or switch to it if already open
    Load { file: String },
    /// Write the active file, a named file, or `all`
    Save { target: Option<String> },
    /// Create a new unsaved file
    Init {
        /// `text` or `xml`
        #[arg(value_parser = parse_kind)]
        kind: BufferKind,
        file: String,
        /// Pass `with-log` to turn on command logging for the file
        #[arg(value_parser = ["with-log"])]
        with_log: Option<String>,
    },
    /// Close the active file or a named one
    Close { file: Option<String> },
    /// Switch to an open file
    Edit { file: String },
    /// List open files
    EditorList,
    /// Print a directory tree, the workspace directory by default
    DirTree { dir: Option<String> },
    /// Undo the last edit in the active file
    Undo,
    /// Redo the last undone edit in the active file
    Redo,
    /// Append a line to the active text file
    Append {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
    /// Insert text at line:col
    Insert {
        #[arg(value_parser = parse_position)]
        at: Position,
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
    /// Delete characters starting at line:col
    Delete {
        #[arg(value_parser = parse_position)]
        at: Position,
        len: usize,
    },
    /// Replace characters starting at line:col
    Replace {
        #[arg(value_parser = parse_position)]
        at: Position,
        len: usize,
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
    /// Print lines of the active text file (`a:b`, `a`, `:b`, `a:`)
    Show {
        #[arg(value_parser = parse_range)]
        range: Option<LineRange>,
    },
    /// Insert a new element before a target element
    InsertBefore {
        tag: String,
        new_id: String,
        target_id: String,
        #[arg(allow_hyphen_values = true)]
        text: Option<String>,
    },
    /// Append a new element as the last child of a parent element
    AppendChild {
        tag: String,
        new_id: String,
        parent_id: String,
        #[arg(allow_hyphen_values = true)]
        text: Option<String>,
    },
    /// Rename an element id
    EditId { old_id: String, new_id: String },
    /// Replace an element's text
    EditText {
        element_id: String,
        #[arg(allow_hyphen_values = true)]
        text: Option<String>,
    },
    /// Remove an element and its subtree
    DeleteElement { element_id: String },
    /// Print the element tree of the active or a named XML file
    XmlTree { file: Option<String> },
    /// Check spelling in the active or a named file
    SpellCheck { file: Option<String> },
    /// Turn on command logging for a file
    LogOn { file: Option<String> },
    /// Turn off command logging for a file
    LogOff { file: Option<String> },
    /// Print a file's command log
    LogShow { file: Option<String> },
    /// Offer to save modified files, record the workspace, and quit
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    line: usize,
    col: usize,
}

/// 1-based and inclusive; `end == 0` runs to the last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineRange {
    start: usize,
    end: usize,
}

fn parse_kind(s: &str) -> Result<BufferKind, String> {
    match s.to_lowercase().as_str() {
        "text" | "txt" => Ok(BufferKind::Text),
        "xml" => Ok(BufferKind::Xml),
        other => Err(format!("unknown file kind {other:?}, expected text or xml")),
    }
}

fn parse_position(s: &str) -> Result<Position, String> {
    let (line, col) = s
        .split_once(':')
        .ok_or_else(|| format!("expected line:col, got {s:?}"))?;
    let number = |part: &str| {
        part.parse::<usize>()
            .map_err(|_| format!("expected line:col, got {s:?}"))
    };
    Ok(Position {
        line: number(line)?,
        col: number(col)?,
    })
}

fn parse_range(s: &str) -> Result<LineRange, String> {
    let number = |part: &str, default: usize| {
        if part.is_empty() {
            Ok(default)
        } else {
            part.parse::<usize>()
                .map_err(|_| format!("expected start:end, got {s:?}"))
        }
    };
    match s.split_once(':') {
        Some((start, end)) => Ok(LineRange {
            start: number(start, 1)?,
            end: number(end, 0)?,
        }),
        None => {
            let line = number(s, 1)?;
            Ok(LineRange {
                start: line,
                end: line,
            })
        }
    }
}

// ============================================================================
// Shell
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// What a command printed and which file it acted on.
#[derive(Default)]
struct Reply {
    output: Vec<String>,
    target: Option<PathBuf>,
}

impl Reply {
    fn on(target: PathBuf) -> Self {
        Self {
            output: Vec::new(),
            target: Some(target),
        }
    }

    fn say(mut self, line: impl Into<String>) -> Self {
        self.output.push(line.into());
        self
    }
}

pub struct Repl {
    workspace: Workspace,
    console: Console,
}

impl Repl {
    pub fn new(workspace: Workspace, console: Console) -> Self {
        Self { workspace, console }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Reads and runs commands until `exit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        while let Some(line) = self.console.read_line(PROMPT)? {
            if self.handle(&line)? == Flow::Exit {
                return Ok(());
            }
        }
        self.console.println("")?;
        self.shutdown()
    }

    /// Runs one input line. Command failures are printed, not returned; the
    /// `Err` case is reserved for the console itself failing.
    pub fn handle(&mut self, raw: &str) -> Result<Flow> {
        let raw = raw.trim();
        let tokens = match tokenize(raw) {
            Ok(tokens) if tokens.is_empty() => return Ok(Flow::Continue),
            Ok(tokens) => tokens,
            Err(err) => {
                self.console.println(&format!("error: {err}"))?;
                return Ok(Flow::Continue);
            }
        };

        let command = match Line::try_parse_from(&tokens) {
            Ok(line) => line.command,
            Err(err) => {
                self.console.println(err.to_string().trim_end())?;
                return Ok(Flow::Continue);
            }
        };

        if command == Command::Exit {
            self.shutdown()?;
            return Ok(Flow::Exit);
        }

        match self.execute(command) {
            Ok(reply) => {
                for line in &reply.output {
                    self.console.println(line)?;
                }
                self.workspace
                    .publish_command(&tokens[0], raw, reply.target.as_deref());
            }
            Err(err) => {
                tracing::debug!(command = %tokens[0], error = %err, "command failed");
                self.console.println(&format!("error: {err:#}"))?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Offers to save each modified file, then records the open set.
    fn shutdown(&mut self) -> Result<()> {
        for info in self.workspace.list() {
            if !info.modified {
                continue;
            }
            let question = format!("save changes to {}?", info.path.display());
            if self.console.confirm(&question)? {
                let path = info.path.to_string_lossy();
                if let Err(err) = self.workspace.save(Some(&path)) {
                    self.console.println(&format!("error: {err}"))?;
                }
            }
        }
        self.workspace
            .persist()
            .context("failed to record workspace state")
    }

    fn execute(&mut self, command: Command) -> Result<Reply> {
        let ws = &mut self.workspace;
        let reply = match command {
            Command::Load { file } => {
                let buffer = ws.load(&file)?;
                Reply::on(buffer.path().to_path_buf()).say(format!("opened {}", buffer.name()))
            }
            Command::Save { target } if target.as_deref() == Some("all") => {
                ws.save_all()?;
                Reply::default().say("saved all files")
            }
            Command::Save { target } => {
                let path = ws.save(target.as_deref())?;
                Reply::on(path.clone()).say(format!("saved {}", path.display()))
            }
            Command::Init {
                kind,
                file,
                with_log,
            } => {
                let buffer = ws.init(kind, &file, with_log.is_some())?;
                Reply::on(buffer.path().to_path_buf())
                    .say(format!("created {} file {}", kind, buffer.name()))
            }
            Command::Close { file } => {
                let path = ws.close(file.as_deref())?;
                Reply::on(path.clone()).say(format!("closed {}", path.display()))
            }
            Command::Edit { file } => {
                let path = ws.edit(&file)?;
                Reply::on(path.clone()).say(format!("switched to {}", path.display()))
            }
            Command::EditorList => {
                let list = ws.list();
                if list.is_empty() {
                    return Ok(Reply::default().say("no open files"));
                }
                let mut reply = Reply::default();
                for info in list {
                    let marker = if info.active { "*" } else { " " };
                    let modified = if info.modified { " [modified]" } else { "" };
                    reply = reply.say(format!(
                        "{marker} {}{modified} ({})",
                        info.name,
                        format_duration(info.duration)
                    ));
                }
                reply
            }
            Command::DirTree { dir } => {
                let tree = ws.dir_tree(dir.as_deref())?;
                let mut reply = Reply::default();
                if !tree.is_empty() {
                    reply = reply.say(tree);
                }
                reply
            }
            Command::Undo => Reply::on(ws.undo()?),
            Command::Redo => Reply::on(ws.redo()?),
            Command::Append { text } => {
                let buffer = active_text(ws)?;
                buffer.append(&text)?;
                Reply::on(buffer.path().to_path_buf())
            }
            Command::Insert { at, text } => {
                let buffer = active_text(ws)?;
                buffer.insert(at.line, at.col, &text)?;
                Reply::on(buffer.path().to_path_buf())
            }
            Command::Delete { at, len } => {
                let buffer = active_text(ws)?;
                buffer.delete(at.line, at.col, len)?;
                Reply::on(buffer.path().to_path_buf())
            }
            Command::Replace { at, len, text } => {
                let buffer = active_text(ws)?;
                buffer.replace(at.line, at.col, len, &text)?;
                Reply::on(buffer.path().to_path_buf())
            }
            Command::Show { range } => {
                let range = range.unwrap_or(LineRange { start: 1, end: 0 });
                let buffer = active_text(ws)?;
                let mut reply = Reply::on(buffer.path().to_path_buf());
                for (i, line) in buffer.show(range.start, range.end)?.iter().enumerate() {
                    reply = reply.say(format!("{}: {line}", range.start + i));
                }
                reply
            }
            Command::InsertBefore {
                tag,
                new_id,
                target_id,
                text,
            } => {
                let buffer = active_xml(ws)?;
                buffer.insert_before(&tag, &new_id, &target_id, text.as_deref())?;
                Reply::on(buffer.path().to_path_buf())
            }
            Command::AppendChild {
                tag,
                new_id,
                parent_id,
                text,
            } => {
                let buffer = active_xml(ws)?;
                buffer.append_child(&tag, &new_id, &parent_id, text.as_deref())?;
                Reply::on(buffer.path().to_path_buf())
            }
            Command::EditId { old_id, new_id } => {
                let buffer = active_xml(ws)?;
                buffer.edit_id(&old_id, &new_id)?;
                Reply::on(buffer.path().to_path_buf())
            }
            Command::EditText { element_id, text } => {
                let buffer = active_xml(ws)?;
                buffer.edit_text(&element_id, text.as_deref().unwrap_or(""))?;
                Reply::on(buffer.path().to_path_buf())
            }
            Command::DeleteElement { element_id } => {
                let buffer = active_xml(ws)?;
                buffer.delete_element(&element_id)?;
                Reply::on(buffer.path().to_path_buf())
            }
            Command::XmlTree { file } => {
                let buffer = match file.as_deref().filter(|f| !f.is_empty()) {
                    Some(file) => ws.buffer_by_path(file)?,
                    None => ws.active_buffer()?,
                };
                let xml = xml_of(buffer)?;
                Reply::on(xml.path().to_path_buf()).say(xml.tree_string())
            }
            Command::SpellCheck { file } => {
                let report = ws.spell_check(file.as_deref())?;
                let path = match file.as_deref().filter(|f| !f.is_empty()) {
                    Some(file) => ws.resolve(file)?,
                    None => ws.active_path().map(PathBuf::from).ok_or(scribe::Error::NoActive)?,
                };
                Reply::on(path).say(report)
            }
            Command::LogOn { file } => {
                let path = ws.enable_log(file.as_deref())?;
                Reply::on(path.clone()).say(format!("logging enabled for {}", path.display()))
            }
            Command::LogOff { file } => {
                let path = ws.disable_log(file.as_deref())?;
                Reply::on(path.clone()).say(format!("logging disabled for {}", path.display()))
            }
            Command::LogShow { file } => {
                let (path, content) = ws.show_log(file.as_deref())?;
                Reply::on(path).say(content.trim_end())
            }
            Command::Exit => bail!("exit is handled by the shell loop"),
        };
        Ok(reply)
    }
}

fn active_text(ws: &mut Workspace) -> Result<&mut TextBuffer> {
    match ws.active_buffer_mut()? {
        Buffer::Text(text) => Ok(text),
        Buffer::Xml(xml) => Err(anyhow!("{} is not a text file", xml.name())),
    }
}

fn active_xml(ws: &mut Workspace) -> Result<&mut XmlBuffer> {
    match ws.active_buffer_mut()? {
        Buffer::Xml(xml) => Ok(xml),
        Buffer::Text(text) => Err(anyhow!("{} is not an XML file", text.name())),
    }
}

fn xml_of(buffer: &Buffer) -> Result<&XmlBuffer> {
    buffer
        .as_xml()
        .ok_or_else(|| anyhow!("{} is not an XML file", buffer.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{Captured, scripted};
    use scribe::{EventBus, Logger, StateKeeper, log_file_path};
    use scribe_spell::{Dictionary, SpellChecker};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn repl(base: &Path, input: &str) -> (Repl, Captured) {
        let (console, out) = scripted(input);
        let bus = Arc::new(EventBus::new());
        let logger = Arc::new(Logger::new());
        bus.subscribe(logger.clone());
        let ws = Workspace::new(base, bus, StateKeeper::new(base), logger)
            .with_decider(Box::new(console.clone()))
            .with_spell_service(Box::new(SpellChecker::new(Dictionary::default())));
        (Repl::new(ws, console), out)
    }

    fn run_lines(repl: &mut Repl, lines: &[&str]) {
        for line in lines {
            assert_eq!(repl.handle(line).unwrap(), Flow::Continue, "{line}");
        }
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("3:7"), Ok(Position { line: 3, col: 7 }));
        assert!(parse_position("3").is_err());
        assert!(parse_position("a:1").is_err());
    }

    #[test]
    fn test_parse_range_forms() {
        let range = |start, end| Ok(LineRange { start, end });
        assert_eq!(parse_range("2:4"), range(2, 4));
        assert_eq!(parse_range("3"), range(3, 3));
        assert_eq!(parse_range(":2"), range(1, 2));
        assert_eq!(parse_range("2:"), range(2, 0));
        assert!(parse_range("x:1").is_err());
    }

    #[test]
    fn test_command_names() {
        let parse = |args: &[&str]| Line::try_parse_from(args).map(|l| l.command);
        assert_eq!(parse(&["editor-list"]).unwrap(), Command::EditorList);
        assert_eq!(
            parse(&["init", "xml", "a.xml", "with-log"]).unwrap(),
            Command::Init {
                kind: BufferKind::Xml,
                file: "a.xml".into(),
                with_log: Some("with-log".into()),
            }
        );
        assert_eq!(
            parse(&["append", "-leading dash"]).unwrap(),
            Command::Append {
                text: "-leading dash".into()
            }
        );
        assert!(parse(&["init", "csv", "a.csv"]).is_err());
        assert!(parse(&["nonsense"]).is_err());
    }

    #[test]
    fn test_text_editing_session() {
        let temp = TempDir::new().unwrap();
        let (mut repl, out) = repl(temp.path(), "");
        run_lines(
            &mut repl,
            &[
                "load notes.txt",
                r#"append "hello world""#,
                r#"append "second""#,
                r#"insert 1:7 "big ""#,
                "delete 2:1 3",
                r#"replace 1:1 5 "HELLO""#,
            ],
        );
        out.clear();
        run_lines(&mut repl, &["show"]);
        assert_eq!(out.text(), "1: HELLO big world\n2: ond\n");

        out.clear();
        run_lines(&mut repl, &["undo", "show 1"]);
        assert_eq!(out.text(), "1: hello big world\n");
    }

    #[test]
    fn test_show_out_of_range_reports_error() {
        let temp = TempDir::new().unwrap();
        let (mut repl, out) = repl(temp.path(), "");
        run_lines(&mut repl, &["load a.txt", "append one", "show 2:5"]);
        assert!(out.text().contains("error: edit position out of range"));
    }

    #[test]
    fn test_xml_session() {
        let temp = TempDir::new().unwrap();
        let (mut repl, out) = repl(temp.path(), "");
        run_lines(
            &mut repl,
            &[
                "init xml books.xml",
                "append-child book book1 root",
                r#"append-child title title1 book1 "Harry Potter""#,
                r#"insert-before book book0 book1"#,
                "edit-id book0 intro",
            ],
        );
        out.clear();
        run_lines(&mut repl, &["xml-tree"]);
        assert_eq!(
            out.text(),
            "root [id=\"root\"]\n\
             ├── book [id=\"intro\"]\n\
             └── book [id=\"book1\"]\n    \
                 └── title [id=\"title1\"]\n        \
                     └── \"Harry Potter\"\n"
        );
    }

    #[test]
    fn test_errors_are_printed_not_fatal() {
        let temp = TempDir::new().unwrap();
        let (mut repl, out) = repl(temp.path(), "");
        run_lines(
            &mut repl,
            &[
                "undo",
                r#"append "unterminated"#,
                "load a.txt",
                "append-child x x1 root",
            ],
        );
        let text = out.text();
        assert!(text.contains("error: no active buffer"));
        assert!(text.contains("error: unterminated quote"));
        assert!(text.contains("error: a.txt is not an XML file"));
    }

    #[test]
    fn test_editor_list_format() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("clean.txt"), "x").unwrap();
        let (mut repl, out) = repl(temp.path(), "");
        run_lines(&mut repl, &["load clean.txt", "load new.txt"]);
        out.clear();
        run_lines(&mut repl, &["editor-list"]);
        let text = out.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  clean.txt ("));
        assert!(lines[1].starts_with("* new.txt [modified] ("));
    }

    #[test]
    fn test_commands_are_logged() {
        let temp = TempDir::new().unwrap();
        let (mut repl, out) = repl(temp.path(), "");
        run_lines(
            &mut repl,
            &[
                "init text log.txt with-log",
                r#"append "entry""#,
                "editor-list",
                "show",
            ],
        );
        let log = fs::read_to_string(log_file_path(&temp.path().join("log.txt"))).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert!(lines[0].starts_with("session start at "));
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with(" init text log.txt with-log"));
        assert!(lines[2].ends_with(r#" append "entry""#));
        assert!(lines[3].ends_with(" show"));

        out.clear();
        run_lines(&mut repl, &["log-show"]);
        assert!(out.text().starts_with("session start at "));
    }

    #[test]
    fn test_spell_check() {
        let temp = TempDir::new().unwrap();
        let (mut repl, out) = repl(temp.path(), "");
        run_lines(&mut repl, &["load a.txt", r#"append "Please recieve updates""#]);
        out.clear();
        run_lines(&mut repl, &["spell-check"]);
        assert_eq!(
            out.text(),
            "spell check results:\nline 1, column 8: \"recieve\" -> suggestions: receive\n"
        );
    }

    #[test]
    fn test_save_all_and_close() {
        let temp = TempDir::new().unwrap();
        let (mut repl, out) = repl(temp.path(), "");
        run_lines(
            &mut repl,
            &["load a.txt", "append a", "load b.txt", "save all", "close"],
        );
        assert!(out.text().contains("saved all files"));
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "a");
        assert!(temp.path().join("b.txt").exists());
        assert_eq!(
            repl.workspace().active_path(),
            Some(temp.path().join("a.txt").as_path())
        );
    }

    #[test]
    fn test_close_prompts_through_console() {
        let temp = TempDir::new().unwrap();
        let (mut repl, _) = repl(temp.path(), "y\n");
        run_lines(&mut repl, &["load a.txt", "append kept", "close"]);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "kept");
    }

    #[test]
    fn test_exit_saves_on_yes_and_persists() {
        let temp = TempDir::new().unwrap();
        let (mut repl, _) = repl(temp.path(), "yes\n");
        run_lines(&mut repl, &["load a.txt", "append body"]);
        assert_eq!(repl.handle("exit").unwrap(), Flow::Exit);

        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "body");
        let state = StateKeeper::new(temp.path()).load().unwrap().unwrap();
        assert_eq!(state.editors.len(), 1);
        assert!(!state.editors[0].modified);
    }

    #[test]
    fn test_end_of_input_declines_and_persists() {
        let temp = TempDir::new().unwrap();
        let (mut repl, _) = repl(temp.path(), "load a.txt\nappend body\n");
        repl.run().unwrap();

        assert!(!temp.path().join("a.txt").exists());
        let state = StateKeeper::new(temp.path()).load().unwrap().unwrap();
        assert!(state.editors[0].modified);
    }
}
