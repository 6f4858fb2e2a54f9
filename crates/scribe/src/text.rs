//! Line-addressed plain text buffer.
//!
//! Positions are 1-based. Columns count Unicode code points, and
//! `col = len + 1` addresses the end of a line.

use crate::error::{Error, Result};
use crate::history::History;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct TextBuffer {
    path: PathBuf,
    lines: Vec<String>,
    modified: bool,
    history: History<Vec<String>>,
}

impl TextBuffer {
    pub fn new<P: Into<PathBuf>>(path: P, lines: Vec<String>, modified: bool) -> Self {
        Self {
            path: path.into(),
            lines,
            modified,
            history: History::new(),
        }
    }

    /// Builds a clean buffer from file bytes already decoded to text.
    pub fn from_content<P: Into<PathBuf>>(path: P, content: &str) -> Self {
        Self::new(path, split_file_content(content), false)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        file_name(&self.path)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Replaces the content wholesale without recording history.
    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn history(&self) -> &History<Vec<String>> {
        &self.history
    }

    /// Appends `text` as one or more new lines at the end of the buffer.
    pub fn append(&mut self, text: &str) -> Result<()> {
        self.execute("append", |lines| {
            lines.extend(split_fragments(text));
            Ok(())
        })
    }

    /// Inserts `text` at `line:col`. Line feeds in `text` split the line.
    pub fn insert(&mut self, line: usize, col: usize, text: &str) -> Result<()> {
        self.execute("insert", |lines| insert_span(lines, line, col, text))
    }

    /// Removes `length` code points starting at `line:col`, within one line.
    pub fn delete(&mut self, line: usize, col: usize, length: usize) -> Result<()> {
        self.execute("delete", |lines| delete_span(lines, line, col, length))
    }

    /// Delete followed by insert at the same position, as a single undo unit.
    pub fn replace(&mut self, line: usize, col: usize, length: usize, text: &str) -> Result<()> {
        self.execute("replace", |lines| {
            delete_span(lines, line, col, length)?;
            insert_span(lines, line, col, text)
        })
    }

    /// Lines `start..=end` (1-based). `end == 0` means through the last line.
    pub fn show(&self, start: usize, end: usize) -> Result<Vec<String>> {
        if self.lines.is_empty() {
            return Ok(Vec::new());
        }
        let len = self.lines.len();
        if start < 1 || start > len {
            return Err(Error::EditRange(format!("start line {start} (buffer has {len} lines)")));
        }
        let end = if end == 0 { len } else { end };
        if end < start || end > len {
            return Err(Error::EditRange(format!("end line {end} (buffer has {len} lines)")));
        }
        Ok(self.lines[start - 1..end].to_vec())
    }

    pub fn undo(&mut self) -> Result<()> {
        self.lines = self.history.undo()?;
        self.modified = true;
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        self.lines = self.history.redo()?;
        self.modified = true;
        Ok(())
    }

    /// Lines joined by `\n`, without a trailing newline.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    fn execute<F>(&mut self, label: &'static str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<String>) -> Result<()>,
    {
        let before = self.lines.clone();
        if let Err(err) = mutate(&mut self.lines) {
            self.lines = before;
            return Err(err);
        }
        self.history.record(label, before, self.lines.clone());
        self.modified = true;
        Ok(())
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Splits file content into lines, dropping the empty fragment after a
/// trailing newline.
pub fn split_file_content(content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    let normalized = content.replace("\r\n", "\n");
    let mut lines: Vec<String> = normalized.split('\n').map(str::to_string).collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn split_fragments(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    text.replace("\r\n", "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `index`-th code point, or `s.len()` at end of string.
fn byte_offset(s: &str, index: usize) -> usize {
    s.char_indices().nth(index).map_or(s.len(), |(i, _)| i)
}

fn check_position(lines: &[String], line: usize, col: usize, allow_eol: bool) -> Result<()> {
    if lines.is_empty() {
        if allow_eol && line == 1 && col == 1 {
            return Ok(());
        }
        return Err(Error::EditRange(
            "an empty buffer only accepts position 1:1".to_string(),
        ));
    }
    if line < 1 || line > lines.len() {
        return Err(Error::EditRange(format!(
            "line {line} (buffer has {} lines)",
            lines.len()
        )));
    }
    let line_len = char_len(&lines[line - 1]);
    let max_col = if allow_eol { line_len + 1 } else { line_len };
    if col < 1 || col > max_col {
        return Err(Error::EditRange(format!(
            "column {col} on line {line} (line has {line_len} characters)"
        )));
    }
    Ok(())
}

fn insert_span(lines: &mut Vec<String>, line: usize, col: usize, text: &str) -> Result<()> {
    check_position(lines, line, col, true)?;
    if lines.is_empty() {
        lines.push(String::new());
    }
    let idx = line - 1;
    let split_at = byte_offset(&lines[idx], col - 1);
    let right = lines[idx].split_off(split_at);
    let mut fragments = split_fragments(text);

    if fragments.len() == 1 {
        lines[idx].push_str(&fragments[0]);
        lines[idx].push_str(&right);
        return Ok(());
    }

    let last = fragments.pop().unwrap_or_default() + &right;
    let mut rest = fragments.into_iter();
    if let Some(first) = rest.next() {
        lines[idx].push_str(&first);
    }
    let tail: Vec<String> = rest.chain(std::iter::once(last)).collect();
    lines.splice(idx + 1..idx + 1, tail);
    Ok(())
}

fn delete_span(lines: &mut [String], line: usize, col: usize, length: usize) -> Result<()> {
    check_position(lines, line, col, false)?;
    if length < 1 {
        return Err(Error::EditRange("delete length must be at least 1".to_string()));
    }
    let target = &mut lines[line - 1];
    let line_len = char_len(target);
    if length > line_len - (col - 1) {
        return Err(Error::EditRange(format!(
            "deleting {length} characters from column {col} runs past end of line {line}"
        )));
    }
    let start = byte_offset(target, col - 1);
    let end = byte_offset(target, col - 1 + length);
    target.replace_range(start..end, "");
    Ok(())
}
