//! Spell-check contract and report formatting.
//!
//! The checker itself lives outside this crate; the workspace only hands it
//! buffer text and renders what comes back.

use crate::xml::TextNode;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextIssue {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in code points.
    pub column: usize,
    pub word: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlIssue {
    pub element_id: String,
    pub word: String,
    pub suggestions: Vec<String>,
}

pub trait SpellService {
    fn check_lines(&self, lines: &[String]) -> Vec<TextIssue>;
    fn check_xml_text(&self, nodes: &[TextNode]) -> Vec<XmlIssue>;
}

const HEADER: &str = "spell check results:";
const CLEAN: &str = "no spelling errors found";

pub fn format_text_issues(issues: &[TextIssue]) -> String {
    report(issues.iter().map(|issue| {
        format!(
            "line {}, column {}: \"{}\" -> suggestions: {}",
            issue.line,
            issue.column,
            issue.word,
            suggestions(&issue.suggestions)
        )
    }))
}

pub fn format_xml_issues(issues: &[XmlIssue]) -> String {
    report(issues.iter().map(|issue| {
        format!(
            "element {}: \"{}\" -> suggestions: {}",
            issue.element_id,
            issue.word,
            suggestions(&issue.suggestions)
        )
    }))
}

fn report(lines: impl Iterator<Item = String>) -> String {
    let mut out = String::from(HEADER);
    let mut empty = true;
    for line in lines {
        let _ = write!(out, "\n{line}");
        empty = false;
    }
    if empty {
        out.push('\n');
        out.push_str(CLEAN);
    }
    out
}

fn suggestions(words: &[String]) -> String {
    if words.is_empty() {
        "none".to_string()
    } else {
        words.join(", ")
    }
}
