#![doc = include_str!("../README.md")]

mod words;

pub use words::{WordPosition, levenshtein, word_positions};

use scribe::{SpellService, TextIssue, TextNode, XmlIssue};
use std::collections::BTreeSet;

/// Furthest edit distance still offered as a suggestion.
pub const MAX_DISTANCE: usize = 2;
/// Most suggestions returned per word.
pub const MAX_SUGGESTIONS: usize = 3;

/// Built-in vocabulary covering the editor's own command and sample words.
pub const DEFAULT_WORDS: &[&str] = &[
    "a", "an", "and", "api", "append", "author", "book", "bookstore", "child", "command",
    "config", "content", "data", "delete", "editor", "element", "english", "file", "harry",
    "hello", "italian", "language", "list", "load", "log", "minute", "minutes", "node",
    "occurred", "parent", "please", "potter", "price", "receive", "redo", "root", "rowling",
    "save", "spell", "text", "title", "tree", "undo", "updates", "with", "world", "xml",
];

/// Decides whether a single word is spelled correctly.
pub trait Checker {
    /// `None` when the word is fine, otherwise the suggested corrections
    /// (possibly empty).
    fn check(&self, word: &str) -> Option<Vec<String>>;
}

/// Case-insensitive word list with edit-distance suggestions.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: BTreeSet<String>,
}

impl Dictionary {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    /// Dictionary words within [`MAX_DISTANCE`] of `word`, nearest first,
    /// ties broken alphabetically.
    pub fn suggestions(&self, word: &str) -> Vec<String> {
        let word = word.to_lowercase();
        let mut candidates: Vec<(usize, &String)> = self
            .words
            .iter()
            .map(|w| (levenshtein(&word, w), w))
            .filter(|(distance, _)| *distance <= MAX_DISTANCE)
            .collect();
        candidates.sort();
        candidates
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, w)| w.clone())
            .collect()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS)
    }
}

impl Checker for Dictionary {
    fn check(&self, word: &str) -> Option<Vec<String>> {
        if self.contains(word) {
            None
        } else {
            Some(self.suggestions(word))
        }
    }
}

/// Runs a [`Checker`] over buffer text.
pub struct SpellChecker<C = Dictionary> {
    checker: C,
}

impl<C: Checker> SpellChecker<C> {
    pub fn new(checker: C) -> Self {
        Self { checker }
    }
}

impl Default for SpellChecker<Dictionary> {
    fn default() -> Self {
        Self::new(Dictionary::default())
    }
}

impl<C: Checker> SpellService for SpellChecker<C> {
    fn check_lines(&self, lines: &[String]) -> Vec<TextIssue> {
        let mut issues = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            for pos in word_positions(line) {
                if let Some(suggestions) = self.checker.check(&pos.word) {
                    issues.push(TextIssue {
                        line: i + 1,
                        column: pos.column,
                        word: pos.word,
                        suggestions,
                    });
                }
            }
        }
        issues
    }

    fn check_xml_text(&self, nodes: &[TextNode]) -> Vec<XmlIssue> {
        let mut issues = Vec::new();
        for node in nodes {
            for pos in word_positions(&node.text) {
                if let Some(suggestions) = self.checker.check(&pos.word) {
                    issues.push(XmlIssue {
                        element_id: node.element_id.clone(),
                        word: pos.word,
                        suggestions,
                    });
                }
            }
        }
        issues
    }
}
