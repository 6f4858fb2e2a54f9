//! XML buffers: an element tree with an id index and snapshot history.
//!
//! Every element carries a unique `id`. An element holds either text or
//! child elements, never both, and the root can be neither renamed, deleted
//! nor given siblings. Edits that would break one of these rules are
//! rejected before anything changes.

mod parse;
mod render;
mod tree;

pub use parse::parse;
pub use render::{DECLARATION, label};
pub use tree::{Attribute, Element, NodeId, XmlTree};

use crate::error::{Error, Result};
use crate::history::History;
use crate::text::file_name;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Trimmed text of one element, as handed to the spell checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub element_id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct XmlBuffer {
    path: PathBuf,
    tree: XmlTree,
    index: HashMap<String, NodeId>,
    modified: bool,
    history: History<XmlTree>,
}

impl XmlBuffer {
    pub fn new<P: Into<PathBuf>>(path: P, tree: XmlTree, modified: bool) -> Self {
        let index = tree.build_index();
        Self {
            path: path.into(),
            tree,
            index,
            modified,
            history: History::new(),
        }
    }

    /// Parses `content` into a clean buffer.
    pub fn parse<P: Into<PathBuf>>(path: P, content: &str) -> Result<Self> {
        Ok(Self::new(path, parse(content)?, false))
    }

    /// A fresh document holding only the default root. Unsaved, so modified.
    pub fn with_default_root<P: Into<PathBuf>>(path: P, with_log: bool) -> Self {
        Self::new(path, XmlTree::default_document(with_log), true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        file_name(&self.path)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn history(&self) -> &History<XmlTree> {
        &self.history
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.index.get(id).and_then(|&node| self.tree.get(node))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Ids currently registered in the index, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.index.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn insert_before(
        &mut self,
        tag: &str,
        new_id: &str,
        target_id: &str,
        text: Option<&str>,
    ) -> Result<()> {
        self.execute("insert-before", |tree, index| {
            check_new_id(index, new_id)?;
            let target = lookup(index, target_id)?;
            let parent = match tree[target].parent() {
                Some(parent) if !tree.is_root(target) => parent,
                _ => return Err(Error::RootProtected("cannot insert a sibling of the root")),
            };
            if tree[parent].has_text() {
                return Err(Error::MixedContent(format!(
                    "element {} already has text",
                    tree[parent].id()
                )));
            }
            let node = tree
                .insert_before(target, new_element(tag, new_id, text))
                .ok_or_else(|| Error::NotFound(format!("element id: {target_id}")))?;
            index.insert(new_id.to_string(), node);
            Ok(())
        })
    }

    pub fn append_child(
        &mut self,
        tag: &str,
        new_id: &str,
        parent_id: &str,
        text: Option<&str>,
    ) -> Result<()> {
        self.execute("append-child", |tree, index| {
            check_new_id(index, new_id)?;
            let parent = lookup(index, parent_id)?;
            if tree[parent].has_text() {
                return Err(Error::MixedContent(format!(
                    "element {parent_id} already has text"
                )));
            }
            let node = tree.append_child(parent, new_element(tag, new_id, text));
            index.insert(new_id.to_string(), node);
            Ok(())
        })
    }

    pub fn edit_id(&mut self, old_id: &str, new_id: &str) -> Result<()> {
        self.execute("edit-id", |tree, index| {
            let node = lookup(index, old_id)?;
            if tree.is_root(node) {
                return Err(Error::RootProtected("cannot change the root id"));
            }
            check_new_id(index, new_id)?;
            if let Some(element) = tree.get_mut(node) {
                element.set_id(new_id.to_string());
            }
            index.remove(old_id);
            index.insert(new_id.to_string(), node);
            Ok(())
        })
    }

    /// Replaces the text of a leaf element. Empty text is allowed.
    pub fn edit_text(&mut self, element_id: &str, text: &str) -> Result<()> {
        self.execute("edit-text", |tree, index| {
            let node = lookup(index, element_id)?;
            if !tree[node].children().is_empty() {
                return Err(Error::MixedContent(format!(
                    "element {element_id} has child elements"
                )));
            }
            if let Some(element) = tree.get_mut(node) {
                element.set_text(text.to_string());
            }
            Ok(())
        })
    }

    pub fn delete_element(&mut self, element_id: &str) -> Result<()> {
        self.execute("delete-element", |tree, index| {
            let node = lookup(index, element_id)?;
            if tree.is_root(node) {
                return Err(Error::RootProtected("cannot delete the root"));
            }
            for id in tree.remove(node) {
                index.remove(&id);
            }
            Ok(())
        })
    }

    pub fn tree_string(&self) -> String {
        render::tree_string(&self.tree)
    }

    /// Every element with non-blank text, in document order.
    pub fn text_nodes(&self) -> Vec<TextNode> {
        self.tree
            .descendants()
            .into_iter()
            .map(|node| &self.tree[node])
            .filter(|element| element.has_text())
            .map(|element| TextNode {
                element_id: element.id().to_string(),
                text: element.text().trim().to_string(),
            })
            .collect()
    }

    pub fn root_attributes(&self) -> BTreeMap<String, String> {
        self.tree
            .root()
            .attributes()
            .iter()
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect()
    }

    /// True when the root carries `log="true"`, ignoring case.
    pub fn wants_log(&self) -> bool {
        self.tree
            .root()
            .attribute("log")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    pub fn content(&self) -> String {
        render::serialize(&self.tree)
    }

    pub fn undo(&mut self) -> Result<()> {
        let snapshot = self.history.undo()?;
        self.restore(snapshot);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        let snapshot = self.history.redo()?;
        self.restore(snapshot);
        Ok(())
    }

    fn restore(&mut self, snapshot: XmlTree) {
        self.index = snapshot.build_index();
        self.tree = snapshot;
        self.modified = true;
    }

    fn execute<F>(&mut self, label: &'static str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut XmlTree, &mut HashMap<String, NodeId>) -> Result<()>,
    {
        let before = self.tree.compact();
        if let Err(err) = mutate(&mut self.tree, &mut self.index) {
            self.index = before.build_index();
            self.tree = before;
            return Err(err);
        }
        let after = self.tree.compact();
        self.index = after.build_index();
        self.tree = after.clone();
        self.history.record(label, before, after);
        self.modified = true;
        Ok(())
    }
}

fn new_element(tag: &str, id: &str, text: Option<&str>) -> Element {
    let element = Element::new(tag, id);
    match text {
        Some(text) => element.with_text(text),
        None => element,
    }
}

fn check_new_id(index: &HashMap<String, NodeId>, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidId(id.to_string()));
    }
    if index.contains_key(id) {
        return Err(Error::DuplicateId(id.to_string()));
    }
    Ok(())
}

fn lookup(index: &HashMap<String, NodeId>, id: &str) -> Result<NodeId> {
    index
        .get(id)
        .copied()
        .ok_or_else(|| Error::NotFound(format!("element id: {id}")))
}
