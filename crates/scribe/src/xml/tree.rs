//! Arena storage for XML element trees.
//!
//! Elements own their children through [`NodeId`] handles into the arena and
//! keep a parent handle for upward navigation. Removed subtrees leave empty
//! slots behind until the tree is compacted.

use std::collections::HashMap;
use std::ops::Index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    id: String,
    attributes: Vec<Attribute>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Element {
    /// A new element whose only attribute is `id`.
    pub fn new(tag: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            tag: tag.into(),
            attributes: vec![Attribute::new("id", id.clone())],
            id,
            text: String::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Builds an element from parsed attributes. `id` must be the value of
    /// the `id` attribute in `attributes`.
    pub(crate) fn from_parts(tag: String, id: String, attributes: Vec<Attribute>) -> Self {
        Self {
            tag,
            id,
            attributes,
            text: String::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the text is non-empty after trimming whitespace.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub(crate) fn push_text(&mut self, fragment: &str) {
        if self.has_text() {
            self.text.push(' ');
            self.text.push_str(fragment);
        } else {
            self.text = fragment.to_string();
        }
    }

    /// Renames the element, rewriting the `id` attribute where it stands.
    pub(crate) fn set_id(&mut self, id: String) {
        match self.attributes.iter_mut().find(|a| a.name == "id") {
            Some(attr) => attr.value = id.clone(),
            None => self.attributes.push(Attribute::new("id", id.clone())),
        }
        self.id = id;
    }
}

#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Option<Element>>,
    root: NodeId,
}

impl XmlTree {
    pub fn new(mut root: Element) -> Self {
        root.parent = None;
        root.children.clear();
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
        }
    }

    /// `<root id="root">`, plus `log="true"` when requested.
    pub fn default_document(with_log: bool) -> Self {
        let mut root = Element::new("root", "root");
        if with_log {
            root = root.with_attribute("log", "true");
        }
        Self::new(root)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &Element {
        &self[self.root]
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// Iterates over the children of `id` in document order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Element> + '_ {
        self[id].children.iter().map(move |&child| &self[child])
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, mut element: Element) -> NodeId {
        element.parent = Some(parent);
        element.children.clear();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(element));
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Splices `element` in front of `target` among its siblings.
    /// Returns `None` when `target` has no parent.
    pub(crate) fn insert_before(&mut self, target: NodeId, mut element: Element) -> Option<NodeId> {
        let parent = self.get(target)?.parent?;
        element.parent = Some(parent);
        element.children.clear();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(element));
        let siblings = &mut self.get_mut(parent)?.children;
        let pos = siblings.iter().position(|&c| c == target)?;
        siblings.insert(pos, id);
        Some(id)
    }

    /// Detaches `id` from its parent and frees its subtree. Returns the
    /// element ids that were removed.
    pub(crate) fn remove(&mut self, id: NodeId) -> Vec<String> {
        if let Some(parent) = self.get(id).and_then(|e| e.parent)
            && let Some(p) = self.get_mut(parent)
        {
            p.children.retain(|&c| c != id);
        }
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(element) = self.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(element.children.iter().copied());
                removed.push(element.id);
            }
        }
        removed
    }

    /// All live nodes in document order (pre-order from the root).
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(element) = self.get(id) {
                order.push(id);
                stack.extend(element.children.iter().rev().copied());
            }
        }
        order
    }

    /// Element id to node handle for every node reachable from the root.
    pub fn build_index(&self) -> HashMap<String, NodeId> {
        self.descendants()
            .into_iter()
            .map(|id| (self[id].id.clone(), id))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deep copy into a fresh arena with no empty slots. Parent handles are
    /// rebuilt from the child lists.
    pub fn compact(&self) -> XmlTree {
        let mut out = XmlTree::new(self.root().clone());
        let mut stack = vec![(self.root, out.root)];
        while let Some((src, dst)) = stack.pop() {
            for &child in &self[src].children {
                let copied = out.append_child(dst, self[child].clone());
                stack.push((child, copied));
            }
        }
        out
    }

    fn same_subtree(&self, a: NodeId, other: &XmlTree, b: NodeId) -> bool {
        let (x, y) = (&self[a], &other[b]);
        x.tag == y.tag
            && x.id == y.id
            && x.attributes == y.attributes
            && x.text == y.text
            && x.children.len() == y.children.len()
            && x
                .children
                .iter()
                .zip(&y.children)
                .all(|(&ca, &cb)| self.same_subtree(ca, other, cb))
    }
}

impl Index<NodeId> for XmlTree {
    type Output = Element;

    /// Panics if `id` refers to a removed node.
    fn index(&self, id: NodeId) -> &Element {
        match self.get(id) {
            Some(element) => element,
            None => panic!("stale xml node handle {id:?}"),
        }
    }
}

/// Structural equality: same tags, ids, attributes, text and child order,
/// regardless of arena layout.
impl PartialEq for XmlTree {
    fn eq(&self, other: &Self) -> bool {
        self.same_subtree(self.root, other, other.root)
    }
}
