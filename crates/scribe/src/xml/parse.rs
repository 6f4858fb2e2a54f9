//! Parses XML documents into an [`XmlTree`].
//!
//! Only the structural subset the editor supports is accepted: a single
//! root, an `id` attribute on every element, unique ids and no mixed
//! content. Comments, processing instructions and the declaration are
//! dropped.

use super::tree::{Attribute, Element, NodeId, XmlTree};
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashSet;

pub fn parse(content: &str) -> Result<XmlTree> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut tree: Option<XmlTree> = None;
    let mut stack: Vec<NodeId> = Vec::new();
    let mut ids = HashSet::new();

    loop {
        let event = reader.read_event().map_err(parse_error)?;
        match event {
            Event::Start(start) => {
                let id = open_element(&mut tree, &stack, &mut ids, &start)?;
                stack.push(id);
            }
            Event::Empty(start) => {
                open_element(&mut tree, &stack, &mut ids, &start)?;
            }
            Event::End(_) => {
                if stack.pop().is_none() {
                    return Err(Error::Parse("unexpected closing tag".to_string()));
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(parse_error)?;
                add_text(&mut tree, &stack, &text)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                add_text(&mut tree, &stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(&open) = stack.last()
        && let Some(tree) = &tree
    {
        return Err(Error::Parse(format!("unclosed element: {}", tree[open].tag())));
    }
    tree.ok_or_else(|| Error::Parse("no root element found".to_string()))
}

fn open_element(
    tree: &mut Option<XmlTree>,
    stack: &[NodeId],
    ids: &mut HashSet<String>,
    start: &BytesStart<'_>,
) -> Result<NodeId> {
    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(parse_error)?
        .to_string();

    let mut attributes = Vec::new();
    let mut id = None;
    for attr in start.attributes() {
        let attr = attr.map_err(parse_error)?;
        let name = std::str::from_utf8(attr.key.as_ref())
            .map_err(parse_error)?
            .to_string();
        let value = attr.unescape_value().map_err(parse_error)?.into_owned();
        if name == "id" {
            id = Some(value.clone());
        }
        attributes.push(Attribute { name, value });
    }

    let id = match id {
        Some(id) if !id.is_empty() => id,
        _ => return Err(Error::Parse(format!("element is missing an id attribute: {tag}"))),
    };
    if !ids.insert(id.clone()) {
        return Err(Error::Parse(format!("duplicate element id: {id}")));
    }

    let element = Element::from_parts(tag, id, attributes);
    let Some(tree) = tree.as_mut() else {
        let created = XmlTree::new(element);
        let root = created.root_id();
        *tree = Some(created);
        return Ok(root);
    };
    match stack.last() {
        Some(&parent) => {
            if tree[parent].has_text() {
                return Err(Error::Parse(format!(
                    "mixed content in element {}: text followed by a child element",
                    tree[parent].id()
                )));
            }
            Ok(tree.append_child(parent, element))
        }
        None => Err(Error::Parse(format!(
            "multiple root elements: {}",
            element.tag()
        ))),
    }
}

fn add_text(tree: &mut Option<XmlTree>, stack: &[NodeId], raw: &str) -> Result<()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    let (Some(tree), Some(&current)) = (tree.as_mut(), stack.last()) else {
        return Ok(());
    };
    if !tree[current].children().is_empty() {
        return Err(Error::Parse(format!(
            "mixed content in element {}: text after a child element",
            tree[current].id()
        )));
    }
    if let Some(element) = tree.get_mut(current) {
        element.push_text(trimmed);
    }
    Ok(())
}

fn parse_error(err: impl std::fmt::Display) -> Error {
    Error::Parse(err.to_string())
}
