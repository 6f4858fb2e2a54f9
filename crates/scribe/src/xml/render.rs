use super::tree::{Element, NodeId, XmlTree};
use quick_xml::escape::escape;
use std::fmt::Write;

pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const INDENT: &str = "    ";

/// `tag [name="value", ...]`, or just `tag` for an element without attributes.
pub fn label(element: &Element) -> String {
    if element.attributes().is_empty() {
        return element.tag().to_string();
    }
    let attrs: Vec<String> = element
        .attributes()
        .iter()
        .map(|a| format!("{}=\"{}\"", a.name, a.value))
        .collect();
    format!("{} [{}]", element.tag(), attrs.join(", "))
}

/// Box-drawing view of the tree. Element text is drawn as the last child.
pub fn tree_string(tree: &XmlTree) -> String {
    let mut lines = vec![label(tree.root())];
    draw_children(tree, tree.root_id(), "", &mut lines);
    lines.join("\n")
}

fn draw_children(tree: &XmlTree, id: NodeId, prefix: &str, lines: &mut Vec<String>) {
    let element = &tree[id];
    let has_text = element.has_text();
    let count = element.children().len();
    for (i, &child) in element.children().iter().enumerate() {
        let last = i + 1 == count && !has_text;
        let (connector, extension) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        lines.push(format!("{prefix}{connector}{}", label(&tree[child])));
        draw_children(tree, child, &format!("{prefix}{extension}"), lines);
    }
    if has_text {
        lines.push(format!("{prefix}└── \"{}\"", element.text()));
    }
}

/// Serializes the whole document, declaration first, one element per line.
pub fn serialize(tree: &XmlTree) -> String {
    let mut out = String::from(DECLARATION);
    out.push('\n');
    write_element(tree, tree.root_id(), 0, &mut out);
    out
}

fn write_element(tree: &XmlTree, id: NodeId, depth: usize, out: &mut String) {
    let element = &tree[id];
    let indent = INDENT.repeat(depth);
    let tag = element.tag();
    let mut attrs = String::new();
    for attr in element.attributes() {
        let _ = write!(attrs, " {}=\"{}\"", attr.name, escape(attr.value.as_str()));
    }

    if element.children().is_empty() {
        if element.has_text() {
            let text = escape(element.text());
            let _ = writeln!(out, "{indent}<{tag}{attrs}>{text}</{tag}>");
        } else {
            let _ = writeln!(out, "{indent}<{tag}{attrs}></{tag}>");
        }
        return;
    }

    let _ = writeln!(out, "{indent}<{tag}{attrs}>");
    for &child in element.children() {
        write_element(tree, child, depth + 1, out);
    }
    let _ = writeln!(out, "{indent}</{tag}>");
}
