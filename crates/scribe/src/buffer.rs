use crate::error::Result;
use crate::text::TextBuffer;
use crate::xml::XmlBuffer;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Text,
    Xml,
}

impl BufferKind {
    /// `.xml` (any case) opens as XML, everything else as text.
    pub fn for_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("xml") => BufferKind::Xml,
            _ => BufferKind::Text,
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKind::Text => write!(f, "text"),
            BufferKind::Xml => write!(f, "xml"),
        }
    }
}

/// An open document. Commands that only make sense for one kind reach the
/// inner buffer through the `as_*` accessors.
#[derive(Debug, Clone)]
pub enum Buffer {
    Text(TextBuffer),
    Xml(XmlBuffer),
}

impl Buffer {
    pub fn kind(&self) -> BufferKind {
        match self {
            Buffer::Text(_) => BufferKind::Text,
            Buffer::Xml(_) => BufferKind::Xml,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Buffer::Text(b) => b.path(),
            Buffer::Xml(b) => b.path(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Buffer::Text(b) => b.name(),
            Buffer::Xml(b) => b.name(),
        }
    }

    pub fn is_modified(&self) -> bool {
        match self {
            Buffer::Text(b) => b.is_modified(),
            Buffer::Xml(b) => b.is_modified(),
        }
    }

    pub fn set_modified(&mut self, modified: bool) {
        match self {
            Buffer::Text(b) => b.set_modified(modified),
            Buffer::Xml(b) => b.set_modified(modified),
        }
    }

    /// The bytes `save` writes to disk.
    pub fn content(&self) -> String {
        match self {
            Buffer::Text(b) => b.content(),
            Buffer::Xml(b) => b.content(),
        }
    }

    pub fn undo(&mut self) -> Result<()> {
        match self {
            Buffer::Text(b) => b.undo(),
            Buffer::Xml(b) => b.undo(),
        }
    }

    pub fn redo(&mut self) -> Result<()> {
        match self {
            Buffer::Text(b) => b.redo(),
            Buffer::Xml(b) => b.redo(),
        }
    }

    /// Whether the document asks for command logging: a text buffer whose
    /// first line is `# log`, or an XML root with `log="true"`.
    pub fn wants_log(&self) -> bool {
        match self {
            Buffer::Text(b) => b.lines().first().is_some_and(|l| l.trim() == "# log"),
            Buffer::Xml(b) => b.wants_log(),
        }
    }

    pub fn as_text(&self) -> Option<&TextBuffer> {
        match self {
            Buffer::Text(b) => Some(b),
            Buffer::Xml(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextBuffer> {
        match self {
            Buffer::Text(b) => Some(b),
            Buffer::Xml(_) => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlBuffer> {
        match self {
            Buffer::Xml(b) => Some(b),
            Buffer::Text(_) => None,
        }
    }

    pub fn as_xml_mut(&mut self) -> Option<&mut XmlBuffer> {
        match self {
            Buffer::Xml(b) => Some(b),
            Buffer::Text(_) => None,
        }
    }
}

impl From<TextBuffer> for Buffer {
    fn from(buffer: TextBuffer) -> Self {
        Buffer::Text(buffer)
    }
}

impl From<XmlBuffer> for Buffer {
    fn from(buffer: XmlBuffer) -> Self {
        Buffer::Xml(buffer)
    }
}
