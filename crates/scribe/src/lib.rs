#![doc = include_str!("../README.md")]

pub mod buffer;
pub mod dir_tree;
pub mod error;
pub mod events;
pub mod history;
pub mod logging;
pub mod paths;
pub mod spell;
pub mod state;
pub mod stats;
pub mod text;
pub mod workspace;
pub mod xml;

pub use buffer::{Buffer, BufferKind};
pub use error::{Error, Result};
pub use events::{Event, EventBus, EventKind, Listener};
pub use history::{EditRecord, History};
pub use logging::Logger;
pub use paths::{PathResolver, log_file_path};
pub use spell::{SpellService, TextIssue, XmlIssue};
pub use state::{EditorState, StateKeeper, WorkspaceState};
pub use stats::{Clock, ManualClock, SystemClock, Tracker, format_duration};
pub use text::TextBuffer;
pub use workspace::{BufferInfo, SaveDecider, Workspace};
pub use xml::{Attribute, Element, NodeId, TextNode, XmlBuffer, XmlTree};
