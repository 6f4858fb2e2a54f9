//! The `.editor_workspace` file that carries open buffers across sessions.

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const STATE_FILE: &str = ".editor_workspace";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub modified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub editors: Vec<EditorState>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logging: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads and writes the workspace state file under a base directory.
#[derive(Debug, Clone)]
pub struct StateKeeper {
    path: PathBuf,
}

impl StateKeeper {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            path: base_dir.join(STATE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the state file in one step: the JSON goes to a temp file in
    /// the same directory, which is then renamed over the old one.
    pub fn save(&self, state: &WorkspaceState) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, state)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// `None` when no state has been saved yet.
    pub fn load(&self) -> Result<Option<WorkspaceState>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&data)?))
    }
}
