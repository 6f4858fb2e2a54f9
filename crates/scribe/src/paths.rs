use crate::error::{Error, Result};
use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolves user-supplied paths against the workspace base directory.
///
/// Every buffer is keyed by the path this resolver returns, so two inputs
/// that normalize to the same absolute path address the same buffer.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base_dir: PathBuf,
}

impl PathResolver {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        let base_dir = base_dir.into();
        let base_dir = absolutize(&base_dir).unwrap_or_else(|_| normalize(&base_dir));
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the absolute, lexically normalized form of `input`.
    ///
    /// Relative inputs are joined onto the base directory first. The file
    /// does not need to exist.
    pub fn resolve(&self, input: &str) -> Result<PathBuf> {
        if input.trim().is_empty() {
            return Err(Error::NotFound("path must not be empty".to_string()));
        }
        let input = Path::new(input);
        if input.is_absolute() {
            Ok(normalize(input))
        } else {
            Ok(normalize(&self.base_dir.join(input)))
        }
    }
}

/// Log file sibling for a source file: `/dir/name.ext` -> `/dir/.name.ext.log`.
pub fn log_file_path(source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!(".{name}.log"))
}

/// Absolute form of `path`, resolved against the process working directory.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    Ok(normalize(&env::current_dir()?.join(path)))
}

/// Removes `.` components and folds `..` into its parent without touching
/// the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
