//! Directory listings drawn with the same connectors as the XML tree view.

use crate::error::{Error, Result};
use std::fs::{self, DirEntry};
use std::path::Path;

/// Renders the entries below `dir`, directories first, each group sorted
/// case-insensitively. An empty directory renders as an empty string.
/// Subdirectories that cannot be read get an `<error: ...>` line instead of
/// failing the whole listing.
pub fn render(dir: &Path) -> Result<String> {
    let meta = fs::metadata(dir).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(format!("directory {}", dir.display())),
        _ => Error::Io(err),
    })?;
    if !meta.is_dir() {
        return Err(Error::BadTarget(dir.to_path_buf()));
    }

    let entries = read_sorted(dir)?;
    let mut lines = Vec::new();
    let count = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        draw(entry, "", i + 1 == count, &mut lines);
    }
    Ok(lines.join("\n"))
}

fn draw(entry: &DirEntry, prefix: &str, last: bool, lines: &mut Vec<String>) {
    let (connector, extension) = if last {
        ("└── ", "    ")
    } else {
        ("├── ", "│   ")
    };
    lines.push(format!(
        "{prefix}{connector}{}",
        entry.file_name().to_string_lossy()
    ));
    if !is_dir(entry) {
        return;
    }
    let next = format!("{prefix}{extension}");
    match read_sorted(&entry.path()) {
        Ok(children) => {
            let count = children.len();
            for (i, child) in children.iter().enumerate() {
                draw(child, &next, i + 1 == count, lines);
            }
        }
        Err(err) => lines.push(format!("{next}├── <error: {err}>")),
    }
}

fn read_sorted(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_cached_key(|e| {
        (
            !is_dir(e),
            e.file_name().to_string_lossy().to_lowercase(),
        )
    });
    Ok(entries)
}

fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_ok_and(|t| t.is_dir())
}
