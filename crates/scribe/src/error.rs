use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("element id already exists: {0}")]
    DuplicateId(String),

    #[error("root element is protected: {0}")]
    RootProtected(&'static str),

    #[error("mixed content is not allowed: {0}")]
    MixedContent(String),

    #[error("edit position out of range: {0}")]
    EditRange(String),

    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("nothing to {0}")]
    HistoryEmpty(&'static str),

    #[error("cannot open a directory: {0}")]
    BadTarget(PathBuf),

    #[error("no active buffer")]
    NoActive,

    #[error("invalid element id: {0:?}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn not_open(path: &std::path::Path) -> Self {
        Error::NotFound(format!("buffer is not open: {}", path.display()))
    }
}
