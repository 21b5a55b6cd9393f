use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScreenError>;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("argument error: {0}")]
    Argument(String),

    #[error("cannot open {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("truncated record: {0}")]
    TruncatedRecord(String),

    #[error("collection layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error("record format error: {0}")]
    RecordFormat(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScreenError {
    pub(crate) fn file_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScreenError::FileOpen { path: path.into(), source }
    }
}
