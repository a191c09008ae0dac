use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("corpus root {0} is missing or not a directory")]
    CorpusRoot(PathBuf),
    #[error("cannot read corpus entry {path}: {source}")]
    CorpusRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed document {path}: {reason}")]
    DocumentParse { path: PathBuf, reason: String },
    #[error("no index at {dir}: missing {artifact}")]
    IndexNotFound { dir: PathBuf, artifact: &'static str },
    #[error("corrupt index: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("bincode: {0}")]
    Encode(#[from] bincode::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl IndexError {
    /// Errors scoped to a single corpus input. The builder skips these.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IndexError::CorpusRead { .. } | IndexError::DocumentParse { .. })
    }
}
