use thiserror::Error;

/// Why a single uploaded file could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("file is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("file is empty")]
    Empty,

    #[error("unsupported file type '{0}'")]
    Unsupported(String),

    #[error("malformed table at line {line}: {message}")]
    MalformedTable { line: usize, message: String },
}
