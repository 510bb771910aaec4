use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("text generation unavailable: {0}")]
    GenerationUnavailable(String),
    #[error(
        "no retrieval breadth fits under {token_limit} tokens \
         (index size {index_size}, {attempts} attempt(s))"
    )]
    RetrievalUnsatisfiable {
        token_limit: usize,
        index_size: usize,
        attempts: usize,
    },
    #[error("flashcard file not recognised: {0}")]
    MalformedBankFile(String),
    #[error("could not process {path:?}: {reason}")]
    UnprocessableDocument { path: PathBuf, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}

pub type Result<T> = std::result::Result<T, MemoraError>;

impl MemoraError {
    pub fn unprocessable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::UnprocessableDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
