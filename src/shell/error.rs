use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: unterminated {0} quote")]
    UnterminatedQuote(&'static str),
    #[error("syntax error: missing command before `{0}`")]
    MissingCommand(String),
    #[error("syntax error: missing file name after `{0}`")]
    MissingRedirectTarget(String),
    #[error("{path}: {source}")]
    Redirection { path: String, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ShellResult<T> = Result<T, ShellError>;
