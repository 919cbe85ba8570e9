pub mod cli;
pub mod config;
pub mod evaluate;
pub mod loader;
pub mod record;
pub mod report;
pub mod session;
pub mod strategy;

use std::path::PathBuf;

#[derive(Debug)]
pub enum EvalError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Decode {
        path: PathBuf,
        line: usize,
        message: String,
    },
    InvalidRecord(String),
    Strategy(String),
    Config(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::Io(e) => write!(f, "io: {e}"),
            EvalError::Json(e) => write!(f, "json: {e}"),
            EvalError::Decode { path, line, message } => {
                write!(f, "decode: {}:{line}: {message}", path.display())
            }
            EvalError::InvalidRecord(msg) => write!(f, "invalid record: {msg}"),
            EvalError::Strategy(msg) => write!(f, "strategy: {msg}"),
            EvalError::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<std::io::Error> for EvalError {
    fn from(e: std::io::Error) -> Self {
        EvalError::Io(e)
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(e: serde_json::Error) -> Self {
        EvalError::Json(e)
    }
}
