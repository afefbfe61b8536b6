use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    OutOfRange,
    FailedPrecondition,
    DataLoss,
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorCode::DataLoss => "DATA_LOSS",
            ErrorCode::Internal => "INTERNAL",
        };
        write!(f, "{}", s)
    }
}

pub trait ProtgraphError: std::error::Error {
    fn error_code(&self) -> ErrorCode;
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("graph not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("format error: {0}")]
    Format(String),
    #[error("empty graph: {0} requires at least one element")]
    EmptyGraph(&'static str),
    #[error("invalid one-hot encoding at node {node}: {reason}")]
    InvalidEncoding { node: usize, reason: String },
    #[error("index {index} out of range for corpus of {len} graphs")]
    Index { index: usize, len: usize },
    #[error("invalid feature layout: {0}")]
    Layout(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export error: {0}")]
    Export(String),
}

impl GraphError {
    pub fn format(msg: impl Into<String>) -> Self {
        GraphError::Format(msg.into())
    }
}

impl ProtgraphError for GraphError {
    fn error_code(&self) -> ErrorCode {
        match self {
            GraphError::NotFound(_) => ErrorCode::NotFound,
            GraphError::Format(_) => ErrorCode::DataLoss,
            GraphError::EmptyGraph(_) => ErrorCode::FailedPrecondition,
            GraphError::InvalidEncoding { .. } => ErrorCode::DataLoss,
            GraphError::Index { .. } => ErrorCode::OutOfRange,
            GraphError::Layout(_) => ErrorCode::InvalidArgument,
            GraphError::Io(_) => ErrorCode::Internal,
            GraphError::Export(_) => ErrorCode::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
