//! Errors raised while constructing or parsing core types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid block hash: {0}")]
    InvalidHash(String),

    #[error("invalid node id: {0}")]
    InvalidNodeId(String),
}
