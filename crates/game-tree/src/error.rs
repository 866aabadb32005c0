//! Error types for the move-tree model.
//!
//! Stale or foreign paths are not errors: lookups and edits report them as
//! `None`/`false` so the host can ignore them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Illegal move '{san}': {reason}")]
    IllegalMove { san: String, reason: String },

    #[error("Invalid starting position: {0}")]
    InvalidPosition(String),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GameError {
    pub(crate) fn illegal(san: &str, reason: impl ToString) -> Self {
        Self::IllegalMove {
            san: san.to_string(),
            reason: reason.to_string(),
        }
    }
}
