//! Error types for the editor
//!
//! Structural errors travel as values up through the command layer; nothing
//! here is used for control flow inside a successful edit. Contract
//! violations (wrong-placement mutation, out-of-range index) panic in the
//! model crate instead and never surface as `EditError`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("no valid target position")]
    InvalidTarget,

    #[error("operation not allowed: {0}")]
    Disallowed(&'static str),

    #[error("element placement does not permit this operation")]
    WrongPlacement,

    #[error("undo out of sync: {0}")]
    UndoDesync(String),
}

pub type EditResult<T> = Result<T, EditError>;
