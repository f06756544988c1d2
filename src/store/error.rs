use thiserror::Error;

use crate::note::{NoteField, NoteId};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} cannot be empty")]
pub struct ValidationError {
    pub field: NoteField,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("note {0} not found")]
    NotFound(NoteId),
    #[error("saving notes failed: {0:#}")]
    Io(anyhow::Error),
}

