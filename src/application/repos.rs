//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::documents::{DocumentPatch, RawDocument};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("document `{id}` not found")]
    NotFound { id: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Source of dataset documents and sink for `set` patches.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document whose `_type` is one of `types`, in storage order.
    async fn documents_of_types(&self, types: &[String]) -> Result<Vec<RawDocument>, RepoError>;

    /// Apply all patches as one unit; nothing is written when any patch fails.
    async fn commit(&self, patches: Vec<DocumentPatch>) -> Result<(), RepoError>;
}
