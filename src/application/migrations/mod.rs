//! Batch content migrations with a dry-run default.
//!
//! Each migration inspects documents of some types and proposes one `set`
//! patch per document it would change. The runner reports what it found and,
//! only when asked to apply, commits the patches in fixed-size chunks.

mod normalize_body;
mod sync_seo;

use std::fmt;

use metrics::counter;
use thiserror::Error;
use tracing::info;

use crate::application::repos::{DocumentStore, RepoError};
use crate::domain::documents::{DocumentPatch, RawDocument};

pub use normalize_body::NormalizeBodyMarkdown;
pub use sync_seo::SyncPostSeo;

pub const DEFAULT_CHUNK_SIZE: usize = 50;
/// Rows listed in a report; the counts always cover every change.
pub const REPORT_PREVIEW_LIMIT: usize = 20;

pub const METRIC_MIGRATION_CHECKED: &str = "inkpress_migration_checked_total";
pub const METRIC_MIGRATION_CHANGED: &str = "inkpress_migration_changed_total";
pub const METRIC_MIGRATION_COMMITTED: &str = "inkpress_migration_committed_total";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration `{migration}` failed: {source}")]
    Store {
        migration: &'static str,
        #[source]
        source: RepoError,
    },
    #[error("migration `{migration}` needs at least one document type")]
    NoTypes { migration: &'static str },
}

/// A batch rewrite over dataset documents.
pub trait Migration: Send + Sync {
    fn name(&self) -> &'static str;

    /// `_type`s the migration reads.
    fn document_types(&self) -> &[String];

    /// The patch for one document, or `None` when it is already up to date.
    fn plan(&self, document: &RawDocument) -> Option<DocumentPatch>;

    /// Extra `key=value` detail for the summary line.
    fn summary_detail(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    pub apply: bool,
    pub chunk_size: usize,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            apply: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl MigrationOptions {
    /// Chunk size clamped to at least one.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedDocument {
    pub id: String,
    pub doc_type: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub migration: &'static str,
    pub detail: Option<String>,
    pub checked: usize,
    pub changed: usize,
    pub committed: usize,
    pub applied: bool,
    pub preview: Vec<ChangedDocument>,
}

impl MigrationReport {
    /// Console lines in the order an operator reads them.
    pub fn lines(&self) -> Vec<String> {
        let tag = format!("[{}]", self.migration);
        let mut lines = Vec::new();

        let mut summary = format!("{tag} checked={} changed={}", self.checked, self.changed);
        if let Some(detail) = &self.detail {
            summary.push(' ');
            summary.push_str(detail);
        }
        lines.push(summary);

        if !self.preview.is_empty() {
            lines.push(format!(
                "{tag} changed docs (up to {REPORT_PREVIEW_LIMIT}):"
            ));
            for row in &self.preview {
                lines.push(format!("  - {} | {} | {}", row.id, row.doc_type, row.title));
            }
        }

        if self.applied {
            lines.push(format!("{tag} done. updated={}", self.committed));
        } else {
            lines.push(format!(
                "{tag} dry-run complete. Add --apply to patch documents."
            ));
        }
        lines
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// Plan every document, then commit in chunks when `options.apply` is set.
pub async fn run_migration(
    store: &dyn DocumentStore,
    migration: &dyn Migration,
    options: MigrationOptions,
) -> Result<MigrationReport, MigrationError> {
    let name = migration.name();
    let types = migration.document_types();
    if types.is_empty() {
        return Err(MigrationError::NoTypes { migration: name });
    }

    let documents = store
        .documents_of_types(types)
        .await
        .map_err(|source| MigrationError::Store {
            migration: name,
            source,
        })?;

    let mut preview = Vec::new();
    let mut patches = Vec::new();
    for document in &documents {
        let Some(patch) = migration.plan(document) else {
            continue;
        };
        if preview.len() < REPORT_PREVIEW_LIMIT {
            preview.push(ChangedDocument {
                id: patch.id.clone(),
                doc_type: document.doc_type().unwrap_or_default().to_string(),
                title: document.label().to_string(),
            });
        }
        patches.push(patch);
    }

    let checked = documents.len();
    let changed = patches.len();
    counter!(METRIC_MIGRATION_CHECKED, "migration" => name).increment(checked as u64);
    counter!(METRIC_MIGRATION_CHANGED, "migration" => name).increment(changed as u64);
    info!(
        target = "inkpress::application::migrations",
        migration = name,
        checked,
        changed,
        apply = options.apply,
        "migration planned"
    );

    let mut committed = 0;
    if options.apply {
        let chunk_size = options.effective_chunk_size();
        let mut remaining = patches.into_iter().peekable();
        while remaining.peek().is_some() {
            let chunk: Vec<DocumentPatch> = remaining.by_ref().take(chunk_size).collect();
            let size = chunk.len();
            store
                .commit(chunk)
                .await
                .map_err(|source| MigrationError::Store {
                    migration: name,
                    source,
                })?;
            committed += size;
            counter!(METRIC_MIGRATION_COMMITTED, "migration" => name).increment(size as u64);
            info!(
                target = "inkpress::application::migrations",
                migration = name,
                committed,
                total = changed,
                "committed {committed}/{changed}"
            );
        }
    }

    Ok(MigrationReport {
        migration: name,
        detail: migration.summary_detail(),
        checked,
        changed,
        committed,
        applied: options.apply,
        preview,
    })
}
