//! NDJSON dataset export used as the document store.
//!
//! One JSON document per line. Commits rewrite the whole file through a
//! sibling temp file and a rename, so readers never observe a partial write.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{DocumentStore, RepoError};
use crate::domain::documents::{DocumentPatch, RawDocument};

use super::error::InfraError;

#[derive(Debug)]
pub struct NdjsonDataset {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl NdjsonDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse every row.
    pub async fn load(&self) -> Result<Vec<RawDocument>, InfraError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        parse_ndjson(&self.path, &contents)
    }

    /// Replace the file contents with `documents`.
    pub async fn write_all(&self, documents: &[RawDocument]) -> Result<(), InfraError> {
        let mut buffer = String::new();
        for (index, document) in documents.iter().enumerate() {
            let line = serde_json::to_string(document)
                .map_err(|err| InfraError::dataset(&self.path, index + 1, err.to_string()))?;
            buffer.push_str(&line);
            buffer.push('\n');
        }

        let tmp_path = temp_path(&self.path);
        let written = match tokio::fs::write(&tmp_path, buffer).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &self.path).await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            // Never leave a partial temp file next to the dataset.
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn apply_patches(&self, patches: Vec<DocumentPatch>) -> Result<(), RepoError> {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.load().await.map_err(RepoError::from_persistence)?;

        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, document) in documents.iter().enumerate() {
            if let Some(id) = document.id() {
                positions.entry(id.to_string()).or_default().push(index);
            }
        }

        // Validate the whole batch before touching any document.
        if let Some(missing) = patches.iter().find(|patch| !positions.contains_key(&patch.id)) {
            return Err(RepoError::NotFound {
                id: missing.id.clone(),
            });
        }

        let count = patches.len();
        for patch in patches {
            let rev = Uuid::new_v4().to_string();
            for &index in positions.get(&patch.id).into_iter().flatten() {
                documents[index].apply_set(&patch.set);
                documents[index].set_rev(rev.clone());
            }
        }

        self.write_all(&documents)
            .await
            .map_err(RepoError::from_persistence)?;
        debug!(
            target = "inkpress::infra::dataset",
            path = %self.path.display(),
            patches = count,
            "dataset committed"
        );
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for NdjsonDataset {
    async fn documents_of_types(&self, types: &[String]) -> Result<Vec<RawDocument>, RepoError> {
        let documents = self.load().await.map_err(RepoError::from_persistence)?;
        Ok(documents
            .into_iter()
            .filter(|document| {
                document
                    .doc_type()
                    .is_some_and(|doc_type| types.iter().any(|ty| ty == doc_type))
            })
            .collect())
    }

    async fn commit(&self, patches: Vec<DocumentPatch>) -> Result<(), RepoError> {
        if patches.is_empty() {
            return Ok(());
        }
        self.apply_patches(patches).await
    }
}

/// Parse NDJSON text, skipping blank lines. Errors carry the 1-based line number.
pub fn parse_ndjson(path: &Path, contents: &str) -> Result<Vec<RawDocument>, InfraError> {
    let mut documents = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_number = index + 1;
        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|err| InfraError::dataset(path, line_number, err.to_string()))?;
        let document = RawDocument::from_value(value)
            .map_err(|err| InfraError::dataset(path, line_number, err.to_string()))?;
        documents.push(document);
    }
    Ok(documents)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
