//! Destinations for rendered graphs

use crate::errors::{GraphError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Sink that persists one rendered artifact per file name
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Make sure the destination exists before the first write
    async fn prepare(&self) -> Result<()>;

    /// Write an artifact and return where it ended up
    async fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf>;
}

/// Writes artifacts into a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    output_dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    async fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, contents).await.map_err(|e| {
            GraphError::Storage(format!("failed to write {}: {}", path.display(), e))
        })?;
        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(path)
    }
}

/// Keeps artifacts in memory; useful for previews and tests
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<BTreeMap<String, String>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, file_name: &str) -> Option<String> {
        self.artifacts.read().await.get(file_name).cloned()
    }

    pub async fn file_names(&self) -> Vec<String> {
        self.artifacts.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    async fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        self.artifacts
            .write()
            .await
            .insert(file_name.to_string(), contents.to_string());
        Ok(PathBuf::from(file_name))
    }
}
