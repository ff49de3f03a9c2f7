//! ID-keyed blob storage on the local filesystem.
//!
//! ```text
//! <root>/
//!   data/<record id>   finalized content
//!   staging/.tmpXXXX   in-flight uploads
//! ```
//!
//! A blob's path is derived only from its record id. Staged files are
//! deleted when dropped, so an aborted upload leaves nothing behind.
//! Staging and data share a filesystem, which makes [`SyncedBlob::persist`]
//! a single atomic rename.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use common::prelude::RecordId;

const DATA_DIR: &str = "data";
pub(crate) const STAGING_DIR: &str = "staging";

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to move staged blob into place: {0}")]
    Persist(#[from] tempfile::PathPersistError),

    #[error("blob not found: {0}")]
    NotFound(RecordId),

    #[error("blocking blob task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    data: PathBuf,
    staging: PathBuf,
}

impl BlobStore {
    pub async fn open(root: &Path) -> Result<Self, BlobStoreError> {
        let data = root.join(DATA_DIR);
        let staging = root.join(STAGING_DIR);
        tokio::fs::create_dir_all(&data).await?;
        tokio::fs::create_dir_all(&staging).await?;

        tracing::info!(path = %root.display(), "blob store ready");
        Ok(Self { data, staging })
    }

    pub fn path_for(&self, id: RecordId) -> PathBuf {
        self.data.join(id.to_string())
    }

    /// Start a private staging file for one upload.
    pub async fn stage(&self) -> Result<StagedBlob, BlobStoreError> {
        let staging = self.staging.clone();
        let temp =
            tokio::task::spawn_blocking(move || tempfile::NamedTempFile::new_in(staging)).await??;
        let (file, path) = temp.into_parts();
        Ok(StagedBlob {
            file: File::from_std(file),
            path,
            written: 0,
        })
    }

    pub async fn open_blob(&self, id: RecordId) -> Result<File, BlobStoreError> {
        match File::open(self.path_for(id)).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BlobStoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove finalized content. Already-absent content counts as removed.
    pub async fn remove(&self, id: RecordId) -> Result<(), BlobStoreError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(%id, "blob already absent on remove");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// An upload in progress.
pub struct StagedBlob {
    file: File,
    path: TempPath,
    written: u64,
}

impl StagedBlob {
    pub async fn write(&mut self, data: &[u8]) -> Result<(), BlobStoreError> {
        self.file.write_all(data).await?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Flush and fsync. The result can only be moved into place, not
    /// written further.
    pub async fn finish(mut self) -> Result<SyncedBlob, BlobStoreError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(SyncedBlob {
            path: self.path,
            size: self.written,
        })
    }
}

/// Fully written, durable, not yet visible.
pub struct SyncedBlob {
    path: TempPath,
    size: u64,
}

impl SyncedBlob {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn persist(self, store: &BlobStore, id: RecordId) -> Result<(), BlobStoreError> {
        let dest = store.path_for(id);
        let data = store.data.clone();
        let path = self.path;
        tokio::task::spawn_blocking(move || -> Result<(), BlobStoreError> {
            path.persist(&dest)?;
            // make the rename itself durable
            std::fs::File::open(&data)?.sync_all()?;
            Ok(())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged_files(root: &Path) -> usize {
        std::fs::read_dir(root.join(STAGING_DIR)).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::open(dir.path()).await.unwrap();
        let id = RecordId::new(42);

        let mut staged = store.stage().await.unwrap();
        staged.write(b"hello ").await.unwrap();
        staged.write(b"world").await.unwrap();

        let synced = staged.finish().await.unwrap();
        assert_eq!(synced.size(), 11);
        synced.persist(&store, id).await.unwrap();

        assert_eq!(std::fs::read(store.path_for(id)).unwrap(), b"hello world");
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_dropped_stage_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::open(dir.path()).await.unwrap();

        let mut staged = store.stage().await.unwrap();
        staged.write(b"partial").await.unwrap();
        assert_eq!(staged_files(dir.path()), 1);

        drop(staged);
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_open_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::open(dir.path()).await.unwrap();
        let id = RecordId::new(1);

        assert!(matches!(
            store.open_blob(id).await,
            Err(BlobStoreError::NotFound(_))
        ));

        std::fs::write(store.path_for(id), b"x").unwrap();
        assert!(store.open_blob(id).await.is_ok());

        store.remove(id).await.unwrap();
        assert!(!store.path_for(id).exists());
        // idempotent
        store.remove(id).await.unwrap();
    }
}
