use std::io;

use futures::Stream;
use tokio::fs::File;

use common::prelude::{DownloadChunk, Owner, RecordId};
use common::transfer::read_chunk;

use crate::blobs::BlobStoreError;
use crate::error::VaultError;
use crate::store::SecretStore;

/// A download whose ownership check has already passed.
#[derive(Debug)]
pub struct BlobDownload {
    pub id: RecordId,
    pub filename: String,
    pub total_size: u64,
    file: File,
}

/// Look the record up before anything is streamed, so a missing or
/// foreign id fails without sending a single chunk.
pub async fn open_download(
    store: &SecretStore,
    owner: &Owner,
    id: RecordId,
) -> Result<BlobDownload, VaultError> {
    let record = store.binaries().get(owner, id).await?;
    let file = store.blobs().open_blob(id).await.map_err(|e| match e {
        BlobStoreError::NotFound(_) => {
            VaultError::internal(format!("binary record {} has no content", id))
        }
        other => other.into(),
    })?;

    Ok(BlobDownload {
        id,
        filename: record.data.filename,
        total_size: record.data.size,
        file,
    })
}

impl BlobDownload {
    /// Stream the content as full [`CHUNK_SIZE`] chunks (the last may be
    /// short). An empty blob yields no chunks.
    pub fn into_chunks(self) -> impl Stream<Item = Result<DownloadChunk, io::Error>> + Send {
        futures::stream::try_unfold((self, 0u64), |(mut download, index)| async move {
            let data = read_chunk(&mut download.file).await?;
            if data.is_empty() {
                tracing::debug!(id = %download.id, chunks = index, "download complete");
                return Ok(None);
            }

            let chunk = DownloadChunk {
                index,
                filename: download.filename.clone(),
                total_size: download.total_size,
                data,
            };
            Ok(Some((chunk, (download, index + 1))))
        })
    }
}
