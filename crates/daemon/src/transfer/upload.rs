use futures::{Stream, StreamExt};

use common::prelude::{CancelSignal, Owner, RecordId, UploadChunk};
use common::secret;
use common::transfer::TransferError;

use crate::error::VaultError;
use crate::store::SecretStore;

/// Consume an upload stream and create the binary record it describes.
///
/// Content is appended to a private staging file; only after end of stream
/// is it fsynced, the record inserted and the file renamed to its final,
/// id-keyed location, all before the insert commits. Any failure before
/// that point drops the staging file, and no record becomes visible.
pub async fn receive_upload<S>(
    store: &SecretStore,
    owner: Owner,
    frames: S,
    cancel: CancelSignal,
) -> Result<RecordId, VaultError>
where
    S: Stream<Item = Result<UploadChunk, TransferError>>,
{
    let mut frames = std::pin::pin!(frames);

    let first = match frames.next().await {
        Some(chunk) => chunk?,
        None => return Err(VaultError::invalid("upload stream carried no chunks")),
    };
    let Some(metadata) = first.metadata else {
        return Err(VaultError::invalid("first upload chunk must carry the record metadata"));
    };
    secret::validate_new(&metadata.name, &metadata.binary)?;

    let mut staged = store.blobs().stage().await?;
    staged.write(&first.data).await?;
    let mut chunks: u64 = 1;

    while let Some(chunk) = frames.next().await {
        cancel.check().map_err(TransferError::from)?;
        let chunk = chunk?;
        if chunk.metadata.is_some() {
            tracing::debug!(%owner, index = chunk.index, "ignoring metadata on a later chunk");
        }
        staged.write(&chunk.data).await?;
        chunks += 1;
    }
    cancel.check().map_err(TransferError::from)?;

    let synced = staged.finish().await?;
    let received = synced.size();
    if received != metadata.binary.size {
        tracing::warn!(
            %owner,
            declared = metadata.binary.size,
            received,
            "upload size differs from declared size"
        );
    }

    let mut tx = store.database().begin().await?;
    let id = store
        .binaries()
        .insert(&mut *tx, &owner, &metadata.name, &metadata.binary)
        .await?;
    synced.persist(store.blobs(), id).await?;

    if let Err(e) = tx.commit().await {
        if let Err(cleanup) = store.blobs().remove(id).await {
            tracing::error!(%owner, %id, error = %cleanup, "failed to discard blob after aborted commit");
        }
        return Err(e.into());
    }

    tracing::info!(%owner, %id, chunks, bytes = received, "upload complete");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use common::prelude::{BinaryMetadata, SecretKind, SecretRecord, UploadMetadata};

    use super::*;
    use crate::blobs::{BlobStore, STAGING_DIR};
    use crate::database::Database;
    use crate::error::ErrorKind;

    async fn setup() -> (SecretStore, Owner, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::in_memory().await.unwrap();
        let owner = db.insert_user("alice", "x").await.unwrap();
        let blobs = BlobStore::open(dir.path()).await.unwrap();
        (SecretStore::new(db, blobs), owner, dir)
    }

    fn chunk(index: u64, name: Option<&str>, data: &'static [u8]) -> UploadChunk {
        UploadChunk {
            index,
            metadata: name.map(|name| UploadMetadata {
                name: name.to_string(),
                binary: BinaryMetadata {
                    filename: format!("{}.bin", name),
                    size: 6,
                    notes: String::new(),
                },
            }),
            data: Bytes::from_static(data),
        }
    }

    fn staged_files(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path().join(STAGING_DIR))
            .unwrap()
            .count()
    }

    #[tokio::test]
    async fn test_metadata_on_later_chunk_is_ignored() {
        let (store, owner, _dir) = setup().await;
        let frames = futures::stream::iter(vec![
            Ok::<_, TransferError>(chunk(0, Some("first"), b"abc")),
            Ok(chunk(1, Some("second"), b"def")),
        ]);

        let id = receive_upload(&store, owner, frames, CancelSignal::never())
            .await
            .unwrap();

        let records = store.get_all(&owner, SecretKind::Binary).await.unwrap();
        assert_eq!(records.len(), 1);
        let SecretRecord::Binary(secret) = &records[0] else {
            panic!("expected a binary record");
        };
        assert_eq!(secret.name, "first");
        assert_eq!(secret.data.filename, "first.bin");
        assert_eq!(std::fs::read(store.blobs().path_for(id)).unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn test_aborted_stream_leaves_nothing_behind() {
        let (store, owner, dir) = setup().await;
        let frames = futures::stream::iter(vec![
            Ok(chunk(0, Some("partial"), b"abc")),
            Err(TransferError::Truncated),
        ]);

        let err = receive_upload(&store, owner, frames, CancelSignal::never())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(store
            .get_all(&owner, SecretKind::Binary)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(staged_files(&dir), 0);
    }

    #[tokio::test]
    async fn test_missing_first_metadata_is_invalid() {
        let (store, owner, dir) = setup().await;
        let frames = futures::stream::iter(vec![Ok::<_, TransferError>(chunk(0, None, b"abc"))]);

        let err = receive_upload(&store, owner, frames, CancelSignal::never())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert_eq!(staged_files(&dir), 0);
    }
}
