//! Streaming binary transfers and the cross-kind fetch, client side.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use common::prelude::{
    BinaryMetadata, CancelSignal, Cancelled, DownloadChunk, FanIn, RecordId, SecretKind,
    SecretRecord, UploadChunk, UploadMetadata, ValidationError,
};
use common::secret::validate_new;
use common::transfer::{decode_stream, encode, read_chunk, CHUNK_SIZE};

use super::client::check_status;
use super::{ApiClient, ApiError};
use crate::http_server::api::v0::binaries::{download_path, UploadResponse, UPLOAD_PATH};
use crate::http_server::api::v0::secrets::ListKindRequest;

/// What a finished download wrote and what the server said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub path: PathBuf,
    pub filename: Option<String>,
    pub declared_size: Option<u64>,
    pub bytes: u64,
    pub chunks: u64,
}

impl ApiClient {
    /// Stream a local file to the server as a new binary secret.
    pub async fn upload_file(
        &self,
        path: &Path,
        name: &str,
        notes: &str,
        cancel: CancelSignal,
    ) -> Result<RecordId, ApiError> {
        let file = File::open(path).await?;
        let size = file.metadata().await?.len();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ValidationError::malformed("filename", "path has no usable file name"))?
            .to_string();

        let metadata = UploadMetadata {
            name: name.to_string(),
            binary: BinaryMetadata {
                filename,
                size,
                notes: notes.to_string(),
            },
        };
        validate_new(&metadata.name, &metadata.binary)?;

        let url = self.remote.join(UPLOAD_PATH)?;
        let body = reqwest::Body::wrap_stream(upload_frames(file, metadata, cancel.clone()));
        let sent = self
            .http_client()
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await;

        let response = match sent {
            Ok(response) if response.status().is_success() => response,
            _ if cancel.is_cancelled() => return Err(Cancelled.into()),
            Ok(response) => response,
            Err(e) => return Err(e.into()),
        };
        let response = check_status(response).await?;
        Ok(response.json::<UploadResponse>().await?.id)
    }

    /// Fetch a binary's content into `dest`. The file only appears once the
    /// stream has ended cleanly.
    pub async fn download_file(
        &self,
        id: RecordId,
        dest: &Path,
        cancel: CancelSignal,
    ) -> Result<DownloadSummary, ApiError> {
        let url = self.remote.join(&download_path(id))?;
        let response = check_status(self.http_client().get(url).send().await?).await?;

        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let (file, temp_path) = tempfile::NamedTempFile::new_in(parent)?.into_parts();
        let mut out = File::from_std(file);

        let mut summary = DownloadSummary {
            path: dest.to_path_buf(),
            filename: None,
            declared_size: None,
            bytes: 0,
            chunks: 0,
        };

        let frames = decode_stream::<DownloadChunk, _, _>(Box::pin(response.bytes_stream()));
        let mut frames = std::pin::pin!(frames);
        while let Some(chunk) = frames.next().await {
            cancel.check()?;
            let chunk = chunk?;
            if summary.filename.is_none() {
                summary.filename = Some(chunk.filename.clone());
                summary.declared_size = Some(chunk.total_size);
            }
            out.write_all(&chunk.data).await?;
            summary.bytes += chunk.data.len() as u64;
            summary.chunks += 1;
        }

        out.flush().await?;
        out.sync_all().await?;
        drop(out);
        temp_path.persist(dest).map_err(|e| ApiError::Io(e.error))?;

        if let Some(declared) = summary.declared_size {
            if declared != summary.bytes {
                tracing::warn!(%id, declared, received = summary.bytes, "download size differs from metadata");
            }
        }
        Ok(summary)
    }

    /// Every record across all kinds, one concurrent request per kind. A
    /// kind whose request fails is logged and skipped.
    pub async fn fetch_all(&self, cancel: CancelSignal) -> Result<Vec<SecretRecord>, ApiError> {
        let mut group = FanIn::default();
        for kind in SecretKind::ALL {
            let client = self.clone();
            group.spawn(kind, async move {
                client
                    .call(ListKindRequest { kind })
                    .await
                    .map(|r| r.secrets)
            });
        }
        Ok(group.collect(cancel).await?)
    }
}

/// Encoded upload frames. The first frame always carries the metadata,
/// even for an empty file.
fn upload_frames(
    file: File,
    metadata: UploadMetadata,
    cancel: CancelSignal,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    futures::stream::try_unfold(
        (file, Some(metadata), 0u64, false),
        move |(mut file, metadata, index, done)| {
            let cancel = cancel.clone();
            async move {
                if done {
                    return Ok(None);
                }
                cancel.check().map_err(io::Error::other)?;

                let data = read_chunk(&mut file).await?;
                if data.is_empty() && index > 0 {
                    return Ok(None);
                }
                let last = data.len() < CHUNK_SIZE;

                let frame = encode(UploadChunk {
                    index,
                    metadata,
                    data,
                })
                .map_err(io::Error::other)?;
                Ok(Some((frame, (file, None, index + 1, last))))
            }
        },
    )
}
