//! Chunked blob transfer.
//!
//! Blobs move as a sequence of frames carried inside one streamed body,
//! never as one buffered message. Every frame is
//!
//! ```text
//! u32 BE header_len | header (bincode) | u32 BE payload_len | payload
//! ```
//!
//! Payloads are at most [`CHUNK_SIZE`] bytes. Ordering comes from the
//! underlying stream; the `index` in each header is informational only.
//! There is no terminal frame: end of stream means the transfer is complete.

mod codec;

use std::io;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::secret::BinaryMetadata;

pub use codec::{decode_stream, encode, FrameDecoder};

/// Fixed chunk size for both directions.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Upper bound on an encoded frame header.
pub const MAX_HEADER_SIZE: usize = 16 * 1024;

/// Read the next chunk: exactly [`CHUNK_SIZE`] bytes unless the reader
/// hits end of file first. Empty means the reader is exhausted.
pub async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Bytes> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut filled = 0;
    while filled < CHUNK_SIZE {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(Bytes::from(buf))
}

/// Record metadata that rides on the first upload chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub name: String,
    pub binary: BinaryMetadata,
}

/// One client -> server chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadChunk {
    pub index: u64,
    /// Authoritative only on the first chunk; ignored afterwards.
    pub metadata: Option<UploadMetadata>,
    pub data: Bytes,
}

/// One server -> client chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadChunk {
    pub index: u64,
    pub filename: String,
    pub total_size: u64,
    pub data: Bytes,
}

/// A frame splits into a serializable header and a raw payload.
pub trait Frame: Sized {
    type Header: Serialize + DeserializeOwned;

    fn into_parts(self) -> (Self::Header, Bytes);

    fn from_parts(header: Self::Header, data: Bytes) -> Self;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadHeader {
    index: u64,
    metadata: Option<UploadMetadata>,
}

impl Frame for UploadChunk {
    type Header = UploadHeader;

    fn into_parts(self) -> (UploadHeader, Bytes) {
        (
            UploadHeader {
                index: self.index,
                metadata: self.metadata,
            },
            self.data,
        )
    }

    fn from_parts(header: UploadHeader, data: Bytes) -> Self {
        Self {
            index: header.index,
            metadata: header.metadata,
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadHeader {
    index: u64,
    filename: String,
    total_size: u64,
}

impl Frame for DownloadChunk {
    type Header = DownloadHeader;

    fn into_parts(self) -> (DownloadHeader, Bytes) {
        (
            DownloadHeader {
                index: self.index,
                filename: self.filename,
                total_size: self.total_size,
            },
            self.data,
        )
    }

    fn from_parts(header: DownloadHeader, data: Bytes) -> Self {
        Self {
            index: header.index,
            filename: header.filename,
            total_size: header.total_size,
            data,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("frame header could not be decoded: {0}")]
    Codec(#[from] bincode::Error),

    #[error("frame header of {0} bytes exceeds the limit")]
    HeaderTooLarge(usize),

    #[error("chunk of {0} bytes exceeds the {CHUNK_SIZE} byte limit")]
    ChunkTooLarge(usize),

    #[error("stream ended in the middle of a frame")]
    Truncated,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer was cancelled")]
    Cancelled(#[from] crate::cancel::Cancelled),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_chunk_fills_whole_chunks() {
        let data = vec![7u8; CHUNK_SIZE + 10];
        let mut reader = &data[..];

        assert_eq!(read_chunk(&mut reader).await.unwrap().len(), CHUNK_SIZE);
        assert_eq!(read_chunk(&mut reader).await.unwrap().len(), 10);
        assert!(read_chunk(&mut reader).await.unwrap().is_empty());
    }
}
