//! Server side of the chunked blob transfer protocol.

mod download;
mod upload;

pub use download::{open_download, BlobDownload};
pub use upload::receive_upload;
