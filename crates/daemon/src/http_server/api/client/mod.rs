//! HTTP client for the vault API. Each request type lives next to the
//! handler that serves it and implements [`ApiRequest`].

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

#[allow(clippy::module_inception)]
mod client;
mod error;
mod transfer;

pub use client::ApiClient;
pub use error::ApiError;
pub use transfer::DownloadSummary;

pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError>;
}
