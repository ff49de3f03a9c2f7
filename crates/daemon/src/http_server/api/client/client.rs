use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use url::Url;

use super::error::ApiError;
use super::ApiRequest;
use crate::error::{ErrorBody, ErrorKind};

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        Self::build(remote, None)
    }

    /// Same remote, with every request carrying `Authorization: Bearer`.
    pub fn with_token(self, token: &str) -> Result<Self, ApiError> {
        Self::build(&self.remote, Some(token))
    }

    fn build(remote: &Url, token: Option<&str>) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            value.set_sensitive(true);
            default_headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = check_status(request_builder.send().await?).await?;
        Ok(response.json::<T::Response>().await?)
    }

    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }
}

/// Turn a non-success response into [`ApiError::Status`], recovering the
/// error kind from the status code and the message from the JSON body.
pub(crate) async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.error,
        Err(_) => text,
    };

    Err(ApiError::Status {
        status,
        kind: ErrorKind::from_status(status),
        message,
    })
}
