use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use viewer_wire::{ApplyFilterRequest, ApplyFilterResponse, JobStatus, StartRequest, StartResponse};

use crate::error::ApiError;
use crate::loader::ImageRequest;

/// The four endpoints of the processing server.
pub trait ViewerApi: Clone + Send + Sync + 'static {
    fn status(&self) -> impl Future<Output = Result<JobStatus, ApiError>> + Send;

    fn fetch_image(
        &self,
        request: ImageRequest,
    ) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;

    fn start(
        &self,
        request: StartRequest,
    ) -> impl Future<Output = Result<StartResponse, ApiError>> + Send;

    fn apply_filter(
        &self,
        request: ApplyFilterRequest,
    ) -> impl Future<Output = Result<ApplyFilterResponse, ApiError>> + Send;
}

#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    /// `base` must end in `/`; see `Configuration::server_url`.
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Url {
        // only fixed relative paths are joined, which cannot fail against an http(s) base
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }
}

impl ViewerApi for HttpApi {
    #[instrument(skip(self), level = "debug")]
    async fn status(&self) -> Result<JobStatus, ApiError> {
        let response = self.client.get(self.endpoint("status")).send().await?;
        decode_json("status", response, false).await
    }

    #[instrument(skip(self), fields(identifier = %request.identifier), level = "debug")]
    async fn fetch_image(&self, request: ImageRequest) -> Result<Vec<u8>, ApiError> {
        let token = request.token.to_string();
        let response = self
            .client
            .get(self.endpoint("image"))
            .query(&[("f", request.identifier.as_str()), ("t", token.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "image fetched");
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self), fields(raw_path = %request.raw_path), level = "debug")]
    async fn start(&self, request: StartRequest) -> Result<StartResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint("start"))
            .json(&request)
            .send()
            .await?;
        decode_json("start", response, true).await
    }

    #[instrument(skip(self), fields(image = %request.image_fname), level = "debug")]
    async fn apply_filter(
        &self,
        request: ApplyFilterRequest,
    ) -> Result<ApplyFilterResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint("apply_filter"))
            .json(&request)
            .send()
            .await?;
        decode_json("apply_filter", response, true).await
    }
}

/// With `json_errors`, a non-success status whose body still parses is handed
/// back as the response so its `error` field reaches the user.
async fn decode_json<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
    json_errors: bool,
) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source });
    }
    if json_errors {
        if let Ok(parsed) = serde_json::from_str(&body) {
            debug!(endpoint, status = status.as_u16(), "server answered with an error payload");
            return Ok(parsed);
        }
    }
    Err(ApiError::Http {
        status: status.as_u16(),
        body,
    })
}
