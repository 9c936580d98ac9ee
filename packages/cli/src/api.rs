//! API Client
//!
//! HTTP client for communicating with the Berth server API.

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create from saved config
    pub fn from_config() -> Result<Self> {
        let config = Config::load()?;
        let base_url = config.api_url().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/api{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::unwrap_envelope(response).await
    }

    /// POST request
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}/api{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::unwrap_envelope(response).await
    }

    /// POST request without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.post(path, &serde_json::json!({})).await
    }

    /// DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/api{}", self.base_url, path);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let text = response.text().await?;

        let body: ApiResponse<T> = serde_json::from_str(&text)
            .with_context(|| format!("Unexpected response ({}): {}", status, text))?;

        if !body.success {
            if let Some(err) = body.error {
                bail!("[{}] {}", err.code, err.message);
            }
            bail!("API request failed with status {}", status);
        }

        body.data.context("Empty response from API")
    }
}
