// src/utils/http.rs

//! HTTP client utilities.
//!
//! Provider adapters reach the network through [`HttpFetch`], which keeps
//! request building and response interpretation testable without a live
//! upstream.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Status code and raw body of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Minimal GET transport used by the provider adapters.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Issue a GET request. Non-2xx statuses are returned, not raised.
    async fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// [`HttpFetch`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a fetcher with a client configured from `config`.
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?))
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        // Transport failures carry the upstream host for the adapter logs.
        let host = url.host_str().unwrap_or_default();
        let response = request
            .send()
            .await
            .map_err(|e| AppError::provider(host, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::provider(host, e))?;
        Ok(HttpResponse { status, body })
    }
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
