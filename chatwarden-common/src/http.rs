//! HTTP client abstraction shared by the feed transport, the browser driver and
//! the classifier provider.
//!
//! Every outbound call in the workspace goes through [`HttpClient`], so tests can
//! swap in canned responses without a network. The default implementation wraps
//! reqwest. Non-2xx statuses are returned as data, not errors; callers decide what
//! a 403 or a 503 means for them.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest;

use crate::Error;

/// Status plus raw body of a completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A generic trait for making HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<HttpResponse, Error>;
    async fn post_json(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, Error>;
    async fn delete(&self, url: &str) -> Result<HttpResponse, Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Default for DefaultHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<HttpResponse, Error> {
        let mut request = self.client.get(url);
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn post_json(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, Error> {
        let mut request = self.client.post(url).json(body);
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn delete(&self, url: &str) -> Result<HttpResponse, Error> {
        let response = self.client.delete(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
