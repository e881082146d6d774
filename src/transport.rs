use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::error::{Result, TryOnError};

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    /// Build a reply from a status code and raw body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// The HTTP seam between provider adapters and the network.
///
/// Non-success statuses are returned as replies, not errors, so callers can
/// surface the provider's body verbatim. Only connection-level failures are
/// errors.
pub trait Transport: Send + Sync {
    /// POST a JSON body, authenticated with `api_key`.
    fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &Value,
    ) -> impl Future<Output = Result<HttpReply>> + Send;

    /// GET a URL, authenticated with `api_key`.
    fn get(&self, url: &str, api_key: &str) -> impl Future<Output = Result<HttpReply>> + Send;
}

fn auth_header(api_key: &str) -> String {
    format!("Key {}", api_key)
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport applying `timeout` to every request.
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            timeout,
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    async fn read(resp: reqwest::Response) -> Result<HttpReply> {
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| TryOnError::Network {
            context: "Failed to read provider response body".into(),
            source: e,
        })?;
        Ok(HttpReply { status, body })
    }
}

impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, api_key: &str, body: &Value) -> Result<HttpReply> {
        let resp = self
            .http
            .post(url)
            .timeout(self.timeout)
            .header(reqwest::header::AUTHORIZATION, auth_header(api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| TryOnError::Network {
                context: format!("Cannot reach provider at {}", url),
                source: e,
            })?;
        Self::read(resp).await
    }

    async fn get(&self, url: &str, api_key: &str) -> Result<HttpReply> {
        let resp = self
            .http
            .get(url)
            .timeout(self.timeout)
            .header(reqwest::header::AUTHORIZATION, auth_header(api_key))
            .send()
            .await
            .map_err(|e| TryOnError::Network {
                context: format!("Cannot reach provider at {}", url),
                source: e,
            })?;
        Self::read(resp).await
    }
}
