//! HTTP client utilities.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::providers::ProviderError;

/// Status and body of a completed GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal transport used by provider adapters
#[async_trait]
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    /// Issue a GET request and return the status code and body
    async fn get(&self, url: &str) -> Result<HttpResponse, ProviderError>;
}

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, ProviderError> {
        Self::from_config(&HttpConfig::default())
    }

    /// Create a client honoring the configured timeouts and user agent
    pub fn from_config(config: &HttpConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, ProviderError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .with_status(404)
            .with_body("missing")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .get(&format!("{}/ping", server.url()))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, "missing");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        let client = HttpClient::new().unwrap();
        let err = client.get("http://127.0.0.1:1/unreachable").await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
