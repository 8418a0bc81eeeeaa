//! HTTP client helpers for tests.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use duet::gateway::{EmbedResponse, RerankResponse};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(25);

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

/// Status code, `x-duet-status`, `x-request-id` and JSON body of a response.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub duet_status: String,
    pub request_id: Option<String>,
    pub body: Value,
}

impl RawResponse {
    pub fn into_json<T: DeserializeOwned>(self) -> T {
        serde_json::from_value(self.body).expect("response body did not match the expected shape")
    }
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<RawResponse, TestClientError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::read(resp).await
    }

    pub async fn get(&self, path: &str) -> Result<RawResponse, TestClientError> {
        let resp = self.client.get(self.url(path)).send().await?;
        Self::read(resp).await
    }

    pub async fn embed(&self, body: Value) -> Result<EmbedResponse, TestClientError> {
        let resp = self.post("/embed", &body).await?;
        Self::expect_ok(resp)
    }

    pub async fn rerank(&self, body: Value) -> Result<RerankResponse, TestClientError> {
        let resp = self.post("/rerank", &body).await?;
        Self::expect_ok(resp)
    }

    /// Polls `/healthz` until it returns 200.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<(), TestClientError> {
        let start = std::time::Instant::now();
        loop {
            let resp = self.get("/healthz").await?;
            if resp.status == 200 {
                return Ok(());
            }
            if start.elapsed() > timeout {
                return Err(TestClientError::UnexpectedStatus(
                    resp.status,
                    resp.body.to_string(),
                ));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn read(resp: reqwest::Response) -> Result<RawResponse, TestClientError> {
        let status = resp.status().as_u16();
        let header = |name: &str| {
            resp.headers()
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        };
        let duet_status = header("x-duet-status").unwrap_or_else(|| "unknown".to_string());
        let request_id = header("x-request-id");
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(RawResponse {
            status,
            duet_status,
            request_id,
            body,
        })
    }

    fn expect_ok<T: DeserializeOwned>(resp: RawResponse) -> Result<T, TestClientError> {
        match resp.status {
            200 => Ok(resp.into_json()),
            400 => Err(TestClientError::BadRequest(resp.body.to_string())),
            status => Err(TestClientError::UnexpectedStatus(status, resp.body.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0} - Body: {1}")]
    UnexpectedStatus(u16, String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_url_building() {
        let client = TestClient::new("http://localhost:8080");
        assert_eq!(client.url("/healthz"), "http://localhost:8080/healthz");
        assert_eq!(client.url("healthz"), "http://localhost:8080/healthz");
    }
}
