//! HTTP access to one relay server.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use tailgram_wire::{ErrorResponse, HistoryResponse, PollResponse, SendRequest, SendResponse};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay returned HTTP {0}")]
    Status(StatusCode),
    #[error("relay rejected message: {0}")]
    Rejected(String),
}

/// Client for the relay's three endpoints. One instance per session.
pub struct Relay {
    client: Client,
    base_url: String,
}

impl Relay {
    pub fn new(server: &str) -> Result<Self, RelayError> {
        // Normalize localhost to IPv4 to avoid IPv6 (::1) preference.
        let server = if server.contains("localhost") {
            server.replace("localhost", "127.0.0.1")
        } else {
            server.to_string()
        };
        let base_url = if server.starts_with("http://") || server.starts_with("https://") {
            server
        } else {
            format!("http://{server}")
        };
        // Conservative timeouts and no proxy, so a dead local relay
        // fails the cycle quickly instead of hanging the loop.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(4))
            .no_proxy()
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn history(&self) -> Result<HistoryResponse, RelayError> {
        let response = self
            .client
            .get(format!("{}/history", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RelayError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn poll(&self, from_me: u64, from_them: u64) -> Result<PollResponse, RelayError> {
        let response = self
            .client
            .get(format!("{}/poll", self.base_url))
            .query(&[("fromMe", from_me), ("fromThem", from_them)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RelayError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn send(&self, message: &str) -> Result<SendResponse, RelayError> {
        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .json(&SendRequest {
                message: message.to_string(),
            })
            .send()
            .await?;
        if response.status() == StatusCode::BAD_REQUEST {
            let body: ErrorResponse = response.json().await?;
            return Err(RelayError::Rejected(body.error));
        }
        if !response.status().is_success() {
            return Err(RelayError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}
