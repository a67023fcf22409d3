//! HTTP sync client for the loops server.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::client::{SyncClient, SyncError, SyncRequest, SyncResponse};
use crate::domain::Loop;
use crate::error::Result;

/// Default server base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default environment variable holding the bearer token
pub const DEFAULT_TOKEN_ENV: &str = "LOOPCYCLE_TOKEN";

#[derive(Debug, Clone)]
pub struct HttpSyncConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub token: Option<String>,
}

impl Default for HttpSyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            token: None,
        }
    }
}

impl HttpSyncConfig {
    /// Read the token from `env_var`; an unset or empty variable means signed out
    pub fn with_token_from_env(mut self, env_var: &str) -> Self {
        self.token = std::env::var(env_var).ok().filter(|t| !t.trim().is_empty());
        self
    }
}

pub struct HttpSyncClient {
    client: Client,
    config: HttpSyncConfig,
}

impl HttpSyncClient {
    pub fn new(config: HttpSyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> std::result::Result<T, SyncError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Unauthorized);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SyncError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SyncError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl SyncClient for HttpSyncClient {
    async fn sync(
        &self,
        loops: &[Loop],
        last_sync: Option<DateTime<Utc>>,
    ) -> std::result::Result<SyncResponse, SyncError> {
        let body = SyncRequest {
            loops,
            last_sync_timestamp: last_sync,
        };
        self.send(self.client.post(self.url("/sync")).json(&body)).await
    }

    async fn fetch_loops(&self) -> std::result::Result<Vec<Loop>, SyncError> {
        self.send(self.client.get(self.url("/loops"))).await
    }

    fn is_authenticated(&self) -> bool {
        self.config.token.is_some()
    }
}

impl std::fmt::Debug for HttpSyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSyncClient")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.config.token.is_some())
            .finish()
    }
}
