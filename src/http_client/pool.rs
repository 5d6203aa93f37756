//! Shares retrying HTTP clients between the HTTP transports.
//!
//! Clients are keyed by retry policy. Two handlers configured with the same
//! `retry_policy` reuse one connection pool.

use std::{collections::HashMap, sync::Arc};

use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use tokio::sync::RwLock;

use super::client::create_retryable_http_client;
use crate::config::{BaseHttpClientConfig, HttpRetryConfig};

/// Errors raised while building a pooled client.
#[derive(Debug, Error)]
pub enum HttpClientPoolError {
    /// reqwest rejected the client settings.
    #[error("Failed to create HTTP client: {0}")]
    HttpClientBuildError(#[from] reqwest::Error),
}

/// Lazily built HTTP clients, one per distinct retry policy.
pub struct HttpClientPool {
    base_config: BaseHttpClientConfig,
    clients: RwLock<HashMap<HttpRetryConfig, Arc<ClientWithMiddleware>>>,
}

impl HttpClientPool {
    /// Creates an empty pool whose clients share `base_config`.
    pub fn new(base_config: BaseHttpClientConfig) -> Self {
        Self { base_config, clients: RwLock::new(HashMap::new()) }
    }

    /// Returns the client for `retry_policy`, building it on first use.
    ///
    /// The write lock re-checks the map so that concurrent callers with the
    /// same policy end up sharing one client.
    pub async fn get_or_create(
        &self,
        retry_policy: &HttpRetryConfig,
    ) -> Result<Arc<ClientWithMiddleware>, HttpClientPoolError> {
        if let Some(client) = self.clients.read().await.get(retry_policy) {
            return Ok(Arc::clone(client));
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(retry_policy) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(create_retryable_http_client(retry_policy, self.build_base_client()?));
        tracing::debug!(?retry_policy, "Created HTTP client.");
        clients.insert(retry_policy.clone(), Arc::clone(&client));
        Ok(client)
    }

    fn build_base_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(self.base_config.user_agent.as_str())
            .pool_max_idle_per_host(self.base_config.max_idle_per_host)
            .connect_timeout(self.base_config.connect_timeout)
            .timeout(self.base_config.request_timeout)
            .build()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for HttpClientPool {
    fn default() -> Self {
        Self::new(BaseHttpClientConfig::default())
    }
}
