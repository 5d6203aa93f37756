use std::{sync::Arc, time::Duration};

use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;

use crate::{
    config::{HttpRetryConfig, JitterSetting},
    http_client::create_retryable_http_client,
};

/// A retry policy that gives up after one quick retry.
pub fn fast_retry_policy() -> HttpRetryConfig {
    HttpRetryConfig {
        max_retries: 1,
        initial_backoff_ms: Duration::from_millis(1),
        max_backoff_secs: Duration::from_millis(10),
        jitter: JitterSetting::None,
        ..Default::default()
    }
}

/// Creates an HTTP client with a fast retry policy for testing purposes.
pub fn create_test_http_client() -> Arc<ClientWithMiddleware> {
    Arc::new(create_retryable_http_client(&fast_retry_policy(), Client::new()))
}
