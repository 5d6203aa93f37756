//! Retrying HTTP clients for the webhook-based transports, and a pool
//! sharing them between handlers.

mod client;
mod pool;

pub use client::create_retryable_http_client;
pub use pool::{HttpClientPool, HttpClientPoolError};
