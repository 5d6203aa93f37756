//! Configuration module for the Sensu handlers.

mod app_config;
mod delivery;
mod handler_loader;
mod helpers;
mod http_base;
mod http_retry;
mod loader;

pub use app_config::{AppConfig, DEFAULT_CONFIG_DIR};
pub use delivery::DeliveryPolicy;
pub use handler_loader::{HandlerLoader, HandlerLoaderError};
pub use helpers::{
    coerce_flag, coerce_int, deserialize_duration_from_ms, deserialize_duration_from_seconds,
    deserialize_flag, deserialize_lenient_int, deserialize_lenient_opt_int,
    deserialize_lenient_opt_string, serialize_duration_to_ms, serialize_duration_to_seconds,
};
pub use http_base::BaseHttpClientConfig;
pub use http_retry::{HttpRetryConfig, JitterSetting};
pub use loader::{ConfigLoader, LoaderError};
