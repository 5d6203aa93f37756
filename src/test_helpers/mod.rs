//! A set of helpers for testing

mod event;
mod handler;
mod http_client;
mod notifier;

pub use event::EventBuilder;
pub use handler::HandlerBuilder;
pub use http_client::{create_test_http_client, fast_retry_policy};
pub use notifier::RecordingNotifier;
