#![warn(missing_docs)]
//! Sensu event handlers: a re-alert cadence filter, per-team channel
//! resolution, and delivery to chat, paging and webhook transports.

pub mod channels;
pub mod cmd;
pub mod config;
pub mod filtering;
pub mod handler;
pub mod http_client;
pub mod models;
pub mod notification;
pub mod test_helpers;
