//! This module contains the data models for the Sensu handlers.

pub mod event;
pub mod handler;
pub mod notification;
pub mod team;

pub use event::{Check, Client, Event, EventAction};
pub use handler::{HandlerConfig, HandlerConfigError, TransportConfig};
pub use notification::{Notification, NotificationMessage, Severity};
pub use team::{TeamConfig, TeamDirectory};
