//! Notifications emitted by the contracts
//!
//! - [`NotificationLog`]: bounded append-only history with sequence numbers
//! - [`EventBus`]: broadcast channel for live subscribers (WebSocket clients)

pub mod bus;
pub mod notification;

pub use bus::EventBus;
pub use notification::{Event, Notification, NotificationLog, DEFAULT_LOG_CAPACITY};
