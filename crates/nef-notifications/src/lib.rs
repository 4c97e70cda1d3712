pub mod adapters;
pub mod error;

pub use adapters::{NotificationAdapter, SendResult, WebhookAdapter, WebhookConfig};
pub use error::NotificationError;
