pub mod webhook;

use async_trait::async_trait;

use crate::error::NotificationError;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub success: bool,
    pub status: Option<u16>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl SendResult {
    pub fn delivered(status: u16, elapsed_ms: u64) -> Self {
        Self {
            success: true,
            status: Some(status),
            error: None,
            elapsed_ms,
        }
    }

    pub fn rejected(status: u16, error: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            success: false,
            status: Some(status),
            error: Some(error.into()),
            elapsed_ms,
        }
    }
}

/// Delivers JSON notification bodies to an AF-supplied destination.
///
/// A returned `Err` means the request never got an HTTP answer; an answer
/// with a non-2xx status is `Ok` with `success == false`.
#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    async fn send(
        &self,
        destination: &str,
        body: &serde_json::Value,
    ) -> Result<SendResult, NotificationError>;

    /// Check if adapter can deliver to this URI scheme
    fn supports(&self, scheme: &str) -> bool;
}

pub use webhook::{WebhookAdapter, WebhookConfig};
