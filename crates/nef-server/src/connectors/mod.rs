//! Narrow interfaces to the systems the gateway depends on: the core
//! network event bus, the identity resolver and the policy controller.

pub mod identity;
pub mod memory;
pub mod policy;
pub mod redis;

use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use nef_api::policy::AppSessionContext;
use nef_core::{CoreNetworkEvent, UeState};

pub use identity::HttpIdentityResolver;
pub use memory::MemoryEventSource;
pub use policy::HttpPolicyClient;
pub use redis::RedisEventSource;

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Subscribe error: {0}")]
    Subscribe(String),

    #[error("Unexpected response: {0}")]
    Protocol(String),

    #[error("Malformed data: {0}")]
    Malformed(String),
}

impl ConnectorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Live subscription to one subscriber channel.
///
/// Yields raw message payloads in delivery order. Dropping the listener
/// releases the underlying subscription.
pub struct EventListener {
    channel: String,
    stream: Mutex<BoxStream<'static, String>>,
}

impl EventListener {
    pub fn new(channel: impl Into<String>, stream: BoxStream<'static, String>) -> Self {
        Self {
            channel: channel.into(),
            stream: Mutex::new(stream),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next payload, or `None` once the source has closed the channel.
    pub async fn next(&mut self) -> Option<String> {
        self.stream
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .next()
            .await
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

/// Source of UE state: full snapshots and per-event update streams.
#[async_trait]
pub trait EventSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_snapshot(&self, subject_id: &str) -> Result<UeState, ConnectorError>;

    async fn subscribe(
        &self,
        subject_id: &str,
        event: CoreNetworkEvent,
    ) -> Result<EventListener, ConnectorError>;
}

/// External identifier to internal subject identifier lookup.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, af_id: &str, external_id: &str) -> Result<String, ConnectorError>;
}

/// Policy controller sessions backing AS-session-with-QoS subscriptions.
#[async_trait]
pub trait PolicyAuthorization: Send + Sync {
    /// Creates an app session and returns its identifier.
    async fn create_session(&self, context: &AppSessionContext)
    -> Result<String, ConnectorError>;

    async fn delete_session(&self, app_session_id: &str) -> Result<(), ConnectorError>;
}
