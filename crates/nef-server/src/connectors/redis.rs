//! Redis-backed event source.
//!
//! The core network keeps one RedisJSON document per subscriber under
//! `user:{supi}` and publishes every state change on
//! `user:{supi}:{EVENT}`. Snapshots go through the pooled connections;
//! each listener opens its own pub/sub connection because a connection in
//! SUBSCRIBE mode cannot be returned to the pool.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::{self, Client};
use deadpool_redis::{Pool, PoolConfig, Runtime};
use futures_util::StreamExt;
use nef_core::ue_state::snapshot_key;
use nef_core::{CoreNetworkEvent, UeState};
use tracing::{debug, info, warn};

use super::{ConnectorError, EventListener, EventSource};
use crate::config::RedisConfig;

pub struct RedisEventSource {
    pool: Pool,
    client: Client,
}

impl RedisEventSource {
    pub fn new(pool: Pool, client: Client) -> Self {
        Self { pool, client }
    }

    /// Builds the pool and pub/sub client and checks the server answers.
    pub async fn connect(config: &RedisConfig) -> Result<Self, ConnectorError> {
        info!(url = %config.url, "Connecting to Redis");

        let timeout = Duration::from_millis(config.timeout_ms);
        let mut redis_config = deadpool_redis::Config::from_url(&config.url);
        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;
        let client = Client::open(config.url.as_str())
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;

        pool.get()
            .await
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;
        info!("Connected to Redis");

        Ok(Self::new(pool, client))
    }
}

/// `JSON.GET` without a path returns the document itself, with a JSONPath
/// it returns an array of matches.
fn parse_snapshot(raw: &str) -> Result<UeState, ConnectorError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ConnectorError::Malformed(e.to_string()))?;
    let document = match value {
        serde_json::Value::Array(mut matches) if !matches.is_empty() => matches.swap_remove(0),
        other => other,
    };
    serde_json::from_value(document).map_err(|e| ConnectorError::Malformed(e.to_string()))
}

#[async_trait]
impl EventSource for RedisEventSource {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn fetch_snapshot(&self, subject_id: &str) -> Result<UeState, ConnectorError> {
        let key = snapshot_key(subject_id);
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;

        let raw: Option<String> = redis::cmd("JSON.GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;

        let raw = raw.ok_or_else(|| ConnectorError::NotFound(key.clone()))?;
        debug!(key = %key, bytes = raw.len(), "Fetched UE snapshot");
        parse_snapshot(&raw)
    }

    async fn subscribe(
        &self,
        subject_id: &str,
        event: CoreNetworkEvent,
    ) -> Result<EventListener, ConnectorError> {
        let channel = event.channel_for(subject_id);

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;
        pubsub
            .subscribe(&channel)
            .await
            .map_err(|e| ConnectorError::Subscribe(e.to_string()))?;

        info!(channel = %channel, "Subscribed to core network channel");

        let log_channel = channel.clone();
        let stream = pubsub
            .into_on_message()
            .filter_map(move |msg| {
                let payload = msg.get_payload::<String>();
                let channel = log_channel.clone();
                async move {
                    match payload {
                        Ok(payload) => Some(payload),
                        Err(e) => {
                            warn!(channel = %channel, error = %e, "Dropping non-text pub/sub message");
                            None
                        }
                    }
                }
            })
            .boxed();

        Ok(EventListener::new(channel, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_accepts_document_or_jsonpath_array() {
        let doc = r#"{"LOSS_OF_CONNECTIVITY":{"LossOfConnectReason":"PURGED","TimeStamp":7}}"#;
        let a = parse_snapshot(doc).unwrap();
        let b = parse_snapshot(&format!("[{doc}]")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.loss_of_connectivity.unwrap().loss_of_connect_reason, "PURGED");
    }

    #[test]
    fn malformed_snapshot_is_reported() {
        assert!(matches!(
            parse_snapshot("not json"),
            Err(ConnectorError::Malformed(_))
        ));
        assert!(matches!(
            parse_snapshot(r#"{"DDDS": 5}"#),
            Err(ConnectorError::Malformed(_))
        ));
    }
}
