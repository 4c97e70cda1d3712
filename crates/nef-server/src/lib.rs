pub mod config;
pub mod connectors;
pub mod handlers;
pub mod monitoring;
pub mod observability;
pub mod qos;
pub mod registry;
pub mod server;

use std::sync::Arc;

pub use config::{AppConfig, RedisConfig, ServerConfig};
pub use connectors::{EventSource, MemoryEventSource, RedisEventSource};
pub use observability::init_tracing;
pub use server::{AppState, NefServer, ServerBuilder, build_app};

/// Event source picked at startup.
pub struct EventSourceSetup {
    pub source: Arc<dyn EventSource>,
    /// Redis was configured but could not be reached. The in-process source
    /// stands in and nothing from the core network will reach it.
    pub degraded: bool,
}

/// Create the core network event source based on configuration.
///
/// ## Modes
///
/// - **Redis disabled**: in-process source, nothing is published to it
///   except by tests or embedding code
/// - **Redis enabled**: connects to Redis, falls back to the in-process
///   source if the server cannot be reached and marks the setup degraded
pub async fn create_event_source(config: &RedisConfig) -> EventSourceSetup {
    if !config.enabled {
        tracing::info!("Redis disabled, using in-process event source");
        return EventSourceSetup {
            source: Arc::new(MemoryEventSource::new()),
            degraded: false,
        };
    }

    match RedisEventSource::connect(config).await {
        Ok(source) => EventSourceSetup {
            source: Arc::new(source),
            degraded: false,
        },
        Err(e) => {
            tracing::warn!(
                error = %e,
                url = %config.url,
                "Redis unavailable, falling back to in-process event source; readiness will report degraded"
            );
            EventSourceSetup {
                source: Arc::new(MemoryEventSource::new()),
                degraded: true,
            }
        }
    }
}
