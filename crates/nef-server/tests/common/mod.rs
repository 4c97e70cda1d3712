#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use nef_server::config::QosReferenceConfig;
use nef_server::{AppConfig, MemoryEventSource, NefServer, ServerBuilder};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wiremock::MockServer;

pub const SUBJECT: &str = "001010000000001";
pub const MONITORING_ROOT: &str = "/3gpp-monitoring-event/v1";
pub const QOS_ROOT: &str = "/3gpp-as-session-with-qos/v1";

pub struct TestServer {
    pub base: String,
    pub events: Arc<MemoryEventSource>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

/// Config pointing every remote peer (identity, policy controller) at `peer`.
pub fn test_config(peer: &MockServer) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.redis.enabled = false;
    cfg.identity.url = peer.uri();
    cfg.policy.url = peer.uri();
    cfg.policy.supported_features = "4".into();
    cfg.webhook.timeout_ms = 2_000;
    cfg.qos.references.insert(
        "qos_a".into(),
        QosReferenceConfig {
            mar_bw_dl: "10 Mbps".into(),
            mar_bw_ul: "5 Mbps".into(),
            media_type: "VIDEO".into(),
        },
    );
    cfg
}

pub async fn start_server(peer: &MockServer) -> TestServer {
    let events = Arc::new(MemoryEventSource::new());
    let server = ServerBuilder::new()
        .with_config(test_config(peer))
        .with_event_source(events.clone())
        .build()
        .await
        .expect("build server");
    spawn_server(server, events).await
}

/// Serves an already built gateway. `events` is handed back to the test as is.
pub async fn spawn_server(server: NefServer, events: Arc<MemoryEventSource>) -> TestServer {
    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = server
            .serve(listener, async move {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        base: format!("http://{addr}"),
        events,
        shutdown: tx,
        handle,
    }
}

/// Polls until the mock peer has seen `count` requests on `path`.
pub async fn wait_for_requests(peer: &MockServer, path: &str, count: usize) -> Vec<wiremock::Request> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let received: Vec<_> = peer
                .received_requests()
                .await
                .unwrap_or_default()
                .into_iter()
                .filter(|r| r.url.path() == path)
                .collect();
            if received.len() >= count {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("requests received in time")
}
