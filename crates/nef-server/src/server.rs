use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, FromRef, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use nef_api::ProblemDetails;
use nef_notifications::{NotificationAdapter, WebhookAdapter};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::connectors::{
    EventSource, HttpIdentityResolver, HttpPolicyClient, IdentityResolver, PolicyAuthorization,
};
use crate::monitoring::{self, SubscriptionService};
use crate::qos::{self, QosService};
use crate::{create_event_source, handlers};

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub monitoring: Arc<SubscriptionService>,
    pub qos: Arc<QosService>,
    pub events: Arc<dyn EventSource>,
    /// Set when the configured event source could not be used at startup
    pub events_degraded: bool,
    pub monitoring_root: Arc<str>,
    pub qos_root: Arc<str>,
}

impl FromRef<AppState> for Arc<SubscriptionService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.monitoring)
    }
}

impl FromRef<AppState> for Arc<QosService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.qos)
    }
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let monitoring_root = &cfg.monitoring.api_root;
    let qos_root = &cfg.qos.api_root;

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Monitoring event API
        .route(
            &format!("{monitoring_root}/{{scs_as_id}}/subscriptions"),
            get(monitoring::handlers::list_subscriptions)
                .post(monitoring::handlers::create_subscription),
        )
        .route(
            &format!("{monitoring_root}/{{scs_as_id}}/subscriptions/{{subscription_id}}"),
            get(monitoring::handlers::get_subscription)
                .put(monitoring::handlers::update_subscription)
                .patch(monitoring::handlers::patch_subscription)
                .delete(monitoring::handlers::delete_subscription),
        )
        // AS session with QoS API
        .route(
            &format!("{qos_root}/{{scs_as_id}}/subscriptions"),
            get(qos::handlers::list_subscriptions).post(qos::handlers::create_subscription),
        )
        .route(
            &format!("{qos_root}/{{scs_as_id}}/subscriptions/{{subscription_id}}"),
            get(qos::handlers::get_subscription)
                .put(qos::handlers::update_subscription)
                .patch(qos::handlers::patch_subscription)
                .delete(qos::handlers::delete_subscription),
        )
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            cfg.server.request_timeout(),
            request_deadline,
        ))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

async fn request_deadline(State(limit): State<Duration>, req: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Request deadline exceeded");
            let status = StatusCode::GATEWAY_TIMEOUT;
            (
                status,
                Json(ProblemDetails::new(status, "request deadline exceeded")),
            )
                .into_response()
        }
    }
}

/// Wires the services from configuration. Collaborators can be swapped
/// before `build`, which is how tests run without Redis or remote peers.
#[derive(Default)]
pub struct ServerBuilder {
    config: AppConfig,
    addr: Option<SocketAddr>,
    events: Option<Arc<dyn EventSource>>,
    identity: Option<Arc<dyn IdentityResolver>>,
    policy: Option<Arc<dyn PolicyAuthorization>>,
    notifier: Option<Arc<dyn NotificationAdapter>>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn with_event_source(mut self, events: Arc<dyn EventSource>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_identity_resolver(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_policy_client(mut self, policy: Arc<dyn PolicyAuthorization>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationAdapter>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn build(self) -> anyhow::Result<NefServer> {
        let cfg = self.config;

        let (events, events_degraded) = match self.events {
            Some(events) => (events, false),
            None => {
                let setup = create_event_source(&cfg.redis).await;
                (setup.source, setup.degraded)
            }
        };
        let identity: Arc<dyn IdentityResolver> = match self.identity {
            Some(identity) => identity,
            None => Arc::new(HttpIdentityResolver::new(
                cfg.identity.url.clone(),
                Duration::from_millis(cfg.identity.timeout_ms),
            )?),
        };
        let policy: Arc<dyn PolicyAuthorization> = match self.policy {
            Some(policy) => policy,
            None => Arc::new(HttpPolicyClient::new(
                cfg.policy.url.clone(),
                Duration::from_millis(cfg.policy.timeout_ms),
            )?),
        };
        let notifier: Arc<dyn NotificationAdapter> = match self.notifier {
            Some(notifier) => notifier,
            None => Arc::new(WebhookAdapter::new(&cfg.webhook.to_adapter_config())?),
        };

        let monitoring = Arc::new(SubscriptionService::new(
            cfg.monitoring.api_root.clone(),
            Arc::clone(&events),
            identity,
            notifier,
        ));
        let qos = Arc::new(
            QosService::new(&cfg.qos, cfg.policy.supported_features.clone(), policy)
                .map_err(anyhow::Error::msg)?,
        );

        let state = AppState {
            monitoring,
            qos,
            events,
            events_degraded,
            monitoring_root: Arc::from(cfg.monitoring.api_root.as_str()),
            qos_root: Arc::from(cfg.qos.api_root.as_str()),
        };
        let app = build_app(&cfg, state.clone());

        tracing::info!(
            event_source = state.events.name(),
            degraded = state.events_degraded,
            monitoring_root = %state.monitoring_root,
            qos_root = %state.qos_root,
            "NEF services initialized"
        );

        Ok(NefServer {
            addr: self.addr.unwrap_or_else(|| cfg.addr()),
            app,
            state,
        })
    }
}

pub struct NefServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
}

impl NefServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves, then
    /// stops every notification relay.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;
        self.state.monitoring.shutdown().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
