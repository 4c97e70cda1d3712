//! Background forwarding of core network updates to an AF webhook.

use std::fmt;
use std::sync::Arc;

use nef_api::monitoring::{MonitoringNotification, MonitoringType};
use nef_core::UeStateUpdate;
use nef_notifications::NotificationAdapter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::report::{RelayTarget, ReportDispatch, ReportHandler};
use crate::connectors::EventListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Listener attached, no callback yet
    Idle,
    /// Callback chosen, not running
    Configured,
    Running,
    Stopped,
}

/// Forwards reports built from one listener to one notification destination.
///
/// A relay runs at most once: `start` consumes the listener, so a stopped
/// relay cannot be restarted and a running one cannot spawn a second task.
pub struct NotificationRelay {
    target: Arc<RelayTarget>,
    adapter: Arc<dyn NotificationAdapter>,
    listener: Option<EventListener>,
    handler: Option<ReportHandler>,
    state: RelayState,
    cancel: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl NotificationRelay {
    pub fn new(
        target: RelayTarget,
        listener: EventListener,
        adapter: Arc<dyn NotificationAdapter>,
    ) -> Self {
        Self {
            target: Arc::new(target),
            adapter,
            listener: Some(listener),
            handler: None,
            state: RelayState::Idle,
            cancel: None,
            task: None,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn target(&self) -> &RelayTarget {
        &self.target
    }

    /// Picks the report builder for `monitoring_type`. Returns `false` if
    /// the table has none or the relay has already been started.
    pub fn set_callback(&mut self, dispatch: &ReportDispatch, monitoring_type: MonitoringType) -> bool {
        if !matches!(self.state, RelayState::Idle | RelayState::Configured) {
            return false;
        }
        match dispatch.handler(monitoring_type) {
            Some(handler) => {
                self.handler = Some(handler);
                self.state = RelayState::Configured;
                true
            }
            None => false,
        }
    }

    /// Spawns the forwarding task. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.state != RelayState::Configured {
            return false;
        }
        let (Some(handler), Some(listener)) = (self.handler, self.listener.take()) else {
            return false;
        };

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let target = Arc::clone(&self.target);
        let adapter = Arc::clone(&self.adapter);
        self.task = Some(tokio::spawn(run(
            listener, handler, target, adapter, cancel_rx,
        )));
        self.cancel = Some(cancel_tx);
        self.state = RelayState::Running;

        info!(
            location = %self.target.location,
            subject_id = %self.target.subject_id,
            "Notification relay started"
        );
        true
    }

    /// Signals the task to finish. Returns `false` if the relay is not running.
    pub fn stop(&mut self) -> bool {
        if self.state != RelayState::Running {
            return false;
        }
        if let Some(cancel) = self.cancel.take() {
            // Err only when the task already ended and dropped its receiver.
            let _ = cancel.send(true);
        }
        self.state = RelayState::Stopped;
        info!(location = %self.target.location, "Notification relay stopped");
        true
    }

    /// Stops the relay and waits for its task to release the listener.
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(location = %self.target.location, error = %e, "Relay task ended abnormally");
            }
        }
    }
}

impl Drop for NotificationRelay {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(true);
        }
    }
}

impl fmt::Debug for NotificationRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRelay")
            .field("target", &self.target)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

async fn run(
    mut listener: EventListener,
    handler: ReportHandler,
    target: Arc<RelayTarget>,
    adapter: Arc<dyn NotificationAdapter>,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;

            result = cancel.changed() => {
                match result {
                    Ok(()) if *cancel.borrow() => break,
                    Ok(()) => {}
                    Err(_) => break,
                }
            }
            message = listener.next() => {
                let Some(raw) = message else {
                    info!(channel = %listener.channel(), "Core network channel closed");
                    break;
                };
                forward(&raw, handler, &target, adapter.as_ref()).await;
            }
        }
    }
    debug!(channel = %listener.channel(), "Releasing core network listener");
}

async fn forward(
    raw: &str,
    handler: ReportHandler,
    target: &RelayTarget,
    adapter: &dyn NotificationAdapter,
) {
    let update = match UeStateUpdate::from_json(raw) {
        Ok(update) => update,
        Err(e) => {
            warn!(location = %target.location, error = %e, "Dropping undecodable core network update");
            return;
        }
    };

    let report = match handler(target, &update) {
        Ok(Some(report)) => report,
        Ok(None) => return,
        Err(e) => {
            warn!(
                location = %target.location,
                update_type = %update.kind,
                error = %e,
                "Could not build monitoring event report"
            );
            return;
        }
    };

    let notification = MonitoringNotification {
        subscription: target.location.clone(),
        monitoring_event_reports: vec![report],
    };
    let body = match serde_json::to_value(&notification) {
        Ok(body) => body,
        Err(e) => {
            warn!(location = %target.location, error = %e, "Could not serialize notification");
            return;
        }
    };

    match adapter.send(&target.notification_destination, &body).await {
        Ok(result) if result.success => debug!(
            endpoint = %target.notification_destination,
            elapsed_ms = result.elapsed_ms,
            "Notification delivered"
        ),
        Ok(result) => warn!(
            endpoint = %target.notification_destination,
            status = ?result.status,
            error = ?result.error,
            "Notification rejected"
        ),
        Err(e) => warn!(
            endpoint = %target.notification_destination,
            error = %e,
            "Notification delivery failed"
        ),
    }
}
