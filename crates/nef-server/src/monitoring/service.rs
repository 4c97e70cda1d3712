//! Monitoring event subscription orchestration.

use std::sync::Arc;

use nef_api::monitoring::{MonitoringEventReport, MonitoringEventSubscription, MonitoringType};
use nef_api::non_empty;
use nef_core::now_utc;
use nef_notifications::NotificationAdapter;
use tracing::{info, warn};

use super::error::{MonitoringError, MonitoringResult};
use super::relay::NotificationRelay;
use super::report::{RelayTarget, ReportDispatch, core_network_channel, immediate_report};
use super::subscription::SubscriptionContext;
use crate::connectors::{EventListener, EventSource, IdentityResolver};
use crate::registry::AppFunctionRegistry;

/// Result of a successful create.
#[derive(Debug, Clone)]
pub struct CreatedSubscription {
    pub report: MonitoringEventReport,
    /// `None` for one-time requests, which are not persisted
    pub location: Option<String>,
}

pub struct SubscriptionService {
    registry: AppFunctionRegistry<SubscriptionContext>,
    events: Arc<dyn EventSource>,
    identity: Arc<dyn IdentityResolver>,
    notifier: Arc<dyn NotificationAdapter>,
    dispatch: ReportDispatch,
}

impl SubscriptionService {
    pub fn new(
        api_root: impl Into<String>,
        events: Arc<dyn EventSource>,
        identity: Arc<dyn IdentityResolver>,
        notifier: Arc<dyn NotificationAdapter>,
    ) -> Self {
        Self {
            registry: AppFunctionRegistry::new(api_root),
            events,
            identity,
            notifier,
            dispatch: ReportDispatch::default(),
        }
    }

    pub fn registry(&self) -> &AppFunctionRegistry<SubscriptionContext> {
        &self.registry
    }

    /// Creates a subscription and returns the immediate report.
    ///
    /// The AF write lock is held for the whole operation, so creations for
    /// one AF never interleave.
    pub async fn post(
        &self,
        af_id: &str,
        payload: MonitoringEventSubscription,
    ) -> MonitoringResult<CreatedSubscription> {
        let af = self.registry.get_or_add_af(af_id);
        let mut af = af.write().await;

        let subject_id = self.subject_id(af_id, &payload).await?;
        let monitoring_type = payload
            .monitoring_type
            .ok_or(MonitoringError::InvalidSubscription)?;

        let snapshot = self
            .events
            .fetch_snapshot(&subject_id)
            .await
            .map_err(MonitoringError::Snapshot)?;

        let reported_id = non_empty(&payload.external_id).unwrap_or(subject_id.as_str());
        let report = immediate_report(Some(reported_id), monitoring_type, &snapshot, now_utc())
            .map_err(MonitoringError::ImmediateReport)?;

        if payload.is_one_time() {
            info!(
                af_id = %af_id,
                subject_id = %subject_id,
                monitoring_type = ?monitoring_type,
                "One-time monitoring request answered"
            );
            return Ok(CreatedSubscription {
                report,
                location: None,
            });
        }

        if !SubscriptionContext::accepts(&subject_id, &payload) {
            return Err(MonitoringError::InvalidSubscription);
        }
        let event = core_network_channel(monitoring_type)
            .ok_or(MonitoringError::UnsupportedMonitoringType(monitoring_type))?;
        // Last await of a create: nothing is stored until it completes, so a
        // request dropped here leaves the registry untouched.
        let listener = self
            .events
            .subscribe(&subject_id, event)
            .await
            .map_err(MonitoringError::Listener)?;

        let (subscription_id, location) = af
            .new_subscription(&subject_id, &payload)
            .map(|sub| (sub.id().to_string(), sub.location().to_string()))
            .ok_or(MonitoringError::InvalidSubscription)?;

        let target = RelayTarget {
            location: location.clone(),
            subject_id: subject_id.clone(),
            external_id: non_empty(&payload.external_id).map(str::to_string),
            notification_destination: payload.notification_destination.clone(),
        };
        let relay = match self.start_relay(target, listener, monitoring_type) {
            Ok(relay) => relay,
            Err(e) => {
                if let Err(rollback) = af.delete_subscription(&subscription_id) {
                    warn!(error = %rollback, "Rollback of failed subscription did not apply");
                }
                return Err(e);
            }
        };
        if let Some(sub) = af.subscription_mut(&subscription_id) {
            sub.attach_relay(relay);
        }

        info!(
            af_id = %af_id,
            subscription_id = %subscription_id,
            subject_id = %subject_id,
            monitoring_type = ?monitoring_type,
            "Monitoring event subscription created"
        );
        Ok(CreatedSubscription {
            report,
            location: Some(location),
        })
    }

    async fn subject_id(
        &self,
        af_id: &str,
        payload: &MonitoringEventSubscription,
    ) -> MonitoringResult<String> {
        if let Some(supi) = non_empty(&payload.supi) {
            return Ok(supi.to_string());
        }
        if let Some(external_id) = non_empty(&payload.external_id) {
            return self
                .identity
                .resolve(af_id, external_id)
                .await
                .map_err(MonitoringError::IdentityResolution);
        }
        if non_empty(&payload.external_group_id).is_some() {
            return Err(MonitoringError::GroupNotSupported);
        }
        Err(MonitoringError::MissingIdentifier)
    }

    fn start_relay(
        &self,
        target: RelayTarget,
        listener: EventListener,
        monitoring_type: MonitoringType,
    ) -> MonitoringResult<NotificationRelay> {
        let mut relay = NotificationRelay::new(target, listener, Arc::clone(&self.notifier));
        if !relay.set_callback(&self.dispatch, monitoring_type) {
            return Err(MonitoringError::UnsupportedMonitoringType(monitoring_type));
        }
        if !relay.start() {
            return Err(MonitoringError::Relay("relay did not start".into()));
        }
        Ok(relay)
    }

    pub async fn get(
        &self,
        af_id: &str,
        subscription_id: &str,
    ) -> MonitoringResult<MonitoringEventSubscription> {
        let af = self
            .registry
            .get_af(af_id)
            .ok_or_else(|| not_found(af_id, subscription_id))?;
        let af = af.read().await;
        af.subscription(subscription_id)
            .map(SubscriptionContext::payload)
            .ok_or_else(|| not_found(af_id, subscription_id))
    }

    pub async fn get_all(&self, af_id: &str) -> MonitoringResult<Vec<MonitoringEventSubscription>> {
        let af = self
            .registry
            .get_af(af_id)
            .ok_or_else(|| MonitoringError::NotFound(format!("AF {af_id} not found")))?;
        let af = af.read().await;
        let mut subscriptions: Vec<_> = af.subscriptions().collect();
        subscriptions.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(subscriptions.into_iter().map(SubscriptionContext::payload).collect())
    }

    pub async fn update(
        &self,
        _af_id: &str,
        _subscription_id: &str,
        _payload: MonitoringEventSubscription,
    ) -> MonitoringResult<MonitoringEventSubscription> {
        Err(MonitoringError::NotImplemented("updating a monitoring event subscription"))
    }

    /// Stops the relay, then forgets the subscription.
    pub async fn delete(&self, af_id: &str, subscription_id: &str) -> MonitoringResult<()> {
        let af = self
            .registry
            .get_af(af_id)
            .ok_or_else(|| not_found(af_id, subscription_id))?;
        let mut af = af.write().await;

        let sub = af
            .subscription_mut(subscription_id)
            .ok_or_else(|| not_found(af_id, subscription_id))?;
        if let Some(relay) = sub.relay_mut() {
            if !relay.stop() {
                return Err(MonitoringError::Relay(
                    "could not stop the notification relay".into(),
                ));
            }
        }
        af.delete_subscription(subscription_id)?;

        info!(af_id = %af_id, subscription_id = %subscription_id, "Monitoring event subscription deleted");
        Ok(())
    }

    /// Stops every running relay and waits for them to finish.
    pub async fn shutdown(&self) {
        let mut stopped = 0usize;
        for af in self.registry.all() {
            let mut af = af.write().await;
            for sub in af.subscriptions_mut() {
                if let Some(relay) = sub.relay_mut() {
                    relay.shutdown().await;
                    stopped += 1;
                }
            }
        }
        info!(relays = stopped, "Notification relays stopped");
    }
}

fn not_found(af_id: &str, subscription_id: &str) -> MonitoringError {
    MonitoringError::NotFound(format!(
        "subscription {subscription_id} not found for AF {af_id}"
    ))
}
