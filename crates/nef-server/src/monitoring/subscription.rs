use nef_api::monitoring::{MonitoringEventSubscription, MonitoringType};

use super::relay::NotificationRelay;
use crate::registry::AppFunctionContext;

/// A persisted monitoring event subscription and its relay.
#[derive(Debug)]
pub struct SubscriptionContext {
    id: String,
    location: String,
    subject_id: String,
    payload: MonitoringEventSubscription,
    relay: Option<NotificationRelay>,
}

impl SubscriptionContext {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn monitoring_type(&self) -> Option<MonitoringType> {
        self.payload.monitoring_type
    }

    /// Copy of the stored payload with `self` set.
    pub fn payload(&self) -> MonitoringEventSubscription {
        self.payload.clone()
    }

    pub fn relay(&self) -> Option<&NotificationRelay> {
        self.relay.as_ref()
    }

    pub fn relay_mut(&mut self) -> Option<&mut NotificationRelay> {
        self.relay.as_mut()
    }

    /// Replaces the relay, returning the previous one.
    pub fn attach_relay(&mut self, relay: NotificationRelay) -> Option<NotificationRelay> {
        self.relay.replace(relay)
    }
}

impl SubscriptionContext {
    /// Whether [`AppFunctionContext::new_subscription`] would store this
    /// request: subject id, notification destination and a known
    /// monitoring type are all present.
    pub fn accepts(subject_id: &str, payload: &MonitoringEventSubscription) -> bool {
        !subject_id.is_empty()
            && !payload.notification_destination.is_empty()
            && !matches!(payload.monitoring_type, None | Some(MonitoringType::Unknown))
    }
}

impl AppFunctionContext<SubscriptionContext> {
    /// Stores a subscription for `subject_id`.
    ///
    /// Returns `None` and stores nothing when the subject id, the
    /// notification destination or the monitoring type is missing.
    pub fn new_subscription(
        &mut self,
        subject_id: &str,
        payload: &MonitoringEventSubscription,
    ) -> Option<&mut SubscriptionContext> {
        if !SubscriptionContext::accepts(subject_id, payload) {
            return None;
        }

        self.insert_with(|id, location| {
            let mut payload = payload.clone();
            payload.self_link = Some(location.clone());
            Some(SubscriptionContext {
                id: id.to_string(),
                location,
                subject_id: subject_id.to_string(),
                payload,
                relay: None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AppFunctionRegistry;

    fn payload() -> MonitoringEventSubscription {
        MonitoringEventSubscription {
            external_id: Some("ext-1".into()),
            notification_destination: "http://af.example/notify".into(),
            monitoring_type: Some(MonitoringType::LocationReporting),
            maximum_number_of_reports: Some(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn stored_payload_carries_self_link() {
        let registry = AppFunctionRegistry::new("/3gpp-monitoring-event/v1");
        let af = registry.get_or_add_af("af-1");
        let mut af = af.write().await;

        let (id, location) = af
            .new_subscription("001010000000001", &payload())
            .map(|s| (s.id().to_string(), s.location().to_string()))
            .unwrap();
        assert_eq!(
            location,
            format!("/3gpp-monitoring-event/v1/af-1/subscriptions/{id}")
        );

        let stored = af.subscription(&id).unwrap();
        assert_eq!(stored.payload().self_link.as_deref(), Some(location.as_str()));
        assert_eq!(stored.subject_id(), "001010000000001");
        assert!(stored.relay().is_none());
    }

    #[tokio::test]
    async fn returned_payload_is_a_copy() {
        let registry = AppFunctionRegistry::new("/m");
        let af = registry.get_or_add_af("af-1");
        let mut af = af.write().await;
        let id = af
            .new_subscription("sub", &payload())
            .map(|s| s.id().to_string())
            .unwrap();

        let mut copy = af.subscription(&id).unwrap().payload();
        copy.notification_destination = "http://elsewhere".into();
        assert_eq!(
            af.subscription(&id).unwrap().payload().notification_destination,
            "http://af.example/notify"
        );
    }

    #[tokio::test]
    async fn incomplete_payloads_are_rejected() {
        let registry = AppFunctionRegistry::new("/m");
        let af = registry.get_or_add_af("af-1");
        let mut af = af.write().await;

        let mut no_destination = payload();
        no_destination.notification_destination.clear();
        let mut no_type = payload();
        no_type.monitoring_type = None;
        let mut unknown_type = payload();
        unknown_type.monitoring_type = Some(MonitoringType::Unknown);

        assert!(af.new_subscription("sub", &no_destination).is_none());
        assert!(af.new_subscription("sub", &no_type).is_none());
        assert!(af.new_subscription("sub", &unknown_type).is_none());
        assert!(af.new_subscription("", &payload()).is_none());
        assert!(af.is_empty());
    }
}
