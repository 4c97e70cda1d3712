//! AS session with QoS orchestration on top of the policy controller.

use std::collections::BTreeMap;
use std::sync::Arc;

use nef_api::non_empty;
use nef_api::policy::{
    AppSessionContext, AppSessionContextReqData, FlowStatus, FlowUsage, MediaComponent,
    MediaSubComponent, MediaType,
};
use nef_api::qos::AsSessionWithQosSubscription;
use tracing::{info, warn};

use super::error::{QosError, QosResult};
use crate::config::{QosConfig, QosReferenceConfig};
use crate::connectors::PolicyAuthorization;
use crate::registry::AppFunctionRegistry;

/// Bandwidth and media type requested for a QoS reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QosReference {
    pub mar_bw_dl: String,
    pub mar_bw_ul: String,
    pub media_type: MediaType,
}

impl TryFrom<&QosReferenceConfig> for QosReference {
    type Error = String;

    fn try_from(cfg: &QosReferenceConfig) -> Result<Self, Self::Error> {
        let media_type = MediaType::parse(&cfg.media_type.to_ascii_uppercase())
            .ok_or_else(|| format!("unknown media type {}", cfg.media_type))?;
        Ok(Self {
            mar_bw_dl: cfg.mar_bw_dl.clone(),
            mar_bw_ul: cfg.mar_bw_ul.clone(),
            media_type,
        })
    }
}

/// A QoS session stored for an AF.
#[derive(Debug, Clone)]
pub struct QosSessionRecord {
    id: String,
    app_session_id: String,
    payload: AsSessionWithQosSubscription,
}

impl QosSessionRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn app_session_id(&self) -> &str {
        &self.app_session_id
    }

    pub fn payload(&self) -> AsSessionWithQosSubscription {
        self.payload.clone()
    }
}

pub struct QosService {
    registry: AppFunctionRegistry<QosSessionRecord>,
    policy: Arc<dyn PolicyAuthorization>,
    references: BTreeMap<String, QosReference>,
    supported_features: String,
}

impl QosService {
    pub fn new(
        config: &QosConfig,
        supported_features: impl Into<String>,
        policy: Arc<dyn PolicyAuthorization>,
    ) -> Result<Self, String> {
        let references = config
            .references
            .iter()
            .map(|(name, cfg)| {
                QosReference::try_from(cfg)
                    .map(|reference| (name.clone(), reference))
                    .map_err(|e| format!("qos.references.{name}: {e}"))
            })
            .collect::<Result<BTreeMap<_, _>, String>>()?;

        Ok(Self {
            registry: AppFunctionRegistry::new(config.api_root.clone()),
            policy,
            references,
            supported_features: supported_features.into(),
        })
    }

    pub fn registry(&self) -> &AppFunctionRegistry<QosSessionRecord> {
        &self.registry
    }

    fn reference(&self, name: &str) -> Option<&QosReference> {
        self.references.get(name).or_else(|| {
            self.references
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, reference)| reference)
        })
    }

    /// Creates the policy controller session, then stores the subscription.
    /// Returns the location and the stored payload.
    pub async fn post(
        &self,
        af_id: &str,
        mut payload: AsSessionWithQosSubscription,
    ) -> QosResult<(String, AsSessionWithQosSubscription)> {
        let af = self.registry.get_or_add_af(af_id);
        let mut af = af.write().await;

        let single_ue = [&payload.gpsi, &payload.ue_ipv4_addr, &payload.ue_ipv6_addr]
            .into_iter()
            .any(|id| non_empty(id).is_some());
        if !single_ue {
            return Err(if non_empty(&payload.ext_group_id).is_some() {
                QosError::GroupNotSupported
            } else {
                QosError::NoTargetUe
            });
        }

        let context = self.to_policy_authorization(af_id, &payload)?;
        let app_session_id = self
            .policy
            .create_session(&context)
            .await
            .map_err(QosError::PolicyCreate)?;

        let stored = af
            .insert_with(|id, location| {
                payload.self_link = Some(location);
                Some(QosSessionRecord {
                    id: id.to_string(),
                    app_session_id: app_session_id.clone(),
                    payload,
                })
            })
            .map(|record| (record.id.clone(), record.payload()));
        let Some((subscription_id, body)) = stored else {
            if let Err(e) = self.policy.delete_session(&app_session_id).await {
                warn!(app_session_id = %app_session_id, error = %e, "Could not undo app session");
            }
            return Err(QosError::Storage);
        };
        let location = af.location_for(&subscription_id);

        info!(
            af_id = %af_id,
            subscription_id = %subscription_id,
            app_session_id = %app_session_id,
            "AS session with QoS created"
        );
        Ok((location, body))
    }

    /// Runs [`post`](Self::post) on its own task, so the policy controller
    /// session and the stored record are created together even when the
    /// caller stops waiting.
    pub async fn post_detached(
        self: Arc<Self>,
        af_id: String,
        payload: AsSessionWithQosSubscription,
    ) -> QosResult<(String, AsSessionWithQosSubscription)> {
        tokio::spawn(async move { self.post(&af_id, payload).await })
            .await
            .map_err(|e| QosError::Aborted(e.to_string()))?
    }

    /// Builds the Npcf_PolicyAuthorization request for a validated payload.
    pub fn to_policy_authorization(
        &self,
        af_id: &str,
        payload: &AsSessionWithQosSubscription,
    ) -> QosResult<AppSessionContext> {
        validate(payload)?;

        let qos_reference = payload.qos_reference.as_deref().unwrap_or_default();
        let reference = self
            .reference(qos_reference)
            .ok_or_else(|| QosError::UnknownQosReference(qos_reference.to_string()))?;

        let med_sub_comps = payload
            .flow_info
            .iter()
            .map(|flow| {
                (
                    flow.flow_id.to_string(),
                    MediaSubComponent {
                        f_num: flow.flow_id,
                        f_descs: flow.flow_descriptions.clone(),
                        flow_usage: Some(FlowUsage::NoInfo),
                    },
                )
            })
            .collect();

        let component = MediaComponent {
            med_comp_n: 1,
            af_app_id: Some(af_id.to_string()),
            f_status: Some(FlowStatus::Enabled),
            mar_bw_dl: Some(reference.mar_bw_dl.clone()),
            mar_bw_ul: Some(reference.mar_bw_ul.clone()),
            med_type: Some(reference.media_type),
            med_sub_comps,
        };

        Ok(AppSessionContext {
            asc_req_data: AppSessionContextReqData {
                af_app_id: Some(af_id.to_string()),
                ue_ipv4: payload.ue_ipv4_addr.clone(),
                notif_uri: payload.notification_destination.clone(),
                supp_feat: self.supported_features.clone(),
                dnn: payload.dnn.clone(),
                slice_info: payload.snssai.clone(),
                qos_duration: payload.qos_duration,
                med_components: BTreeMap::from([("1".to_string(), component)]),
            },
        })
    }

    pub async fn get(
        &self,
        af_id: &str,
        subscription_id: &str,
    ) -> QosResult<AsSessionWithQosSubscription> {
        let af = self
            .registry
            .get_af(af_id)
            .ok_or_else(|| not_found(af_id, subscription_id))?;
        let af = af.read().await;
        af.subscription(subscription_id)
            .map(QosSessionRecord::payload)
            .ok_or_else(|| not_found(af_id, subscription_id))
    }

    pub async fn get_all(&self, af_id: &str) -> QosResult<Vec<AsSessionWithQosSubscription>> {
        let af = self
            .registry
            .get_af(af_id)
            .ok_or_else(|| QosError::NotFound(format!("AF {af_id} not found")))?;
        let af = af.read().await;
        let mut records: Vec<_> = af.subscriptions().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records.into_iter().map(QosSessionRecord::payload).collect())
    }

    pub async fn update(
        &self,
        _af_id: &str,
        _subscription_id: &str,
        _payload: AsSessionWithQosSubscription,
    ) -> QosResult<AsSessionWithQosSubscription> {
        Err(QosError::NotImplemented("updating an AS session with QoS"))
    }

    /// Removes the policy controller session first; the local record is
    /// only dropped once that succeeded.
    pub async fn delete(&self, af_id: &str, subscription_id: &str) -> QosResult<()> {
        let af = self
            .registry
            .get_af(af_id)
            .ok_or_else(|| not_found(af_id, subscription_id))?;
        let mut af = af.write().await;

        let app_session_id = af
            .subscription(subscription_id)
            .map(|record| record.app_session_id.clone())
            .ok_or_else(|| not_found(af_id, subscription_id))?;

        self.policy
            .delete_session(&app_session_id)
            .await
            .map_err(QosError::PolicyDelete)?;
        af.delete_subscription(subscription_id)?;

        info!(af_id = %af_id, subscription_id = %subscription_id, "AS session with QoS deleted");
        Ok(())
    }
}

fn validate(payload: &AsSessionWithQosSubscription) -> QosResult<()> {
    if non_empty(&payload.ue_ipv4_addr).is_none() {
        return Err(QosError::Validation("field UeIpv4Addr not provided"));
    }
    if payload.notification_destination.is_empty() {
        return Err(QosError::Validation("field NotificationDestination not provided"));
    }
    if non_empty(&payload.dnn).is_none() {
        return Err(QosError::Validation("field Dnn not provided"));
    }
    if non_empty(&payload.qos_reference).is_none() {
        return Err(QosError::Validation("field QosReference not provided"));
    }
    if payload.flow_info.is_empty() {
        return Err(QosError::Validation("field FlowInfo not provided"));
    }
    for flow in &payload.flow_info {
        if flow.flow_descriptions.is_empty() {
            return Err(QosError::Validation("no FlowDescription provided"));
        }
        if flow.flow_descriptions.iter().any(String::is_empty) {
            return Err(QosError::Validation("invalid flow descriptor"));
        }
    }
    Ok(())
}

fn not_found(af_id: &str, subscription_id: &str) -> QosError {
    QosError::NotFound(format!(
        "subscription {subscription_id} not found for AF {af_id}"
    ))
}
