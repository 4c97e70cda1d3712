//! Monitoring event API models (TS 29.122 MonitoringEvent).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use nef_core::types::{DlDataDeliveryStatus, GeographicArea, PlmnId, Snssai, UserLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitoringType {
    LossOfConnectivity,
    UeReachability,
    LocationReporting,
    ChangeOfImsiImeiAssociation,
    RoamingStatus,
    CommunicationFailure,
    AvailabilityAfterDdnFailure,
    NumberOfUesInAnArea,
    PdnConnectivityStatus,
    DownlinkDataDeliveryStatus,
    ApiSupportCapability,
    NumOfRegdUes,
    NumOfEstdPduSessions,
    AreaOfInterest,
    GroupMemberListChange,
    ApplicationStart,
    ApplicationStop,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReachabilityType {
    Sms,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PdnConnectionStatus {
    Created,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PdnType {
    Ipv4,
    Ipv6,
    Ipv4v6,
    NonIp,
    Ethernet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositioningMethod {
    #[serde(rename = "CELLID")]
    CellId,
    #[serde(rename = "ECID")]
    Ecid,
    #[serde(rename = "OTDOA")]
    Otdoa,
    #[serde(rename = "GNSS")]
    Gnss,
}

/// Subscription request, stored verbatim apart from `self`.
///
/// Attributes this gateway does not act upon are kept in `extra` so that
/// reads return what the AF sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringEventSubscription {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_features: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msisdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snssai: Option<Snssai>,
    #[serde(default)]
    pub notification_destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_type: Option<MonitoringType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_number_of_reports: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_expire_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_period: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immediate_rep: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MonitoringEventSubscription {
    /// One-shot requests only want the immediate report.
    pub fn is_one_time(&self) -> bool {
        self.maximum_number_of_reports == Some(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_of_location_info: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<UserLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic_area: Option<GeographicArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_method: Option<PositioningMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdnConnectionInformation {
    pub status: PdnConnectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apn: Option<String>,
    pub pdn_type: PdnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_addr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PduSessionInformation {
    pub snssai: Snssai,
    pub dnn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ue_ipv4: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringEventReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub monitoring_type: MonitoringType,
    #[serde(with = "time::serde::rfc3339")]
    pub event_time: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_info: Option<LocationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plmn_id: Option<PlmnId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_of_connect_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reachability_type: Option<ReachabilityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdn_conn_info_list: Option<Vec<PdnConnectionInformation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddd_status: Option<DlDataDeliveryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdu_sess_info: Option<PduSessionInformation>,
}

impl MonitoringEventReport {
    pub fn new(
        monitoring_type: MonitoringType,
        external_id: Option<String>,
        event_time: OffsetDateTime,
    ) -> Self {
        Self {
            external_id,
            monitoring_type,
            event_time,
            location_info: None,
            plmn_id: None,
            loss_of_connect_reason: None,
            reachability_type: None,
            pdn_conn_info_list: None,
            ddd_status: None,
            pdu_sess_info: None,
        }
    }
}

/// Body POSTed to the AF notification destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringNotification {
    pub subscription: String,
    pub monitoring_event_reports: Vec<MonitoringEventReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscription_keeps_unknown_attributes() {
        let raw = json!({
            "externalId": "ext-1",
            "notificationDestination": "http://af.example/notify",
            "monitoringType": "LOCATION_REPORTING",
            "maximumNumberOfReports": 5,
            "locationType": "CURRENT_LOCATION",
            "accuracy": "CELL_LEVEL"
        });
        let sub: MonitoringEventSubscription = serde_json::from_value(raw).unwrap();
        assert_eq!(sub.monitoring_type, Some(MonitoringType::LocationReporting));
        assert!(!sub.is_one_time());
        assert_eq!(sub.extra["locationType"], "CURRENT_LOCATION");

        let back = serde_json::to_value(&sub).unwrap();
        assert_eq!(back["accuracy"], "CELL_LEVEL");
        assert!(back.get("self").is_none());
    }

    #[test]
    fn unrecognised_monitoring_type_is_not_a_parse_error() {
        let sub: MonitoringEventSubscription =
            serde_json::from_value(json!({ "monitoringType": "SOMETHING_NEW" })).unwrap();
        assert_eq!(sub.monitoring_type, Some(MonitoringType::Unknown));
    }

    #[test]
    fn report_serializes_wire_names() {
        let mut report = MonitoringEventReport::new(
            MonitoringType::PdnConnectivityStatus,
            Some("ext-1".into()),
            OffsetDateTime::UNIX_EPOCH,
        );
        report.pdn_conn_info_list = Some(vec![PdnConnectionInformation {
            status: PdnConnectionStatus::Created,
            apn: Some("internet".into()),
            pdn_type: PdnType::Ipv4,
            ipv4_addr: Some("10.45.0.2".into()),
        }]);
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["monitoringType"], "PDN_CONNECTIVITY_STATUS");
        assert_eq!(v["eventTime"], "1970-01-01T00:00:00Z");
        assert_eq!(v["pdnConnInfoList"][0]["pdnType"], "IPV4");
        assert!(v.get("locationInfo").is_none());
    }
}
