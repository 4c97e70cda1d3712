//! UE state as maintained by the core network simulator: the full snapshot
//! stored per subscriber and the incremental updates published on the bus.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{DlDataDeliveryStatus, GeographicArea, Snssai, UserLocation};

/// Event channels published by the core network, one topic per subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoreNetworkEvent {
    LocationReport,
    RegistrationStateReport,
    ConnectivityStateReport,
    ReachabilityReport,
    CommunicationFailureReport,
    LossOfConnectivity,
    UpPathCh,
    PduSesRel,
    PlmnCh,
    UeIpCh,
    Ddds,
    PduSesEst,
    QosMon,
    PdnConnectivityStatus,
}

impl CoreNetworkEvent {
    pub const ALL: [CoreNetworkEvent; 14] = [
        Self::LocationReport,
        Self::RegistrationStateReport,
        Self::ConnectivityStateReport,
        Self::ReachabilityReport,
        Self::CommunicationFailureReport,
        Self::LossOfConnectivity,
        Self::UpPathCh,
        Self::PduSesRel,
        Self::PlmnCh,
        Self::UeIpCh,
        Self::Ddds,
        Self::PduSesEst,
        Self::QosMon,
        Self::PdnConnectivityStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocationReport => "LOCATION_REPORT",
            Self::RegistrationStateReport => "REGISTRATION_STATE_REPORT",
            Self::ConnectivityStateReport => "CONNECTIVITY_STATE_REPORT",
            Self::ReachabilityReport => "REACHABILITY_REPORT",
            Self::CommunicationFailureReport => "COMMUNICATION_FAILURE_REPORT",
            Self::LossOfConnectivity => "LOSS_OF_CONNECTIVITY",
            Self::UpPathCh => "UP_PATH_CH",
            Self::PduSesRel => "PDU_SES_REL",
            Self::PlmnCh => "PLMN_CH",
            Self::UeIpCh => "UE_IP_CH",
            Self::Ddds => "DDDS",
            Self::PduSesEst => "PDU_SES_EST",
            Self::QosMon => "QOS_MON",
            Self::PdnConnectivityStatus => "PDN_CONNECTIVITY_STATUS",
        }
    }

    /// Pub/sub topic carrying this event for one subscriber.
    pub fn channel_for(&self, subject_id: &str) -> String {
        format!("user:{subject_id}:{}", self.as_str())
    }
}

impl fmt::Display for CoreNetworkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoreNetworkEvent {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| CoreError::unknown_event(s))
    }
}

/// Key of the JSON document holding a subscriber's full state.
pub fn snapshot_key(subject_id: &str) -> String {
    format!("user:{subject_id}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PduSessionEstablishment {
    #[serde(default)]
    pub ad_ipv4_addr: Option<String>,
    #[serde(default)]
    pub dnn: Option<String>,
    #[serde(default)]
    pub pdu_se_id: Option<i32>,
    #[serde(default)]
    pub pdu_sess_type: Option<String>,
    #[serde(default)]
    pub snssai: Option<Snssai>,
    #[serde(default)]
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PduSessionRelease {
    #[serde(default)]
    pub ipv4_addr: Option<String>,
    #[serde(default)]
    pub dnn: Option<String>,
    #[serde(default)]
    pub pdu_se_id: Option<i32>,
    #[serde(default)]
    pub pdu_sess_type: Option<String>,
    #[serde(default)]
    pub snssai: Option<Snssai>,
    #[serde(default)]
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DownlinkDeliveryRecord {
    #[serde(default)]
    pub ddd_status: Option<DlDataDeliveryStatus>,
    #[serde(default)]
    pub pdu_se_id: Option<i32>,
    #[serde(default)]
    pub dnn: Option<String>,
    #[serde(default)]
    pub snssai: Option<Snssai>,
    #[serde(default)]
    pub ue_ipv4_addr: Option<String>,
    #[serde(default)]
    pub time_stamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RmInfo {
    #[serde(default)]
    pub rm_state: String,
    #[serde(default)]
    pub access_type: Option<String>,
}

impl RmInfo {
    pub fn is_registered(&self) -> bool {
        self.rm_state == "REGISTERED"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationRecord {
    #[serde(default)]
    pub rm_info: RmInfo,
    #[serde(default)]
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectivityRecord {
    #[serde(default)]
    pub cm_info: serde_json::Value,
    #[serde(default)]
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LossOfConnectivityRecord {
    pub loss_of_connect_reason: String,
    #[serde(default)]
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocationRecord {
    #[serde(default)]
    pub user_location: UserLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic_area: Option<GeographicArea>,
    #[serde(default)]
    pub time_stamp: i64,
}

/// Full per-subscriber snapshot. Session-keyed maps are ordered by session
/// id so reports built from them are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UeState {
    #[serde(rename = "PDU_SES_EST", default, deserialize_with = "null_as_default")]
    pub pdu_sess_est: BTreeMap<String, PduSessionEstablishment>,
    #[serde(rename = "PDU_SES_REL", default, deserialize_with = "null_as_default")]
    pub pdu_sess_rel: BTreeMap<String, PduSessionRelease>,
    #[serde(rename = "DDDS", default, deserialize_with = "null_as_default")]
    pub ddds: BTreeMap<String, DownlinkDeliveryRecord>,
    #[serde(rename = "REGISTRATION_STATE_REPORT", default)]
    pub registration: Option<RegistrationRecord>,
    #[serde(rename = "CONNECTIVITY_STATE_REPORT", default)]
    pub connectivity: Option<ConnectivityRecord>,
    #[serde(rename = "LOSS_OF_CONNECTIVITY", default)]
    pub loss_of_connectivity: Option<LossOfConnectivityRecord>,
    #[serde(rename = "LOCATION_REPORT", default)]
    pub location: Option<LocationRecord>,
}

impl UeState {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| CoreError::malformed_state(e.to_string()))
    }

    /// Most recent downlink delivery record, by timestamp.
    pub fn latest_ddds(&self) -> Option<&DownlinkDeliveryRecord> {
        self.ddds.values().max_by_key(|record| record.time_stamp)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Incremental update published on a subscriber channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UeStateUpdate {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(rename = "imsi", alias = "subjectId", default)]
    pub subject_id: String,
}

impl UeStateUpdate {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn event(&self) -> Result<CoreNetworkEvent> {
        self.kind.parse()
    }

    /// Decodes the `data` member into the record type for this update.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.data)
            .map_err(|e| CoreError::malformed_payload(self.kind.clone(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_names_round_trip_through_from_str() {
        for event in CoreNetworkEvent::ALL {
            assert_eq!(event.as_str().parse::<CoreNetworkEvent>().unwrap(), event);
        }
        assert!("NOPE".parse::<CoreNetworkEvent>().is_err());
        assert_eq!(
            CoreNetworkEvent::Ddds.channel_for("001010000000001"),
            "user:001010000000001:DDDS"
        );
        assert_eq!(snapshot_key("001010000000001"), "user:001010000000001");
    }

    #[test]
    fn snapshot_tolerates_null_maps_and_missing_sections() {
        let state = UeState::from_json(r#"{"PDU_SES_EST":null,"DDDS":null}"#).unwrap();
        assert!(state.pdu_sess_est.is_empty());
        assert!(state.ddds.is_empty());
        assert!(state.location.is_none());
    }

    #[test]
    fn snapshot_parses_published_records() {
        let raw = json!({
            "PDU_SES_EST": {
                "1": {
                    "AdIpv4Addr": "10.45.0.2",
                    "Dnn": "internet",
                    "PduSeId": 1,
                    "PduSessType": "IPV4",
                    "Snssai": { "sst": 1, "sd": "000001" },
                    "TimeStamp": 10
                }
            },
            "DDDS": {
                "1": { "DddStatus": "BUFFERED", "TimeStamp": 5 },
                "2": { "DddStatus": "TRANSMITTED", "TimeStamp": 9 }
            },
            "LOSS_OF_CONNECTIVITY": { "LossOfConnectReason": "DEREGISTERED", "TimeStamp": 3 },
            "REGISTRATION_STATE_REPORT": {
                "RmInfo": { "rmState": "REGISTERED", "accessType": "3GPP_ACCESS" },
                "TimeStamp": 1
            }
        });
        let state: UeState = serde_json::from_value(raw).unwrap();
        let est = &state.pdu_sess_est["1"];
        assert_eq!(est.ad_ipv4_addr.as_deref(), Some("10.45.0.2"));
        assert_eq!(est.snssai.as_ref().map(|s| s.sst), Some(1));
        assert_eq!(
            state.latest_ddds().and_then(|r| r.ddd_status),
            Some(DlDataDeliveryStatus::Transmitted)
        );
        assert_eq!(
            state.loss_of_connectivity.unwrap().loss_of_connect_reason,
            "DEREGISTERED"
        );
        assert!(state.registration.unwrap().rm_info.is_registered());
    }

    #[test]
    fn update_envelope_accepts_both_subject_keys() {
        let a = UeStateUpdate::from_json(r#"{"type":"DDDS","data":{},"imsi":"001"}"#).unwrap();
        let b = UeStateUpdate::from_json(r#"{"type":"DDDS","data":{},"subjectId":"001"}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.event().unwrap(), CoreNetworkEvent::Ddds);
    }

    #[test]
    fn decode_reports_the_event_kind_on_failure() {
        let update = UeStateUpdate {
            kind: "LOSS_OF_CONNECTIVITY".into(),
            data: json!({ "TimeStamp": "not-a-number" }),
            subject_id: "001".into(),
        };
        let err = update.decode::<LossOfConnectivityRecord>().unwrap_err();
        assert!(matches!(err, CoreError::MalformedPayload { ref event, .. } if event == "LOSS_OF_CONNECTIVITY"));
    }
}
