//! Monitoring event reports built from core network state.
//!
//! Two entry points: [`immediate_report`] works on a full [`UeState`]
//! snapshot at subscription time, and the [`ReportHandler`]s in
//! [`ReportDispatch`] turn one published [`UeStateUpdate`] into a report
//! for a running relay.

use std::collections::HashMap;

use nef_api::monitoring::{
    LocationInfo, MonitoringEventReport, MonitoringType, PdnConnectionInformation,
    PdnConnectionStatus, PdnType, PduSessionInformation, PositioningMethod, ReachabilityType,
};
use nef_core::ue_state::{
    DownlinkDeliveryRecord, LocationRecord, LossOfConnectivityRecord, PduSessionEstablishment,
    PduSessionRelease, RegistrationRecord,
};
use nef_core::{
    CoreNetworkEvent, GeographicArea, GeographicalCoordinates, SupportedGadShape, UeState,
    UeStateUpdate, age_seconds, from_unix,
};
use time::OffsetDateTime;

use super::error::ReportError;

const MOCK_BASE_LAT: f64 = 48.8566;
const MOCK_BASE_LON: f64 = 2.3522;
const MOCK_HALF_SIDE: f64 = 0.001;

/// Core network channel feeding a monitoring type, `None` when unsupported.
pub fn core_network_channel(monitoring_type: MonitoringType) -> Option<CoreNetworkEvent> {
    match monitoring_type {
        MonitoringType::UeReachability => Some(CoreNetworkEvent::ReachabilityReport),
        MonitoringType::LocationReporting => Some(CoreNetworkEvent::LocationReport),
        MonitoringType::LossOfConnectivity => Some(CoreNetworkEvent::LossOfConnectivity),
        MonitoringType::DownlinkDataDeliveryStatus => Some(CoreNetworkEvent::Ddds),
        MonitoringType::PdnConnectivityStatus => Some(CoreNetworkEvent::PdnConnectivityStatus),
        _ => None,
    }
}

/// Square polygon around a point derived from the cell id.
///
/// The core network reports cells, not coordinates; AFs expecting a
/// geographic area get a stable synthetic one per cell.
pub fn mock_geographic_area(cell_id: &str) -> GeographicArea {
    let offset = cell_id
        .as_bytes()
        .last()
        .map(|b| f64::from(b % 10) * 0.01)
        .unwrap_or(0.0);
    let (lat, lon) = (MOCK_BASE_LAT + offset, MOCK_BASE_LON + offset);

    let point = |dlat: f64, dlon: f64| GeographicalCoordinates {
        lat: lat + dlat,
        lon: lon + dlon,
    };
    GeographicArea {
        shape: SupportedGadShape::Polygon,
        point_list: vec![
            point(MOCK_HALF_SIDE, MOCK_HALF_SIDE),
            point(MOCK_HALF_SIDE, -MOCK_HALF_SIDE),
            point(-MOCK_HALF_SIDE, -MOCK_HALF_SIDE),
            point(-MOCK_HALF_SIDE, MOCK_HALF_SIDE),
        ],
    }
}

/// Report reflecting the current state of the UE.
pub fn immediate_report(
    external_id: Option<&str>,
    monitoring_type: MonitoringType,
    ue: &UeState,
    now: OffsetDateTime,
) -> Result<MonitoringEventReport, ReportError> {
    let mut report =
        MonitoringEventReport::new(monitoring_type, external_id.map(str::to_string), now);

    match monitoring_type {
        MonitoringType::LocationReporting => {
            if let Some(location) = &ue.location {
                report.location_info = Some(snapshot_location(location, now));
            }
        }
        MonitoringType::LossOfConnectivity => {
            report.loss_of_connect_reason = ue
                .loss_of_connectivity
                .as_ref()
                .map(|loss| loss.loss_of_connect_reason.clone());
        }
        MonitoringType::DownlinkDataDeliveryStatus => {
            if let Some(latest) = ue.latest_ddds() {
                report.pdu_sess_info = Some(
                    session_info(
                        latest.dnn.as_deref(),
                        latest.snssai.as_ref(),
                        latest.ue_ipv4_addr.as_deref(),
                    )
                    .ok_or(ReportError::MissingField("Dnn, Snssai or UeIpv4Addr"))?,
                );
                report.ddd_status = latest.ddd_status;
            }
        }
        MonitoringType::PdnConnectivityStatus => {
            report.pdn_conn_info_list = Some(pdn_connections(ue));
        }
        MonitoringType::UeReachability => {
            if ue
                .registration
                .as_ref()
                .is_some_and(|record| record.rm_info.is_registered())
            {
                report.reachability_type = Some(ReachabilityType::Data);
            }
        }
        other => return Err(ReportError::Unsupported(other)),
    }

    Ok(report)
}

fn snapshot_location(location: &LocationRecord, now: OffsetDateTime) -> LocationInfo {
    let age = age_seconds(location.time_stamp, now);
    let mut user_location = location.user_location.clone();
    if let Some(nr) = user_location.nr_location.as_mut() {
        nr.age_of_location_information = Some(age);
        nr.ue_location_timestamp = Some(from_unix(location.time_stamp));
    }
    let cell_id = location.user_location.nr_cell_id().map(str::to_string);
    let geographic_area = location
        .geographic_area
        .clone()
        .unwrap_or_else(|| mock_geographic_area(cell_id.as_deref().unwrap_or_default()));

    LocationInfo {
        age_of_location_info: Some(age),
        cell_id,
        user_location: Some(user_location),
        geographic_area: Some(geographic_area),
        position_method: None,
    }
}

/// Establishment-derived entries first, then releases with no
/// establishment. Each list is in session id order.
fn pdn_connections(ue: &UeState) -> Vec<PdnConnectionInformation> {
    let mut list = Vec::with_capacity(ue.pdu_sess_est.len() + ue.pdu_sess_rel.len());

    for (id, est) in &ue.pdu_sess_est {
        match ue.pdu_sess_rel.get(id) {
            Some(rel) if rel.time_stamp > est.time_stamp => list.push(released(rel)),
            _ => list.push(PdnConnectionInformation {
                status: PdnConnectionStatus::Created,
                apn: est.dnn.clone(),
                pdn_type: PdnType::Ipv4,
                ipv4_addr: est.ad_ipv4_addr.clone(),
            }),
        }
    }
    list.extend(
        ue.pdu_sess_rel
            .iter()
            .filter(|(id, _)| !ue.pdu_sess_est.contains_key(*id))
            .map(|(_, rel)| released(rel)),
    );
    list
}

fn released(rel: &PduSessionRelease) -> PdnConnectionInformation {
    PdnConnectionInformation {
        status: PdnConnectionStatus::Released,
        apn: rel.dnn.clone(),
        pdn_type: PdnType::Ipv4,
        ipv4_addr: rel.ipv4_addr.clone(),
    }
}

fn session_info(
    dnn: Option<&str>,
    snssai: Option<&nef_core::Snssai>,
    ipv4: Option<&str>,
) -> Option<PduSessionInformation> {
    Some(PduSessionInformation {
        snssai: snssai?.clone(),
        dnn: dnn?.to_string(),
        ue_ipv4: Some(ipv4?.to_string()),
    })
}

/// Who a relay reports on and where its reports go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTarget {
    pub location: String,
    pub subject_id: String,
    /// Identity the AF subscribed with, echoed in reports when present
    pub external_id: Option<String>,
    pub notification_destination: String,
}

impl RelayTarget {
    fn reported_id(&self, update: &UeStateUpdate) -> Option<String> {
        self.external_id
            .clone()
            .or_else(|| Some(update.subject_id.clone()).filter(|id| !id.is_empty()))
            .or_else(|| Some(self.subject_id.clone()))
    }
}

/// Builds the report for one update. `Ok(None)` means the update does not
/// warrant a notification.
pub type ReportHandler =
    fn(&RelayTarget, &UeStateUpdate) -> Result<Option<MonitoringEventReport>, ReportError>;

fn location_report(
    target: &RelayTarget,
    update: &UeStateUpdate,
) -> Result<Option<MonitoringEventReport>, ReportError> {
    let record: LocationRecord = update.decode()?;
    let nr = record.user_location.nr_location.clone().unwrap_or_default();

    let mut report = MonitoringEventReport::new(
        MonitoringType::LocationReporting,
        target.reported_id(update),
        from_unix(record.time_stamp),
    );
    report.plmn_id = Some(nr.tai.plmn_id.clone());
    report.location_info = Some(LocationInfo {
        age_of_location_info: Some(age_seconds(record.time_stamp, nef_core::now_utc())),
        cell_id: Some(nr.ncgi.nr_cell_id.clone()).filter(|id| !id.is_empty()),
        user_location: Some(record.user_location),
        geographic_area: record.geographic_area,
        position_method: Some(PositioningMethod::CellId),
    });
    Ok(Some(report))
}

fn ddds_report(
    target: &RelayTarget,
    update: &UeStateUpdate,
) -> Result<Option<MonitoringEventReport>, ReportError> {
    let record: DownlinkDeliveryRecord = update.decode()?;
    let mut report = MonitoringEventReport::new(
        MonitoringType::DownlinkDataDeliveryStatus,
        target.reported_id(update),
        from_unix(record.time_stamp),
    );
    report.ddd_status = record.ddd_status;
    report.pdu_sess_info = session_info(
        record.dnn.as_deref(),
        record.snssai.as_ref(),
        record.ue_ipv4_addr.as_deref(),
    );
    Ok(Some(report))
}

fn pdn_status_report(
    target: &RelayTarget,
    update: &UeStateUpdate,
) -> Result<Option<MonitoringEventReport>, ReportError> {
    let (status, info, time_stamp) = if update.kind == CoreNetworkEvent::PduSesEst.as_str() {
        let est: PduSessionEstablishment = update.decode()?;
        let info = session_info(
            est.dnn.as_deref(),
            est.snssai.as_ref(),
            est.ad_ipv4_addr.as_deref(),
        );
        (PdnConnectionStatus::Created, info, est.time_stamp)
    } else {
        let rel: PduSessionRelease = update.decode()?;
        let info = session_info(
            rel.dnn.as_deref(),
            rel.snssai.as_ref(),
            rel.ipv4_addr.as_deref(),
        );
        (PdnConnectionStatus::Released, info, rel.time_stamp)
    };
    let info = info.ok_or(ReportError::MissingField("Dnn, Snssai or IPv4 address"))?;

    let mut report = MonitoringEventReport::new(
        MonitoringType::PdnConnectivityStatus,
        target.reported_id(update),
        from_unix(time_stamp),
    );
    report.pdn_conn_info_list = Some(vec![PdnConnectionInformation {
        status,
        apn: Some(info.dnn.clone()),
        pdn_type: PdnType::Ipv4,
        ipv4_addr: info.ue_ipv4.clone(),
    }]);
    report.pdu_sess_info = Some(info);
    Ok(Some(report))
}

fn loss_of_connectivity_report(
    target: &RelayTarget,
    update: &UeStateUpdate,
) -> Result<Option<MonitoringEventReport>, ReportError> {
    let record: LossOfConnectivityRecord = update.decode()?;
    let mut report = MonitoringEventReport::new(
        MonitoringType::LossOfConnectivity,
        target.reported_id(update),
        from_unix(record.time_stamp),
    );
    report.loss_of_connect_reason = Some(record.loss_of_connect_reason);
    Ok(Some(report))
}

fn reachability_report(
    target: &RelayTarget,
    update: &UeStateUpdate,
) -> Result<Option<MonitoringEventReport>, ReportError> {
    let record: RegistrationRecord = update.decode()?;
    if !record.rm_info.is_registered() {
        tracing::debug!(
            subject_id = %target.subject_id,
            rm_state = %record.rm_info.rm_state,
            "UE not reachable, no report"
        );
        return Ok(None);
    }
    let mut report = MonitoringEventReport::new(
        MonitoringType::UeReachability,
        target.reported_id(update),
        from_unix(record.time_stamp),
    );
    report.reachability_type = Some(ReachabilityType::Data);
    Ok(Some(report))
}

/// Monitoring type to relay handler table, built once per service.
#[derive(Clone)]
pub struct ReportDispatch {
    handlers: HashMap<MonitoringType, ReportHandler>,
}

impl Default for ReportDispatch {
    fn default() -> Self {
        let mut handlers: HashMap<MonitoringType, ReportHandler> = HashMap::new();
        handlers.insert(MonitoringType::LocationReporting, location_report);
        handlers.insert(MonitoringType::DownlinkDataDeliveryStatus, ddds_report);
        handlers.insert(MonitoringType::PdnConnectivityStatus, pdn_status_report);
        handlers.insert(MonitoringType::LossOfConnectivity, loss_of_connectivity_report);
        handlers.insert(MonitoringType::UeReachability, reachability_report);
        Self { handlers }
    }
}

impl ReportDispatch {
    pub fn handler(&self, monitoring_type: MonitoringType) -> Option<ReportHandler> {
        self.handlers.get(&monitoring_type).copied()
    }

    pub fn supports(&self, monitoring_type: MonitoringType) -> bool {
        self.handlers.contains_key(&monitoring_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nef_api::DlDataDeliveryStatus;
    use serde_json::json;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-05-01 12:00:00 UTC);

    fn state(raw: serde_json::Value) -> UeState {
        serde_json::from_value(raw).unwrap()
    }

    fn target() -> RelayTarget {
        RelayTarget {
            location: "/3gpp-monitoring-event/v1/af-1/subscriptions/s-1".into(),
            subject_id: "001010000000001".into(),
            external_id: Some("ext-1".into()),
            notification_destination: "http://af.example/notify".into(),
        }
    }

    fn update(kind: &str, data: serde_json::Value) -> UeStateUpdate {
        UeStateUpdate {
            kind: kind.into(),
            data,
            subject_id: "001010000000001".into(),
        }
    }

    fn location_json(ts: i64) -> serde_json::Value {
        json!({
            "UserLocation": {
                "nrLocation": {
                    "tai": { "plmnId": { "mcc": "001", "mnc": "01" }, "tac": "000001" },
                    "ncgi": { "plmnId": { "mcc": "001", "mnc": "01" }, "nrCellId": "000000013" }
                }
            },
            "TimeStamp": ts
        })
    }

    #[test]
    fn channel_mapping_covers_supported_types_only() {
        assert_eq!(
            core_network_channel(MonitoringType::UeReachability),
            Some(CoreNetworkEvent::ReachabilityReport)
        );
        assert_eq!(
            core_network_channel(MonitoringType::DownlinkDataDeliveryStatus),
            Some(CoreNetworkEvent::Ddds)
        );
        assert_eq!(core_network_channel(MonitoringType::RoamingStatus), None);
        assert_eq!(core_network_channel(MonitoringType::Unknown), None);

        let dispatch = ReportDispatch::default();
        for t in [
            MonitoringType::LocationReporting,
            MonitoringType::UeReachability,
            MonitoringType::LossOfConnectivity,
            MonitoringType::DownlinkDataDeliveryStatus,
            MonitoringType::PdnConnectivityStatus,
        ] {
            assert!(core_network_channel(t).is_some());
            assert!(dispatch.supports(t));
        }
        assert!(dispatch.handler(MonitoringType::NumOfRegdUes).is_none());
    }

    #[test]
    fn pdn_session_released_after_establishment() {
        let ue = state(json!({
            "PDU_SES_EST": { "1": { "Dnn": "internet", "AdIpv4Addr": "10.45.0.2", "TimeStamp": 10 } },
            "PDU_SES_REL": { "1": { "Dnn": "internet", "Ipv4Addr": "10.45.0.2", "TimeStamp": 20 } }
        }));
        let report =
            immediate_report(Some("ext-1"), MonitoringType::PdnConnectivityStatus, &ue, NOW)
                .unwrap();
        let list = report.pdn_conn_info_list.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].status, PdnConnectionStatus::Released);
        assert_eq!(list[0].pdn_type, PdnType::Ipv4);
    }

    #[test]
    fn pdn_session_without_release_is_created() {
        let ue = state(json!({
            "PDU_SES_EST": { "1": { "Dnn": "internet", "AdIpv4Addr": "10.45.0.2", "TimeStamp": 10 } }
        }));
        let report =
            immediate_report(None, MonitoringType::PdnConnectivityStatus, &ue, NOW).unwrap();
        let list = report.pdn_conn_info_list.unwrap();
        assert_eq!(list[0].status, PdnConnectionStatus::Created);
        assert_eq!(list[0].apn.as_deref(), Some("internet"));
        assert_eq!(list[0].ipv4_addr.as_deref(), Some("10.45.0.2"));
    }

    #[test]
    fn pdn_list_orders_establishments_before_orphan_releases() {
        let ue = state(json!({
            "PDU_SES_EST": {
                "2": { "Dnn": "ims", "TimeStamp": 30 },
                "1": { "Dnn": "internet", "TimeStamp": 10 }
            },
            "PDU_SES_REL": {
                "1": { "Dnn": "internet", "TimeStamp": 5 },
                "0": { "Dnn": "old", "Ipv4Addr": "10.45.0.9", "TimeStamp": 1 }
            }
        }));
        let list = immediate_report(None, MonitoringType::PdnConnectivityStatus, &ue, NOW)
            .unwrap()
            .pdn_conn_info_list
            .unwrap();
        let summary: Vec<_> = list
            .iter()
            .map(|p| (p.apn.as_deref().unwrap(), p.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("internet", PdnConnectionStatus::Created),
                ("ims", PdnConnectionStatus::Created),
                ("old", PdnConnectionStatus::Released),
            ]
        );
    }

    #[test]
    fn ddds_picks_most_recent_record() {
        let ue = state(json!({
            "DDDS": {
                "a": { "DddStatus": "BUFFERED", "Dnn": "internet", "Snssai": { "sst": 1 }, "UeIpv4Addr": "10.0.0.1", "TimeStamp": 50 },
                "b": { "DddStatus": "DISCARDED", "Dnn": "internet", "Snssai": { "sst": 1 }, "UeIpv4Addr": "10.0.0.1", "TimeStamp": 90 },
                "c": { "DddStatus": "TRANSMITTED", "Dnn": "internet", "Snssai": { "sst": 1 }, "UeIpv4Addr": "10.0.0.1", "TimeStamp": 70 }
            }
        }));
        let report =
            immediate_report(None, MonitoringType::DownlinkDataDeliveryStatus, &ue, NOW).unwrap();
        assert_eq!(report.ddd_status, Some(DlDataDeliveryStatus::Discarded));
        assert_eq!(report.pdu_sess_info.unwrap().dnn, "internet");
    }

    #[test]
    fn ddds_without_records_is_empty_report() {
        let report = immediate_report(
            None,
            MonitoringType::DownlinkDataDeliveryStatus,
            &UeState::default(),
            NOW,
        )
        .unwrap();
        assert!(report.ddd_status.is_none());
        assert!(report.pdu_sess_info.is_none());
    }

    #[test]
    fn location_age_is_recomputed_and_area_synthesized() {
        let ts = NOW.unix_timestamp() - 42;
        let ue = state(json!({ "LOCATION_REPORT": location_json(ts) }));
        let report =
            immediate_report(Some("ext-1"), MonitoringType::LocationReporting, &ue, NOW).unwrap();
        assert_eq!(report.external_id.as_deref(), Some("ext-1"));

        let info = report.location_info.unwrap();
        assert_eq!(info.age_of_location_info, Some(42));
        assert_eq!(info.cell_id.as_deref(), Some("000000013"));
        let nr = info.user_location.unwrap().nr_location.unwrap();
        assert_eq!(nr.age_of_location_information, Some(42));
        assert_eq!(nr.ue_location_timestamp, Some(from_unix(ts)));

        let area = info.geographic_area.unwrap();
        assert_eq!(area.shape, SupportedGadShape::Polygon);
        assert_eq!(area, mock_geographic_area("000000013"));
    }

    #[test]
    fn mock_area_offsets_by_last_byte() {
        // '3' is byte 51
        let area = mock_geographic_area("000000013");
        let expected_lat = MOCK_BASE_LAT + 0.01 + MOCK_HALF_SIDE;
        assert!((area.point_list[0].lat - expected_lat).abs() < 1e-9);
        assert_eq!(area.point_list.len(), 4);

        let empty = mock_geographic_area("");
        assert!((empty.point_list[2].lon - (MOCK_BASE_LON - MOCK_HALF_SIDE)).abs() < 1e-9);
    }

    #[test]
    fn loss_of_connectivity_reason_is_verbatim() {
        let ue = state(json!({
            "LOSS_OF_CONNECTIVITY": { "LossOfConnectReason": "MAX_DETECTION_TIME_EXPIRED", "TimeStamp": 3 }
        }));
        let report =
            immediate_report(None, MonitoringType::LossOfConnectivity, &ue, NOW).unwrap();
        assert_eq!(
            report.loss_of_connect_reason.as_deref(),
            Some("MAX_DETECTION_TIME_EXPIRED")
        );
    }

    #[test]
    fn immediate_reachability_follows_registration_state() {
        let registered: UeState = serde_json::from_value(json!({
            "REGISTRATION_STATE_REPORT": { "RmInfo": { "rmState": "REGISTERED" }, "TimeStamp": 1 }
        }))
        .unwrap();
        let report =
            immediate_report(None, MonitoringType::UeReachability, &registered, NOW).unwrap();
        assert_eq!(report.reachability_type, Some(ReachabilityType::Data));

        let report =
            immediate_report(None, MonitoringType::UeReachability, &UeState::default(), NOW)
                .unwrap();
        assert_eq!(report.reachability_type, None);
    }

    #[test]
    fn other_types_have_no_immediate_report() {
        let err = immediate_report(None, MonitoringType::RoamingStatus, &UeState::default(), NOW)
            .unwrap_err();
        assert!(matches!(err, ReportError::Unsupported(MonitoringType::RoamingStatus)));
    }

    #[test]
    fn relay_location_report_carries_plmn_and_method() {
        let ts = 1_714_564_800;
        let report = location_report(&target(), &update("LOCATION_REPORT", location_json(ts)))
            .unwrap()
            .unwrap();
        assert_eq!(report.event_time, from_unix(ts));
        assert_eq!(report.plmn_id.unwrap().mcc, "001");
        let info = report.location_info.unwrap();
        assert_eq!(info.position_method, Some(PositioningMethod::CellId));
        assert_eq!(info.cell_id.as_deref(), Some("000000013"));
        assert!(info.age_of_location_info.unwrap() >= 0);
    }

    #[test]
    fn relay_ddds_session_info_requires_all_fields() {
        let partial = update("DDDS", json!({ "DddStatus": "BUFFERED", "Dnn": "internet", "TimeStamp": 4 }));
        let report = ddds_report(&target(), &partial).unwrap().unwrap();
        assert_eq!(report.ddd_status, Some(DlDataDeliveryStatus::Buffered));
        assert!(report.pdu_sess_info.is_none());

        let full = update(
            "DDDS",
            json!({ "DddStatus": "TRANSMITTED", "Dnn": "internet", "Snssai": { "sst": 1, "sd": "000001" }, "UeIpv4Addr": "10.45.0.2", "TimeStamp": 4 }),
        );
        let info = ddds_report(&target(), &full).unwrap().unwrap().pdu_sess_info.unwrap();
        assert_eq!(info.ue_ipv4.as_deref(), Some("10.45.0.2"));
    }

    #[test]
    fn relay_pdn_status_follows_envelope_type() {
        let data = json!({ "Dnn": "internet", "Snssai": { "sst": 1 }, "AdIpv4Addr": "10.45.0.2", "Ipv4Addr": "10.45.0.2", "TimeStamp": 9 });
        let created = pdn_status_report(&target(), &update("PDU_SES_EST", data.clone()))
            .unwrap()
            .unwrap();
        assert_eq!(
            created.pdn_conn_info_list.unwrap()[0].status,
            PdnConnectionStatus::Created
        );
        let released = pdn_status_report(&target(), &update("PDU_SES_REL", data))
            .unwrap()
            .unwrap();
        assert_eq!(
            released.pdn_conn_info_list.unwrap()[0].status,
            PdnConnectionStatus::Released
        );

        let missing = pdn_status_report(&target(), &update("PDU_SES_EST", json!({ "TimeStamp": 1 })));
        assert!(matches!(missing, Err(ReportError::MissingField(_))));
    }

    #[test]
    fn relay_reachability_only_when_registered() {
        let registered = update(
            "REACHABILITY_REPORT",
            json!({ "RmInfo": { "rmState": "REGISTERED" }, "TimeStamp": 2 }),
        );
        let report = reachability_report(&target(), &registered).unwrap().unwrap();
        assert_eq!(report.reachability_type, Some(ReachabilityType::Data));

        let deregistered = update(
            "REACHABILITY_REPORT",
            json!({ "RmInfo": { "rmState": "DEREGISTERED" }, "TimeStamp": 3 }),
        );
        assert!(reachability_report(&target(), &deregistered).unwrap().is_none());
    }

    #[test]
    fn malformed_update_is_an_error() {
        let bad = update("LOSS_OF_CONNECTIVITY", json!({ "TimeStamp": 1 }));
        assert!(matches!(
            loss_of_connectivity_report(&target(), &bad),
            Err(ReportError::Malformed(_))
        ));
    }

    #[test]
    fn reports_echo_external_id_or_subject() {
        let mut t = target();
        let u = update("LOSS_OF_CONNECTIVITY", json!({ "LossOfConnectReason": "PURGED", "TimeStamp": 1 }));
        let r = loss_of_connectivity_report(&t, &u).unwrap().unwrap();
        assert_eq!(r.external_id.as_deref(), Some("ext-1"));

        t.external_id = None;
        let r = loss_of_connectivity_report(&t, &u).unwrap().unwrap();
        assert_eq!(r.external_id.as_deref(), Some("001010000000001"));
    }
}
