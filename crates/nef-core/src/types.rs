//! 3GPP data types shared by the core-network event model and the
//! northbound APIs (TS 29.571 common data).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snssai {
    pub sst: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlmnId {
    pub mcc: String,
    pub mnc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tai {
    pub plmn_id: PlmnId,
    pub tac: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ncgi {
    pub plmn_id: PlmnId,
    pub nr_cell_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NrLocation {
    #[serde(default)]
    pub tai: Tai,
    #[serde(default)]
    pub ncgi: Ncgi,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_of_location_information: Option<i32>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ue_location_timestamp: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographical_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geodetic_information: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nr_location: Option<NrLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eutra_location: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n3ga_location: Option<serde_json::Value>,
}

impl UserLocation {
    pub fn nr_cell_id(&self) -> Option<&str> {
        self.nr_location
            .as_ref()
            .map(|nr| nr.ncgi.nr_cell_id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupportedGadShape {
    Point,
    PointUncertaintyCircle,
    PointUncertaintyEllipse,
    Polygon,
    PointAltitude,
    PointAltitudeUncertainty,
    EllipsoidArc,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicalCoordinates {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicArea {
    pub shape: SupportedGadShape,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub point_list: Vec<GeographicalCoordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DlDataDeliveryStatus {
    Buffered,
    Transmitted,
    Discarded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_location_parses_core_network_shape() {
        let raw = json!({
            "nrLocation": {
                "tai": { "plmnId": { "mcc": "001", "mnc": "01" }, "tac": "000001" },
                "ncgi": { "plmnId": { "mcc": "001", "mnc": "01" }, "nrCellId": "000000011" },
                "ueLocationTimestamp": "2024-05-01T10:00:00Z"
            }
        });
        let loc: UserLocation = serde_json::from_value(raw).unwrap();
        assert_eq!(loc.nr_cell_id(), Some("000000011"));
        let nr = loc.nr_location.unwrap();
        assert_eq!(nr.tai.plmn_id.mcc, "001");
        assert!(nr.ue_location_timestamp.is_some());
        assert!(nr.age_of_location_information.is_none());
    }

    #[test]
    fn empty_cell_id_is_absent() {
        let loc = UserLocation {
            nr_location: Some(NrLocation::default()),
            ..Default::default()
        };
        assert_eq!(loc.nr_cell_id(), None);
        assert_eq!(UserLocation::default().nr_cell_id(), None);
    }

    #[test]
    fn gad_shape_uses_wire_names() {
        let area = GeographicArea {
            shape: SupportedGadShape::Polygon,
            point_list: vec![GeographicalCoordinates { lon: 2.0, lat: 48.0 }],
        };
        let v = serde_json::to_value(&area).unwrap();
        assert_eq!(v["shape"], "POLYGON");
        assert_eq!(v["pointList"][0]["lat"], 48.0);
    }
}
