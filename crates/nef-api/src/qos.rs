//! AS session with QoS API models (TS 29.122 AsSessionWithQoS).

use serde::{Deserialize, Serialize};

use nef_core::types::Snssai;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowInfo {
    pub flow_id: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow_descriptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tos_tc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsSessionWithQosSubscription {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_features: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snssai: Option<Snssai>,
    #[serde(default)]
    pub notification_destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exter_app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpsi: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow_info: Vec<FlowInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ue_ipv4_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ue_ipv6_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos_duration: Option<i32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_af_request() {
        let raw = json!({
            "ueIpv4Addr": "10.45.0.2",
            "notificationDestination": "http://af.example/qos",
            "dnn": "internet",
            "snssai": { "sst": 1, "sd": "000001" },
            "qosReference": "qos-gold",
            "flowInfo": [ { "flowId": 1, "flowDescriptions": ["permit out ip from any to 10.45.0.2"] } ],
            "requestTestNotification": true
        });
        let sub: AsSessionWithQosSubscription = serde_json::from_value(raw).unwrap();
        assert_eq!(sub.flow_info[0].flow_id, 1);
        assert_eq!(sub.snssai.as_ref().and_then(|s| s.sd.as_deref()), Some("000001"));
        assert_eq!(sub.extra["requestTestNotification"], true);
    }
}
