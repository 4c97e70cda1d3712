//! Policy authorization request models (TS 29.514 Npcf_PolicyAuthorization).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use nef_core::types::Snssai;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Audio,
    Video,
    Data,
    Application,
    Control,
    Text,
    Message,
    Other,
}

impl MediaType {
    pub const ALL: [MediaType; 8] = [
        Self::Audio,
        Self::Video,
        Self::Data,
        Self::Application,
        Self::Control,
        Self::Text,
        Self::Message,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "AUDIO",
            Self::Video => "VIDEO",
            Self::Data => "DATA",
            Self::Application => "APPLICATION",
            Self::Control => "CONTROL",
            Self::Text => "TEXT",
            Self::Message => "MESSAGE",
            Self::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStatus {
    EnabledUplink,
    EnabledDownlink,
    Enabled,
    Disabled,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowUsage {
    NoInfo,
    RtcpFlow,
    AfSignalling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSubComponent {
    pub f_num: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub f_descs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_usage: Option<FlowUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaComponent {
    pub med_comp_n: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub af_app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_status: Option<FlowStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mar_bw_dl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mar_bw_ul: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub med_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub med_sub_comps: BTreeMap<String, MediaSubComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSessionContextReqData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub af_app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ue_ipv4: Option<String>,
    pub notif_uri: String,
    pub supp_feat: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice_info: Option<Snssai>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos_duration: Option<i32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub med_components: BTreeMap<String, MediaComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSessionContext {
    pub asc_req_data: AppSessionContextReqData,
}
