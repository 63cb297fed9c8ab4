//! Tag list endpoint payloads. Field names and nesting are what
//! the endpoint expects and must not change.

use crate::core::models::request::{FlexId, Geo, UserParams, VideoTargeting};
use crate::core::serializers::lenient;
use crate::core::sizes::Size;
use crate::core::spec::MediaType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Keyword {
    pub key: String,
    pub value: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagNative {
    pub layouts: Vec<Map<String, Value>>,
}

/// One slot on the tag endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Tag {
    pub sizes: Vec<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_size: Option<Size>,
    pub ad_types: Vec<MediaType>,
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub allow_smaller_sizes: bool,
    pub use_pmt_rule: bool,
    pub prebid: bool,
    pub disable_psa: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_source_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_sizes: Option<Vec<Size>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubclick: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_inv_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_imp_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<Keyword>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native: Option<TagNative>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_asset_url: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoTargeting>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sdk {
    pub source: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TagDevice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagApp {
    pub appid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GdprConsent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_required: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferrerDetection {
    pub rd_ref: String,
    pub rd_top: bool,
    pub rd_ifs: u32,
    pub rd_stk: String,
}

/// Whole tag endpoint request for one auction call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagRequest {
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserParams>,
    pub sdk: Sdk,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<TagDevice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<TagApp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr_consent: Option<GdprConsent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer_detection: Option<ReferrerDetection>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RtbBanner {
    #[serde(deserialize_with = "lenient::int")]
    pub width: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub height: Option<i64>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RtbVideo {
    #[serde(deserialize_with = "lenient::int")]
    pub player_width: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub player_height: Option<i64>,
    pub asset_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RtbNativeLink {
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient::each")]
    pub click_trackers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RtbNativeImage {
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub width: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RtbNative {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub ctatext: Option<String>,
    pub sponsored: Option<String>,
    pub link: Option<RtbNativeLink>,
    #[serde(deserialize_with = "lenient::each")]
    pub impression_trackers: Vec<String>,
    pub javascript_trackers: Option<Value>,
    pub main_img: Option<RtbNativeImage>,
    pub icon: Option<RtbNativeImage>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RtbTracker {
    #[serde(deserialize_with = "lenient::option")]
    pub impression_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerRtb {
    pub banner: Option<RtbBanner>,
    pub video: Option<RtbVideo>,
    pub native: Option<RtbNative>,
    #[serde(deserialize_with = "lenient::option")]
    pub trackers: Option<Vec<RtbTracker>>,
}

/// One candidate ad within a server tag
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerAd {
    pub ad_type: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    pub cpm: Option<f64>,
    #[serde(deserialize_with = "lenient::option")]
    pub creative_id: Option<FlexId>,
    #[serde(deserialize_with = "lenient::option")]
    pub deal_id: Option<FlexId>,
    #[serde(deserialize_with = "lenient::option")]
    pub buyer_member_id: Option<i64>,
    pub notify_url: Option<String>,
    pub renderer_url: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub renderer_id: Option<FlexId>,
    pub rtb: Option<ServerRtb>,
}

impl ServerAd {
    /// Outstream renderer script, an empty url means none
    pub fn renderer_url(&self) -> Option<&str> {
        self.renderer_url.as_deref().filter(|u| !u.is_empty())
    }
}

/// Server answer for one requested tag
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerTag {
    #[serde(deserialize_with = "lenient::option")]
    pub uuid: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub tag_id: Option<i64>,
    #[serde(deserialize_with = "lenient::each")]
    pub ads: Vec<ServerAd>,
}
