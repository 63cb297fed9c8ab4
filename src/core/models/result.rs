use crate::core::render::{OutstreamAd, RendererHandle};
use crate::core::spec::MediaType;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NativeImage {
    pub url: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// Native asset bundle in the generic vocabulary
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NativeAd {
    pub title: Option<String>,
    pub body: Option<String>,
    pub cta: Option<String>,
    pub sponsored_by: Option<String>,
    pub click_url: Option<String>,
    pub click_trackers: Vec<String>,
    pub impression_trackers: Vec<String>,
    pub javascript_trackers: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<NativeImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<NativeImage>,
}

/// What the orchestrator renders for a bid
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Creative {
    /// Html markup, banner
    Markup { ad: String },
    /// Video delivered by VAST url
    #[serde(rename_all = "camelCase")]
    Vast {
        vast_url: Option<String>,
        vast_imp_url: Option<String>,
    },
    Native { native: NativeAd },
}

/// Adapter scoped metadata
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BidMeta {
    pub buyer_member_id: Option<i64>,
}

/// The unified bid handed back to the orchestrator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBidResult {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_unit_code: Option<String>,
    pub cpm: f64,
    pub currency: String,
    pub net_revenue: bool,
    pub ttl: u32,
    pub creative_id: Option<String>,
    pub deal_id: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub media_type: MediaType,
    #[serde(flatten)]
    pub creative: Creative,
    /// Raw server payload kept for an outstream renderer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_response: Option<Value>,
    #[serde(skip)]
    pub renderer: Option<Arc<dyn RendererHandle>>,
    pub meta: BidMeta,
}

impl CanonicalBidResult {
    /// Creative size as `WxH`
    pub fn size(&self) -> Option<(i64, i64)> {
        Some((self.width?, self.height?))
    }

    pub fn markup(&self) -> Option<&str> {
        match &self.creative {
            Creative::Markup { ad } => Some(ad),
            _ => None,
        }
    }

    /// What the renderer hands to the host when this outstream
    /// bid is rendered. `None` for bids without a raw payload
    pub fn outstream_ad(&self) -> Option<OutstreamAd> {
        let ad_response = self.ad_response.clone()?;

        Some(OutstreamAd {
            tag_id: ad_response.get("tag_id").and_then(Value::as_i64),
            sizes: (self.width, self.height),
            target_id: self.ad_unit_code.clone(),
            uuid: ad_response
                .get("uuid")
                .and_then(Value::as_str)
                .unwrap_or(&self.request_id)
                .to_string(),
            renderer_options: self.renderer.as_ref().map(|r| r.config()),
            ad_response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result() -> CanonicalBidResult {
        CanonicalBidResult {
            request_id: "b1".into(),
            ad_unit_code: Some("div-b1".into()),
            cpm: 1.0,
            currency: "USD".into(),
            net_revenue: true,
            ttl: 3600,
            creative_id: None,
            deal_id: None,
            width: Some(640),
            height: Some(480),
            media_type: MediaType::Video,
            creative: Creative::Vast {
                vast_url: Some("https://v.example.com".into()),
                vast_imp_url: None,
            },
            ad_response: None,
            renderer: None,
            meta: BidMeta::default(),
        }
    }

    #[test]
    fn test_serializes_flattened_creative() {
        let body = serde_json::to_value(result()).unwrap();

        assert_eq!(body["requestId"], json!("b1"));
        assert_eq!(body["vastUrl"], json!("https://v.example.com"));
        assert_eq!(body["mediaType"], json!("video"));
        assert!(body.get("renderer").is_none());
        assert!(body.get("adResponse").is_none());
    }

    #[test]
    fn test_outstream_ad_from_payload() {
        let mut bid = result();
        assert!(bid.outstream_ad().is_none());

        bid.ad_response = Some(json!({"uuid": "b1", "tag_id": 99}));
        let ad = bid.outstream_ad().unwrap();

        assert_eq!(ad.tag_id, Some(99));
        assert_eq!(ad.sizes, (Some(640), Some(480)));
        assert_eq!(ad.target_id.as_deref(), Some("div-b1"));
        assert_eq!(ad.uuid, "b1");
    }
}
