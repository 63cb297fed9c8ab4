use crate::core::demand::takerate::markdown_bid;
use crate::core::events::injectors::adm::inject_banner_beacon;
use crate::core::models::policy::PolicyConfig;
use crate::core::models::request::{CanonicalBidRequest, FlexId, match_request};
use crate::core::models::result::{
    BidMeta, CanonicalBidResult, Creative, NativeAd, NativeImage,
};
use crate::core::render::{RenderHost, install_outstream_renderer};
use crate::core::spec::MediaType;
use crate::core::wire::tags::{RtbNativeImage, ServerAd, ServerRtb, ServerTag};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

fn native_image(img: &RtbNativeImage) -> NativeImage {
    NativeImage {
        url: img.url.clone(),
        width: img.width,
        height: img.height,
    }
}

/// Raw tag with the first ad promoted to `ad` and its video
/// payload lifted to `ad.video`, the shape outstream players read
fn outstream_payload(raw_tag: &Value) -> Value {
    let mut payload = raw_tag.clone();

    let ad = payload
        .get("ads")
        .and_then(|ads| ads.get(0))
        .cloned()
        .map(|mut ad| {
            let video = ad.pointer("/rtb/video").cloned().unwrap_or(Value::Null);
            if let Some(obj) = ad.as_object_mut() {
                obj.insert("video".into(), video);
            }
            ad
        });

    if let (Some(obj), Some(ad)) = (payload.as_object_mut(), ad) {
        obj.insert("ad".into(), ad);
    }

    payload
}

struct Extracted {
    width: Option<i64>,
    height: Option<i64>,
    creative: Creative,
    ttl: u32,
    outstream: bool,
}

fn extract_creative(ad: &ServerAd, rtb: &ServerRtb, policy: &PolicyConfig) -> Extracted {
    if let Some(video) = &rtb.video {
        return Extracted {
            width: video.player_width,
            height: video.player_height,
            creative: Creative::Vast {
                vast_url: video.asset_url.clone(),
                vast_imp_url: ad.notify_url.clone(),
            },
            ttl: policy.video_ttl,
            outstream: ad.renderer_url().is_some(),
        };
    }

    if let Some(native) = &rtb.native {
        let link = native.link.clone().unwrap_or_default();
        return Extracted {
            width: None,
            height: None,
            creative: Creative::Native {
                native: NativeAd {
                    title: native.title.clone(),
                    body: native.desc.clone(),
                    cta: native.ctatext.clone(),
                    sponsored_by: native.sponsored.clone(),
                    click_url: link.url,
                    click_trackers: link.click_trackers,
                    impression_trackers: native.impression_trackers.clone(),
                    javascript_trackers: native.javascript_trackers.clone(),
                    image: native.main_img.as_ref().map(native_image),
                    icon: native.icon.as_ref().map(native_image),
                },
            },
            ttl: policy.banner_ttl,
            outstream: false,
        };
    }

    let banner = rtb.banner.clone().unwrap_or_default();
    let content = banner.content.unwrap_or_default();

    let beacon = rtb
        .trackers
        .as_ref()
        .and_then(|t| t.first())
        .and_then(|t| t.impression_urls.as_ref())
        .and_then(|urls| urls.first())
        .map(String::as_str);

    let markup = match inject_banner_beacon(beacon, &content) {
        Ok(markup) => markup,
        Err(e) => {
            error!("Error appending tracking pixel: {}", e);
            content
        }
    };

    Extracted {
        width: banner.width,
        height: banner.height,
        creative: Creative::Markup { ad: markup },
        ttl: policy.banner_ttl,
        outstream: false,
    }
}

fn normalize_tag(
    raw_tag: &Value,
    requests: &[CanonicalBidRequest],
    policy: &PolicyConfig,
    render_host: Option<&Arc<dyn RenderHost>>,
) -> Option<CanonicalBidResult> {
    let tag = match ServerTag::deserialize(raw_tag) {
        Ok(tag) => tag,
        Err(e) => {
            warn!("Skipping malformed server tag: {}", e);
            return None;
        }
    };

    let uuid = tag.uuid.clone().unwrap_or_default();

    let Some((ad, rtb)) = tag
        .ads
        .iter()
        .find_map(|ad| ad.rtb.as_ref().map(|rtb| (ad, rtb)))
    else {
        debug!(uuid = %uuid, "Tag has no rtb ad, no bid");
        return None;
    };

    let cpm = ad.cpm.unwrap_or(0.0);
    if cpm == 0.0 {
        debug!(uuid = %uuid, "Dropping zero price candidate");
        return None;
    }

    let Some(media_type) = MediaType::from_ad_type(ad.ad_type.as_deref()) else {
        debug!(uuid = %uuid, ad_type = ?ad.ad_type, "Dropping unsupported ad type");
        return None;
    };

    let request = match_request(requests, &uuid);
    let extracted = extract_creative(ad, rtb, policy);

    let mut result = CanonicalBidResult {
        request_id: uuid,
        ad_unit_code: request.map(|r| r.ad_unit_code.clone()),
        cpm: markdown_bid(cpm, policy.take_rate),
        currency: policy.currency.clone(),
        net_revenue: true,
        ttl: extracted.ttl,
        creative_id: ad.creative_id.as_ref().map(FlexId::to_string),
        deal_id: ad.deal_id.as_ref().map(FlexId::to_string),
        width: extracted.width,
        height: extracted.height,
        media_type,
        creative: extracted.creative,
        ad_response: None,
        renderer: None,
        meta: BidMeta {
            buyer_member_id: ad.buyer_member_id,
        },
    };

    if extracted.outstream {
        result.ad_response = Some(outstream_payload(raw_tag));

        if let (Some(host), Some(url)) = (render_host, ad.renderer_url()) {
            result.renderer = Some(install_outstream_renderer(
                host.clone(),
                ad.renderer_id.as_ref().map(FlexId::to_string),
                url,
                result.ad_unit_code.clone().unwrap_or_default(),
                request.and_then(|r| r.renderer_options.clone()),
            ));
        }
    }

    Some(result)
}

/// Normalizes a tag endpoint body into canonical bids, one per
/// tag at most. Every accepted price is reduced by the take rate
pub fn normalize_tags(
    body: &Value,
    requests: &[CanonicalBidRequest],
    policy: &PolicyConfig,
    render_host: Option<&Arc<dyn RenderHost>>,
) -> Vec<CanonicalBidResult> {
    let Some(tags) = body.get("tags").and_then(Value::as_array) else {
        warn!("Tag response carries no tag list");
        return Vec::new();
    };

    tags.iter()
        .filter_map(|tag| normalize_tag(tag, requests, policy, render_host))
        .collect()
}
