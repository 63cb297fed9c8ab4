use crate::core::models::context::AuctionContext;
use crate::core::models::policy::PolicyConfig;
use crate::core::models::request::{BidParams, CanonicalBidRequest, FlexId, UserParams};
use crate::core::native::NativeAssetMapper;
use crate::core::sizes::{normalize_sizes, parse_int_str};
use crate::core::spec::uri::encode_component;
use crate::core::spec::{MediaType, VideoContext};
use crate::core::wire::tags::{
    GdprConsent, Keyword, ReferrerDetection, Sdk, Tag, TagApp, TagDevice, TagNative, TagRequest,
};
use serde_json::{Map, Value};
use tracing::trace;

fn position_code(position: &str) -> u8 {
    match position {
        "above" => 1,
        "below" => 2,
        _ => 0,
    }
}

/// Flattens `{key: value | [values]}` page keywords into the tag
/// endpoint's key/value list. Scalars other than strings and
/// numbers are dropped
fn transform_keywords(keywords: &Map<String, Value>) -> Vec<Keyword> {
    fn keyword_value(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    keywords
        .iter()
        .filter_map(|(key, value)| {
            let values: Vec<String> = match value {
                Value::Array(items) => items.iter().filter_map(keyword_value).collect(),
                Value::String(s) => vec![s.clone()],
                Value::Number(n) => vec![n.to_string()],
                _ => return None,
            };

            Some(Keyword {
                key: key.clone(),
                value: values,
            })
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

fn ad_types(request: &CanonicalBidRequest) -> Vec<MediaType> {
    let media = &request.media_types;
    let mut types = Vec::with_capacity(3);

    if media.native.is_some() {
        types.push(MediaType::Native);
    }

    if media.video.is_some() {
        types.push(MediaType::Video);
    }

    if media.is_unspecified() || media.banner.is_some() {
        types.push(MediaType::Banner);
    }

    types
}

fn build_tag(
    request: &CanonicalBidRequest,
    policy: &PolicyConfig,
    mapper: &NativeAssetMapper,
) -> Tag {
    let params = &request.params;
    let sizes = normalize_sizes(&request.sizes);

    let placement_id = params.placement_id();
    let code = match (placement_id, &params.dmxid) {
        (Some(_), _) => None,
        (None, Some(dmxid)) => Some(format!("{}{}", policy.inventory_code_prefix, dmxid)),
        (None, None) => None,
    };

    let native = match (&request.media_types.native, &request.native_params) {
        (Some(_), Some(native_params)) => Some(TagNative {
            layouts: vec![mapper.map(native_params)],
        }),
        _ => None,
    };

    let require_asset_url = request
        .media_types
        .video
        .as_ref()
        .filter(|v| v.context != Some(VideoContext::Outstream))
        .map(|_| true);

    let keywords = params
        .keywords
        .as_ref()
        .filter(|k| !k.is_empty())
        .map(transform_keywords);

    Tag {
        primary_size: sizes.first().copied(),
        sizes,
        ad_types: ad_types(request),
        uuid: request.bid_id.clone(),
        id: placement_id,
        code,
        allow_smaller_sizes: params.allow_smaller_sizes.unwrap_or(false),
        use_pmt_rule: params.use_payment_rule.unwrap_or(false),
        prebid: true,
        disable_psa: true,
        reserve: params.reserve.filter(|r| *r != 0.0),
        position: params
            .position
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(position_code),
        traffic_source_code: non_empty(&params.traffic_source_code),
        private_sizes: params.private_sizes.as_ref().map(normalize_sizes),
        supply_type: non_empty(&params.supply_type),
        pubclick: non_empty(&params.pub_click),
        ext_inv_code: non_empty(&params.ext_inv_code),
        external_imp_id: non_empty(&params.external_imp_id),
        keywords,
        native,
        require_asset_url,
        video: params.video.clone(),
    }
}

/// Member a slot is attributed to. The configured seat overrides
/// whatever the page set
fn effective_member(params: &BidParams, policy: &PolicyConfig) -> Option<i64> {
    match &policy.seat {
        Some(seat) => parse_int_str(seat),
        None => params.member.as_ref().and_then(FlexId::as_int),
    }
}

fn user_of(requests: &[CanonicalBidRequest]) -> Option<UserParams> {
    requests.iter().find_map(|r| r.params.user.clone())
}

fn device_of(requests: &[CanonicalBidRequest]) -> Option<TagDevice> {
    requests
        .iter()
        .find_map(|r| r.params.app.as_ref())
        .map(|app| TagDevice {
            geo: app.geo,
            device_id: app.device_id.clone(),
        })
}

fn app_of(requests: &[CanonicalBidRequest]) -> Option<TagApp> {
    requests
        .iter()
        .find_map(|r| r.params.app.as_ref().and_then(|a| a.id.clone()))
        .map(|appid| TagApp { appid })
}

/// Compiles a slot batch into a single tag list request.
///
/// Batch level fields are taken from the first slot defining
/// them and never merged across slots.
pub fn compile_tags(
    requests: &[CanonicalBidRequest],
    context: &AuctionContext,
    policy: &PolicyConfig,
    mapper: &NativeAssetMapper,
) -> TagRequest {
    let tags: Vec<Tag> = requests
        .iter()
        .map(|r| build_tag(r, policy, mapper))
        .collect();

    let member_id = requests
        .iter()
        .filter_map(|r| effective_member(&r.params, policy))
        .find(|m| *m > 0);

    let gdpr_consent = context.consent.as_ref().map(|c| GdprConsent {
        consent_string: c.consent_string.clone(),
        consent_required: c.gdpr_applies,
    });

    let referrer_detection = context.referer.as_ref().map(|r| ReferrerDetection {
        rd_ref: encode_component(&r.referer),
        rd_top: r.reached_top,
        rd_ifs: r.num_iframes,
        rd_stk: r
            .stack
            .iter()
            .map(|url| encode_component(url))
            .collect::<Vec<_>>()
            .join(","),
    });

    trace!(tags = tags.len(), member_id = ?member_id, "compiled tag request");

    TagRequest {
        tags,
        user: user_of(requests),
        sdk: Sdk {
            source: policy.sdk_source.clone(),
            version: policy.sdk_version.clone(),
        },
        member_id,
        device: device_of(requests),
        app: app_of(requests),
        gdpr_consent,
        referrer_detection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::context::{AuctionContextBuilder, ConsentState, RefererInfo};
    use crate::core::models::request::{
        AppParams, BidParamsBuilder, CanonicalBidRequestBuilder, MediaTypesBuilder,
        NativeMediaType, VideoMediaType,
    };
    use crate::core::sizes::{Size, SizeSpec};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn params() -> BidParams {
        BidParamsBuilder::default()
            .dmxid(100001i64)
            .memberid("100")
            .build()
            .unwrap()
    }

    fn request(bid_id: &str) -> CanonicalBidRequest {
        CanonicalBidRequestBuilder::default()
            .bid_id(bid_id)
            .ad_unit_code(format!("div-{}", bid_id))
            .sizes(SizeSpec::list(&[(300, 250), (300, 600)]))
            .params(params())
            .build()
            .unwrap()
    }

    fn compile(requests: &[CanonicalBidRequest], ctx: &AuctionContext) -> TagRequest {
        compile_tags(
            requests,
            ctx,
            &PolicyConfig::default(),
            &NativeAssetMapper::default(),
        )
    }

    #[test]
    fn test_basic_tag() {
        let out = compile(&[request("b1")], &AuctionContext::default());
        let tag = &out.tags[0];

        assert_eq!(tag.uuid, "b1");
        assert_eq!(tag.sizes, vec![Size::new(300, 250), Size::new(300, 600)]);
        assert_eq!(tag.primary_size, Some(Size::new(300, 250)));
        assert_eq!(tag.ad_types, vec![MediaType::Banner]);
        assert_eq!(tag.code.as_deref(), Some("dm-pl-100001"));
        assert_eq!(tag.id, None);
        assert!(tag.prebid && tag.disable_psa);
        assert!(!tag.allow_smaller_sizes && !tag.use_pmt_rule);
        assert_eq!(out.member_id, Some(1908));
        assert_eq!(out.sdk.source, "pbjs");
        assert!(out.gdpr_consent.is_none());
        assert!(out.referrer_detection.is_none());
    }

    #[test]
    fn test_placement_id_replaces_code() {
        let mut req = request("b1");
        req.params.placement_id = Some(FlexId::from("1234"));

        let out = compile(&[req], &AuctionContext::default());
        assert_eq!(out.tags[0].id, Some(1234));
        assert_eq!(out.tags[0].code, None);
    }

    #[test]
    fn test_ad_types_order_and_asset_url() {
        let mut req = request("b1");
        req.media_types = MediaTypesBuilder::default()
            .native(NativeMediaType {})
            .video(VideoMediaType {
                context: Some(VideoContext::Instream),
            })
            .banner(Default::default())
            .build()
            .unwrap();
        req.native_params = Some(
            serde_json::from_value::<BTreeMap<String, Map<String, Value>>>(
                json!({"image": {}, "body": {}}),
            )
            .unwrap(),
        );

        let out = compile(&[req.clone()], &AuctionContext::default());
        let tag = &out.tags[0];
        assert_eq!(
            tag.ad_types,
            vec![MediaType::Native, MediaType::Video, MediaType::Banner]
        );
        assert_eq!(tag.require_asset_url, Some(true));
        assert_eq!(
            serde_json::to_value(tag.native.as_ref().unwrap()).unwrap(),
            json!({"layouts": [{"main_image": {"required": true, "sizes": [{}]}, "description": {}}]})
        );

        req.media_types.video = Some(VideoMediaType {
            context: Some(VideoContext::Outstream),
        });
        let out = compile(&[req], &AuctionContext::default());
        assert_eq!(out.tags[0].require_asset_url, None);
    }

    #[test]
    fn test_optional_fields() {
        let mut req = request("b1");
        req.params.reserve = Some(0.5);
        req.params.position = Some("below".into());
        req.params.private_sizes = Some(SizeSpec::pair(1, 1));
        req.params.keywords = Some(
            json!({"genre": ["rock", "pop", 7, true], "age": 30, "flag": true, "one": "x"})
                .as_object()
                .unwrap()
                .clone(),
        );

        let out = compile(&[req], &AuctionContext::default());
        let tag = serde_json::to_value(&out.tags[0]).unwrap();

        assert_eq!(tag["reserve"], json!(0.5));
        assert_eq!(tag["position"], json!(2));
        assert_eq!(tag["private_sizes"], json!([{"width": 1, "height": 1}]));
        assert_eq!(
            tag["keywords"],
            json!([
                {"key": "age", "value": ["30"]},
                {"key": "genre", "value": ["rock", "pop", "7"]},
                {"key": "one", "value": ["x"]}
            ])
        );
        assert!(tag.get("supply_type").is_none());
    }

    #[test]
    fn test_unknown_position_is_zero() {
        let mut req = request("b1");
        req.params.position = Some("sidebar".into());

        let out = compile(&[req], &AuctionContext::default());
        assert_eq!(out.tags[0].position, Some(0));
    }

    #[test]
    fn test_consent_and_referer() {
        let ctx = AuctionContextBuilder::default()
            .consent(ConsentState {
                gdpr_applies: Some(true),
                consent_string: Some("XYZ".into()),
            })
            .referer(RefererInfo {
                referer: "https://pub.example.com/a b".into(),
                reached_top: true,
                num_iframes: 1,
                stack: vec!["https://a.com/?x=1".into(), "https://b.com".into()],
            })
            .build()
            .unwrap();

        let out = compile(&[request("b1")], &ctx);
        let gdpr = out.gdpr_consent.unwrap();
        assert_eq!(gdpr.consent_string.as_deref(), Some("XYZ"));
        assert_eq!(gdpr.consent_required, Some(true));

        let rd = out.referrer_detection.unwrap();
        assert_eq!(rd.rd_ref, "https%3A%2F%2Fpub.example.com%2Fa%20b");
        assert!(rd.rd_top);
        assert_eq!(rd.rd_ifs, 1);
        assert_eq!(rd.rd_stk, "https%3A%2F%2Fa.com%2F%3Fx%3D1,https%3A%2F%2Fb.com");
    }

    #[test]
    fn test_batch_fields_first_match() {
        let mut first = request("b1");
        first.params.app = Some(AppParams {
            id: None,
            geo: None,
            device_id: Some(BTreeMap::from([("idfa".to_string(), "abc".to_string())])),
        });

        let mut second = request("b2");
        second.params.user = Some(UserParams {
            age: Some(30),
            ..Default::default()
        });
        second.params.app = Some(AppParams {
            id: Some("com.example.app".into()),
            ..Default::default()
        });

        let out = compile(&[first, second], &AuctionContext::default());
        assert_eq!(out.user.unwrap().age, Some(30));
        assert_eq!(
            out.device.unwrap().device_id.unwrap()["idfa"],
            "abc".to_string()
        );
        assert_eq!(out.app.unwrap().appid, "com.example.app");
    }

    #[test]
    fn test_member_from_params_without_seat() {
        let policy = PolicyConfig {
            seat: None,
            ..Default::default()
        };

        let mut first = request("b1");
        first.params.member = Some(FlexId::from("abc"));
        let mut second = request("b2");
        second.params.member = Some(FlexId::from("77"));

        let out = compile_tags(
            &[first.clone(), second],
            &AuctionContext::default(),
            &policy,
            &NativeAssetMapper::default(),
        );
        assert_eq!(out.member_id, Some(77));

        let out = compile_tags(
            &[first],
            &AuctionContext::default(),
            &policy,
            &NativeAssetMapper::default(),
        );
        assert_eq!(out.member_id, None);
        assert!(
            serde_json::to_value(&out)
                .unwrap()
                .get("member_id")
                .is_none()
        );
    }
}
