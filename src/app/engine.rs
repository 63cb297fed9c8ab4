use crate::core::compiler::{compile_ortb, compile_tags};
use crate::core::demand::Transport;
use crate::core::demand::encoding::ResponseDecoder;
use crate::core::models::bidder::{Endpoints, WireFormat};
use crate::core::models::context::AuctionContext;
use crate::core::models::policy::PolicyConfig;
use crate::core::models::request::CanonicalBidRequest;
use crate::core::models::result::CanonicalBidResult;
use crate::core::native::NativeAssetMapper;
use crate::core::normalizer::{normalize_ortb, normalize_tags};
use crate::core::render::RenderHost;
use crate::core::wire::{RequestOptions, WireRequest};
use crate::{child_span_debug, child_span_info, sample_or_attach_root_span};
use anyhow::Error;
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

/// Compiles slot batches for both endpoints and folds their answers
/// back into canonical bids
pub struct BidEngine {
    policy: PolicyConfig,
    endpoints: Endpoints,
    mapper: NativeAssetMapper,
    render_host: Option<Arc<dyn RenderHost>>,
    span_sample_rate: f32,
}

impl BidEngine {
    pub fn new(policy: PolicyConfig, endpoints: Endpoints) -> Self {
        Self {
            policy,
            endpoints,
            mapper: NativeAssetMapper::default(),
            render_host: None,
            span_sample_rate: 0.0,
        }
    }

    /// Replaces the built in native asset table
    pub fn with_mapper(mut self, mapper: NativeAssetMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Host used to install outstream video renderers. Only an
    /// embedder with a page to render into has one, the stdin binary
    /// runs without and outstream bids still carry their raw payload
    pub fn with_render_host(mut self, host: Arc<dyn RenderHost>) -> Self {
        self.render_host = Some(host);
        self
    }

    pub fn with_span_sample_rate(mut self, rate: f32) -> Self {
        self.span_sample_rate = rate;
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn is_request_valid(&self, request: &CanonicalBidRequest) -> bool {
        request.is_valid()
    }

    fn wire_request<T: Serialize>(
        &self,
        format: WireFormat,
        payload: &T,
    ) -> Result<WireRequest, Error> {
        let endpoint = self.endpoints.get(format);
        let options = endpoint.content_type.as_ref().map(|ct| RequestOptions {
            content_type: ct.clone(),
            with_credentials: endpoint.with_credentials,
        });

        Ok(WireRequest {
            format,
            method: "POST",
            url: endpoint.url.clone(),
            data: serde_json::to_string(payload)?,
            options,
        })
    }

    /// The wire requests for one auction call. The tag request is
    /// always built, the impression request only when a non video
    /// slot remains. Invalid slots are dropped first
    pub fn build_requests(
        &self,
        requests: &[CanonicalBidRequest],
        context: &AuctionContext,
    ) -> Result<Vec<WireRequest>, Error> {
        let valid: Vec<CanonicalBidRequest> = requests
            .iter()
            .filter(|r| {
                let ok = self.is_request_valid(r);
                if !ok {
                    debug!(bid_id = %r.bid_id, "Dropping slot without dmxid and memberid");
                }
                ok
            })
            .cloned()
            .collect();

        if valid.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(2);

        if self.endpoints.tags.enabled {
            let payload = compile_tags(&valid, context, &self.policy, &self.mapper);
            out.push(self.wire_request(WireFormat::Tags, &payload)?);
        }

        let has_display = valid.iter().any(|r| r.media_types.video.is_none());
        if self.endpoints.ortb.enabled && has_display {
            let payload = compile_ortb(&valid, context, &self.policy);
            out.push(self.wire_request(WireFormat::Ortb, &payload)?);
        }

        Ok(out)
    }

    /// Normalizes an already parsed body, dispatching on its shape
    pub fn interpret_value(
        &self,
        body: &Value,
        requests: &[CanonicalBidRequest],
    ) -> Vec<CanonicalBidResult> {
        let format = if body.get("tags").is_some() {
            WireFormat::Tags
        } else if body.get("seatbid").is_some() {
            WireFormat::Ortb
        } else {
            debug!("Response is neither a tag nor a seatbid body, no bids");
            return Vec::new();
        };

        let span = child_span_debug!("normalize", format = %format);
        let _enter = span.enter();

        let bids = match format {
            WireFormat::Tags => {
                normalize_tags(body, requests, &self.policy, self.render_host.as_ref())
            }
            WireFormat::Ortb => normalize_ortb(body, requests, &self.policy),
        };

        debug!(bids = bids.len(), "Response normalized");

        bids
    }

    /// Normalizes a raw endpoint body. Unparseable bodies yield no bids
    pub fn interpret_response(
        &self,
        body: &[u8],
        requests: &[CanonicalBidRequest],
    ) -> Vec<CanonicalBidResult> {
        match ResponseDecoder::decode(body) {
            Ok(value) => self.interpret_value(&value, requests),
            Err(e) => {
                warn!("Discarding unparseable response: {}", e);
                Vec::new()
            }
        }
    }

    /// Sends every wire request concurrently and concatenates the
    /// normalized bids. A failed endpoint contributes nothing
    pub async fn run_auction(
        &self,
        transport: &dyn Transport,
        requests: &[CanonicalBidRequest],
        context: &AuctionContext,
    ) -> Vec<CanonicalBidResult> {
        let span = sample_or_attach_root_span!(self.span_sample_rate, "auction");

        async {
            let wire_requests = match self.build_requests(requests, context) {
                Ok(wire_requests) => wire_requests,
                Err(e) => {
                    warn!("Failed to build wire requests: {}", e);
                    return Vec::new();
                }
            };

            let calls = wire_requests.iter().map(|req| {
                let span = child_span_info!("endpoint_call", format = %req.format);

                async move {
                    match transport.send(req).await {
                        Ok(body) => self.interpret_response(&body, requests),
                        Err(e) => {
                            warn!(format = %req.format, "Endpoint call failed: {}", e);
                            Vec::new()
                        }
                    }
                }
                .instrument(span)
            });

            let bids: Vec<CanonicalBidResult> =
                join_all(calls).await.into_iter().flatten().collect();

            info!(slots = requests.len(), bids = bids.len(), "Auction finished");

            bids
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::context::{AuctionContextBuilder, ConsentState};
    use crate::core::models::request::{
        BidParamsBuilder, CanonicalBidRequestBuilder, MediaTypesBuilder, NativeMediaType,
        VideoMediaType,
    };
    use crate::core::native::NativeMapping;
    use crate::core::render::testing::TestHost;
    use crate::core::sizes::SizeSpec;
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    fn slot(bid_id: &str) -> CanonicalBidRequest {
        CanonicalBidRequestBuilder::default()
            .bid_id(bid_id)
            .ad_unit_code(format!("div-{}", bid_id))
            .sizes(SizeSpec::list(&[(300, 250)]))
            .params(
                BidParamsBuilder::default()
                    .dmxid(100001i64)
                    .memberid(100i64)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn video_slot(bid_id: &str) -> CanonicalBidRequest {
        let mut req = slot(bid_id);
        req.media_types = MediaTypesBuilder::default()
            .video(VideoMediaType::default())
            .build()
            .unwrap();
        req
    }

    fn engine() -> BidEngine {
        BidEngine::new(PolicyConfig::default(), Endpoints::default())
    }

    /// Answers each format with a canned body and records what it saw
    struct CannedTransport {
        tags: Result<Bytes, String>,
        ortb: Result<Bytes, String>,
        seen: Mutex<Vec<WireRequest>>,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn send(&self, req: &WireRequest) -> Result<Bytes, Error> {
            self.seen.lock().push(req.clone());
            let canned = match req.format {
                WireFormat::Tags => &self.tags,
                WireFormat::Ortb => &self.ortb,
            };
            canned.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn tags_body(uuid: &str, cpm: f64) -> Bytes {
        Bytes::from(
            json!({"tags": [{"uuid": uuid, "ads": [{
                "ad_type": "banner", "cpm": cpm,
                "rtb": {"banner": {"width": 300, "height": 250, "content": "<a/>"},
                        "trackers": [{"impression_urls": ["https://t.example.com"]}]}
            }]}]})
            .to_string(),
        )
    }

    fn ortb_body(impid: &str, prices: &[f64]) -> Bytes {
        let bids: Vec<Value> = prices
            .iter()
            .map(|p| json!({"impid": impid, "price": p, "adm": format!("<b>{}</b>", p), "crid": "c"}))
            .collect();
        Bytes::from(json!({"id": "x", "seatbid": [{"seat": "s", "bid": bids}]}).to_string())
    }

    #[test]
    fn test_build_plan_both_formats() {
        let reqs = engine()
            .build_requests(&[slot("b1")], &AuctionContext::default())
            .unwrap();

        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].format, WireFormat::Tags);
        assert_eq!(reqs[0].method, "POST");
        assert_eq!(reqs[0].url, "https://ib.adnxs.com/ut/v3/prebid");
        assert!(reqs[0].options.is_none());

        assert_eq!(reqs[1].format, WireFormat::Ortb);
        assert_eq!(
            reqs[1].options,
            Some(RequestOptions {
                content_type: "application/json".into(),
                with_credentials: true,
            })
        );
    }

    #[test]
    fn test_all_video_batch_is_tags_only() {
        let reqs = engine()
            .build_requests(&[video_slot("v1"), video_slot("v2")], &AuctionContext::default())
            .unwrap();

        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].format, WireFormat::Tags);

        let body: Value = serde_json::from_str(&reqs[0].data).unwrap();
        assert_eq!(body["tags"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_video_slot_excluded_from_impressions() {
        let reqs = engine()
            .build_requests(&[video_slot("v1"), slot("b1")], &AuctionContext::default())
            .unwrap();

        let body: Value = serde_json::from_str(&reqs[1].data).unwrap();
        let imps = body["imp"].as_array().unwrap();
        assert_eq!(imps.len(), 1);
        assert_eq!(imps[0]["id"], json!("b1"));
    }

    #[test]
    fn test_consent_in_both_formats() {
        let ctx = AuctionContextBuilder::default()
            .consent(ConsentState {
                gdpr_applies: Some(true),
                consent_string: Some("XYZ".into()),
            })
            .build()
            .unwrap();

        let reqs = engine().build_requests(&[slot("b1")], &ctx).unwrap();
        let tags: Value = serde_json::from_str(&reqs[0].data).unwrap();
        let ortb: Value = serde_json::from_str(&reqs[1].data).unwrap();

        assert_eq!(
            tags["gdpr_consent"],
            json!({"consent_string": "XYZ", "consent_required": true})
        );
        assert_eq!(ortb["regs"]["ext"]["gdpr"], json!(1));
        assert_eq!(ortb["user"]["ext"]["consent"], json!("XYZ"));
    }

    fn memberless(bid_id: &str) -> CanonicalBidRequest {
        let mut req = slot(bid_id);
        req.params.memberid = None;
        req
    }

    #[test]
    fn test_invalid_slots_dropped() {
        let bad = memberless("x");
        assert!(!engine().is_request_valid(&bad));
        assert!(engine().is_request_valid(&slot("b1")));

        let reqs = engine()
            .build_requests(&[bad.clone()], &AuctionContext::default())
            .unwrap();
        assert!(reqs.is_empty());

        let reqs = engine()
            .build_requests(&[bad, slot("b1")], &AuctionContext::default())
            .unwrap();
        let body: Value = serde_json::from_str(&reqs[0].data).unwrap();
        assert_eq!(body["tags"].as_array().unwrap().len(), 1);
        assert_eq!(body["tags"][0]["uuid"], json!("b1"));
    }

    #[test]
    fn test_disabled_endpoint_skipped() {
        let mut endpoints = Endpoints::default();
        endpoints.ortb.enabled = false;

        let reqs = BidEngine::new(PolicyConfig::default(), endpoints)
            .build_requests(&[slot("b1")], &AuctionContext::default())
            .unwrap();
        assert_eq!(reqs.len(), 1);
    }

    #[test]
    fn test_interpret_dispatch() {
        let e = engine();
        let reqs = [slot("b1")];

        assert_eq!(e.interpret_response(&tags_body("b1", 1.0), &reqs).len(), 1);
        assert_eq!(e.interpret_response(&ortb_body("b1", &[1.0]), &reqs).len(), 1);
        assert!(e.interpret_response(br#"{"other": 1}"#, &reqs).is_empty());
        assert!(e.interpret_response(b"not json", &reqs).is_empty());
        assert!(e.interpret_response(b"", &reqs).is_empty());
    }

    #[test]
    fn test_custom_mapper_reaches_tag_request() {
        let mapper = NativeAssetMapper::new(HashMap::from([(
            "title",
            NativeMapping::Rename("headline"),
        )]));
        let mut req = slot("b1");
        req.media_types = MediaTypesBuilder::default()
            .native(NativeMediaType::default())
            .build()
            .unwrap();
        req.native_params = Some(BTreeMap::from([(
            "title".to_string(),
            json!({"len": 25}).as_object().unwrap().clone(),
        )]));

        let reqs = engine()
            .with_mapper(mapper)
            .build_requests(&[req], &AuctionContext::default())
            .unwrap();
        let tags: Value = serde_json::from_str(&reqs[0].data).unwrap();

        assert_eq!(tags["tags"][0]["native"]["layouts"][0], json!({"headline": {"len": 25}}));
    }

    #[test]
    fn test_render_host_installs_outstream_renderer() {
        let host = Arc::new(TestHost::default());
        let e = engine().with_render_host(host.clone());
        let body = json!({"tags": [{"uuid": "b1", "ads": [{
            "ad_type": "video",
            "cpm": 2.0,
            "renderer_url": "https://cdn.example.com/outstream.js",
            "rtb": {"video": {"player_width": 640, "player_height": 360}}
        }]}]});

        let out = e.interpret_value(&body, &[slot("b1")]);

        assert_eq!(out.len(), 1);
        assert!(out[0].renderer.is_some());
        assert_eq!(host.inner.installed.lock().len(), 1);
    }

    #[test]
    fn test_zero_and_unsupported_yield_nothing() {
        let body = json!({"tags": [
            {"uuid": "b1", "ads": [{"ad_type": "banner", "cpm": 0, "rtb": {"banner": {}}}]},
            {"uuid": "b1", "ads": [{"ad_type": "audio", "cpm": 2.0, "rtb": {}}]}
        ]});

        let out = engine().interpret_value(&body, &[slot("b1")]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_ortb_round_trip_resolves_bid_id() {
        let e = engine();
        let slots = [slot("b1"), slot("b2")];
        let reqs = e.build_requests(&slots, &AuctionContext::default()).unwrap();

        let sent: Value = serde_json::from_str(&reqs[1].data).unwrap();
        let echo_id = sent["imp"][1]["id"].as_str().unwrap();

        let out = e.interpret_response(&ortb_body(echo_id, &[1.50, 3.25]), &slots);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].request_id, "b2");
        assert_eq!(out[0].ad_unit_code.as_deref(), Some("div-b2"));
        assert_eq!(out[0].cpm, 3.25);
        assert_eq!(out[0].ttl, 60);
    }

    #[tokio::test]
    async fn test_run_auction_concatenates_formats() {
        let transport = CannedTransport {
            tags: Ok(tags_body("b1", 2.0)),
            ortb: Ok(ortb_body("b1", &[1.50, 3.25])),
            seen: Mutex::new(Vec::new()),
        };

        let bids = engine()
            .run_auction(&transport, &[slot("b1")], &AuctionContext::default())
            .await;

        assert_eq!(transport.seen.lock().len(), 2);
        assert_eq!(bids.len(), 2);
        assert!((bids[0].cpm - 1.8).abs() < 1e-9);
        assert_eq!(bids[0].ttl, 300);
        assert_eq!(bids[1].cpm, 3.25);
        assert_eq!(bids[1].ttl, 60);
    }

    #[tokio::test]
    async fn test_run_auction_failed_endpoint_contributes_nothing() {
        let transport = CannedTransport {
            tags: Err("connection refused".into()),
            ortb: Ok(ortb_body("b1", &[0.75])),
            seen: Mutex::new(Vec::new()),
        };

        let bids = engine()
            .run_auction(&transport, &[slot("b1")], &AuctionContext::default())
            .await;

        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].cpm, 0.75);
    }

    #[tokio::test]
    async fn test_run_auction_without_valid_slots() {
        let transport = CannedTransport {
            tags: Ok(tags_body("b1", 2.0)),
            ortb: Ok(ortb_body("b1", &[1.0])),
            seen: Mutex::new(Vec::new()),
        };

        let bids = engine()
            .run_auction(&transport, &[memberless("b1")], &AuctionContext::default())
            .await;

        assert!(bids.is_empty());
        assert!(transport.seen.lock().is_empty());
    }
}
