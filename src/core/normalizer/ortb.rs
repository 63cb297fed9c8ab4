use crate::core::models::policy::PolicyConfig;
use crate::core::models::request::{CanonicalBidRequest, FlexId, match_request};
use crate::core::models::result::{BidMeta, CanonicalBidResult, Creative};
use crate::core::normalizer::arbitration::arbitrate;
use crate::core::spec::MediaType;
use crate::core::wire::ortb::{OrtbBid, OrtbSeatBid};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

fn to_result(
    bid: &OrtbBid,
    requests: &[CanonicalBidRequest],
    policy: &PolicyConfig,
) -> Option<CanonicalBidResult> {
    let Some(adm) = bid.adm.clone().filter(|a| !a.is_empty()) else {
        warn!(impid = ?bid.impid, "Winning bid carries no markup, dropped");
        return None;
    };

    let Some(impid) = bid
        .impid
        .as_ref()
        .map(FlexId::to_string)
        .filter(|i| !i.is_empty())
    else {
        warn!("Winning bid carries no impression id, dropped");
        return None;
    };

    let request = match_request(requests, &impid);
    let (req_w, req_h) = request.map(|r| r.first_size()).unwrap_or((None, None));

    Some(CanonicalBidResult {
        request_id: impid,
        ad_unit_code: request.map(|r| r.ad_unit_code.clone()),
        cpm: bid.price(),
        currency: policy.currency.clone(),
        net_revenue: true,
        ttl: policy.ortb_ttl,
        creative_id: bid.crid.as_ref().map(FlexId::to_string),
        deal_id: bid.dealid.as_ref().map(FlexId::to_string),
        width: bid.w.filter(|w| *w != 0).or(req_w),
        height: bid.h.filter(|h| *h != 0).or(req_h),
        media_type: MediaType::Banner,
        creative: Creative::Markup { ad: adm },
        ad_response: None,
        renderer: None,
        meta: BidMeta::default(),
    })
}

/// Normalizes an impression envelope response, at most one bid
/// per seat. A body whose `seatbid` is not an array has no bids
pub fn normalize_ortb(
    body: &Value,
    requests: &[CanonicalBidRequest],
    policy: &PolicyConfig,
) -> Vec<CanonicalBidResult> {
    let Some(seats) = body.get("seatbid").and_then(Value::as_array) else {
        debug!("Response has no seatbid array, no bids");
        return Vec::new();
    };

    seats
        .iter()
        .filter_map(|raw| match OrtbSeatBid::deserialize(raw) {
            Ok(seat) => Some(seat),
            Err(e) => {
                warn!("Skipping malformed seat: {}", e);
                None
            }
        })
        .filter_map(|seat| {
            let Some(winner) = arbitrate(&seat.bid) else {
                debug!(seat = ?seat.seat, candidates = seat.bid.len(), "Seat has no priced bid, no fill");
                return None;
            };

            to_result(winner, requests, policy)
        })
        .collect()
}
