use crate::core::models::context::AuctionContext;
use crate::core::models::policy::PolicyConfig;
use crate::core::models::request::CanonicalBidRequest;
use crate::core::sizes::normalize_sizes;
use crate::core::wire::ortb::{
    Banner, Format, Imp, OrtbRequest, Publisher, Regs, RegsExt, Site, User, UserExt,
};
use tracing::trace;
use uuid::Uuid;

fn build_imp(request: &CanonicalBidRequest, secure: bool) -> Imp {
    let sizes = normalize_sizes(&request.sizes);
    let first = sizes.first().copied().unwrap_or_default();

    let format = sizes
        .iter()
        .filter(|s| s.is_numeric())
        .map(|s| Format {
            w: s.width.unwrap_or(0),
            h: s.height.unwrap_or(0),
        })
        .collect();

    Imp {
        id: request.bid_id.clone(),
        tagid: request
            .params
            .dmxid
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        secure: secure as u8,
        banner: Banner {
            topframe: 1,
            w: first.width.unwrap_or(0),
            h: first.height.unwrap_or(0),
            format,
        },
    }
}

/// Compiles the impression envelope for the non video slots of
/// a batch. Callers check the batch is non empty first, an empty
/// batch still yields a valid envelope with no impressions
pub fn compile_ortb(
    requests: &[CanonicalBidRequest],
    context: &AuctionContext,
    policy: &PolicyConfig,
) -> OrtbRequest {
    let eligible: Vec<&CanonicalBidRequest> = requests
        .iter()
        .filter(|r| r.media_types.video.is_none())
        .collect();

    let secure = context.is_secure();
    let imp: Vec<Imp> = eligible.iter().map(|r| build_imp(r, secure)).collect();

    let publisher_id = eligible
        .first()
        .and_then(|r| r.params.memberid.as_ref())
        .map(ToString::to_string);

    let (regs, user) = match &context.consent {
        Some(consent) => (
            Some(Regs {
                ext: RegsExt {
                    gdpr: (consent.gdpr_applies == Some(true)) as u8,
                },
            }),
            Some(User {
                ext: UserExt {
                    consent: consent.consent_string.clone(),
                },
            }),
        ),
        None => (None, None),
    };

    let tmax = context.timeout.saturating_sub(policy.tmax_margin);

    trace!(imps = imp.len(), tmax_ms = tmax.as_millis() as u64, "compiled ortb request");

    OrtbRequest {
        id: Uuid::new_v4().to_string(),
        cur: vec![policy.currency.clone()],
        tmax: tmax.as_millis() as u64,
        test: context.test_mode().then_some(1),
        site: Site {
            publisher: Publisher { id: publisher_id },
        },
        regs,
        user,
        imp,
    }
}
