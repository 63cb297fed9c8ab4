use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Marker a page url carries to force test traffic
pub const TEST_MODE_MARKER: &str = "dmTest=true";

fn default_timeout() -> Duration {
    Duration::from_millis(3000)
}

/// Consent state as collected by the page. The consent
/// string is opaque and forwarded untouched
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsentState {
    pub gdpr_applies: Option<bool>,
    pub consent_string: Option<String>,
}

/// How the page was reached, including any iframe nesting
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RefererInfo {
    pub referer: String,
    pub reached_top: bool,
    pub num_iframes: u32,
    pub stack: Vec<String>,
}

/// State shared by every slot of one auction call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Builder)]
#[serde(default, rename_all = "camelCase")]
#[builder(default, setter(into))]
pub struct AuctionContext {
    #[builder(setter(into, strip_option))]
    pub consent: Option<ConsentState>,
    #[builder(setter(into, strip_option))]
    pub referer: Option<RefererInfo>,
    /// Global bidder timeout budget for the whole auction
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub test: bool,
    #[builder(setter(into, strip_option))]
    pub page_url: Option<Url>,
}

impl Default for AuctionContext {
    fn default() -> Self {
        Self {
            consent: None,
            referer: None,
            timeout: default_timeout(),
            test: false,
            page_url: None,
        }
    }
}

impl AuctionContext {
    /// Test traffic is flagged either by the caller or by
    /// the page url carrying the test marker
    pub fn test_mode(&self) -> bool {
        self.test
            || self
                .page_url
                .as_ref()
                .is_some_and(|u| u.as_str().contains(TEST_MODE_MARKER))
    }

    /// Whether the page itself was served over https
    pub fn is_secure(&self) -> bool {
        self.page_url
            .as_ref()
            .is_some_and(|u| u.scheme() == "https")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_timeout() {
        assert_eq!(AuctionContext::default().timeout, Duration::from_millis(3000));
    }

    #[test]
    fn test_mode_from_flag_or_page_marker() {
        let mut ctx = AuctionContext::default();
        assert!(!ctx.test_mode());

        ctx.page_url = Some(Url::parse("https://pub.example.com/a?dmTest=true").unwrap());
        assert!(ctx.test_mode());

        ctx.page_url = Some(Url::parse("https://pub.example.com/a").unwrap());
        ctx.test = true;
        assert!(ctx.test_mode());
    }

    #[test]
    fn test_secure_follows_page_scheme() {
        let mut ctx = AuctionContext::default();
        assert!(!ctx.is_secure());

        ctx.page_url = Some(Url::parse("http://pub.example.com").unwrap());
        assert!(!ctx.is_secure());

        ctx.page_url = Some(Url::parse("https://pub.example.com").unwrap());
        assert!(ctx.is_secure());
    }

    #[test]
    fn test_deserialize_context() {
        let ctx: AuctionContext = serde_json::from_value(json!({
            "consent": {"gdprApplies": true, "consentString": "XYZ"},
            "referer": {"referer": "https://a.com", "reachedTop": true, "numIframes": 0, "stack": ["https://a.com"]},
            "timeout": "1500ms",
            "pageUrl": "https://a.com/page"
        }))
        .unwrap();

        assert_eq!(ctx.timeout, Duration::from_millis(1500));
        assert_eq!(ctx.consent.as_ref().unwrap().consent_string.as_deref(), Some("XYZ"));
        assert!(ctx.is_secure());
    }
}
