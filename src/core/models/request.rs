use crate::core::serializers::lenient;
use crate::core::sizes::{SizeSpec, parse_int, parse_int_str};
use crate::core::spec::VideoContext;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// An identifier pages pass as either a number or a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexId {
    Num(i64),
    Str(String),
}

impl FlexId {
    /// Integer view of the id with `parseInt` leniency
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlexId::Num(n) => Some(*n),
            FlexId::Str(s) => parse_int_str(s),
        }
    }
}

impl fmt::Display for FlexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexId::Num(n) => write!(f, "{}", n),
            FlexId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FlexId {
    fn from(value: i64) -> Self {
        FlexId::Num(value)
    }
}

impl From<&str> for FlexId {
    fn from(value: &str) -> Self {
        FlexId::Str(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BannerMediaType {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub sizes: Option<SizeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VideoMediaType {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub context: Option<VideoContext>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NativeMediaType {}

/// The formats a slot accepts. No format at all means the
/// page did not say, which downstream treats as banner
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Builder)]
#[serde(default)]
#[builder(default, setter(strip_option))]
pub struct MediaTypes {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub banner: Option<BannerMediaType>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub video: Option<VideoMediaType>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub native: Option<NativeMediaType>,
}

impl MediaTypes {
    pub fn is_unspecified(&self) -> bool {
        self.banner.is_none() && self.video.is_none() && self.native.is_none()
    }

    pub fn video_context(&self) -> Option<VideoContext> {
        self.video.as_ref().and_then(|v| v.context)
    }
}

/// Video targeting overrides a page may set. Only these keys
/// are forwarded, anything else on the page object is ignored
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct VideoTargeting {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub id: Option<FlexId>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub mimes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub minduration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub maxduration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub startdelay: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub skippable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub playback_method: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub frameworks: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct UserParams {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub external_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub segments: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub gender: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub dnt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::option")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Geo {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppParams {
    /// App bundle or store id
    #[serde(deserialize_with = "lenient::option")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub geo: Option<Geo>,
    /// Advertising ids keyed by kind, e.g. `idfa`, `aaid`
    #[serde(deserialize_with = "lenient::option")]
    pub device_id: Option<BTreeMap<String, String>>,
}

/// Adapter parameters of a slot, as configured by the page
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Builder)]
#[serde(default, rename_all = "camelCase")]
#[builder(default, setter(into, strip_option))]
pub struct BidParams {
    /// Slot identifier on the impression based endpoint, also
    /// used to derive the inventory code on the tag endpoint
    #[serde(deserialize_with = "lenient::option")]
    pub dmxid: Option<FlexId>,
    /// Publisher account id
    #[serde(deserialize_with = "lenient::option")]
    pub memberid: Option<FlexId>,
    #[serde(deserialize_with = "lenient::option")]
    pub member: Option<FlexId>,
    #[serde(deserialize_with = "lenient::option")]
    pub placement_id: Option<FlexId>,
    #[serde(deserialize_with = "lenient::option")]
    pub allow_smaller_sizes: Option<bool>,
    #[serde(deserialize_with = "lenient::option")]
    pub use_payment_rule: Option<bool>,
    /// Floor price
    #[serde(deserialize_with = "lenient::option")]
    pub reserve: Option<f64>,
    /// `above` or `below` the fold
    #[serde(deserialize_with = "lenient::option")]
    pub position: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub traffic_source_code: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub private_sizes: Option<SizeSpec>,
    #[serde(deserialize_with = "lenient::option")]
    pub supply_type: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub pub_click: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub ext_inv_code: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub external_imp_id: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub keywords: Option<Map<String, Value>>,
    #[serde(deserialize_with = "lenient::option")]
    pub video: Option<VideoTargeting>,
    #[serde(deserialize_with = "lenient::option")]
    pub user: Option<UserParams>,
    #[serde(deserialize_with = "lenient::option")]
    pub app: Option<AppParams>,
}

impl BidParams {
    pub fn member_id(&self) -> Option<i64> {
        self.member.as_ref().and_then(FlexId::as_int)
    }

    pub fn placement_id(&self) -> Option<i64> {
        self.placement_id.as_ref().and_then(FlexId::as_int)
    }
}

/// One slot of an auction call, owned by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Builder)]
#[serde(default, rename_all = "camelCase")]
#[builder(default, setter(into))]
pub struct CanonicalBidRequest {
    /// Unique within one auction call
    pub bid_id: String,
    pub ad_unit_code: String,
    pub sizes: SizeSpec,
    pub media_types: MediaTypes,
    /// Generic native asset spec, asset key to its parameters
    #[builder(setter(into, strip_option))]
    #[serde(deserialize_with = "lenient::option")]
    pub native_params: Option<BTreeMap<String, Map<String, Value>>>,
    pub params: BidParams,
    /// Opaque options handed to an outstream renderer
    #[builder(setter(into, strip_option))]
    #[serde(deserialize_with = "lenient::option")]
    pub renderer_options: Option<Value>,
}

impl CanonicalBidRequest {
    /// Minimum identifiers both endpoints need for this slot
    pub fn is_valid(&self) -> bool {
        self.params.dmxid.is_some() && self.params.memberid.is_some()
    }

    /// First declared size of the slot, used when a response
    /// omits creative dimensions
    pub fn first_size(&self) -> (Option<i64>, Option<i64>) {
        match &self.sizes {
            SizeSpec::Pair(w, h) => (parse_int(w), parse_int(h)),
            SizeSpec::List(items) => match items.first() {
                Some(Value::Array(pair)) => (
                    pair.first().and_then(parse_int),
                    pair.get(1).and_then(parse_int),
                ),
                _ => (None, None),
            },
            SizeSpec::Empty => (None, None),
        }
    }
}

/// Finds the slot a response refers to by its bid id
pub fn match_request<'a>(
    requests: &'a [CanonicalBidRequest],
    bid_id: &str,
) -> Option<&'a CanonicalBidRequest> {
    requests.iter().find(|r| r.bid_id == bid_id)
}
