use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed business policy applied when compiling requests and
/// normalizing responses. Defaults mirror production values,
/// tests may inject alternates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Builder)]
#[serde(default)]
#[builder(default, setter(into))]
pub struct PolicyConfig {
    /// Seat forced onto every tag request as its member id.
    /// When unset each slot's own member param is used
    #[builder(setter(into, strip_option))]
    pub seat: Option<String>,
    /// Prefix of the inventory code derived from a slot's dmxid
    pub inventory_code_prefix: String,
    /// Percent withheld from gross tag endpoint prices
    pub take_rate: u32,
    pub currency: String,
    pub banner_ttl: u32,
    pub video_ttl: u32,
    /// Ttl of any impression endpoint result
    pub ortb_ttl: u32,
    /// Subtracted from the auction timeout to leave room for
    /// the other endpoint's round trip
    #[serde(with = "humantime_serde")]
    pub tmax_margin: Duration,
    pub sdk_source: String,
    pub sdk_version: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            seat: Some("1908".to_string()),
            inventory_code_prefix: "dm-pl-".to_string(),
            take_rate: 10,
            currency: "USD".to_string(),
            banner_ttl: 300,
            video_ttl: 3600,
            ortb_ttl: 60,
            tmax_margin: Duration::from_millis(300),
            sdk_source: "pbjs".to_string(),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
