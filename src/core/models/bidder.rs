use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WireFormat {
    /// Flat tag list endpoint
    Tags,
    /// OpenRTB style impression envelope endpoint
    Ortb,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Builder)]
#[serde(default)]
#[builder(default, setter(into))]
pub struct Endpoint {
    pub enabled: bool,
    pub url: String,
    /// Hint that the browser side call would carry cookies
    pub with_credentials: bool,
    /// Explicit content type, sent as text/plain when unset
    #[builder(setter(into, strip_option))]
    pub content_type: Option<String>,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            enabled: true,
            url: String::new(),
            with_credentials: false,
            content_type: None,
        }
    }
}

/// The two downstream endpoints a slot batch is compiled for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub tags: Endpoint,
    pub ortb: Endpoint,
}

impl Endpoints {
    pub fn get(&self, format: WireFormat) -> &Endpoint {
        match format {
            WireFormat::Tags => &self.tags,
            WireFormat::Ortb => &self.ortb,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            tags: Endpoint {
                url: "https://ib.adnxs.com/ut/v3/prebid".to_string(),
                ..Default::default()
            },
            ortb: Endpoint {
                url: "https://dmx.districtm.io/b/v1".to_string(),
                with_credentials: true,
                content_type: Some("application/json".to_string()),
                ..Default::default()
            },
        }
    }
}
