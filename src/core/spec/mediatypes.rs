use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The ad formats a slot may request and a server may answer with
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaType {
    #[default]
    Banner,
    Video,
    Native,
}

impl MediaType {
    /// Resolve a server declared ad type string. Anything outside
    /// the supported set yields `None`
    pub fn from_ad_type(ad_type: Option<&str>) -> Option<Self> {
        ad_type.and_then(|t| t.parse().ok())
    }
}

/// Where a video slot plays back. Outstream video needs an
/// external renderer rather than the page's own player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VideoContext {
    Instream,
    Outstream,
    #[serde(other)]
    Other,
}
