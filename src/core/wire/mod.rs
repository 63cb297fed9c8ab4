pub mod ortb;
pub mod tags;

use crate::core::models::bidder::WireFormat;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub content_type: String,
    pub with_credentials: bool,
}

/// A compiled, serialized request ready for transport
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WireRequest {
    pub format: WireFormat,
    pub method: &'static str,
    pub url: String,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<RequestOptions>,
}
