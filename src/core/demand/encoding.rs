use crate::core::wire::WireRequest;
use anyhow::anyhow;
use bytes::Bytes;
use serde_json::Value;

const DEFAULT_CONTENT_TYPE: &str = "text/plain";

pub struct Header {
    pub key: &'static str,
    pub value: String,
}

impl Header {
    pub fn new(key: &'static str, value: String) -> Self {
        Self { key, value }
    }
}

/// Http level framing of a compiled wire request
pub struct RequestEncoder {
    pub headers: Vec<Header>,
    pub data: Bytes,
}

impl RequestEncoder {
    /// The body is already serialized by the compiler, only the
    /// content type depends on the endpoint options. Requests
    /// without options go out as a simple text/plain post
    pub fn encode(req: &WireRequest) -> Self {
        let content_type = req
            .options
            .as_ref()
            .map(|o| o.content_type.clone())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Self {
            headers: vec![Header::new("content-type", content_type)],
            data: Bytes::from(req.data.clone()),
        }
    }
}

pub struct ResponseDecoder;

impl ResponseDecoder {
    /// Parses a raw endpoint body. An empty body is a valid no bid
    pub fn decode(data: &[u8]) -> Result<Value, anyhow::Error> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(data)
            .map_err(|e| anyhow!("Failed decoding json response: {}", e))
    }
}
