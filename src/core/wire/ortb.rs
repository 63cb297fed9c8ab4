//! Impression envelope endpoint payloads, a trimmed OpenRTB shape.

use crate::core::models::request::FlexId;
use crate::core::serializers::lenient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Format {
    pub w: i64,
    pub h: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Banner {
    pub topframe: u8,
    pub w: i64,
    pub h: i64,
    pub format: Vec<Format>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Imp {
    pub id: String,
    pub tagid: String,
    pub secure: u8,
    pub banner: Banner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Publisher {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Site {
    pub publisher: Publisher,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegsExt {
    pub gdpr: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Regs {
    pub ext: RegsExt,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserExt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub ext: UserExt,
}

/// One envelope per auction call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrtbRequest {
    pub id: String,
    pub cur: Vec<String>,
    pub tmax: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<u8>,
    pub site: Site,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regs: Option<Regs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub imp: Vec<Imp>,
}

/// One seat candidate. Ids may come back numeric and dims as
/// floats or strings, a mistyped field reads as absent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OrtbBid {
    #[serde(deserialize_with = "lenient::option")]
    pub id: Option<FlexId>,
    #[serde(deserialize_with = "lenient::option")]
    pub impid: Option<FlexId>,
    #[serde(deserialize_with = "lenient::float")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient::option")]
    pub adm: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub crid: Option<FlexId>,
    #[serde(deserialize_with = "lenient::option")]
    pub dealid: Option<FlexId>,
    #[serde(deserialize_with = "lenient::int")]
    pub w: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub h: Option<i64>,
}

impl OrtbBid {
    pub fn price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OrtbSeatBid {
    #[serde(deserialize_with = "lenient::each")]
    pub bid: Vec<OrtbBid>,
    #[serde(deserialize_with = "lenient::option")]
    pub seat: Option<FlexId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrtbResponse {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::each")]
    pub seatbid: Vec<OrtbSeatBid>,
    pub cur: Option<String>,
}
