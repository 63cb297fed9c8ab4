pub mod bidder;
pub mod context;
pub mod policy;
pub mod request;
pub mod result;
