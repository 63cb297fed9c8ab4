pub mod client;
pub mod encoding;
pub mod takerate;

pub use client::{HttpTransport, Transport};
