mod arbitration;
mod ortb;
mod tags;

pub use arbitration::arbitrate;
pub use ortb::normalize_ortb;
pub use tags::normalize_tags;
