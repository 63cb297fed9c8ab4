mod ortb;
mod tags;

pub use ortb::compile_ortb;
pub use tags::compile_tags;
