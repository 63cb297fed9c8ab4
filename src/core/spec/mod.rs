pub mod mediatypes;
pub mod uri;

pub use mediatypes::{MediaType, VideoContext};
