pub mod mapping;

pub use mapping::{NativeAssetMapper, NativeMapping};
