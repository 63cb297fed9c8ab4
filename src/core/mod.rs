pub mod compiler;
pub mod config_manager;
pub mod demand;
pub mod events;
pub mod models;
pub mod native;
pub mod normalizer;
#[macro_use]
pub mod observability;
pub mod render;
pub mod serializers;
pub mod sizes;
pub mod spec;
pub mod wire;
