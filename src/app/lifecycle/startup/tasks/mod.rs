pub mod config_load;
pub mod engine_build;
pub mod observability;
pub mod transport_init;
