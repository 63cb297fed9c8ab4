mod startup;
pub mod tasks;

pub use startup::{StartupPipeline, StartupTask, build_start_pipeline};
