use crate::app::lifecycle::context::StartupContext;
use crate::app::lifecycle::startup::StartupTask;
use crate::core::observability;
use anyhow::Error;
use tracing::info;

pub struct ConfigureObservabilityTask;

impl StartupTask for ConfigureObservabilityTask {
    fn name(&self) -> &'static str {
        "observability"
    }

    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let config = context.config()?;

        observability::init(&config.logging)?;

        info!(version = env!("CARGO_PKG_VERSION"), "Observability configured");

        Ok(())
    }
}
