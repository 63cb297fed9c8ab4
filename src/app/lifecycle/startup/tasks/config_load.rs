use crate::app::lifecycle::context::StartupContext;
use crate::app::lifecycle::startup::StartupTask;
use crate::core::config_manager::ConfigManager;
use anyhow::{Error, anyhow};

pub(crate) struct ConfigLoadTask {
    manager: ConfigManager,
}

impl ConfigLoadTask {
    pub fn new(manager: ConfigManager) -> Self {
        Self { manager }
    }
}

impl StartupTask for ConfigLoadTask {
    fn name(&self) -> &'static str {
        "config_load"
    }

    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        self.manager.start()?;

        let cfg = self.manager.get().clone();
        cfg.logging.validate()?;

        context
            .config
            .set(cfg)
            .map_err(|_| anyhow!("Config already loaded"))
    }
}
