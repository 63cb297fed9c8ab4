use crate::app::config::BidmuxConfig;
use crate::app::engine::BidEngine;
use crate::core::demand::Transport;
use std::sync::{Arc, OnceLock};

/// Shared state filled in by startup tasks, in task order
#[derive(Default)]
pub struct StartupContext {
    /// Snapshot of the config loaded at startup
    pub config: OnceLock<BidmuxConfig>,

    /// Outbound client shared by every auction
    pub transport: OnceLock<Arc<dyn Transport>>,

    pub engine: OnceLock<Arc<BidEngine>>,
}

impl StartupContext {
    pub fn config(&self) -> Result<&BidmuxConfig, anyhow::Error> {
        self.config
            .get()
            .ok_or_else(|| anyhow::anyhow!("Config not loaded yet"))
    }
}
