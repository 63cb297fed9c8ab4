use crate::app::config::BidmuxConfig;
use anyhow::Error;
use parking_lot::{RwLock, RwLockReadGuard};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Owns the loaded config and allows reloading it in place
pub struct ConfigManager {
    path: PathBuf,
    cfg: Arc<RwLock<BidmuxConfig>>,
    started: AtomicBool,
}

impl ConfigManager {
    pub fn new(cfg_path: PathBuf) -> ConfigManager {
        ConfigManager {
            path: cfg_path,
            cfg: Arc::new(RwLock::new(BidmuxConfig::default())),
            started: AtomicBool::new(false),
        }
    }

    /// Re-reads the file. On failure the previous config stays
    pub fn reload(&self) -> Result<(), Error> {
        let cfg = BidmuxConfig::load(&self.path)?;
        *self.cfg.write() = cfg;

        info!(path = %self.path.display(), "Config loaded");

        Ok(())
    }

    /// Loads the initial config
    pub fn start(&self) -> Result<(), Error> {
        self.reload()?;
        self.started.store(true, Ordering::Release);

        Ok(())
    }

    /// Read access to the current config. Before `start` this is
    /// the built in defaults
    pub fn get(&self) -> RwLockReadGuard<'_, BidmuxConfig> {
        if !self.started.load(Ordering::Acquire) {
            warn!("ConfigManager not started yet but fetching config");
        }

        self.cfg.read()
    }
}
