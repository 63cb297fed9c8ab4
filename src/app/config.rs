use crate::core::models::bidder::Endpoints;
use crate::core::models::policy::PolicyConfig;
use config::Config;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var naming an alternate config file
pub const CONFIG_PATH_ENV: &str = "BIDMUX_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "bidmux.yaml";

/// Outbound http client settings for endpoint calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Builder)]
#[serde(default)]
#[builder(default, setter(into))]
pub struct HttpConfig {
    pub user_agent: String,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Whole request budget, independent of the auction tmax
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("bidmux/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: Duration::from_secs(1),
            request_timeout: Duration::from_secs(3),
            pool_idle_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSink {
    #[serde(flatten)]
    pub dest: LogType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogType {
    /// Console output. Written to stderr since stdout carries
    /// the binary's results
    Stdout {
        #[serde(default = "default_true")]
        color: bool,
        #[serde(default)]
        json: bool,
        #[serde(default = "default_true")]
        spans: bool,
    },
    File {
        path: PathBuf,
        #[serde(default)]
        json: bool,
        #[serde(default)]
        rotation: FileRotation,
        #[serde(default)]
        max_files: usize,
        #[serde(default = "default_true")]
        spans: bool,
    },
}

fn default_true() -> bool {
    true
}

/// Omitted keys take the values of `LoggingConfig::default()`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub span_sample_rate: f32,
    pub sinks: Vec<LogSink>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            span_sample_rate: 0.01,
            sinks: vec![LogSink {
                dest: LogType::Stdout {
                    color: true,
                    json: false,
                    spans: false,
                },
            }],
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.sinks.is_empty() {
            anyhow::bail!("At least one logging sink must be configured");
        }

        self.level.parse::<tracing::Level>().map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: trace, debug, info, warn, error",
                self.level
            )
        })?;

        if !(0.0..=1.0).contains(&self.span_sample_rate) {
            anyhow::bail!(
                "span_sample_rate must be between 0.0 and 1.0, got {}",
                self.span_sample_rate
            );
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Builder)]
#[serde(default)]
#[builder(default, setter(into))]
pub struct BidmuxConfig {
    pub endpoints: Endpoints,
    pub policy: PolicyConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
}

impl BidmuxConfig {
    /// Path from `BIDMUX_CONFIG`, else `bidmux.yaml` in the
    /// working directory
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Loads the yaml file at `path` layered under `BIDMUX__*` env
    /// overrides, e.g. `BIDMUX__POLICY__TAKE_RATE=15`. A missing
    /// file at the default path is fine, every field has a default
    pub fn load(path: &Path) -> Result<BidmuxConfig, anyhow::Error> {
        let required = path != Path::new(DEFAULT_CONFIG_PATH);

        let cfg = Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(required))
            .add_source(
                config::Environment::with_prefix("BIDMUX")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}
