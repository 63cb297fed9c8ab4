use crate::app::engine::BidEngine;
use crate::app::lifecycle::context::StartupContext;
use crate::app::lifecycle::startup::StartupTask;
use anyhow::{Error, anyhow};
use std::sync::Arc;
use tracing::info;

pub struct EngineBuildTask;

impl StartupTask for EngineBuildTask {
    fn name(&self) -> &'static str {
        "engine_build"
    }

    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let cfg = context.config()?;

        let engine = BidEngine::new(cfg.policy.clone(), cfg.endpoints.clone())
            .with_span_sample_rate(cfg.logging.span_sample_rate);

        info!(
            tags = cfg.endpoints.tags.enabled,
            ortb = cfg.endpoints.ortb.enabled,
            take_rate = cfg.policy.take_rate,
            "Bid engine ready"
        );

        context
            .engine
            .set(Arc::new(engine))
            .map_err(|_| anyhow!("Engine already built"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::BidmuxConfig;
    use crate::app::lifecycle::startup::tasks::transport_init::TransportInitTask;

    #[test]
    fn test_requires_config() {
        let ctx = StartupContext::default();
        assert!(EngineBuildTask.run(&ctx).is_err());
        assert!(ctx.engine.get().is_none());
    }

    #[test]
    fn test_builds_from_config() {
        let ctx = StartupContext::default();
        ctx.config.set(BidmuxConfig::default()).unwrap();

        TransportInitTask.run(&ctx).unwrap();
        EngineBuildTask.run(&ctx).unwrap();

        assert!(ctx.transport.get().is_some());
        let engine = ctx.engine.get().unwrap();
        assert_eq!(engine.policy().take_rate, 10);
    }
}
