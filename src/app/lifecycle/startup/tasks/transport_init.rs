use crate::app::lifecycle::context::StartupContext;
use crate::app::lifecycle::startup::StartupTask;
use crate::core::demand::HttpTransport;
use anyhow::{Error, anyhow};
use std::sync::Arc;
use tracing::debug;

pub struct TransportInitTask;

impl StartupTask for TransportInitTask {
    fn name(&self) -> &'static str {
        "transport_init"
    }

    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let http = &context.config()?.http;
        let transport = HttpTransport::new(http)?;

        debug!(
            connect_timeout = ?http.connect_timeout,
            request_timeout = ?http.request_timeout,
            "Http transport built"
        );

        context
            .transport
            .set(Arc::new(transport))
            .map_err(|_| anyhow!("Transport already initialized"))
    }
}
