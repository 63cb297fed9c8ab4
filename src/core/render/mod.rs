//! Outstream video renderer seam. Script loading and playback
//! belong to the host, this module only wires a freshly
//! installed renderer to its bid.

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything the host needs to render one outstream ad
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutstreamAd {
    pub tag_id: Option<i64>,
    pub sizes: (Option<i64>, Option<i64>),
    pub target_id: Option<String>,
    pub uuid: String,
    pub ad_response: Value,
    pub renderer_options: Option<Value>,
}

pub type RenderFn = Box<dyn Fn(&OutstreamAd) + Send + Sync>;
pub type EventFn = Box<dyn Fn(&str) + Send + Sync>;
pub type RenderTask = Box<dyn FnOnce() + Send>;

/// Player lifecycle callbacks
pub struct EventHandlers {
    pub impression: EventFn,
    pub loaded: EventFn,
    pub ended: EventFn,
}

/// A renderer instance created by the host for one bid
pub trait RendererHandle: Send + Sync + Debug {
    fn set_render(&self, render: RenderFn) -> Result<(), Error>;
    fn set_event_handlers(&self, handlers: EventHandlers);
    /// Queue work to run once the renderer script is ready
    fn push(&self, task: RenderTask);
    fn config(&self) -> Value;
}

/// Host side of rendering, supplied by the embedding page
pub trait RenderHost: Send + Sync {
    fn install(&self, id: Option<String>, url: &str, config: Value) -> Arc<dyn RendererHandle>;
    fn render_outstream(&self, ad: OutstreamAd);
    fn hide_container(&self, ad_unit_code: &str);
}

/// Installs and wires a renderer for an outstream bid.
///
/// The render callback defers to the host through the renderer's
/// task queue, and the end of playback hides the slot.
pub fn install_outstream_renderer(
    host: Arc<dyn RenderHost>,
    renderer_id: Option<String>,
    renderer_url: &str,
    ad_unit_code: String,
    renderer_options: Option<Value>,
) -> Arc<dyn RendererHandle> {
    let config = renderer_options.clone().unwrap_or(Value::Null);
    let renderer = host.install(renderer_id, renderer_url, config);

    let render_host = host.clone();
    let queue = Arc::downgrade(&renderer);
    let render: RenderFn = Box::new(move |ad: &OutstreamAd| {
        let Some(queue) = queue.upgrade() else {
            return;
        };

        let host = render_host.clone();
        let mut ad = ad.clone();
        if ad.renderer_options.is_none() {
            ad.renderer_options = renderer_options.clone();
        }
        queue.push(Box::new(move || host.render_outstream(ad)));
    });

    if let Err(e) = renderer.set_render(render) {
        warn!("Failed to set outstream render callback: {}", e);
    }

    let ended_host = host.clone();
    renderer.set_event_handlers(EventHandlers {
        impression: Box::new(|id: &str| debug!(id, "outstream video impression event")),
        loaded: Box::new(|id: &str| debug!(id, "outstream video loaded event")),
        ended: Box::new(move |id: &str| {
            debug!(id, "outstream renderer video event");
            ended_host.hide_container(&ad_unit_code);
        }),
    });

    renderer
}
