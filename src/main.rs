use anyhow::{Context, anyhow};
use bidmux::app::config::BidmuxConfig;
use bidmux::app::lifecycle::context::StartupContext;
use bidmux::app::lifecycle::startup::build_start_pipeline;
use bidmux::core::models::context::AuctionContext;
use bidmux::core::models::request::CanonicalBidRequest;
use bidmux::core::serializers::lenient;
use mimalloc::MiMalloc;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// One auction read from stdin
#[derive(Debug, Deserialize)]
struct AuctionInput {
    /// A slot that is not an object is skipped, the rest still run
    #[serde(deserialize_with = "lenient::each")]
    requests: Vec<CanonicalBidRequest>,
    #[serde(default)]
    context: AuctionContext,
}

async fn run(startup_ctx: &StartupContext) -> Result<(), anyhow::Error> {
    let engine = startup_ctx
        .engine
        .get()
        .ok_or_else(|| anyhow!("Engine missing after startup"))?;
    let transport = startup_ctx
        .transport
        .get()
        .ok_or_else(|| anyhow!("Transport missing after startup"))?;

    let mut raw = Vec::new();
    tokio::io::stdin().read_to_end(&mut raw).await?;

    let input: AuctionInput =
        serde_json::from_slice(&raw).context("Failed to parse auction input")?;

    let results = engine
        .run_auction(transport.as_ref(), &input.requests, &input.context)
        .await;

    let mut out = serde_json::to_vec_pretty(&results)?;
    out.push(b'\n');

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&out).await?;
    stdout.flush().await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let startup_pipeline = build_start_pipeline(BidmuxConfig::default_path());
    let startup_ctx = StartupContext::default();

    startup_pipeline.run(&startup_ctx)?;
    info!("Startup successful");

    if let Err(e) = run(&startup_ctx).await {
        error!("Auction failed: {:?}", e);
        return Err(e);
    }

    Ok(())
}
