use anyhow::Result;
use service_bar::bar::run_bar;
use service_bar::config::load_config;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the bar protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting service-bar");

    let config_path = std::env::var("SERVICE_BAR_CONFIG")
        .ok()
        .or_else(|| std::env::args().nth(1));
    let config = load_config(config_path.as_deref())?;

    info!("Number of blocks: {}", config.blocks.len());

    let widgets = config.widgets();
    run_bar(
        widgets,
        tokio::io::stdout(),
        BufReader::new(tokio::io::stdin()),
    )
    .await?;

    Ok(())
}
