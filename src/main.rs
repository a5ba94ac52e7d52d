use dispatch::config::ServerConfig;
use dispatch::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.listen_addr();

    eprintln!("📦 Dispatch v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Page: http://{}/", addr);
    eprintln!("   Scan API: http://{}/api/scan", addr);
    eprintln!("   Gmail API: {}", config.gmail_api_base);
    eprintln!(
        "   Window: {} days, up to {} messages",
        config.scan.window_days, config.scan.max_results
    );
    if config.google_client_id.is_empty() {
        eprintln!("   Warning: GOOGLE_CLIENT_ID not set, browser sign-in is disabled");
    }

    routes::serve(&config).await?;
    Ok(())
}
