use wa_autoreply::{AppConfig, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the config layers read the environment
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    logging::init(&config.logging);

    server::run(config).await
}
