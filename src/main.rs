// src/main.rs
use stowkeeper::api;
use stowkeeper::config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stowkeeper=info".into()),
        )
        .init();

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let placement_config = app_config.placement.clone();

    println!("🚀 Stowage Service starting...");
    api::start_api_server(api_config, placement_config).await;
}
