use real_estate_listings_backend::api::{self, AppState};
use real_estate_listings_backend::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };
    log::info!("Loaded config: {:?}", config);

    let app = api::router(AppState::new(&config));
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

    log::info!("Starting server on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
