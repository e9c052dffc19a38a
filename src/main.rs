use tracing_subscriber::EnvFilter;

use hearth_api::config::AppConfig;
use hearth_api::database;
use hearth_api::router::{router, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL and JWT_SECRET.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("configuration error: {}", err);
            std::process::exit(1);
        }
    };

    let pool = match database::connect(&config.database).await {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!("failed to connect to database: {}", err);
            std::process::exit(1);
        }
    };

    let state = AppState::new(&config, pool);
    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("hearth-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
