use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use officehours_adapters::persistence::sqlite::SqliteDb;
use officehours_server::config::Config;
use officehours_server::routes::router;
use officehours_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let db = SqliteDb::connect(&config.database_url, config.max_connections).await?;
    let app = router(AppState::sqlite(db));

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "officehours listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("officehours stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
