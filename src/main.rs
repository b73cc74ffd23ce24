//! Entity server: loads settings, connects the pool, assembles services and serves the API.

use entity_access::{assemble, router, Settings, Stores};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("entity_access=info")),
        )
        .init();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(settings.database_url()?)
        .await?;
    tracing::info!(schema = %settings.database.schema, "connected to database");

    let services = assemble(Stores::postgres(&pool, &settings.database.schema), settings.page);
    let app = router(services, Some(pool), settings.body_limit_bytes);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
