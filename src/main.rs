use roomchat::{
    build_router, AppConfig, AppState, InMemoryConnectionManager, InMemoryMessageRepository,
    LocalBlobStore, MessageRepository, PostgresMessageRepository,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomchat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting room chat server");

    let config = AppConfig::from_env()?;

    let message_repository: Arc<dyn MessageRepository + Send + Sync> =
        match config.database_url.as_deref() {
            Some(database_url) => {
                let pool = sqlx::PgPool::connect(database_url).await?;
                let repository = PostgresMessageRepository::new(pool);
                repository.ensure_schema().await?;
                info!("Using PostgreSQL message store");
                Arc::new(repository)
            }
            None => {
                warn!("DATABASE_URL not set, messages are kept in memory only");
                Arc::new(InMemoryMessageRepository::new())
            }
        };

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let blob_store = Arc::new(LocalBlobStore::new(
        config.upload_dir.clone(),
        config.public_url.clone(),
    ));

    let bind_addr = config.bind_addr;
    let app_state = AppState::new(
        config,
        message_repository,
        Arc::new(InMemoryConnectionManager::new()),
        blob_store,
    );

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(address = %bind_addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
