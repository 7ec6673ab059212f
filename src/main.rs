use drinks_api::{
    AppState, SqliteRepository, build_gate,
    auth::HttpKeySetSource,
    config::{AppConfig, Env},
    create_router,
    repository::{Repository, RepositoryState},
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the database, the authorization gate and the
/// HTTP server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast in production).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise debug for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "drinks_api=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database.
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to open the database. Check DATABASE_URL.");

    let repo = Arc::new(SqliteRepository::new(pool)) as RepositoryState;

    if config.reset_db {
        tracing::warn!("DB_RESET is set: dropping all drinks and reseeding");
        repo.reset().await.expect("FATAL: Failed to reset the drink table.");
    } else {
        repo.ensure_schema()
            .await
            .expect("FATAL: Failed to create the drink table.");
    }

    // 4. Authorization gate. The key cache starts empty and fills on first use.
    let source = Arc::new(HttpKeySetSource::new(config.jwks_url()));
    tracing::info!(jwks_url = source.url(), audience = %config.api_audience, "authorization configured");
    let gate = build_gate(&config, source);

    // 5. State, router, server.
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { repo, gate, config });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
