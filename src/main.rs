use parky_api::{
    AppState, TokenKeys,
    config::{AppConfig, Env},
    create_router,
    repository::{
        ParkRepositoryState, PostgresParkRepository, PostgresTrailRepository, PostgresUserStore,
        TrailRepositoryState, UserStoreState,
    },
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the signing key, the database pool and the
/// HTTP server, in that order. Any failure here is fatal.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "parky_api=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Signing key: validated once, shared read-only for the process lifetime.
    let keys = Arc::new(
        TokenKeys::from_secret(&config.jwt_secret).expect("FATAL: invalid JWT signing secret."),
    );

    // 4. Database (Postgres) and schema
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to run database migrations.");

    let parks = Arc::new(PostgresParkRepository::new(pool.clone())) as ParkRepositoryState;
    let trails = Arc::new(PostgresTrailRepository::new(pool.clone())) as TrailRepositoryState;
    let users = Arc::new(PostgresUserStore::new(pool)) as UserStoreState;

    // 5. Unified state and router
    let app = create_router(AppState::new(parks, trails, users, keys));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("FATAL: Failed to bind listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
