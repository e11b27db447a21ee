use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use taskboard::api::{BoardApp, HasAuth, HasPool};
use taskboard::auth::AuthConfig;
use taskboard::config::ServerConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct BoardState {
    pool: Arc<PgPool>,
    auth: Arc<AuthConfig>,
}

impl HasPool for BoardState {
    fn pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }
}

impl HasAuth for BoardState {
    fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }
}

impl BoardApp for BoardState {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::parse();
    init_tracing(config.log_json);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout())
        .connect(&config.database_url)
        .await
        .context("failed to connect to postgres")?;

    migrate(&pool, config.reset_schema_on_migration_failure).await?;

    let state = BoardState {
        pool: Arc::new(pool),
        auth: Arc::new(config.auth_config()),
    };

    let api = Router::new()
        .route("/healthz", get(health_handler))
        .merge(taskboard::api::routes::<BoardState>());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().nest("/api", api);
    if let Some(dir) = &config.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static client bundle");
        app = app.fallback_service(ServeDir::new(dir));
    }
    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind listener on {}", config.bind))?;
    tracing::info!(addr = %config.bind, "taskboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,taskboard=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn migrate(pool: &PgPool, reset_on_failure: bool) -> anyhow::Result<()> {
    let Err(err) = taskboard::db::create_board_tables(pool).await else {
        return Ok(());
    };
    if !reset_on_failure {
        return Err(err).context("failed to run board migrations");
    }

    tracing::warn!(
        error = %err,
        "Migrations failed; dropping and recreating the public schema"
    );
    taskboard::db::reset_public_schema(pool)
        .await
        .context("failed to reset public schema")?;
    taskboard::db::create_board_tables(pool)
        .await
        .context("failed to run board migrations after schema reset")
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
