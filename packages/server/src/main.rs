use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use arena_server::config::{AppConfig, CorsConfig};
use arena_server::duel::expiry::run_expiry_sweeper;
use arena_server::judge::{DisabledJudge, Judge, Judge0Client};
use arena_server::state::AppState;
use arena_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let db = database::init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    seed::ensure_indexes(&db).await?;
    seed::seed_questions(&db).await?;

    let judge: Arc<dyn Judge> = if config.judge.enabled {
        Arc::new(Judge0Client::new(&config.judge)?)
    } else {
        info!("Judge disabled; submissions will be rejected");
        Arc::new(DisabledJudge)
    };

    if config.duel.expiry_sweep_interval_secs > 0 {
        tokio::spawn(run_expiry_sweeper(db.clone(), config.duel.clone()));
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;
    let cors = cors_layer(&config.server.cors);

    let state = AppState {
        db,
        config: Arc::new(config),
        judge,
    };
    let app = build_router(state).layer(cors);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config
                .allow_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age))
}
