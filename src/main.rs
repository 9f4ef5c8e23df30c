use std::sync::{Arc, Mutex};

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use venuebook::config::AppConfig;
use venuebook::db;
use venuebook::handlers;
use venuebook::services::auth::TokenGate;
use venuebook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        admin_gate: Box::new(TokenGate::new(config.admin_token.clone())),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/calendar/occupied",
            get(handlers::calendar::occupied_dates),
        )
        .route("/api/reservations", post(handlers::booking::create_reservation))
        .route(
            "/api/admin/reservations",
            get(handlers::admin::list_reservations),
        )
        .route(
            "/api/admin/reservations/:id",
            patch(handlers::admin::update_reservation),
        )
        .route("/api/admin/metrics", get(handlers::admin::get_metrics))
        .route("/api/dev/seed", post(handlers::dev::seed))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
