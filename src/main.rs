mod app;
mod auth;
mod config;
mod error;
mod state;
mod users;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "authd=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (app_state, db) = AppState::init(AppConfig::from_env()?).await?;

    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!(issuer = app_state.keys.issuer(), "database ready");

    let config = app_state.config.clone();
    let app = app::build_app(app_state);
    app::serve(app, &config.host, config.port).await
}
