mod app;
mod config;
mod dashboard;
mod error;
mod foods;
mod meals;
#[cfg(test)]
mod memory;
mod model;
mod recognition;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "calee=debug,axum=info,tower_http=info".to_string());
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

    let state = state::AppState::init().await?;

    sqlx::migrate!("./migrations").run(&state.db).await?;
    dashboard::repo::PgGoalStore::new(state.db.clone())
        .ensure_user(state.config.default_user_id)
        .await?;
    tracing::info!(
        user_id = %state.config.default_user_id,
        vision_model = %state.config.vision.model,
        "database ready"
    );

    let app = app::build_app(state);
    app::serve(app).await
}
