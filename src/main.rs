use std::net::SocketAddr;

use securemed::{app::build_app, logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init("securemed=debug,axum=info,tower_http=info", std::io::stdout);

    let (app_state, db) = AppState::init().await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let app = build_app(app_state);

    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
