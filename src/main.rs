use std::sync::Arc;

use anyhow::Context;
use coachcall::{
    config::{EnvCredentials, Settings},
    profiles::SqliteProfileStore,
    rooms::{DailyClient, RoomProvisioner},
    AppState,
};
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coachcall=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env();

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&settings.database_url)
        .await
        .with_context(|| format!("opening {}", settings.database_url))?;
    let profiles = SqliteProfileStore::new(db_pool);
    profiles.migrate().await?;

    let daily = DailyClient::new(reqwest::Client::new(), settings.daily_rooms_url.clone());
    let app_state = AppState {
        rooms: RoomProvisioner::new(Arc::new(EnvCredentials), daily),
        profiles: Arc::new(profiles),
    };

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr)
        .await
        .with_context(|| format!("binding {}", settings.listen_addr))?;
    tracing::info!(addr = %settings.listen_addr, daily = %settings.daily_rooms_url, "listening");

    axum::serve(listener, coachcall::router(app_state)).await?;
    Ok(())
}
