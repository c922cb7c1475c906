pub mod callable;
pub mod config;
pub mod profiles;
pub mod rooms;

use std::sync::Arc;

use axum::{extract::FromRef, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use callable::{Callable, CallableError, ErrorKind};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub rooms: rooms::RoomProvisioner,
    pub profiles: Arc<dyn profiles::ProfileStore>,
}

/// Registers both handlers with the HTTP dispatcher.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .merge(rooms::router())
        .merge(profiles::router())

        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
