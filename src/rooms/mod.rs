mod daily;
mod provision;

use axum::{routing::post, Router};

use crate::AppState;

pub use daily::{DailyClient, DailyError, DailyRoom, RoomOptions, RoomProperties};
pub use provision::{RoomCreated, RoomError, RoomProvisioner, ROOM_LIFETIME_SECS};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/createCoachingRoom", post(provision::create_coaching_room))
}
