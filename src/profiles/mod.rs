mod store;
mod trigger;

use axum::{routing::post, Router};

use crate::AppState;

pub use store::{NewProfile, ProfileStore, SqliteProfileStore, UserProfile, DEFAULT_ROLE};
pub use trigger::{on_account_created, AccountCreated, Delivery, EventError, TriggerAck};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/createProfileOnRegister", post(trigger::create_profile_on_register))
}
