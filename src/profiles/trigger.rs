use std::sync::Arc;

use axum::{body::Bytes, debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::AppState;

use super::store::{NewProfile, ProfileStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCreated {
    pub id: String,
    pub email: Option<String>,
}

/// Account record as the platform delivers it. User records may carry both
/// `uid` and `id`; `uid` wins.
#[derive(Debug, Deserialize)]
struct AccountEvent {
    uid: Option<String>,
    id: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed account event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("account event carries no uid or id")]
    MissingId,
}

impl AccountCreated {
    pub fn from_json(body: &[u8]) -> Result<Self, EventError> {
        let AccountEvent { uid, id, email } = serde_json::from_slice(body)?;
        let non_empty = |value: Option<String>| value.filter(|value| !value.is_empty());

        let id = non_empty(uid)
            .or_else(|| non_empty(id))
            .ok_or(EventError::MissingId)?;
        Ok(AccountCreated { id, email })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Written,
    Dropped,
}

#[derive(Debug, Serialize)]
pub struct TriggerAck {
    pub handled: bool,
    pub delivery: Delivery,
}

/// Creates the default profile for a freshly registered account.
///
/// Runs at most once per event: a failed write is logged and dropped, and the
/// trigger is still reported as handled so the platform never retries it.
/// Such failures only show up in the logs.
#[instrument(skip(store, account), fields(account_id = %account.id))]
pub async fn on_account_created(store: &dyn ProfileStore, account: AccountCreated) -> Delivery {
    info!(email = ?account.email, "new account registered, creating profile");

    let profile = NewProfile::patient(account.email);
    match store.put(&account.id, &profile).await {
        Ok(()) => {
            info!("profile created");
            Delivery::Written
        }
        Err(err) => {
            error!(error = %err, "could not create profile");
            Delivery::Dropped
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn create_profile_on_register(
    State(profiles): State<Arc<dyn ProfileStore>>,
    body: Bytes,
) -> Json<TriggerAck> {
    let delivery = match AccountCreated::from_json(&body) {
        Ok(account) => on_account_created(profiles.as_ref(), account).await,
        Err(err) => {
            error!(error = %err, "dropping account event");
            Delivery::Dropped
        }
    };
    Json(TriggerAck { handled: true, delivery })
}
