//! Minimal client for the Daily.co rooms API.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomOptions {
    pub properties: RoomProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomProperties {
    /// Epoch seconds after which Daily closes the room.
    pub exp: i64,
    pub enable_chat: bool,
    pub enable_screenshare: bool,
}

impl RoomOptions {
    pub fn expiring_in(now: OffsetDateTime, lifetime_secs: i64) -> Self {
        RoomOptions {
            properties: RoomProperties {
                exp: now.unix_timestamp() + lifetime_secs,
                enable_chat: true,
                enable_screenshare: true,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyRoom {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum DailyError {
    #[error("request to Daily failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Daily rejected the API key")]
    Unauthorized,

    #[error("Daily API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response from Daily: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct DailyClient {
    http_client: reqwest::Client,
    rooms_url: String,
}

impl DailyClient {
    pub fn new(http_client: reqwest::Client, rooms_url: impl Into<String>) -> Self {
        DailyClient {
            http_client,
            rooms_url: rooms_url.into(),
        }
    }

    pub fn rooms_url(&self) -> &str {
        &self.rooms_url
    }

    pub async fn create_room(&self, api_key: &str, options: &RoomOptions) -> Result<DailyRoom, DailyError> {
        let response = self.http_client
            .post(&self.rooms_url)
            .bearer_auth(api_key)
            .json(options)
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "Daily answered");

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, %body, "Daily rejected the request");
            return Err(DailyError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, %body, "Daily rejected the request");
            return Err(DailyError::Status { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|err| DailyError::InvalidResponse(format!("{err} in {body}")))
    }
}
