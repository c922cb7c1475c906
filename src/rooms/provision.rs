use std::sync::Arc;

use axum::{debug_handler, extract::State};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{callable::{Callable, CallableError, ErrorKind}, config::CredentialProvider, AppState};

use super::daily::{DailyClient, DailyError, RoomOptions};

/// Rooms close two hours after they are created.
pub const ROOM_LIFETIME_SECS: i64 = 2 * 60 * 60;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("server not configured to create rooms")]
    NotConfigured,

    #[error("configured API key is invalid")]
    InvalidApiKey,

    #[error("could not create video room")]
    Upstream(#[source] DailyError),
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoomError::InvalidApiKey => ErrorKind::Unauthenticated,
            RoomError::NotConfigured | RoomError::Upstream(_) => ErrorKind::Internal,
        }
    }
}

impl From<RoomError> for CallableError {
    fn from(err: RoomError) -> Self {
        let details = match &err {
            RoomError::Upstream(source) => Some(source.to_string()),
            RoomError::NotConfigured | RoomError::InvalidApiKey => None,
        };
        CallableError {
            kind: err.kind(),
            message: err.to_string(),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    pub room_url: String,
}

#[derive(Clone)]
pub struct RoomProvisioner {
    credentials: Arc<dyn CredentialProvider>,
    daily: DailyClient,
}

impl RoomProvisioner {
    pub fn new(credentials: Arc<dyn CredentialProvider>, daily: DailyClient) -> Self {
        RoomProvisioner { credentials, daily }
    }

    #[instrument(skip(self), fields(invocation_id = %Uuid::now_v7()))]
    pub async fn provision_room(&self) -> Result<RoomCreated, RoomError> {
        let Some(api_key) = self.credentials.daily_api_key().filter(|key| !key.is_empty()) else {
            error!("no Daily API key configured, refusing to create a room");
            return Err(RoomError::NotConfigured);
        };

        let options = RoomOptions::expiring_in(OffsetDateTime::now_utc(), ROOM_LIFETIME_SECS);
        info!(exp = options.properties.exp, url = %self.daily.rooms_url(), "creating Daily room");

        match self.daily.create_room(&api_key, &options).await {
            Ok(room) => {
                info!(room_url = %room.url, "room created");
                Ok(RoomCreated { room_url: room.url })
            }
            Err(DailyError::Unauthorized) => {
                error!("the configured Daily API key is invalid");
                Err(RoomError::InvalidApiKey)
            }
            Err(err) => {
                error!(error = %err, "could not create Daily room");
                Err(RoomError::Upstream(err))
            }
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn create_coaching_room(
    State(rooms): State<RoomProvisioner>,
) -> Result<Callable<RoomCreated>, CallableError> {
    Ok(Callable(rooms.provision_room().await?))
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use wiremock::{matchers::{bearer_token, method, path}, Mock, MockServer, ResponseTemplate};

    use crate::config::FixedCredentials;

    use super::*;

    fn provisioner(credentials: FixedCredentials, rooms_url: String) -> RoomProvisioner {
        RoomProvisioner::new(Arc::new(credentials), DailyClient::new(reqwest::Client::new(), rooms_url))
    }

    async fn daily_answering(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/rooms"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn returns_room_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/rooms"))
            .and(bearer_token("good-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": "https://x.daily.co/abc"})))
            .expect(1)
            .mount(&server)
            .await;

        let created = provisioner(FixedCredentials::new("good-key"), format!("{}/v1/rooms", server.uri()))
            .provision_room()
            .await
            .unwrap();
        assert_eq!(created, RoomCreated { room_url: "https://x.daily.co/abc".to_owned() });
    }

    #[tokio::test]
    async fn missing_or_empty_key_never_calls_daily() {
        let server = daily_answering(ResponseTemplate::new(200).set_body_json(json!({"url": "u"}))).await;

        for credentials in [FixedCredentials::missing(), FixedCredentials::new("")] {
            let err = provisioner(credentials, format!("{}/v1/rooms", server.uri()))
                .provision_room()
                .await
                .unwrap_err();
            assert!(matches!(err, RoomError::NotConfigured), "{err:?}");
            assert_eq!(err.kind(), ErrorKind::Internal);
        }

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_whatever_the_body() {
        for template in [
            ResponseTemplate::new(401),
            ResponseTemplate::new(401).set_body_json(json!({"error": "authentication-error", "info": "bad key"})),
            ResponseTemplate::new(401).set_body_string("<html>nope</html>"),
        ] {
            let server = daily_answering(template).await;
            let err = provisioner(FixedCredentials::new("bad-key"), format!("{}/v1/rooms", server.uri()))
                .provision_room()
                .await
                .unwrap_err();

            assert!(matches!(err, RoomError::InvalidApiKey), "{err:?}");
            let callable = CallableError::from(err);
            assert_eq!(callable.kind, ErrorKind::Unauthenticated);
            assert_eq!(callable.message, "configured API key is invalid");
        }
    }

    #[tokio::test]
    async fn server_error_is_internal_with_details() {
        let server = daily_answering(ResponseTemplate::new(500).set_body_string("daily is down")).await;
        let err = provisioner(FixedCredentials::new("key"), format!("{}/v1/rooms", server.uri()))
            .provision_room()
            .await
            .unwrap_err();

        let callable = CallableError::from(err);
        assert_eq!(callable.kind, ErrorKind::Internal);
        assert_eq!(callable.message, "could not create video room");
        let details = callable.details.unwrap();
        assert!(details.contains("500"), "{details}");
        assert!(details.contains("daily is down"), "{details}");
    }

    #[tokio::test]
    async fn network_failure_is_internal_with_details() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let rooms_url = format!("http://{}/v1/rooms", listener.local_addr().unwrap());
        drop(listener);

        let err = provisioner(FixedCredentials::new("key"), rooms_url)
            .provision_room()
            .await
            .unwrap_err();

        assert!(matches!(err, RoomError::Upstream(DailyError::Network(_))), "{err:?}");
        let callable = CallableError::from(err);
        assert_eq!(callable.kind, ErrorKind::Internal);
        assert!(callable.details.unwrap().contains("request to Daily failed"));
    }

    #[tokio::test]
    async fn timeout_is_internal_with_details() {
        let server = daily_answering(
            ResponseTemplate::new(200)
                .set_body_json(json!({"url": "https://x.daily.co/abc"}))
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .await;
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(100))
            .build()
            .unwrap();
        let rooms = RoomProvisioner::new(
            Arc::new(FixedCredentials::new("key")),
            DailyClient::new(http_client, format!("{}/v1/rooms", server.uri())),
        );

        let err = rooms.provision_room().await.unwrap_err();

        match &err {
            RoomError::Upstream(DailyError::Network(source)) => assert!(source.is_timeout(), "{source:?}"),
            other => panic!("unexpected {other:?}"),
        }
        let callable = CallableError::from(err);
        assert_eq!(callable.kind, ErrorKind::Internal);
        assert!(callable.details.unwrap().contains("request to Daily failed"));
    }

    #[tokio::test]
    async fn expiry_is_two_hours_from_now() {
        let server = daily_answering(ResponseTemplate::new(200).set_body_json(json!({"url": "https://x.daily.co/abc"}))).await;

        let before = OffsetDateTime::now_utc().unix_timestamp();
        provisioner(FixedCredentials::new("key"), format!("{}/v1/rooms", server.uri()))
            .provision_room()
            .await
            .unwrap();
        let after = OffsetDateTime::now_utc().unix_timestamp();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let exp = body["properties"]["exp"].as_i64().unwrap();
        assert!(exp >= before + ROOM_LIFETIME_SECS - 5 && exp <= after + ROOM_LIFETIME_SECS + 5, "exp={exp}");
        assert_eq!(body["properties"]["enable_chat"], true);
        assert_eq!(body["properties"]["enable_screenshare"], true);
    }
}
