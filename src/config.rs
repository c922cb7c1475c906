pub const DAILY_API_KEY_VAR: &str = "DAILY_APIKEY";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://coachcall.db?mode=rwc";
pub const DEFAULT_DAILY_ROOMS_URL: &str = "https://api.daily.co/v1/rooms";

/// Source of the Daily bearer credential, consulted on every invocation.
pub trait CredentialProvider: Send + Sync {
    fn daily_api_key(&self) -> Option<String>;
}

/// Reads `DAILY_APIKEY` from the process environment (and `.env`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn daily_api_key(&self) -> Option<String> {
        dotenv::var(DAILY_API_KEY_VAR).ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixedCredentials(Option<String>);

impl FixedCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self(Some(api_key.into()))
    }

    pub fn missing() -> Self {
        Self(None)
    }
}

impl CredentialProvider for FixedCredentials {
    fn daily_api_key(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub listen_addr: String,
    pub database_url: String,
    pub daily_rooms_url: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        Settings {
            listen_addr: get("LISTEN_ADDR", DEFAULT_LISTEN_ADDR),
            database_url: get("DATABASE_URL", DEFAULT_DATABASE_URL),
            daily_rooms_url: get("DAILY_ROOMS_URL", DEFAULT_DAILY_ROOMS_URL),
        }
    }
}
