use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;

/// Every account registered through the app starts out as a patient.
pub const DEFAULT_ROLE: &str = "patient";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: Option<String>,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A profile about to be written. `created_at` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    email: Option<String>,
    role: &'static str,
}

impl NewProfile {
    pub fn patient(email: Option<String>) -> Self {
        NewProfile {
            email,
            role: DEFAULT_ROLE,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn role(&self) -> &str {
        self.role
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Writes the profile at `account_id`, replacing whatever was there.
    async fn put(&self, account_id: &str, profile: &NewProfile) -> anyhow::Result<()>;

    async fn get(&self, account_id: &str) -> anyhow::Result<Option<UserProfile>>;
}

#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    db_pool: SqlitePool,
}

impl SqliteProfileStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        SqliteProfileStore { db_pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY NOT NULL,
                email TEXT,
                role TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn put(&self, account_id: &str, profile: &NewProfile) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO profiles (id,email,role,created_at)
            VALUES (?,?,?,CAST(strftime('%s','now') AS INTEGER))",
        )
            .bind(account_id)
            .bind(profile.email())
            .bind(profile.role())
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    async fn get(&self, account_id: &str) -> anyhow::Result<Option<UserProfile>> {
        let row: Option<(Option<String>, String, i64)> =
            sqlx::query_as("SELECT email,role,created_at FROM profiles WHERE id=?")
                .bind(account_id)
                .fetch_optional(&self.db_pool)
                .await?;

        let Some((email, role, created_at)) = row else {
            return Ok(None);
        };

        Ok(Some(UserProfile {
            email,
            role,
            created_at: OffsetDateTime::from_unix_timestamp(created_at)?,
        }))
    }
}
